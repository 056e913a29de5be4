use thiserror::Error;

use crate::models::ItemId;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 队列相关错误
    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 存储错误（本地 / 远程）
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
}

/// 队列错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// 文章内容为空
    #[error("文章内容不能为空")]
    EmptyText,
    /// 队列中不存在该条目
    #[error("队列中不存在条目 {0}")]
    NotFound(ItemId),
    /// 非法状态迁移
    #[error("条目 {id} 无法从 {from} 迁移到 {to}")]
    InvalidTransition {
        id: ItemId,
        from: &'static str,
        to: &'static str,
    },
    /// 已有批次正在运行
    #[error("已有批次正在处理中，请等待完成后再试")]
    BatchInFlight,
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 缺少 API Key
    #[error("{provider} 缺少 API Key，请在配置或环境变量中设置")]
    MissingApiKey { provider: String },
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 无法解析返回的 JSON
    #[error("无法解析AI返回的内容，返回格式可能无效: {reason}")]
    InvalidJson { reason: String },
    /// 所有 provider 均失败
    #[error("所有 provider 均失败: {last_message}")]
    AllProvidersFailed { last_message: String },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 文件读写失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 序列化 / 反序列化失败
    #[error("JSON处理失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 远程请求失败
    #[error("远程存储请求失败: {0}")]
    Remote(#[from] reqwest::Error),
    /// 远程返回错误状态
    #[error("远程存储返回错误 (status={status}): {body}")]
    RemoteStatus { status: u16, body: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 认证错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("访问码无效")]
    InvalidCredentials,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            message: message.into(),
        })
    }

    /// 创建文件读写错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage(StorageError::Io {
            path: path.into(),
            source,
        })
    }

    /// 面向用户的错误描述（写入队列条目）
    ///
    /// 只取最内层的描述，不带分类前缀
    pub fn user_message(&self) -> String {
        let message = match self {
            AppError::Queue(e) => e.to_string(),
            AppError::Llm(e) => e.to_string(),
            AppError::Storage(e) => e.to_string(),
            AppError::Config(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
        };
        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

/// 错误没有描述时使用的兜底文案
pub const UNKNOWN_ERROR: &str = "未知错误";

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
