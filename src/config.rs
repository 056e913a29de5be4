use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{ConfigError, Result};

/// 同时进行的远程优化调用上限
pub const CONCURRENCY_LIMIT: usize = 4;

/// 单个 LLM provider 的配置（OpenAI 兼容接口）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 用于日志的名称
    pub name: String,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::groq()
    }
}

impl ProviderConfig {
    pub fn groq() -> Self {
        Self {
            name: "groq".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            max_tokens: 8192,
        }
    }

    pub fn gemini() -> Self {
        Self {
            name: "gemini".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.2,
            max_tokens: 8192,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 每批同时优化的文章数量
    pub concurrency_limit: usize,
    /// 待优化文章（.txt / .md）所在目录
    pub input_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 按顺序尝试的 provider
    pub providers: Vec<ProviderConfig>,
    /// 本地存档文件
    pub archive_file: String,
    // --- 远程存档（PostgREST）---
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub remote_user_id: Option<String>,
    // --- 访问控制 ---
    pub app_password: Option<String>,
    pub access_code: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency_limit: CONCURRENCY_LIMIT,
            input_folder: "articles".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            providers: vec![ProviderConfig::groq(), ProviderConfig::gemini()],
            archive_file: "saved-articles.json".to_string(),
            remote_url: None,
            remote_key: None,
            remote_user_id: None,
            app_password: None,
            access_code: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺失的键使用默认值，之后再叠加环境变量
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        let mut providers = self.providers;
        for provider in providers.iter_mut() {
            let var = format!("{}_API_KEY", provider.name.to_uppercase());
            if let Ok(key) = std::env::var(&var) {
                provider.api_key = key;
            }
        }

        Self {
            concurrency_limit: env_parse("CONCURRENCY_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(self.concurrency_limit),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(self.input_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            providers,
            archive_file: std::env::var("ARCHIVE_FILE").unwrap_or(self.archive_file),
            remote_url: std::env::var("SUPABASE_URL").ok().or(self.remote_url),
            remote_key: std::env::var("SUPABASE_KEY").ok().or(self.remote_key),
            remote_user_id: std::env::var("SUPABASE_USER_ID").ok().or(self.remote_user_id),
            app_password: std::env::var("APP_PASSWORD").ok().or(self.app_password),
            access_code: std::env::var("ACCESS_CODE").ok().or(self.access_code),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }
}

/// 读取并解析环境变量；解析失败时记录警告并返回 `None`（保留默认值）
fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let value = std::env::var(var).ok()?;
    match parse_env_value(var, &value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("⚠️ {}，使用默认值", e);
            None
        }
    }
}

fn parse_env_value<T: std::str::FromStr>(
    var: &str,
    value: &str,
) -> std::result::Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var.to_string(),
            value: value.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}
