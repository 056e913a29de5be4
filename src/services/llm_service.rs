//! LLM 服务 - 业务能力层
//!
//! 只负责"把一篇文章交给模型优化 / 补充来源"的能力，不关心队列和批次
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（Groq、Gemini OpenAI 兼容端点等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, LlmError, Result};
use crate::models::{GroundingSource, SeoResult};
use crate::services::provider::SeoProvider;
use crate::utils::DebugLog;

const SYSTEM_MESSAGE: &str = "You are a world-class SEO editor specialising in long-form articles. \
Your mission is content preservation: never summarise, never truncate, never omit details. \
You turn plain text into SEO-optimised HTML without losing a single fact, figure or name. \
Always answer with a single JSON object.";

const ENRICH_TEMPERATURE: f32 = 0.1;

/// LLM 服务
///
/// 职责：
/// - 调用 OpenAI 兼容接口完成优化 / 补充来源
/// - 把模型回复解析为 `SeoResult`
/// - 只处理单篇文章，不出现队列
pub struct LlmService {
    client: Client<OpenAIConfig>,
    settings: ProviderConfig,
    debug_log: DebugLog,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(settings: ProviderConfig, debug_log: DebugLog) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&settings.api_key)
            .with_api_base(&settings.api_base);

        Self {
            client: Client::with_config(openai_config),
            settings,
            debug_log,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `temperature`: 采样温度
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已 trim）
    async fn send_to_llm(&self, user_message: &str, temperature: f32) -> Result<String> {
        if self.settings.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: self.settings.name.clone(),
            }
            .into());
        }

        let model = &self.settings.model;
        debug!("调用 LLM API，模型: {}", model);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| AppError::llm_api_failed(model, e.to_string()))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::llm_api_failed(model, e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| AppError::llm_api_failed(model, e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::llm_api_failed(model, e.to_string()))?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: model.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    fn build_optimize_prompt(text: &str) -> String {
        let words = word_count(text);
        format!(
            r#"URGENT TASK: SEO optimisation and professional HTML formatting.

SOURCE WORD COUNT: {words} words.
MINIMUM OUTPUT WORD COUNT for 'htmlContent': {words} words.

RULES:
1. Do not summarise, shorten or omit anything.
2. Every fact, quote, name and technical detail must appear in 'htmlContent'.
3. Keep every information block of the source.

OUTPUT FORMAT:
- Return ONLY a JSON object.
- Fields: keyPhrase, title, description, slug, htmlContent, tags, categories, socialMediaPost, seoChecklist, readability.
- 'htmlContent' is the full optimised article in HTML (h2, h3, p, strong, ul, li).

SOURCE TEXT:
{text}"#
        )
    }

    fn build_enrich_prompt(current: &SeoResult) -> String {
        format!(
            r#"SEO ANALYST TASK: add <a href="..."> links to official sources inside the HTML below.
Do NOT remove or change a single word of the existing text; only wrap existing mentions of
software, brands or sources with appropriate links.
Return a JSON object with the same fields as before (at least 'htmlContent'),
plus 'groundingSources': [{{"title": ..., "uri": ...}}] for every link you added.

HTML CONTENT TO PRESERVE:
{}"#,
            current.html_content
        )
    }
}

#[async_trait]
impl SeoProvider for LlmService {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn optimize(&self, text: &str) -> Result<SeoResult> {
        self.debug_log.info(
            format!("[{}] 开始优化，输入 {} 个词", self.settings.name, word_count(text)),
            None,
        );

        let prompt = Self::build_optimize_prompt(text);
        let reply = match self.send_to_llm(&prompt, self.settings.temperature).await {
            Ok(reply) => reply,
            Err(e) => {
                self.debug_log.error(
                    format!("[{}] 优化失败", self.settings.name),
                    Some(json!({ "error": e.to_string() })),
                );
                return Err(e);
            }
        };

        self.debug_log.info(
            "收到 API 响应",
            Some(json!({
                "inputLength": text.chars().count(),
                "responseLength": reply.chars().count(),
                "isTruncated": !reply.ends_with('}'),
            })),
        );

        let object = parse_reply_object(&reply, &self.debug_log)?;
        serde_json::from_value(JsonValue::Object(object)).map_err(|e| {
            LlmError::InvalidJson {
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn enrich(&self, current: &SeoResult) -> Result<SeoResult> {
        self.debug_log
            .info(format!("[{}] 开始补充来源", self.settings.name), None);

        let prompt = Self::build_enrich_prompt(current);
        let reply = self.send_to_llm(&prompt, ENRICH_TEMPERATURE).await?;
        let overlay = parse_reply_object(&reply, &self.debug_log)?;
        let enriched = merge_enrichment(current, overlay)?;

        self.debug_log.info(
            "补充来源完成",
            Some(json!({
                "originalLength": current.html_content.chars().count(),
                "newLength": enriched.html_content.chars().count(),
            })),
        );
        Ok(enriched)
    }
}

// ========== 辅助函数 ==========

/// 按空白切分统计词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 从模型回复中截取 JSON 对象
///
/// 直接取第一个 `{` 到最后一个 `}` 之间的内容，Markdown 代码块和前后的说明文字一并去掉；
/// 正文里出现的三个反引号不影响截取
pub fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(open), Some(close)) if close > open => &text[open..=close],
        _ => text,
    }
}

/// 解析模型回复为 JSON 对象
///
/// 先直接解析，失败后清理再解析一次
pub fn parse_reply_object(reply: &str, debug_log: &DebugLog) -> Result<Map<String, JsonValue>> {
    let first_error = match serde_json::from_str::<JsonValue>(reply.trim()) {
        Ok(JsonValue::Object(object)) => return Ok(object),
        Ok(other) => format!("期望 JSON 对象，实际为 {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };

    debug_log.warn(
        "首次解析 JSON 失败，尝试清理后重试",
        Some(json!({ "error": first_error, "length": reply.len() })),
    );

    let cleaned = extract_json(reply);
    match serde_json::from_str::<JsonValue>(cleaned) {
        Ok(JsonValue::Object(object)) => {
            debug_log.info("清理后 JSON 解析成功", None);
            Ok(object)
        }
        Ok(other) => Err(LlmError::InvalidJson {
            reason: format!("期望 JSON 对象，实际为 {}", json_kind(&other)),
        }
        .into()),
        Err(e) => {
            debug_log.error(
                "清理后 JSON 仍无法解析",
                Some(json!({
                    "error": e.to_string(),
                    "isTruncated": !cleaned.trim_end().ends_with('}'),
                })),
            );
            Err(LlmError::InvalidJson {
                reason: e.to_string(),
            }
            .into())
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// 把补充结果覆盖到当前结果上，来源按 uri 去重（先出现者优先）
pub fn merge_enrichment(current: &SeoResult, overlay: Map<String, JsonValue>) -> Result<SeoResult> {
    let mut base = match serde_json::to_value(current) {
        Ok(JsonValue::Object(object)) => object,
        Ok(_) => Map::new(),
        Err(e) => {
            return Err(LlmError::InvalidJson {
                reason: e.to_string(),
            }
            .into())
        }
    };
    for (key, value) in overlay {
        base.insert(key, value);
    }

    let mut merged: SeoResult =
        serde_json::from_value(JsonValue::Object(base)).map_err(|e| LlmError::InvalidJson {
            reason: e.to_string(),
        })?;

    let old_sources = current.grounding_sources.clone().unwrap_or_default();
    let new_sources = merged.grounding_sources.take().unwrap_or_default();
    let sources = dedupe_sources(old_sources.into_iter().chain(new_sources));
    merged.grounding_sources = if sources.is_empty() {
        None
    } else {
        Some(sources)
    };

    Ok(merged)
}

fn dedupe_sources(sources: impl Iterator<Item = GroundingSource>) -> Vec<GroundingSource> {
    let mut seen = std::collections::HashSet::new();
    sources
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// 创建指向 mock 服务器的 LlmService
    fn create_test_service(api_base: &str, api_key: &str) -> LlmService {
        let settings = ProviderConfig {
            name: "test".to_string(),
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            model: "test-model".to_string(),
            temperature: 0.0,
            max_tokens: 512,
        };
        LlmService::new(settings, DebugLog::default())
    }

    fn chat_response(content: &str) -> JsonValue {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000u32,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop",
                "logprobs": null
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 10, "total_tokens": 20 }
        })
    }

    #[test]
    fn test_extract_json_strips_fence_and_chatter() {
        let reply = "Ecco il risultato:\n```json\n{\"title\": \"T\"}\n```\nGrazie!";
        assert_eq!(extract_json(reply), "{\"title\": \"T\"}");

        let reply = "Sure! {\"a\": {\"b\": 1}} hope it helps";
        assert_eq!(extract_json(reply), "{\"a\": {\"b\": 1}}");

        assert_eq!(extract_json("no braces"), "no braces");
    }

    #[test]
    fn test_fenced_reply_with_backticks_in_html() {
        let reply = "```json\n{\"title\":\"Rust\",\"htmlContent\":\"<p>usa ```cargo``` per compilare</p>\"}\n```";
        assert_eq!(
            extract_json(reply),
            "{\"title\":\"Rust\",\"htmlContent\":\"<p>usa ```cargo``` per compilare</p>\"}"
        );

        let log = DebugLog::default();
        let object = parse_reply_object(reply, &log).unwrap();
        assert_eq!(object["title"], "Rust");
        assert_eq!(object["htmlContent"], "<p>usa ```cargo``` per compilare</p>");
        assert_eq!(log.error_count(), 0);
    }

    #[test]
    fn test_parse_reply_object_second_attempt() {
        let log = DebugLog::default();
        let object = parse_reply_object("Here you go: {\"title\":\"T\"}", &log).unwrap();
        assert_eq!(object["title"], "T");
        assert!(log
            .entries()
            .iter()
            .any(|e| e.message.contains("首次解析 JSON 失败")));
    }

    #[test]
    fn test_parse_reply_object_gives_up() {
        let log = DebugLog::default();
        let err = parse_reply_object("{\"title\": \"trunc", &log).unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::InvalidJson { .. })));
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn test_merge_enrichment_overlays_and_dedupes_sources() {
        let current = SeoResult {
            title: "Titolo".to_string(),
            html_content: "<p>vecchio</p>".to_string(),
            grounding_sources: Some(vec![GroundingSource {
                title: "A".to_string(),
                uri: "https://a.example".to_string(),
            }]),
            ..Default::default()
        };
        let overlay = json!({
            "htmlContent": "<p><a href=\"https://b.example\">nuovo</a></p>",
            "groundingSources": [
                { "title": "A bis", "uri": "https://a.example" },
                { "title": "Senza link" },
                { "title": "B", "uri": "https://b.example" }
            ]
        });
        let JsonValue::Object(overlay) = overlay else {
            unreachable!()
        };

        let merged = merge_enrichment(&current, overlay).unwrap();
        assert_eq!(merged.title, "Titolo");
        assert!(merged.html_content.contains("nuovo"));
        let sources = merged.grounding_sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "A");
        assert_eq!(sources[1].uri, "https://b.example");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  uno due\n tre\t"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let service = create_test_service("http://127.0.0.1:9", "");
        let err = service.optimize("testo").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::MissingApiKey { .. })));
    }

    #[tokio::test]
    async fn test_optimize_parses_chat_reply() {
        let server = MockServer::start().await;
        let content = r#"```json
{"keyPhrase":"rust","title":"Rust in produzione","htmlContent":"<h2>Rust</h2><p>testo</p>","readability":[{"criteria":"frasi","status":"good","score":"9","message":"ok"}]}
```"#;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(content)))
            .mount(&server)
            .await;

        let service = create_test_service(&server.uri(), "sk-test");
        let result = service.optimize("Rust in produzione, testo").await.unwrap();
        assert_eq!(result.title, "Rust in produzione");
        assert_eq!(result.key_phrase, "rust");
        assert_eq!(result.readability.len(), 1);
    }

    #[tokio::test]
    async fn test_optimize_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Invalid API Key",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let service = create_test_service(&server.uri(), "sk-wrong");
        let err = service.optimize("testo").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::ApiCallFailed { .. })));
    }

    /// 真实 provider 调用，需要 GROQ_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_optimize_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut settings = ProviderConfig::groq();
        settings.api_key = std::env::var("GROQ_API_KEY").unwrap_or_default();
        let service = LlmService::new(settings, DebugLog::default());

        let result = service
            .optimize("Rust è un linguaggio di programmazione orientato alla sicurezza della memoria.")
            .await
            .unwrap();
        println!("{}", result.title);
        assert!(!result.html_content.is_empty());
    }
}
