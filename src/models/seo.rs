use serde::{Deserialize, Deserializer, Serialize};

/// SEO 检查项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoChecklistItem {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub status: ChecklistStatus,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ChecklistStatus {
    Pass,
    Fail,
    #[default]
    ManualAction,
}

impl From<String> for ChecklistStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            _ => Self::ManualAction,
        }
    }
}

/// 可读性评估项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityItem {
    #[serde(default)]
    pub criteria: String,
    #[serde(default)]
    pub status: ReadabilityStatus,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: String,
    #[serde(default)]
    pub message: String,
}

// 模型有时把分数写成数字，统一转成字符串
fn deserialize_score<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number representing a score")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

/// 可读性评级
///
/// provider 偶尔会返回 `average`，和 `ok` 分开保留
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ReadabilityStatus {
    Good,
    Ok,
    Average,
    #[default]
    NeedsImprovement,
}

impl From<String> for ReadabilityStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "good" => Self::Good,
            "ok" => Self::Ok,
            "average" => Self::Average,
            _ => Self::NeedsImprovement,
        }
    }
}

/// 引用来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

/// 丢弃没有 uri 的来源
fn deserialize_sources<'de, D>(deserializer: D) -> Result<Option<Vec<GroundingSource>>, D::Error>
where
    D: Deserializer<'de>,
{
    let sources: Option<Vec<GroundingSource>> = Option::deserialize(deserializer)?;
    Ok(sources.map(|sources| {
        sources
            .into_iter()
            .filter(|source| !source.uri.trim().is_empty())
            .collect()
    }))
}

/// 一次 SEO 优化的完整结果
///
/// 对调度器来说是不透明的载荷，只在展示和存档时读取字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoResult {
    pub key_phrase: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub html_content: String,
    pub seo_checklist: Vec<SeoChecklistItem>,
    pub readability: Vec<ReadabilityItem>,
    pub tags: String,
    pub categories: String,
    pub social_media_post: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_sources"
    )]
    pub grounding_sources: Option<Vec<GroundingSource>>,
}

/// 已存档的优化结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSeoResult {
    pub id: String,
    pub original_article_text: String,
    #[serde(flatten)]
    pub result: SeoResult,
}
