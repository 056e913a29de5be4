//! 结果评分
//!
//! 对优化后的 HTML 做本地的 SEO / 可读性打分，不调用远程服务

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::OnceLock;

use crate::models::{ReadabilityItem, ReadabilityStatus};

/// SEO 指标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoMetrics {
    /// 0-100
    pub score: u32,
    pub word_count: usize,
    pub keyword_count: usize,
    /// 关键词密度（百分比）
    pub density: f64,
    pub h2_count: usize,
    pub has_lists: bool,
    pub has_bold: bool,
}

struct HtmlPatterns {
    tag: Regex,
    h2: Regex,
    bold: Regex,
    list: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        tag: Regex::new(r"<[^>]*>").expect("tag regex is valid"),
        h2: Regex::new(r"(?i)<h2").expect("h2 regex is valid"),
        bold: Regex::new(r"(?i)<strong|<b\s").expect("bold regex is valid"),
        list: Regex::new(r"(?i)<ul|<ol").expect("list regex is valid"),
    })
}

/// 计算 HTML 正文针对焦点关键词的 SEO 得分
///
/// 评分构成：
/// - 关键词密度（最高 30 分，0.5%-2.5% 最佳）
/// - 篇幅（最高 20 分，600 词以上最佳）
/// - H2 结构（最高 20 分）
/// - 加粗（15 分）
/// - 列表（15 分）
pub fn seo_score(html: &str, focus_keyword: &str) -> SeoMetrics {
    let p = patterns();
    let text = p.tag.replace_all(html, " ");
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    let plain = words.join(" ");

    let keyword = focus_keyword.trim();
    let keyword_count = if keyword.is_empty() {
        0
    } else {
        RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
            .map(|re| re.find_iter(&plain).count())
            .unwrap_or(0)
    };

    let density = if word_count > 0 {
        keyword_count as f64 / word_count as f64 * 100.0
    } else {
        0.0
    };

    let h2_count = p.h2.find_iter(html).count();
    let bold_count = p.bold.find_iter(html).count();
    let list_count = p.list.find_iter(html).count();

    let mut score = 0u32;

    if (0.5..=2.5).contains(&density) {
        score += 30;
    } else if density > 0.0 && density < 0.5 {
        score += 15;
    } else if density > 2.5 && density < 4.0 {
        score += 10;
    }

    if word_count >= 600 {
        score += 20;
    } else if word_count >= 300 {
        score += 10;
    }

    match h2_count {
        0 => {}
        1 => score += 10,
        _ => score += 20,
    }

    if bold_count > 2 {
        score += 15;
    }
    if list_count > 0 {
        score += 15;
    }

    SeoMetrics {
        score: score.min(100),
        word_count,
        keyword_count,
        density,
        h2_count,
        has_lists: list_count > 0,
        has_bold: bold_count > 0,
    }
}

/// 可读性得分：good=100、average=60、其余=30 的平均值，空列表为 0
pub fn readability_score(items: &[ReadabilityItem]) -> u32 {
    if items.is_empty() {
        return 0;
    }
    let total: u32 = items
        .iter()
        .map(|item| match item.status {
            ReadabilityStatus::Good => 100,
            ReadabilityStatus::Average => 60,
            _ => 30,
        })
        .sum();
    (total as f64 / items.len() as f64).round() as u32
}
