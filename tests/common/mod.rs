#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use seo_batch::models::GroundingSource;
use seo_batch::{AppError, Result, SeoProvider, SeoResult};
use tokio::sync::Notify;

/// 可观察的 provider：记录开始 / 结束顺序和同时在途的调用数
#[derive(Default)]
pub struct StubProvider {
    delay: Duration,
    enrich_delay: Duration,
    failing: HashSet<String>,
    fail_enrich: bool,
    gate: Option<Arc<Notify>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_enrich_delay(mut self, delay: Duration) -> Self {
        self.enrich_delay = delay;
        self
    }

    /// 这些文本的优化调用会失败
    pub fn failing_on(mut self, texts: &[&str]) -> Self {
        self.failing = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn failing_enrich(mut self) -> Self {
        self.fail_enrich = true;
        self
    }

    /// 每个优化调用都要等到 gate 被通知后才返回
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

pub fn result_for(text: &str) -> SeoResult {
    SeoResult {
        title: format!("T:{}", text),
        key_phrase: text.to_string(),
        html_content: format!("<p>{}</p>", text),
        ..Default::default()
    }
}

#[async_trait]
impl SeoProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn optimize(&self, text: &str) -> Result<SeoResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.record(format!("start:{}", text));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.record(format!("end:{}", text));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            Err(AppError::llm_api_failed("stub", "servizio non disponibile"))
        } else {
            Ok(result_for(text))
        }
    }

    async fn enrich(&self, current: &SeoResult) -> Result<SeoResult> {
        if !self.enrich_delay.is_zero() {
            tokio::time::sleep(self.enrich_delay).await;
        }
        if self.fail_enrich {
            return Err(AppError::llm_api_failed("stub", "ricerca fallita"));
        }
        let mut enriched = current.clone();
        enriched.html_content = format!("{}<p>fonte</p>", current.html_content);
        enriched.grounding_sources = Some(vec![GroundingSource {
            title: "Fonte".to_string(),
            uri: "https://example.org/fonte".to_string(),
        }]);
        Ok(enriched)
    }
}
