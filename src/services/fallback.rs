//! Provider 降级链
//!
//! 按配置顺序依次尝试，直到某个 provider 成功

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{LlmError, Result};
use crate::models::SeoResult;
use crate::services::provider::SeoProvider;

pub struct ProviderChain {
    providers: Vec<Arc<dyn SeoProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn SeoProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl SeoProvider for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn optimize(&self, text: &str) -> Result<SeoResult> {
        let mut last_message = String::from("no providers configured");
        for provider in &self.providers {
            match provider.optimize(text).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("⚠️ provider {} 优化失败，尝试下一个: {}", provider.name(), e);
                    last_message = e.user_message();
                }
            }
        }
        Err(LlmError::AllProvidersFailed { last_message }.into())
    }

    async fn enrich(&self, current: &SeoResult) -> Result<SeoResult> {
        let mut last_message = String::from("no providers configured");
        for provider in &self.providers {
            match provider.enrich(current).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("⚠️ provider {} 补充来源失败，尝试下一个: {}", provider.name(), e);
                    last_message = e.user_message();
                }
            }
        }
        Err(LlmError::AllProvidersFailed { last_message }.into())
    }
}
