pub mod auth;
pub mod fallback;
pub mod llm_service;
pub mod provider;
pub mod scoring;

pub use auth::AuthGate;
pub use fallback::ProviderChain;
pub use llm_service::LlmService;
pub use provider::SeoProvider;
pub use scoring::{readability_score, seo_score, SeoMetrics};
