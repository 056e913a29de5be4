//! 应用入口：把文件夹中的文章批量优化并存档

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{load_all_articles, ItemState};
use crate::orchestrator::batch_processor::BatchReport;
use crate::orchestrator::session::Workbench;
use crate::services::{AuthGate, LlmService, ProviderChain, SeoProvider};
use crate::storage::Archive;
use crate::utils::logging::{
    append_log_line, init_log_file, log_articles_loaded, log_startup, print_final_stats,
};
use crate::utils::DebugLog;

/// 应用主结构
pub struct App {
    config: Config,
    workbench: Workbench,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.concurrency_limit, &config.provider_names());

        // 访问控制
        let gate = AuthGate::new(config.app_password.clone());
        if !gate.is_authenticated() {
            gate.login(config.access_code.as_deref().unwrap_or_default());
            gate.require()?;
        }

        let debug_log = DebugLog::default();
        let provider = build_provider_chain(&config, &debug_log);
        let archive = Archive::from_config(&config);
        let workbench = Workbench::new(provider, archive, debug_log, config.concurrency_limit);

        Ok(Self { config, workbench })
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        info!("📁 正在扫描待优化的文章...");
        let articles = load_all_articles(&self.config.input_folder).await?;

        if articles.is_empty() {
            warn!("⚠️ 没有找到待优化的 .txt / .md 文件，程序结束");
            return Ok(BatchReport::default());
        }

        log_articles_loaded(articles.len(), self.config.concurrency_limit);

        let mut sources = Vec::with_capacity(articles.len());
        for article in articles {
            let id = self.workbench.add_to_queue(article.text)?;
            sources.push((id, article.path));
        }

        let report = self.workbench.run_batch().await?;

        // 存档并写入运行日志
        for (id, path) in &sources {
            let Some(item) = self.workbench.item(*id) else {
                continue;
            };
            let line = match item.state() {
                ItemState::Completed { result } => {
                    self.workbench.select(*id);
                    if let Err(e) = self.workbench.save_selected(None).await {
                        warn!("⚠️ 条目 {} 存档失败: {}", id, e);
                    }
                    format!("✅ {} {} → {}", id, path.display(), result.title)
                }
                ItemState::Error { error } => format!("❌ {} {} → {}", id, path.display(), error),
                other => format!("⏳ {} {} → {}", id, path.display(), other.status()),
            };
            append_log_line(&self.config.output_log_file, &line)?;
        }
        self.workbench.clear_selection();

        print_final_stats(
            report.completed,
            report.failed,
            report.total,
            &self.config.output_log_file,
        );

        Ok(report)
    }
}

/// 按配置顺序组装 provider；缺少密钥的 provider 跳过
fn build_provider_chain(config: &Config, debug_log: &DebugLog) -> Arc<dyn SeoProvider> {
    let providers: Vec<Arc<dyn SeoProvider>> = config
        .providers
        .iter()
        .filter(|settings| {
            let has_key = !settings.api_key.trim().is_empty();
            if !has_key {
                warn!("⚠️ 未配置 {} 的 API key，已跳过", settings.name);
            }
            has_key
        })
        .map(|settings| {
            Arc::new(LlmService::new(settings.clone(), debug_log.clone())) as Arc<dyn SeoProvider>
        })
        .collect();

    if providers.is_empty() {
        warn!("⚠️ 没有可用的 provider，所有文章都会失败");
    }

    Arc::new(ProviderChain::new(providers))
}
