use anyhow::Result;
use seo_batch::utils::logging;
use seo_batch::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：设置了 SEO_BATCH_CONFIG 时从 TOML 文件读取
    let config = match std::env::var("SEO_BATCH_CONFIG") {
        Ok(path) => Config::from_toml_file(path)?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
