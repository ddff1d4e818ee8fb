mod bootstrap;

use anyhow::Result;
use clap::Parser;
use config_crate::Network;
use tracing::info;
use utils::LoggerManager;

use crate::bootstrap::{setup_panic_hook, Application};

/// 跨交易所回跑竞速机器人
#[derive(Debug, Parser)]
#[command(name = "backrun_bot", about = "监听待打包交易并竞速提交回跑 bundle")]
struct Cli {
    /// 运行网络 (mainnet | goerli)
    #[arg(short, long)]
    network: Network,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    let _logger = LoggerManager::init();

    // 设置 panic hook
    setup_panic_hook();

    info!("========================================");
    info!("  回跑竞速机器人启动 ({})", cli.network.name());
    info!("========================================");

    // 启动应用
    let app = Application::start(cli.network).await?;

    // 等待退出信号
    app.wait_for_shutdown().await;

    // 关闭应用
    app.shutdown().await?;

    Ok(())
}
