use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{self, EnvFilter};

use rv32i_interp::{Args, build_interp_run_blocking};

fn main() -> Result<()> {
    // 初始化日志，输出到 stderr，避免与程序输出混在一起
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false) // 不显示目标模块
        .with_file(true) // 显示文件名
        .with_line_number(true) // 显示行号
        .init();

    // 解析命令行参数
    let args = Args::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "启动RV32I解释器");

    let status = build_interp_run_blocking(args)?;
    std::process::exit(status)
}
