//! RV32I 解释器库

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::const_values::EmuConfig;
use crate::emulator::{Emulator, ExecutionResult};

pub mod const_values;
pub mod emulator;
pub mod system;
pub mod utils;

pub use emulator::{load_and_run, load_and_run_with};

/// 程序出错时进程的退出码
pub const FAULT_EXIT_CODE: i32 = 1;

/// RV32I 解释器
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 程序文件路径 (ELF 或平坦二进制)
    #[arg(short, long)]
    pub program: PathBuf,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 内存大小 (字节)
    #[arg(short, long)]
    pub memory_bytes: Option<usize>,

    /// 入口地址，支持 0x 前缀
    #[arg(short, long, value_parser = parse_addr)]
    pub entry: Option<u32>,

    /// 最大执行步数
    #[arg(long)]
    pub max_steps: Option<u64>,
}

fn parse_addr(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("无效的地址 '{}': {}", s, e))
}

/// 合并配置文件和命令行参数，命令行优先
pub fn resolve_config(args: &Args) -> Result<EmuConfig> {
    let mut config = match &args.config {
        Some(path) => EmuConfig::new(path)?,
        None => EmuConfig::default(),
    };
    if let Some(size) = args.memory_bytes {
        config.memory.size = size;
    }
    if args.max_steps.is_some() {
        config.exec.max_steps = args.max_steps;
    }
    Ok(config)
}

/// 装载并运行程序，返回进程退出码
pub fn build_interp_run_blocking(args: Args) -> Result<i32> {
    let config = resolve_config(&args)?;
    info!(memory_size = config.memory.size, max_steps = ?config.exec.max_steps, "配置解释器");

    let mut image =
        utils::load_image(&args.program, config.memory.load_address, config.memory.size)?;
    if let Some(entry) = args.entry {
        image.entry = entry;
    }

    let stdout = std::io::stdout().lock();
    let result = match Emulator::new(config, &image, stdout) {
        Ok(mut emu) => {
            let result = emu.run();
            emu.into_sink().flush().context("无法刷新标准输出")?;
            result
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("程序映像无法装入内存: {}", args.program.display())
            });
        }
    };

    match result {
        ExecutionResult::Halted(status) => {
            info!(status, "运行结束");
            Ok(status)
        }
        ExecutionResult::Faulted(report) => {
            warn!("运行出错");
            eprintln!("{}", report);
            Ok(FAULT_EXIT_CODE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("0x80"), Ok(0x80));
        assert_eq!(parse_addr("0X10"), Ok(0x10));
        assert_eq!(parse_addr("64"), Ok(64));
        assert!(parse_addr("0xzz").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "rv32i-interp",
            "--program",
            "hello.bin",
            "--memory-bytes",
            "4096",
            "--max-steps",
            "10",
            "--entry",
            "0x40",
        ]);
        assert_eq!(args.entry, Some(0x40));
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.memory.size, 4096);
        assert_eq!(config.exec.max_steps, Some(10));
        assert_eq!(config.debug, EmuConfig::default().debug);
    }
}
