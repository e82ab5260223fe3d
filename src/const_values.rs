use anyhow::{self, Context};
use serde::Deserialize;
use std::path::Path;

use crate::emulator::MisalignedPolicy;

/// 默认内存大小 128 KiB
pub const DEFAULT_MEMORY_SIZE: usize = 1 << 17;
/// 默认保留的指令追踪条数
pub const DEFAULT_TRACE_HISTORY: usize = 16;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    /// 内存大小（字节）
    pub size: usize,
    /// 平坦二进制的装载地址
    pub load_address: u32,
    pub misaligned: MisalignedPolicy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_MEMORY_SIZE,
            load_address: 0,
            misaligned: MisalignedPolicy::Permit,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ExecConfig {
    /// 最大执行步数，不设置则不限制
    pub max_steps: Option<u64>,
    /// 复位时写入 sp 的值，不设置则 sp 为0
    pub stack_pointer: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DebugConfig {
    pub trace_history: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            trace_history: DEFAULT_TRACE_HISTORY,
        }
    }
}

/// 解释器配置（来自 profile/config.toml），所有字段都有默认值
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EmuConfig {
    pub memory: MemoryConfig,
    pub exec: ExecConfig,
    pub debug: DebugConfig,
}

impl EmuConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<EmuConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取配置文件: {:?}", path.as_ref().as_os_str()))?;
        Self::from_toml_str(&toml_str)
            .with_context(|| format!("无法解析配置文件: {:?}", path.as_ref().as_os_str()))
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<EmuConfig> {
        let config: EmuConfig = toml::from_str(toml_str)?;
        anyhow::Ok(config)
    }
}
