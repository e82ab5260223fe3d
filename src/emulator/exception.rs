//! 异常处理模块

use std::fmt;

use thiserror::Error;

use super::instructions::DecodeError;
use super::memory::MemoryError;
use super::state::StateError;

/// 使一次运行终止的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("访存越界: {addr:#x}, 大小 {size}")]
    OutOfBounds { addr: u32, size: usize },

    #[error("访存未对齐: {addr:#x}, 对齐要求 {alignment}")]
    Misaligned { addr: u32, alignment: usize },

    #[error("取指未对齐地址: {addr:#x}")]
    InstructionAddressMisaligned { addr: u32 },

    #[error("寄存器 x{0} 超出范围")]
    InvalidRegister(usize),

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("未知的系统调用: {0}")]
    UnknownSyscall(u32),

    #[error("超出最大执行步数 {limit}")]
    StepLimitExceeded { limit: u64 },

    #[error("执行被外部取消")]
    Cancelled,

    #[error("输出写入失败: {0}")]
    Sink(String),
}

impl From<MemoryError> for Fault {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfBounds { addr, size } => Fault::OutOfBounds { addr, size },
            MemoryError::Misaligned { addr, alignment } => Fault::Misaligned { addr, alignment },
        }
    }
}

impl From<StateError> for Fault {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Memory(e) => e.into(),
            StateError::InvalidRegister(reg) => Fault::InvalidRegister(reg),
        }
    }
}

/// 错误发生时的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    pub fault: Fault,
    /// 出错指令的地址
    pub pc: u32,
    /// 出错指令的机器码，取指失败时为空
    pub instruction: Option<u32>,
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instruction {
            Some(inst) => write!(f, "{} (pc={:#010x}, inst={:#010x})", self.fault, self.pc, inst),
            None => write!(f, "{} (pc={:#010x})", self.fault, self.pc),
        }
    }
}

/// 一次运行的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// exit 系统调用给出的退出码
    Halted(i32),
    Faulted(FaultReport),
}

impl ExecutionResult {
    /// 取出 fault 种类，正常结束时为 None
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ExecutionResult::Halted(_) => None,
            ExecutionResult::Faulted(report) => Some(&report.fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_conversion() {
        assert_eq!(Fault::from(StateError::InvalidRegister(40)), Fault::InvalidRegister(40));
        assert_eq!(
            Fault::from(StateError::Memory(MemoryError::OutOfBounds { addr: 8, size: 4 })),
            Fault::OutOfBounds { addr: 8, size: 4 }
        );
    }

    #[test]
    fn test_report_display() {
        let report = FaultReport {
            fault: Fault::UnknownSyscall(99),
            pc: 4,
            instruction: Some(0x73),
        };
        assert_eq!(report.to_string(), "未知的系统调用: 99 (pc=0x00000004, inst=0x00000073)");
    }
}
