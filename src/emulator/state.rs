//! CPU状态管理

use super::exception::FaultReport;
use super::memory::{Memory, MemoryError};
use crate::utils::disasm::RiscvDisassembler;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("寄存器访问错误: 寄存器 x{0} 超出范围")]
    InvalidRegister(usize),
    #[error("内存错误: {0}")]
    Memory(#[from] MemoryError),
}

/// 解释器状态机
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecState {
    /// 程序已装载，等待执行
    #[default]
    Ready,
    Running,
    /// 程序通过 exit 系统调用正常结束
    Halted(i32),
    /// 程序因错误终止
    Faulted(FaultReport),
}

impl ExecState {
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecState::Halted(_) | ExecState::Faulted(_))
    }
}

/// 通用寄存器堆，x0 恒为0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    registers: [u32; 32],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取寄存器值
    #[inline(always)]
    pub fn get(&self, reg: usize) -> Result<u32, StateError> {
        match reg {
            0 => Ok(0), // x0 永远是0
            1..=31 => Ok(self.registers[reg]),
            _ => Err(StateError::InvalidRegister(reg)),
        }
    }

    /// 设置寄存器值，对 x0 的写入被丢弃
    #[inline(always)]
    pub fn set(&mut self, reg: usize, value: u32) -> Result<(), StateError> {
        match reg {
            0 => Ok(()),
            1..=31 => {
                self.registers[reg] = value;
                Ok(())
            }
            _ => Err(StateError::InvalidRegister(reg)),
        }
    }

    #[inline(always)]
    pub fn as_array(&self) -> &[u32; 32] {
        &self.registers
    }
}

/// CPU状态
#[derive(Debug, Clone)]
pub struct State {
    // 通用寄存器
    pub registers: RegisterFile,
    // 程序计数器
    pc: u32,
    // npc
    npc: u32,
    // 内存
    pub memory: Memory,
}

impl State {
    /// 创建新的CPU状态，寄存器清零，PC 指向入口
    pub fn new(memory: Memory, entry: u32) -> Self {
        Self {
            registers: RegisterFile::new(),
            pc: entry,
            npc: entry,
            memory,
        }
    }

    /// 取指令
    #[inline(always)]
    pub fn fetch_instruction(&self, pc: u32) -> Result<u32, MemoryError> {
        self.memory.fetch(pc)
    }

    #[inline(always)]
    pub fn get_reg(&self, reg: usize) -> Result<u32, StateError> {
        self.registers.get(reg)
    }

    #[inline(always)]
    pub fn set_reg(&mut self, reg: usize, value: u32) -> Result<(), StateError> {
        self.registers.set(reg, value)
    }

    /// 获取PC值
    #[inline(always)]
    pub fn get_pc(&self) -> u32 {
        self.pc
    }

    /// 设置下一条指令地址
    #[inline(always)]
    pub fn set_npc(&mut self, value: u32) {
        self.npc = value;
    }

    /// 提交 npc 为当前 PC
    #[inline(always)]
    pub fn sync_pc(&mut self) {
        self.pc = self.npc;
    }
}

/// RISC-V寄存器别名
fn get_register_alias(reg: usize) -> &'static str {
    const ALIASES: [&str; 32] = [
        "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0/fp", "s1", "a0", "a1", "a2", "a3",
        "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11",
        "t3", "t4", "t5", "t6",
    ];
    ALIASES.get(reg).copied().unwrap_or("unknown")
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CPU State ===")?;
        writeln!(f, "PC: 0x{:08x}", self.pc)?;
        writeln!(f)?;

        // 打印寄存器，每行四个
        writeln!(f, "Registers:")?;
        for (i, values) in self.registers.as_array().chunks(4).enumerate() {
            write!(f, " ")?;
            for (j, value) in values.iter().enumerate() {
                let reg = i * 4 + j;
                let value = if reg == 0 { 0 } else { *value };
                write!(f, " x{:<2}({:>5}): 0x{:08x}", reg, get_register_alias(reg), value)?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "Memory around PC:")?;
        let disasm = match RiscvDisassembler::new() {
            Ok(d) => Some(d),
            Err(_) => {
                writeln!(f, "  Failed to create disassembler")?;
                None
            }
        };

        // 显示PC前后各4条指令
        let start_addr = self.pc.saturating_sub(4 * 4);
        for i in 0..9u32 {
            let addr = start_addr.wrapping_add(i * 4);
            let marker = if addr == self.pc { " <-- PC" } else { "" };
            match self.memory.fetch(addr) {
                Ok(word) => {
                    let text = disasm
                        .as_ref()
                        .and_then(|d| d.disasm_instruction(word, addr).ok())
                        .unwrap_or_else(|| "<invalid>".to_string());
                    writeln!(f, "  0x{:08x}: {:08x}    {}{}", addr, word, text, marker)?;
                }
                Err(_) => {
                    writeln!(f, "  0x{:08x}: <memory error>{}", addr, marker)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::memory::MisalignedPolicy;

    #[test]
    fn get_and_set() {
        let mut registers = RegisterFile::new();

        for i in 1..32 {
            assert_eq!(registers.get(i).unwrap(), 0);
            registers.set(i, 50).unwrap();
            assert_eq!(registers.get(i).unwrap(), 50);
            registers.set(i, u32::MAX).unwrap();
            assert_eq!(registers.get(i).unwrap(), u32::MAX);
        }
    }

    #[test]
    fn x0_is_hard_wired() {
        let mut registers = RegisterFile::new();
        assert_eq!(registers.get(0).unwrap(), 0);
        registers.set(0, 50).unwrap();
        assert_eq!(registers.get(0).unwrap(), 0);
        registers.set(0, u32::MAX).unwrap();
        assert_eq!(registers.get(0).unwrap(), 0);
    }

    #[test]
    fn invalid_register_index() {
        let mut registers = RegisterFile::new();
        assert!(matches!(registers.get(32), Err(StateError::InvalidRegister(32))));
        assert!(matches!(registers.set(40, 1), Err(StateError::InvalidRegister(40))));
    }

    #[test]
    fn pc_commit() {
        let mut state = State::new(Memory::new(16, MisalignedPolicy::Permit), 8);
        assert_eq!(state.get_pc(), 8);
        state.set_npc(12);
        assert_eq!(state.get_pc(), 8);
        state.sync_pc();
        assert_eq!(state.get_pc(), 12);
    }
}
