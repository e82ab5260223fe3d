//! RISC-V 32位指令反汇编模块

use anyhow::{Result, anyhow};
use capstone::prelude::*;

/// RISC-V 32位反汇编器
pub struct RiscvDisassembler {
    cs: Capstone,
}

impl RiscvDisassembler {
    pub fn new() -> Result<Self> {
        let cs = Capstone::new()
            .riscv()
            .mode(arch::riscv::ArchMode::RiscV32)
            .build()
            .map_err(|e| anyhow!("Failed to create capstone engine: {}", e))?;

        Ok(Self { cs })
    }

    /// 反汇编单条指令
    ///
    /// # 参数
    /// - `code`: 4字节的指令码
    /// - `address`: 指令地址
    pub fn disasm_instruction(&self, code: u32, address: u32) -> Result<String> {
        let insns = self
            .cs
            .disasm_count(&code.to_le_bytes(), address as u64, 1)
            .map_err(|e| anyhow!("Failed to disassemble: {}", e))?;

        let Some(insn) = insns.iter().next() else {
            return Ok("<invalid>".to_string());
        };
        let mnemonic = insn.mnemonic().unwrap_or("<unknown>");
        match insn.op_str() {
            Some(op_str) if !op_str.is_empty() => Ok(format!("{} {}", mnemonic, op_str)),
            _ => Ok(mnemonic.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_instructions() {
        let disasm = RiscvDisassembler::new().expect("Failed to create disassembler");

        // addi x1, x0, 42
        let text = disasm.disasm_instruction(0x02a0_0093, 0x1000).unwrap();
        assert!(text.contains("42"), "{}", text);

        let text = disasm.disasm_instruction(0x0000_0073, 0x1004).unwrap();
        assert_eq!(text, "ecall");
    }

    #[test]
    fn test_invalid_word() {
        let disasm = RiscvDisassembler::new().expect("Failed to create disassembler");
        if let Ok(text) = disasm.disasm_instruction(0xFFFF_FFFF, 0) {
            assert_eq!(text, "<invalid>");
        }
    }
}
