//! 指令追踪器，记录最近执行过的指令

use crate::utils::disasm::RiscvDisassembler;
use crate::utils::ringbuf::RingBuffer;

/// 指令和地址
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceEntry {
    pub pc: u32,
    pub code: u32,
}

pub struct ITracer {
    instructions: RingBuffer<TraceEntry>,
}

impl ITracer {
    /// `size` 为0时不记录
    pub fn new(size: usize) -> Self {
        ITracer {
            instructions: RingBuffer::new(size),
        }
    }

    #[inline(always)]
    pub fn trace(&mut self, pc: u32, code: u32) {
        self.instructions.push_overwrite(TraceEntry { pc, code });
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.instructions.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
    }

    /// 从旧到新输出所有追踪的指令(带反汇编)
    pub fn get_instructions_log(&self) -> String {
        let disasm = RiscvDisassembler::new().ok();
        let mut log = String::new();
        for inst in self.instructions.iter() {
            let text = disasm
                .as_ref()
                .and_then(|d| d.disasm_instruction(inst.code, inst.pc).ok())
                .unwrap_or_else(|| "<invalid>".to_string());
            log += &format!("{:08x}: {:08x}  {}\n", inst.pc, inst.code, text);
        }
        log
    }
}
