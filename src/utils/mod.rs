//! 工具模块

pub mod bit_utils;
pub mod disasm;
mod elf;
pub mod encode;
pub mod ringbuf;

pub use disasm::RiscvDisassembler;
pub use elf::load_image;
