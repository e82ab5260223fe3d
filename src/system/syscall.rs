use std::io::{self, Write};

use crate::emulator::RegisterFile;

/// 系统调用号所在寄存器 a0
pub const REG_SYSCALL_NUMBER: usize = 10;
/// 参数所在寄存器 a1
pub const REG_SYSCALL_ARG: usize = 11;

/// 系统调用号
pub mod syscall_num {
    pub const SYS_EXIT: u32 = 0;
    pub const SYS_PUTC: u32 = 1;
}

/// 系统调用上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallContext {
    /// 系统调用号
    pub number: u32,
    /// 参数
    pub arg: u32,
}

impl SyscallContext {
    /// 按 a0 = 调用号、a1 = 参数 的约定读取寄存器
    pub fn from_registers(registers: &RegisterFile) -> Self {
        let regs = registers.as_array();
        Self {
            number: regs[REG_SYSCALL_NUMBER],
            arg: regs[REG_SYSCALL_ARG],
        }
    }
}

/// 系统调用的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallOutcome {
    /// 结束运行，带退出码
    Terminate(i32),
    /// 输出一个字节后继续执行
    Emit(u8),
    UnknownSyscall(u32),
}

/// 处理系统调用
pub fn handle_syscall(ctx: SyscallContext) -> SyscallOutcome {
    match ctx.number {
        syscall_num::SYS_EXIT => SyscallOutcome::Terminate(ctx.arg as i32),
        syscall_num::SYS_PUTC => SyscallOutcome::Emit(ctx.arg as u8),
        number => SyscallOutcome::UnknownSyscall(number),
    }
}

/// 从寄存器堆读取约定并分发
#[inline]
pub fn dispatch(registers: &RegisterFile) -> SyscallOutcome {
    handle_syscall(SyscallContext::from_registers(registers))
}

/// putc 的输出目标，由调用者提供
pub trait OutputSink {
    fn put_byte(&mut self, byte: u8) -> io::Result<()>;
}

impl<W: Write> OutputSink for W {
    #[inline]
    fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers(number: u32, arg: u32) -> RegisterFile {
        let mut regs = RegisterFile::new();
        regs.set(REG_SYSCALL_NUMBER, number).unwrap();
        regs.set(REG_SYSCALL_ARG, arg).unwrap();
        regs
    }

    #[test]
    fn test_exit() {
        assert_eq!(dispatch(&registers(0, 0)), SyscallOutcome::Terminate(0));
        assert_eq!(dispatch(&registers(0, 3)), SyscallOutcome::Terminate(3));
        assert_eq!(dispatch(&registers(0, u32::MAX)), SyscallOutcome::Terminate(-1));
    }

    #[test]
    fn test_putc_takes_low_byte() {
        assert_eq!(dispatch(&registers(1, b'H' as u32)), SyscallOutcome::Emit(b'H'));
        assert_eq!(dispatch(&registers(1, 0x1234_5641)), SyscallOutcome::Emit(b'A'));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(dispatch(&registers(99, 0)), SyscallOutcome::UnknownSyscall(99));
        assert_eq!(dispatch(&registers(93, 0)), SyscallOutcome::UnknownSyscall(93));
    }

    #[test]
    fn test_vec_sink() {
        let mut out: Vec<u8> = Vec::new();
        out.put_byte(b'o').unwrap();
        out.put_byte(b'k').unwrap();
        assert_eq!(out, b"ok");
    }
}
