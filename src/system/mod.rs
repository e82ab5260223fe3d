//! 系统接口模块

mod syscall;

pub use syscall::{
    OutputSink, REG_SYSCALL_ARG, REG_SYSCALL_NUMBER, SyscallContext, SyscallOutcome, dispatch,
    handle_syscall, syscall_num,
};
