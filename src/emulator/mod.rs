//! 解释器核心模块

mod exception;
mod execute;
pub mod instructions;
mod memory;
pub mod state;
mod tracer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, trace, warn};

use crate::const_values::EmuConfig;
use crate::system::{self, OutputSink, SyscallOutcome};

pub use exception::{ExecutionResult, Fault, FaultReport};
pub use execute::{StepOutcome, execute};
pub use instructions::{DecodeError, Instruction, decode};
pub use memory::{Memory, MemoryError, MisalignedPolicy, Width};
pub use state::{ExecState, RegisterFile, State, StateError};
pub use tracer::TraceEntry;

/// 栈指针 sp
const REG_SP: usize = 2;

/// 待装载的程序映像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    /// 装载基址
    pub base: u32,
    pub bytes: Vec<u8>,
    /// 入口地址，即 PC 初值
    pub entry: u32,
}

impl ProgramImage {
    pub fn new(base: u32, bytes: Vec<u8>, entry: u32) -> Self {
        Self { base, bytes, entry }
    }
}

/// 外部停止标志，每步执行前检查一次
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// 解释器
///
/// 每次装载都会重建内存和寄存器堆，不同实例之间没有共享状态。
pub struct Emulator<S: OutputSink> {
    state: State,
    exec_state: ExecState,
    config: EmuConfig,
    sink: S,
    steps: u64,
    tracer: tracer::ITracer,
    stop: StopHandle,
}

impl<S: OutputSink> Emulator<S> {
    /// 创建解释器并装载程序，成功后处于 Ready 状态
    pub fn new(config: EmuConfig, image: &ProgramImage, sink: S) -> Result<Self, StateError> {
        let state = Self::fresh_state(&config, image)?;
        let tracer = tracer::ITracer::new(config.debug.trace_history);
        Ok(Self {
            state,
            exec_state: ExecState::Ready,
            config,
            sink,
            steps: 0,
            tracer,
            stop: StopHandle::default(),
        })
    }

    fn fresh_state(config: &EmuConfig, image: &ProgramImage) -> Result<State, StateError> {
        let mut memory = Memory::new(config.memory.size, config.memory.misaligned);
        memory.write(image.base, &image.bytes)?;

        let mut state = State::new(memory, image.entry);
        if let Some(sp) = config.exec.stack_pointer {
            state.registers.set(REG_SP, sp)?;
        }
        debug!(
            base = image.base,
            size = image.bytes.len(),
            entry = image.entry,
            "装载程序映像"
        );
        Ok(state)
    }

    /// 重新装载程序，丢弃之前的全部状态
    pub fn load(&mut self, image: &ProgramImage) -> Result<(), StateError> {
        self.state = Self::fresh_state(&self.config, image)?;
        self.exec_state = ExecState::Ready;
        self.steps = 0;
        self.tracer.clear();
        self.stop.reset();
        Ok(())
    }

    /// 执行一条指令
    ///
    /// 已经处于终止状态时不做任何事，直接返回当前状态。
    pub fn step(&mut self) -> ExecState {
        if self.exec_state.is_terminal() {
            return self.exec_state.clone();
        }
        self.exec_state = ExecState::Running;

        match self.step_internal() {
            Ok(None) => {}
            Ok(Some(status)) => {
                info!(status, steps = self.steps, "程序正常退出");
                self.exec_state = ExecState::Halted(status);
            }
            Err(report) => {
                self.log_fault(&report);
                self.exec_state = ExecState::Faulted(report);
            }
        }
        self.exec_state.clone()
    }

    /// 最多执行 n 条指令
    pub fn steps(&mut self, n: usize) -> ExecState {
        for _ in 0..n {
            if self.step().is_terminal() {
                break;
            }
        }
        self.exec_state.clone()
    }

    /// 运行直到程序退出或出错
    pub fn run(&mut self) -> ExecutionResult {
        loop {
            match self.step() {
                ExecState::Halted(status) => return ExecutionResult::Halted(status),
                ExecState::Faulted(report) => return ExecutionResult::Faulted(report),
                ExecState::Ready | ExecState::Running => {}
            }
        }
    }

    /// 返回 Ok(Some(status)) 表示程序退出
    #[inline(always)]
    fn step_internal(&mut self) -> Result<Option<i32>, FaultReport> {
        let pc = self.state.get_pc();
        let fault_at = |fault: Fault, instruction: Option<u32>| FaultReport {
            fault,
            pc,
            instruction,
        };

        if self.stop.is_stopped() {
            return Err(fault_at(Fault::Cancelled, None));
        }
        if let Some(limit) = self.config.exec.max_steps {
            if self.steps >= limit {
                return Err(fault_at(Fault::StepLimitExceeded { limit }, None));
            }
        }
        // 只有入口地址本身未对齐时才会走到这里，跳转目标在执行时已经检查
        if pc & 0b11 != 0 {
            return Err(fault_at(Fault::InstructionAddressMisaligned { addr: pc }, None));
        }

        let word = self
            .state
            .fetch_instruction(pc)
            .map_err(|e| fault_at(e.into(), None))?;
        self.tracer.trace(pc, word);

        let inst = decode(word).map_err(|e| fault_at(e.into(), Some(word)))?;
        trace!("{:#010x}: {:08x}  {}", pc, word, inst);

        self.steps += 1;
        self.state.set_npc(pc.wrapping_add(4));

        match execute(&mut self.state, &inst, pc) {
            StepOutcome::Continue => {}
            StepOutcome::Trap => match system::dispatch(&self.state.registers) {
                SyscallOutcome::Terminate(status) => {
                    self.state.sync_pc();
                    return Ok(Some(status));
                }
                SyscallOutcome::Emit(byte) => {
                    debug!(byte, "putc");
                    self.sink
                        .put_byte(byte)
                        .map_err(|e| fault_at(Fault::Sink(e.to_string()), Some(word)))?;
                }
                SyscallOutcome::UnknownSyscall(number) => {
                    return Err(fault_at(Fault::UnknownSyscall(number), Some(word)));
                }
            },
            StepOutcome::Fault(fault) => return Err(fault_at(fault, Some(word))),
        }

        self.state.sync_pc();
        Ok(None)
    }

    fn log_fault(&self, report: &FaultReport) {
        warn!(steps = self.steps, "运行出错: {}", report);
        if !self.tracer.entries().is_empty() {
            error!("最近执行的指令:\n{}", self.tracer.get_instructions_log());
        }
        debug!("CPU状态:\n{}", self.state);
    }

    #[inline(always)]
    pub fn get_state_ref(&self) -> &State {
        &self.state
    }

    #[inline(always)]
    pub fn get_exec_state(&self) -> &ExecState {
        &self.exec_state
    }

    /// 已执行的指令数
    #[inline(always)]
    pub fn steps_executed(&self) -> u64 {
        self.steps
    }

    #[inline(always)]
    pub fn get_pc(&self) -> u32 {
        self.state.get_pc()
    }

    #[inline(always)]
    pub fn get_reg(&self, reg: usize) -> Result<u32, StateError> {
        self.state.get_reg(reg)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// 最近执行过的指令，从旧到新
    pub fn recent_instructions(&self) -> Vec<TraceEntry> {
        self.tracer.entries()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// 使用默认配置装载并运行程序
///
/// `image` 装载到地址0，从 `entry` 开始执行，putc 的输出写入 `sink`。
pub fn load_and_run<S: OutputSink>(image: &[u8], entry: u32, sink: S) -> ExecutionResult {
    load_and_run_with(&EmuConfig::default(), image, entry, sink)
}

/// 使用给定配置装载并运行程序，映像装载到 `config.memory.load_address`
pub fn load_and_run_with<S: OutputSink>(
    config: &EmuConfig,
    image: &[u8],
    entry: u32,
    sink: S,
) -> ExecutionResult {
    let image = ProgramImage::new(config.memory.load_address, image.to_vec(), entry);
    match Emulator::new(config.clone(), &image, sink) {
        Ok(mut emu) => emu.run(),
        Err(e) => {
            warn!("程序映像无法装入内存: {}", e);
            ExecutionResult::Faulted(FaultReport {
                fault: e.into(),
                pc: entry,
                instruction: None,
            })
        }
    }
}
