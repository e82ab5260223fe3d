//! 指令执行模块

use super::exception::Fault;
use super::instructions::{AluOp, BranchCond, Instruction, LoadKind, StoreKind};
use super::memory::Width;
use super::state::State;

/// 单条指令的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// 遇到 ecall，需要交给系统调用分发器
    Trap,
    Fault(Fault),
}

#[inline(always)]
fn is_inst_addr_misaligned(addr: u32) -> bool {
    addr & 0b11 != 0
}

#[inline(always)]
fn alu(op: AluOp, lhs: u32, rhs: u32) -> u32 {
    // 移位量只取低5位
    let shamt = rhs & 0x1f;
    match op {
        AluOp::Add => lhs.wrapping_add(rhs),
        AluOp::Sub => lhs.wrapping_sub(rhs),
        AluOp::Sll => lhs << shamt,
        AluOp::Slt => ((lhs as i32) < (rhs as i32)) as u32,
        AluOp::Sltu => (lhs < rhs) as u32,
        AluOp::Xor => lhs ^ rhs,
        AluOp::Srl => lhs >> shamt,
        AluOp::Sra => ((lhs as i32) >> shamt) as u32,
        AluOp::Or => lhs | rhs,
        AluOp::And => lhs & rhs,
    }
}

#[inline(always)]
fn branch_taken(cond: BranchCond, lhs: u32, rhs: u32) -> bool {
    match cond {
        BranchCond::Eq => lhs == rhs,
        BranchCond::Ne => lhs != rhs,
        BranchCond::Lt => (lhs as i32) < (rhs as i32),
        BranchCond::Ge => (lhs as i32) >= (rhs as i32),
        BranchCond::Ltu => lhs < rhs,
        BranchCond::Geu => lhs >= rhs,
    }
}

#[inline(always)]
fn jump(state: &mut State, target: u32) -> Result<(), Fault> {
    if is_inst_addr_misaligned(target) {
        return Err(Fault::InstructionAddressMisaligned { addr: target });
    }
    state.set_npc(target);
    Ok(())
}

/// 执行一条已译码的指令
///
/// 调用前 npc 必须已经设为 `pc + 4`，跳转类指令会覆盖它。
/// 所有源寄存器都在写目的寄存器之前读出。
pub fn execute(state: &mut State, inst: &Instruction, pc: u32) -> StepOutcome {
    match execute_inner(state, inst, pc) {
        Ok(outcome) => outcome,
        Err(fault) => StepOutcome::Fault(fault),
    }
}

fn execute_inner(state: &mut State, inst: &Instruction, pc: u32) -> Result<StepOutcome, Fault> {
    match *inst {
        Instruction::Lui { rd, imm } => state.set_reg(rd, imm)?,
        Instruction::Auipc { rd, imm } => state.set_reg(rd, pc.wrapping_add(imm))?,
        Instruction::Jal { rd, offset } => {
            let target = pc.wrapping_add_signed(offset);
            jump(state, target)?;
            state.set_reg(rd, pc.wrapping_add(4))?;
        }
        Instruction::Jalr { rd, rs1, offset } => {
            let target = state.get_reg(rs1)?.wrapping_add_signed(offset) & !1u32;
            jump(state, target)?;
            state.set_reg(rd, pc.wrapping_add(4))?;
        }
        Instruction::Branch { cond, rs1, rs2, offset } => {
            let lhs = state.get_reg(rs1)?;
            let rhs = state.get_reg(rs2)?;
            if branch_taken(cond, lhs, rhs) {
                jump(state, pc.wrapping_add_signed(offset))?;
            }
        }
        Instruction::Load { kind, rd, rs1, offset } => {
            let addr = state.get_reg(rs1)?.wrapping_add_signed(offset);
            let (width, signed) = match kind {
                LoadKind::Byte => (Width::Byte, true),
                LoadKind::Half => (Width::Half, true),
                LoadKind::Word => (Width::Word, false),
                LoadKind::ByteUnsigned => (Width::Byte, false),
                LoadKind::HalfUnsigned => (Width::Half, false),
            };
            let value = state.memory.load(addr, width, signed)?;
            state.set_reg(rd, value)?;
        }
        Instruction::Store { kind, rs1, rs2, offset } => {
            let addr = state.get_reg(rs1)?.wrapping_add_signed(offset);
            let value = state.get_reg(rs2)?;
            let width = match kind {
                StoreKind::Byte => Width::Byte,
                StoreKind::Half => Width::Half,
                StoreKind::Word => Width::Word,
            };
            state.memory.store(addr, width, value)?;
        }
        Instruction::OpImm { op, rd, rs1, imm } => {
            let lhs = state.get_reg(rs1)?;
            state.set_reg(rd, alu(op, lhs, imm as u32))?;
        }
        Instruction::Op { op, rd, rs1, rs2 } => {
            let lhs = state.get_reg(rs1)?;
            let rhs = state.get_reg(rs2)?;
            state.set_reg(rd, alu(op, lhs, rhs))?;
        }
        // 单 hart，不需要任何内存序处理
        Instruction::Fence => {}
        Instruction::Ecall => return Ok(StepOutcome::Trap),
    }
    Ok(StepOutcome::Continue)
}
