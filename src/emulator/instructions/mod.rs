//! 指令译码

mod insts;
mod rv32i;

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use nohash_hasher::BuildNoHashHasher;
use thiserror::Error;

use crate::utils::bit_utils::{BitSlice, sign_extend_32};
use insts::MASK_OPCODE;

/// 译码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("不支持的指令: {0:#010x}")]
    Unsupported(u32),
}

/// 条件分支的比较方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

/// 访存宽度与符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Byte,
    Half,
    Word,
    ByteUnsigned,
    HalfUnsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Byte,
    Half,
    Word,
}

/// 整数运算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

/// 译码后的指令
///
/// 每种格式一个变体，寄存器编号已经拆出，立即数已经按格式做好符号扩展。
/// 执行器对它做穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `imm` 为已经左移12位的高20位
    Lui { rd: usize, imm: u32 },
    Auipc { rd: usize, imm: u32 },
    Jal { rd: usize, offset: i32 },
    Jalr { rd: usize, rs1: usize, offset: i32 },
    Branch { cond: BranchCond, rs1: usize, rs2: usize, offset: i32 },
    Load { kind: LoadKind, rd: usize, rs1: usize, offset: i32 },
    Store { kind: StoreKind, rs1: usize, rs2: usize, offset: i32 },
    OpImm { op: AluOp, rd: usize, rs1: usize, imm: i32 },
    Op { op: AluOp, rd: usize, rs1: usize, rs2: usize },
    Fence,
    Ecall,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Lui { rd, imm } => write!(f, "lui x{}, {:#x}", rd, imm >> 12),
            Instruction::Auipc { rd, imm } => write!(f, "auipc x{}, {:#x}", rd, imm >> 12),
            Instruction::Jal { rd, offset } => write!(f, "jal x{}, {}", rd, offset),
            Instruction::Jalr { rd, rs1, offset } => write!(f, "jalr x{}, {}(x{})", rd, offset, rs1),
            Instruction::Branch { cond, rs1, rs2, offset } => {
                write!(f, "b{} x{}, x{}, {}", format!("{:?}", cond).to_lowercase(), rs1, rs2, offset)
            }
            Instruction::Load { kind, rd, rs1, offset } => {
                let name = match kind {
                    LoadKind::Byte => "lb",
                    LoadKind::Half => "lh",
                    LoadKind::Word => "lw",
                    LoadKind::ByteUnsigned => "lbu",
                    LoadKind::HalfUnsigned => "lhu",
                };
                write!(f, "{} x{}, {}(x{})", name, rd, offset, rs1)
            }
            Instruction::Store { kind, rs1, rs2, offset } => {
                let name = match kind {
                    StoreKind::Byte => "sb",
                    StoreKind::Half => "sh",
                    StoreKind::Word => "sw",
                };
                write!(f, "{} x{}, {}(x{})", name, rs2, offset, rs1)
            }
            Instruction::OpImm { op: AluOp::Sltu, rd, rs1, imm } => {
                write!(f, "sltiu x{}, x{}, {}", rd, rs1, imm)
            }
            Instruction::OpImm { op, rd, rs1, imm } => {
                write!(f, "{}i x{}, x{}, {}", format!("{:?}", op).to_lowercase(), rd, rs1, imm)
            }
            Instruction::Op { op, rd, rs1, rs2 } => {
                write!(f, "{} x{}, x{}, x{}", format!("{:?}", op).to_lowercase(), rd, rs1, rs2)
            }
            Instruction::Fence => write!(f, "fence"),
            Instruction::Ecall => write!(f, "ecall"),
        }
    }
}

/// 指令匹配模式：`word & mask == identifier` 时由 `build` 构造译码结果
#[derive(Debug, Clone, Copy)]
pub struct InstPattern {
    pub mask: u32,
    pub identifier: u32,
    pub name: &'static str,
    pub build: fn(inst: u32) -> Instruction,
}

/// 按主操作码分桶的译码表
pub struct InstDecoder {
    opcode_map: HashMap<u32, Vec<InstPattern>, BuildNoHashHasher<u32>>,
}

impl InstDecoder {
    pub fn new() -> Self {
        let mut opcode_map: HashMap<u32, Vec<InstPattern>, BuildNoHashHasher<u32>> =
            HashMap::with_hasher(BuildNoHashHasher::default());

        for pattern in rv32i::RV_I {
            let opcode = pattern.identifier & MASK_OPCODE;
            opcode_map.entry(opcode).or_default().push(*pattern);
        }
        InstDecoder { opcode_map }
    }

    /// 查找匹配的指令模式
    #[inline(always)]
    pub fn lookup(&self, inst: u32) -> Option<&InstPattern> {
        self.opcode_map
            .get(&(inst & MASK_OPCODE))
            .and_then(|patterns| patterns.iter().find(|p| inst & p.mask == p.identifier))
    }

    /// 译码一条指令字
    #[inline(always)]
    pub fn decode(&self, inst: u32) -> Result<Instruction, DecodeError> {
        self.lookup(inst)
            .map(|pattern| (pattern.build)(inst))
            .ok_or(DecodeError::Unsupported(inst))
    }
}

impl Default for InstDecoder {
    fn default() -> Self {
        Self::new()
    }
}

static DECODER: LazyLock<InstDecoder> = LazyLock::new(InstDecoder::new);

/// 使用全局只读译码表译码
pub fn decode(inst: u32) -> Result<Instruction, DecodeError> {
    DECODER.decode(inst)
}

/// 指令助记符，不支持的指令返回 None
pub fn mnemonic(inst: u32) -> Option<&'static str> {
    DECODER.lookup(inst).map(|p| p.name)
}

pub(crate) struct FormatR {
    pub rd: usize,
    pub rs1: usize,
    pub rs2: usize,
}

pub(crate) struct FormatI {
    pub rd: usize,
    pub rs1: usize,
    pub imm: i32,
}

pub(crate) struct FormatS {
    pub rs1: usize,
    pub rs2: usize,
    pub imm: i32,
}

pub(crate) struct FormatU {
    pub rd: usize,
    pub imm: u32,
}

pub(crate) struct FormatJ {
    pub rd: usize,
    pub imm: i32,
}

#[inline(always)]
fn rd(inst: u32) -> usize {
    inst.bits(7..12) as usize
}

#[inline(always)]
fn rs1(inst: u32) -> usize {
    inst.bits(15..20) as usize
}

#[inline(always)]
fn rs2(inst: u32) -> usize {
    inst.bits(20..25) as usize
}

#[inline(always)]
pub(crate) fn parse_format_r(inst: u32) -> FormatR {
    FormatR {
        rd: rd(inst),
        rs1: rs1(inst),
        rs2: rs2(inst),
    }
}

#[inline(always)]
pub(crate) fn parse_format_i(inst: u32) -> FormatI {
    FormatI {
        rd: rd(inst),
        rs1: rs1(inst),
        imm: sign_extend_32(inst.bits(20..32), 12) as i32,
    }
}

#[inline(always)]
pub(crate) fn parse_format_s(inst: u32) -> FormatS {
    let imm = (inst.bits(25..32) << 5) | inst.bits(7..12);
    FormatS {
        rs1: rs1(inst),
        rs2: rs2(inst),
        imm: sign_extend_32(imm, 12) as i32,
    }
}

/// B型与S型共用寄存器字段，立即数重新排列
#[inline(always)]
pub(crate) fn parse_format_b(inst: u32) -> FormatS {
    let imm = ((inst.bit(31) as u32) << 12)
        | ((inst.bit(7) as u32) << 11)
        | (inst.bits(25..31) << 5)
        | (inst.bits(8..12) << 1);
    FormatS {
        rs1: rs1(inst),
        rs2: rs2(inst),
        imm: sign_extend_32(imm, 13) as i32,
    }
}

#[inline(always)]
pub(crate) fn parse_format_u(inst: u32) -> FormatU {
    FormatU {
        rd: rd(inst),
        imm: inst & 0xffff_f000,
    }
}

#[inline(always)]
pub(crate) fn parse_format_j(inst: u32) -> FormatJ {
    let imm = ((inst.bit(31) as u32) << 20)
        | (inst.bits(12..20) << 12)
        | ((inst.bit(20) as u32) << 11)
        | (inst.bits(21..31) << 1);
    FormatJ {
        rd: rd(inst),
        imm: sign_extend_32(imm, 21) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encode;

    #[test]
    fn test_decode_addi() {
        // addi x1, x0, 42
        assert_eq!(
            decode(0x02a0_0093),
            Ok(Instruction::OpImm { op: AluOp::Add, rd: 1, rs1: 0, imm: 42 })
        );
        // addi a0, a0, -1
        assert_eq!(
            decode(encode::addi(10, 10, -1)),
            Ok(Instruction::OpImm { op: AluOp::Add, rd: 10, rs1: 10, imm: -1 })
        );
    }

    #[test]
    fn test_decode_ecall_and_fence() {
        assert_eq!(decode(0x0000_0073), Ok(Instruction::Ecall));
        assert_eq!(decode(0x0ff0_000f), Ok(Instruction::Fence));
    }

    #[test]
    fn test_decode_loads_and_stores() {
        assert_eq!(
            decode(encode::lbu(11, 12, 0)),
            Ok(Instruction::Load { kind: LoadKind::ByteUnsigned, rd: 11, rs1: 12, offset: 0 })
        );
        assert_eq!(
            decode(encode::lw(1, 2, -4)),
            Ok(Instruction::Load { kind: LoadKind::Word, rd: 1, rs1: 2, offset: -4 })
        );
        assert_eq!(
            decode(encode::sw(2, 1, -2048)),
            Ok(Instruction::Store { kind: StoreKind::Word, rs1: 2, rs2: 1, offset: -2048 })
        );
        assert_eq!(
            decode(encode::sb(5, 6, 2047)),
            Ok(Instruction::Store { kind: StoreKind::Byte, rs1: 5, rs2: 6, offset: 2047 })
        );
    }

    #[test]
    fn test_decode_branch_and_jump_offsets() {
        assert_eq!(
            decode(encode::beq(11, 0, 20)),
            Ok(Instruction::Branch { cond: BranchCond::Eq, rs1: 11, rs2: 0, offset: 20 })
        );
        assert_eq!(
            decode(encode::bne(1, 2, -4096)),
            Ok(Instruction::Branch { cond: BranchCond::Ne, rs1: 1, rs2: 2, offset: -4096 })
        );
        assert_eq!(
            decode(encode::jal(0, -20)),
            Ok(Instruction::Jal { rd: 0, offset: -20 })
        );
        assert_eq!(
            decode(encode::jal(1, 0x000F_FFFE)),
            Ok(Instruction::Jal { rd: 1, offset: 0x000F_FFFE })
        );
        // jalr x0, 0(ra)，即 ret
        assert_eq!(
            decode(0x0000_8067),
            Ok(Instruction::Jalr { rd: 0, rs1: 1, offset: 0 })
        );
    }

    #[test]
    fn test_decode_upper_immediates() {
        assert_eq!(
            decode(encode::lui(5, 0x12345)),
            Ok(Instruction::Lui { rd: 5, imm: 0x1234_5000 })
        );
        assert_eq!(
            decode(encode::auipc(6, 0xFFFFF)),
            Ok(Instruction::Auipc { rd: 6, imm: 0xFFFF_F000 })
        );
    }

    #[test]
    fn test_decode_shifts_and_register_ops() {
        assert_eq!(
            decode(encode::srai(3, 4, 31)),
            Ok(Instruction::OpImm { op: AluOp::Sra, rd: 3, rs1: 4, imm: 31 })
        );
        assert_eq!(
            decode(encode::srli(3, 4, 7)),
            Ok(Instruction::OpImm { op: AluOp::Srl, rd: 3, rs1: 4, imm: 7 })
        );
        assert_eq!(
            decode(encode::sub(1, 2, 3)),
            Ok(Instruction::Op { op: AluOp::Sub, rd: 1, rs1: 2, rs2: 3 })
        );
        // add x2, x1, x1
        assert_eq!(
            decode(0x0010_8133),
            Ok(Instruction::Op { op: AluOp::Add, rd: 2, rs1: 1, rs2: 1 })
        );
    }

    #[test]
    fn test_unsupported_words() {
        let words = [
            0x0000_0000, // 全零
            0xFFFF_FFFF,
            0x0010_0073, // ebreak
            0x3000_2573, // csrrs a0, mstatus, x0
            0x0220_8533, // mul a0, ra, sp
            0x0000_4501, // c.li a0, 0
            0x0200_1013, // slli 且 shamt[5] = 1，RV32 中非法
            0x0000_3003, // ld，RV64
        ];
        for word in words {
            assert_eq!(decode(word), Err(DecodeError::Unsupported(word)), "{:#010x}", word);
            assert_eq!(decode(word), decode(word));
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let word = encode::addi(10, 0, 1);
        assert_eq!(decode(word), decode(word));
        assert_eq!(InstDecoder::new().decode(word), decode(word));
    }

    #[test]
    fn test_mnemonic_and_display() {
        assert_eq!(mnemonic(encode::ecall()), Some("ecall"));
        assert_eq!(mnemonic(encode::lbu(1, 2, 3)), Some("lbu"));
        assert_eq!(mnemonic(0), None);
        assert_eq!(decode(encode::addi(10, 0, 1)).unwrap().to_string(), "addi x10, x0, 1");
        assert_eq!(decode(encode::bne(1, 2, 8)).unwrap().to_string(), "bne x1, x2, 8");
    }
}
