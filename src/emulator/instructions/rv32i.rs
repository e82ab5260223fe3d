use super::insts::*;
use super::*;

macro_rules! branch {
    ($mask:expr, $identifier:expr, $name:literal, $cond:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let b = parse_format_b(inst);
                Instruction::Branch { cond: $cond, rs1: b.rs1, rs2: b.rs2, offset: b.imm }
            },
        }
    };
}

macro_rules! load {
    ($mask:expr, $identifier:expr, $name:literal, $kind:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let i = parse_format_i(inst);
                Instruction::Load { kind: $kind, rd: i.rd, rs1: i.rs1, offset: i.imm }
            },
        }
    };
}

macro_rules! store {
    ($mask:expr, $identifier:expr, $name:literal, $kind:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let s = parse_format_s(inst);
                Instruction::Store { kind: $kind, rs1: s.rs1, rs2: s.rs2, offset: s.imm }
            },
        }
    };
}

macro_rules! op_imm {
    ($mask:expr, $identifier:expr, $name:literal, $op:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let i = parse_format_i(inst);
                Instruction::OpImm { op: $op, rd: i.rd, rs1: i.rs1, imm: i.imm }
            },
        }
    };
}

// 移位立即数只取 shamt，funct7 已经由 mask 校验
macro_rules! shift_imm {
    ($mask:expr, $identifier:expr, $name:literal, $op:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let i = parse_format_i(inst);
                Instruction::OpImm { op: $op, rd: i.rd, rs1: i.rs1, imm: i.imm & 0x1f }
            },
        }
    };
}

macro_rules! op {
    ($mask:expr, $identifier:expr, $name:literal, $op:expr) => {
        InstPattern {
            mask: $mask,
            identifier: $identifier,
            name: $name,
            build: |inst: u32| {
                let r = parse_format_r(inst);
                Instruction::Op { op: $op, rd: r.rd, rs1: r.rs1, rs2: r.rs2 }
            },
        }
    };
}

pub const RV_I: &[InstPattern] = &[
    InstPattern {
        mask: MASK_LUI,
        identifier: MATCH_LUI,
        name: "lui",
        build: |inst: u32| {
            let u = parse_format_u(inst);
            Instruction::Lui { rd: u.rd, imm: u.imm }
        },
    },
    InstPattern {
        mask: MASK_AUIPC,
        identifier: MATCH_AUIPC,
        name: "auipc",
        build: |inst: u32| {
            let u = parse_format_u(inst);
            Instruction::Auipc { rd: u.rd, imm: u.imm }
        },
    },
    InstPattern {
        mask: MASK_JAL,
        identifier: MATCH_JAL,
        name: "jal",
        build: |inst: u32| {
            let j = parse_format_j(inst);
            Instruction::Jal { rd: j.rd, offset: j.imm }
        },
    },
    InstPattern {
        mask: MASK_JALR,
        identifier: MATCH_JALR,
        name: "jalr",
        build: |inst: u32| {
            let i = parse_format_i(inst);
            Instruction::Jalr { rd: i.rd, rs1: i.rs1, offset: i.imm }
        },
    },
    branch!(MASK_BEQ, MATCH_BEQ, "beq", BranchCond::Eq),
    branch!(MASK_BNE, MATCH_BNE, "bne", BranchCond::Ne),
    branch!(MASK_BLT, MATCH_BLT, "blt", BranchCond::Lt),
    branch!(MASK_BGE, MATCH_BGE, "bge", BranchCond::Ge),
    branch!(MASK_BLTU, MATCH_BLTU, "bltu", BranchCond::Ltu),
    branch!(MASK_BGEU, MATCH_BGEU, "bgeu", BranchCond::Geu),
    load!(MASK_LB, MATCH_LB, "lb", LoadKind::Byte),
    load!(MASK_LH, MATCH_LH, "lh", LoadKind::Half),
    load!(MASK_LW, MATCH_LW, "lw", LoadKind::Word),
    load!(MASK_LBU, MATCH_LBU, "lbu", LoadKind::ByteUnsigned),
    load!(MASK_LHU, MATCH_LHU, "lhu", LoadKind::HalfUnsigned),
    store!(MASK_SB, MATCH_SB, "sb", StoreKind::Byte),
    store!(MASK_SH, MATCH_SH, "sh", StoreKind::Half),
    store!(MASK_SW, MATCH_SW, "sw", StoreKind::Word),
    op_imm!(MASK_ADDI, MATCH_ADDI, "addi", AluOp::Add),
    op_imm!(MASK_SLTI, MATCH_SLTI, "slti", AluOp::Slt),
    op_imm!(MASK_SLTIU, MATCH_SLTIU, "sltiu", AluOp::Sltu),
    op_imm!(MASK_XORI, MATCH_XORI, "xori", AluOp::Xor),
    op_imm!(MASK_ORI, MATCH_ORI, "ori", AluOp::Or),
    op_imm!(MASK_ANDI, MATCH_ANDI, "andi", AluOp::And),
    shift_imm!(MASK_SLLI, MATCH_SLLI, "slli", AluOp::Sll),
    shift_imm!(MASK_SRLI, MATCH_SRLI, "srli", AluOp::Srl),
    shift_imm!(MASK_SRAI, MATCH_SRAI, "srai", AluOp::Sra),
    op!(MASK_ADD, MATCH_ADD, "add", AluOp::Add),
    op!(MASK_SUB, MATCH_SUB, "sub", AluOp::Sub),
    op!(MASK_SLL, MATCH_SLL, "sll", AluOp::Sll),
    op!(MASK_SLT, MATCH_SLT, "slt", AluOp::Slt),
    op!(MASK_SLTU, MATCH_SLTU, "sltu", AluOp::Sltu),
    op!(MASK_XOR, MATCH_XOR, "xor", AluOp::Xor),
    op!(MASK_SRL, MATCH_SRL, "srl", AluOp::Srl),
    op!(MASK_SRA, MATCH_SRA, "sra", AluOp::Sra),
    op!(MASK_OR, MATCH_OR, "or", AluOp::Or),
    op!(MASK_AND, MATCH_AND, "and", AluOp::And),
    InstPattern {
        mask: MASK_FENCE,
        identifier: MATCH_FENCE,
        name: "fence",
        build: |_inst: u32| Instruction::Fence,
    },
    InstPattern {
        mask: MASK_ECALL,
        identifier: MATCH_ECALL,
        name: "ecall",
        build: |_inst: u32| Instruction::Ecall,
    },
];
