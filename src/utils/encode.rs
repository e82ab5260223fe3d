//! RV32I 指令编码
//!
//! 访存类函数的参数顺序统一为 `(目的或基址, 源, 偏移)`：
//! `lw(rd, rs1, offset)`、`sw(rs1, rs2, offset)`。
//! 超出编码范围的参数直接 panic，这里只用来拼装测试与演示程序。

const OP_LUI: u32 = 0b0110111;
const OP_AUIPC: u32 = 0b0010111;
const OP_JAL: u32 = 0b1101111;
const OP_JALR: u32 = 0b1100111;
const OP_BRANCH: u32 = 0b1100011;
const OP_LOAD: u32 = 0b0000011;
const OP_STORE: u32 = 0b0100011;
const OP_IMM: u32 = 0b0010011;
const OP: u32 = 0b0110011;
const OP_MISC_MEM: u32 = 0b0001111;
const OP_SYSTEM: u32 = 0b1110011;

const FUNCT7_ALT: u32 = 0b0100000;

#[inline]
fn reg(r: usize) -> u32 {
    assert!(r < 32, "register x{r} out of range");
    r as u32
}

#[inline]
fn imm12(imm: i32) -> u32 {
    assert!((-2048..=2047).contains(&imm), "12-bit immediate {imm} out of range");
    (imm as u32) & 0xfff
}

fn r_type(funct7: u32, rs2: usize, rs1: usize, funct3: u32, rd: usize, opcode: u32) -> u32 {
    (funct7 << 25) | (reg(rs2) << 20) | (reg(rs1) << 15) | (funct3 << 12) | (reg(rd) << 7) | opcode
}

fn i_type(imm: i32, rs1: usize, funct3: u32, rd: usize, opcode: u32) -> u32 {
    (imm12(imm) << 20) | (reg(rs1) << 15) | (funct3 << 12) | (reg(rd) << 7) | opcode
}

fn s_type(imm: i32, rs2: usize, rs1: usize, funct3: u32) -> u32 {
    let imm = imm12(imm);
    ((imm >> 5) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | (funct3 << 12)
        | ((imm & 0x1f) << 7)
        | OP_STORE
}

fn b_type(offset: i32, rs2: usize, rs1: usize, funct3: u32) -> u32 {
    assert!((-4096..=4094).contains(&offset), "branch offset {offset} out of range");
    assert!(offset & 1 == 0, "branch offset {offset} must be even");
    let imm = offset as u32;
    (((imm >> 12) & 1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 1) << 7)
        | OP_BRANCH
}

fn u_type(imm20: u32, rd: usize, opcode: u32) -> u32 {
    assert!(imm20 < (1 << 20), "20-bit immediate {imm20:#x} out of range");
    (imm20 << 12) | (reg(rd) << 7) | opcode
}

fn shift_imm(funct7: u32, shamt: u32, rs1: usize, funct3: u32, rd: usize) -> u32 {
    assert!(shamt < 32, "shift amount {shamt} out of range");
    (funct7 << 25) | (shamt << 20) | (reg(rs1) << 15) | (funct3 << 12) | (reg(rd) << 7) | OP_IMM
}

/// `imm20` 为结果的高20位
pub fn lui(rd: usize, imm20: u32) -> u32 {
    u_type(imm20, rd, OP_LUI)
}

pub fn auipc(rd: usize, imm20: u32) -> u32 {
    u_type(imm20, rd, OP_AUIPC)
}

pub fn jal(rd: usize, offset: i32) -> u32 {
    assert!((-(1 << 20)..(1 << 20)).contains(&offset), "jump offset {offset} out of range");
    assert!(offset & 1 == 0, "jump offset {offset} must be even");
    let imm = offset as u32;
    (((imm >> 20) & 1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | (reg(rd) << 7)
        | OP_JAL
}

pub fn jalr(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b000, rd, OP_JALR)
}

pub fn beq(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b000)
}

pub fn bne(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b001)
}

pub fn blt(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b100)
}

pub fn bge(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b101)
}

pub fn bltu(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b110)
}

pub fn bgeu(rs1: usize, rs2: usize, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b111)
}

pub fn lb(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b000, rd, OP_LOAD)
}

pub fn lh(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b001, rd, OP_LOAD)
}

pub fn lw(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b010, rd, OP_LOAD)
}

pub fn lbu(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b100, rd, OP_LOAD)
}

pub fn lhu(rd: usize, rs1: usize, offset: i32) -> u32 {
    i_type(offset, rs1, 0b101, rd, OP_LOAD)
}

pub fn sb(rs1: usize, rs2: usize, offset: i32) -> u32 {
    s_type(offset, rs2, rs1, 0b000)
}

pub fn sh(rs1: usize, rs2: usize, offset: i32) -> u32 {
    s_type(offset, rs2, rs1, 0b001)
}

pub fn sw(rs1: usize, rs2: usize, offset: i32) -> u32 {
    s_type(offset, rs2, rs1, 0b010)
}

pub fn addi(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b000, rd, OP_IMM)
}

pub fn slti(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b010, rd, OP_IMM)
}

pub fn sltiu(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b011, rd, OP_IMM)
}

pub fn xori(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b100, rd, OP_IMM)
}

pub fn ori(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b110, rd, OP_IMM)
}

pub fn andi(rd: usize, rs1: usize, imm: i32) -> u32 {
    i_type(imm, rs1, 0b111, rd, OP_IMM)
}

pub fn slli(rd: usize, rs1: usize, shamt: u32) -> u32 {
    shift_imm(0, shamt, rs1, 0b001, rd)
}

pub fn srli(rd: usize, rs1: usize, shamt: u32) -> u32 {
    shift_imm(0, shamt, rs1, 0b101, rd)
}

pub fn srai(rd: usize, rs1: usize, shamt: u32) -> u32 {
    shift_imm(FUNCT7_ALT, shamt, rs1, 0b101, rd)
}

pub fn add(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b000, rd, OP)
}

pub fn sub(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(FUNCT7_ALT, rs2, rs1, 0b000, rd, OP)
}

pub fn sll(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b001, rd, OP)
}

pub fn slt(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b010, rd, OP)
}

pub fn sltu(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b011, rd, OP)
}

pub fn xor(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b100, rd, OP)
}

pub fn srl(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b101, rd, OP)
}

pub fn sra(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(FUNCT7_ALT, rs2, rs1, 0b101, rd, OP)
}

pub fn or(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b110, rd, OP)
}

pub fn and(rd: usize, rs1: usize, rs2: usize) -> u32 {
    r_type(0, rs2, rs1, 0b111, rd, OP)
}

/// `fence iorw, iorw`
pub fn fence() -> u32 {
    (0b1111_1111 << 20) | OP_MISC_MEM
}

pub fn ecall() -> u32 {
    OP_SYSTEM
}

/// `addi x0, x0, 0`
pub fn nop() -> u32 {
    addi(0, 0, 0)
}

/// 把指令序列按小端序排成字节流
pub fn assemble(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(addi(1, 0, 42), 0x02a0_0093);
        assert_eq!(add(2, 1, 1), 0x0010_8133);
        assert_eq!(nop(), 0x0000_0013);
        assert_eq!(ecall(), 0x0000_0073);
        assert_eq!(fence(), 0x0ff0_000f);
        assert_eq!(jalr(0, 1, 0), 0x0000_8067);
        // jal x0, 0 即原地死循环
        assert_eq!(jal(0, 0), 0x0000_006f);
        // lui a0, 0x12345
        assert_eq!(lui(10, 0x12345), 0x1234_5537);
        // sw ra, 12(sp)
        assert_eq!(sw(2, 1, 12), 0x0011_2623);
        // lbu a5, 0(a5)
        assert_eq!(lbu(15, 15, 0), 0x0007_c783);
        // bnez a5, -16 即 bne a5, x0, -16
        assert_eq!(bne(15, 0, -16), 0xfe07_98e3);
    }

    #[test]
    fn test_assemble_is_little_endian() {
        assert_eq!(assemble(&[0x0000_0073, 0x0010_8133]), vec![0x73, 0, 0, 0, 0x33, 0x81, 0x10, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_immediate_out_of_range() {
        addi(1, 0, 2048);
    }

    #[test]
    #[should_panic(expected = "must be even")]
    fn test_odd_branch_offset() {
        beq(1, 2, 3);
    }
}
