//! 指令字段的位切片工具

use std::ops::Range;

/// 32位指令字上的位操作
pub trait BitSlice {
    /// 取第 `pos` 位 (LSB 为 0)
    fn bit(&self, pos: u32) -> bool;

    /// 取 `[start..end)` 范围内的位，结果右对齐
    fn bits(&self, range: Range<u32>) -> u32;
}

impl BitSlice for u32 {
    #[inline(always)]
    fn bit(&self, pos: u32) -> bool {
        assert!(pos < 32, "Bit position out of bounds");
        (self >> pos) & 1 != 0
    }

    #[inline(always)]
    fn bits(&self, range: Range<u32>) -> u32 {
        assert!(range.end <= 32, "Bit range end out of bounds");
        assert!(range.start <= range.end, "Invalid bit range");

        let width = range.end - range.start;
        if width == 0 {
            return 0;
        }
        let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
        (self >> range.start) & mask
    }
}

/// 把低 `num_bits` 位当作有符号数扩展到32位
#[inline(always)]
pub fn sign_extend_32(value: u32, num_bits: u32) -> u32 {
    debug_assert!(num_bits > 0 && num_bits <= 32);
    let shift_amount = 32 - num_bits;
    // 将符号位移到最高位，然后算术右移
    ((value << shift_amount) as i32 >> shift_amount) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit() {
        let x = 0x8000_0001u32;
        assert!(x.bit(0));
        assert!(!x.bit(1));
        assert!(x.bit(31));
    }

    #[test]
    fn test_bits_fields_of_addi() {
        // addi x1, x0, 42
        let inst = 0x02a0_0093u32;
        assert_eq!(inst.bits(0..7), 0x13);
        assert_eq!(inst.bits(7..12), 1);
        assert_eq!(inst.bits(12..15), 0);
        assert_eq!(inst.bits(15..20), 0);
        assert_eq!(inst.bits(20..32), 42);
    }

    #[test]
    fn test_empty_and_full_range() {
        let x = 0x1234_5678u32;
        assert_eq!(x.bits(10..10), 0);
        assert_eq!(x.bits(0..32), x);
    }

    #[test]
    #[should_panic(expected = "Bit position out of bounds")]
    fn test_bit_out_of_bounds() {
        0u32.bit(32);
    }

    #[test]
    #[should_panic(expected = "Bit range end out of bounds")]
    fn test_bits_out_of_bounds() {
        0u32.bits(30..33);
    }

    #[test]
    fn test_sign_extend_32() {
        assert_eq!(sign_extend_32(0x7FF, 12), 0x7FF);
        assert_eq!(sign_extend_32(0x800, 12), 0xFFFF_F800);
        assert_eq!(sign_extend_32(0xFFF, 12), u32::MAX);
        // B型立即数 13 位
        assert_eq!(sign_extend_32(0x1000, 13), 0xFFFF_F000);
        // J型立即数 21 位
        assert_eq!(sign_extend_32(0x0F_FFFE, 21), 0x000F_FFFE);
        assert_eq!(sign_extend_32(0x1F_FFEC, 21), (-20i32) as u32);
        assert_eq!(sign_extend_32(0xDEAD_BEEF, 32), 0xDEAD_BEEF);
    }
}
