//! 平坦内存

use serde::Deserialize;
use thiserror::Error;

use crate::utils::bit_utils::sign_extend_32;

/// 内存错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("内存访问越界: 地址 {addr:#x}, 大小 {size}")]
    OutOfBounds { addr: u32, size: usize },
    #[error("内存对齐错误: 地址 {addr:#x}, 对齐要求 {alignment}")]
    Misaligned { addr: u32, alignment: usize },
}

/// 非对齐访问策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MisalignedPolicy {
    /// 允许非对齐访问
    #[default]
    Permit,
    /// 非对齐访问产生错误
    Trap,
}

/// 访存宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Half,
    Word,
}

impl Width {
    /// 宽度对应的字节数
    #[inline(always)]
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
        }
    }
}

/// 内存管理结构
#[derive(Debug, Clone)]
pub struct Memory {
    /// 内存数据
    data: Vec<u8>,
    policy: MisalignedPolicy,
}

impl Memory {
    /// 创建新的内存实例，内容全部清零
    pub fn new(size: usize, policy: MisalignedPolicy) -> Self {
        Self {
            data: vec![0; size],
            policy,
        }
    }

    /// 内存容量（字节）
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn policy(&self) -> MisalignedPolicy {
        self.policy
    }

    /// 检查 `[addr, addr + size)` 是否落在内存内，返回起始下标
    #[inline(always)]
    fn check_bounds(&self, addr: u32, size: usize) -> Result<usize, MemoryError> {
        let end = (addr as u64)
            .checked_add(size as u64)
            .ok_or(MemoryError::OutOfBounds { addr, size })?;

        if end > self.data.len() as u64 {
            return Err(MemoryError::OutOfBounds { addr, size });
        }
        Ok(addr as usize)
    }

    #[inline(always)]
    fn check_alignment(&self, addr: u32, width: Width) -> Result<(), MemoryError> {
        let alignment = width.bytes();
        if self.policy == MisalignedPolicy::Trap && addr as usize % alignment != 0 {
            return Err(MemoryError::Misaligned { addr, alignment });
        }
        Ok(())
    }

    /// 写入一段原始字节
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let start = self.check_bounds(addr, data.len())?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 按宽度读取小端数据，`signed` 时做符号扩展
    pub fn load(&self, addr: u32, width: Width, signed: bool) -> Result<u32, MemoryError> {
        self.check_alignment(addr, width)?;
        let size = width.bytes();
        let start = self.check_bounds(addr, size)?;

        let mut raw = [0u8; 4];
        raw[..size].copy_from_slice(&self.data[start..start + size]);
        let value = u32::from_le_bytes(raw);

        Ok(if signed {
            sign_extend_32(value, (size * 8) as u32)
        } else {
            value
        })
    }

    /// 写入 `value` 的低 `width` 个字节
    pub fn store(&mut self, addr: u32, width: Width, value: u32) -> Result<(), MemoryError> {
        self.check_alignment(addr, width)?;
        let size = width.bytes();
        let start = self.check_bounds(addr, size)?;
        self.data[start..start + size].copy_from_slice(&value.to_le_bytes()[..size]);
        Ok(())
    }

    /// 取指，总是4字节
    #[inline(always)]
    pub fn fetch(&self, addr: u32) -> Result<u32, MemoryError> {
        let start = self.check_bounds(addr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[start..start + 4]);
        Ok(u32::from_le_bytes(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_round_trip() {
        let mut mem = Memory::new(256, MisalignedPolicy::Permit);

        for i in 0..256u32 {
            assert_eq!(mem.load(i, Width::Byte, false), Ok(0));
        }
        for i in 0..256u32 {
            mem.store(i, Width::Byte, 255 - i).unwrap();
        }
        for i in 0..256u32 {
            assert_eq!(mem.load(i, Width::Byte, false), Ok(255 - i));
        }
    }

    #[test]
    fn test_store_truncates_and_load_sign_extends() {
        let mut mem = Memory::new(64, MisalignedPolicy::Permit);

        mem.store(0, Width::Byte, 0x1234_5680).unwrap();
        assert_eq!(mem.load(0, Width::Byte, false), Ok(0x80));
        assert_eq!(mem.load(0, Width::Byte, true), Ok(0xFFFF_FF80));

        mem.store(8, Width::Half, 0xABCD_8001).unwrap();
        assert_eq!(mem.load(8, Width::Half, false), Ok(0x8001));
        assert_eq!(mem.load(8, Width::Half, true), Ok(0xFFFF_8001));

        mem.store(16, Width::Word, 0x7FFF_FFFF).unwrap();
        assert_eq!(mem.load(16, Width::Word, true), Ok(0x7FFF_FFFF));
        assert_eq!(mem.load(16, Width::Word, false), Ok(0x7FFF_FFFF));
    }

    #[test]
    fn test_little_endian_layout() {
        let mut mem = Memory::new(16, MisalignedPolicy::Permit);
        mem.store(0, Width::Word, 0xDEAD_BEEF).unwrap();
        for (i, byte) in [0xEF, 0xBE, 0xAD, 0xDE].into_iter().enumerate() {
            assert_eq!(mem.load(i as u32, Width::Byte, false), Ok(byte));
        }
        assert_eq!(mem.fetch(0), Ok(0xDEAD_BEEF));
    }

    #[test]
    fn test_out_of_bounds_leaves_memory_untouched() {
        let mut mem = Memory::new(256, MisalignedPolicy::Permit);
        mem.write(252, &[1, 2, 3, 4]).unwrap();

        assert_eq!(
            mem.store(254, Width::Word, 0xFFFF_FFFF),
            Err(MemoryError::OutOfBounds { addr: 254, size: 4 })
        );
        assert_eq!(mem.fetch(252), Ok(0x0403_0201));

        assert!(matches!(
            mem.load(256, Width::Byte, false),
            Err(MemoryError::OutOfBounds { .. })
        ));
        assert!(matches!(
            mem.load(255, Width::Half, false),
            Err(MemoryError::OutOfBounds { .. })
        ));
        assert!(matches!(mem.fetch(u32::MAX), Err(MemoryError::OutOfBounds { .. })));
        assert!(matches!(
            mem.write(4096, &[0]),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_misaligned_policy() {
        let mut permit = Memory::new(16, MisalignedPolicy::Permit);
        permit.store(1, Width::Word, 0x1122_3344).unwrap();
        assert_eq!(permit.load(1, Width::Word, false), Ok(0x1122_3344));

        let mut trap = Memory::new(16, MisalignedPolicy::Trap);
        assert_eq!(
            trap.store(2, Width::Word, 0),
            Err(MemoryError::Misaligned { addr: 2, alignment: 4 })
        );
        assert_eq!(
            trap.load(3, Width::Half, false),
            Err(MemoryError::Misaligned { addr: 3, alignment: 2 })
        );
        // 字节访问永远对齐
        assert!(trap.store(3, Width::Byte, 7).is_ok());
    }
}
