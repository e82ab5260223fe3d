//! 程序映像加载器，支持 ELF 和平坦二进制

use anyhow::{Context, Result, anyhow, bail};
use object::{Architecture, Object, ObjectSection, SectionKind};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::emulator::ProgramImage;

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// 读取程序映像
///
/// ELF 文件按节展开为一段连续映像，入口取自 ELF 头；
/// 其他文件视为平坦二进制，装载到 `load_address` 并从该地址开始执行。
/// ELF 的节超出 `[0, capacity)` 时直接报错，不会为其分配内存。
pub fn load_image(
    path: impl AsRef<Path>,
    load_address: u32,
    capacity: usize,
) -> Result<ProgramImage> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("无法读取程序文件 '{}'", path.display()))?;

    let image = if data.starts_with(ELF_MAGIC) {
        parse_elf(&data, capacity).with_context(|| format!("无法解析ELF文件 '{}'", path.display()))?
    } else {
        ProgramImage::new(load_address, data, load_address)
    };

    info!(
        path = %path.display(),
        base = %format!("{:#x}", image.base),
        entry = %format!("{:#x}", image.entry),
        size = image.bytes.len(),
        "加载程序映像"
    );
    let head = &image.bytes[..image.bytes.len().min(16)];
    debug!("映像起始字节: {}", hex::encode(head));
    Ok(image)
}

fn parse_elf(data: &[u8], capacity: usize) -> Result<ProgramImage> {
    let elf_file = object::File::parse(data)?;

    // 验证目标架构
    if !matches!(elf_file.architecture(), Architecture::Riscv32) {
        return Err(anyhow!(
            "不支持的目标架构 {:?}, 仅支持RV32",
            elf_file.architecture()
        ));
    }

    // 只装载需要分配内存的节
    let sections: Vec<_> = elf_file
        .sections()
        .filter(|s| {
            matches!(
                s.kind(),
                SectionKind::Text
                    | SectionKind::Data
                    | SectionKind::ReadOnlyData
                    | SectionKind::ReadOnlyString
                    | SectionKind::UninitializedData
            ) && s.size() > 0
        })
        .collect();

    let start = sections
        .iter()
        .map(|s| s.address())
        .min()
        .ok_or_else(|| anyhow!("ELF中没有可装载的节"))?;
    let end = sections
        .iter()
        .map(|s| s.address().saturating_add(s.size()))
        .max()
        .unwrap_or(start);

    if end > capacity as u64 {
        bail!(
            "节的范围 {:#x}..{:#x} 超出内存大小 {:#x}",
            start,
            end,
            capacity
        );
    }
    let base = u32::try_from(start).with_context(|| format!("装载地址 {:#x} 超出32位地址空间", start))?;
    let entry = u32::try_from(elf_file.entry())
        .with_context(|| format!("入口地址 {:#x} 超出32位地址空间", elf_file.entry()))?;

    // 节之间的空隙和 .bss 填0
    let mut bytes = vec![0u8; (end - start) as usize];
    for section in &sections {
        if section.kind() == SectionKind::UninitializedData {
            continue;
        }
        let name = section.name().unwrap_or("<unknown>");
        let data = section
            .data()
            .with_context(|| format!("无法读取节 '{}' 的数据", name))?;
        let offset = (section.address() - start) as usize;
        bytes[offset..offset + data.len()].copy_from_slice(data);
        debug!(
            section = name,
            addr = %format!("{:#x}", section.address()),
            size = data.len(),
            "装载节"
        );
    }

    Ok(ProgramImage::new(base, bytes, entry))
}
