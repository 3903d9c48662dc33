//! Page-aligned memory-mapped regions
//!
//! 页对齐的内存映射区域
//!
//! This library wraps one file-backed memory mapping and exposes residency
//! queries, page-cache advice and flushing on arbitrary byte ranges, snapping
//! every range to page boundaries before it reaches the OS.
//!
//! 本库封装一个文件支持的内存映射，在任意字节范围上提供驻留查询、
//! 页缓存建议和刷盘操作，并在交给操作系统之前把每个范围对齐到页边界。
//!
//! # Features
//!
//! - **Owned mappings**: [`MappedRegion`] unmaps exactly once, on
//!   [`MappedRegion::unmap`] or on drop
//! - **Strict contracts**: misuse panics instead of silently doing nothing
//! - **Separate failure channels**: panics, [`Result`] and `bool` never mix
//! - **Build-time capabilities**: `mincore` and `madvise` can be compiled out
//!
//! # 特性
//!
//! - **持有映射**：[`MappedRegion`] 只解除映射一次，在 [`MappedRegion::unmap`] 或 drop 时
//! - **严格契约**：误用会 panic，而不是静默无操作
//! - **独立的失败通道**：panic、[`Result`] 与 `bool` 互不混用
//! - **编译期能力**：`mincore` 和 `madvise` 可以在编译期关闭
//!
//! # Quick Start
//!
//! ```
//! use mapped_region::{Advice, MappedRegion, Result, SyncMode};
//! use memmap2::MmapOptions;
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("piece.bin");
//! let file = std::fs::OpenOptions::new()
//!     .read(true)
//!     .write(true)
//!     .create(true)
//!     .truncate(true)
//!     .open(&path)?;
//! file.set_len(1 << 20)?;
//!
//! // The caller maps, the region owns
//! // 调用方负责映射，区域负责持有
//! let region = MappedRegion::from_mmap_raw(MmapOptions::new().map_raw(&file)?);
//!
//! region.advise(0, region.size(), Advice::WillNeed);
//!
//! let mut resident = vec![0u8; region.pages_touched(0, 4096)];
//! let pages = region.incore(0, 4096, &mut resident)?;
//! assert_eq!(pages, resident.len());
//!
//! assert!(region.sync(0, region.size(), SyncMode::ASYNC));
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`MappedRegion`]: Owned handle over one mapping
//! - [`PageSize`]: Process-wide page size
//! - [`Protection`], [`MapFlags`]: How the mapping was created
//! - [`Advice`], [`SyncMode`]: Arguments of `advise` and `sync`
//! - [`CAPABILITIES`]: OS facilities compiled into this build
//!
//! # 主要类型
//!
//! - [`MappedRegion`]：单个映射的持有句柄
//! - [`PageSize`]：进程级页大小
//! - [`Protection`]、[`MapFlags`]：映射的创建方式
//! - [`Advice`]、[`SyncMode`]：`advise` 与 `sync` 的参数
//! - [`CAPABILITIES`]：本次构建启用的操作系统能力

#[cfg(not(unix))]
compile_error!("mapped-region requires a Unix platform / mapped-region 需要 Unix 平台");

mod region;

pub use region::{
    Advice, CAPABILITIES, Capabilities, Error, MapFlags, MappedRegion, PageSize, Protection,
    Result, SyncMode,
};
