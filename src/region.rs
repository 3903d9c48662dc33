//! Page-aligned memory-mapped regions
//!
//! 页对齐的内存映射区域
//!
//! [`MappedRegion`] takes over a mapping that the caller already created (with
//! `mmap` directly or through [`memmap2`]) and offers range operations that
//! snap arbitrary byte ranges to page boundaries before calling into the OS:
//!
//! - [`MappedRegion::incore`]: which pages are resident (`mincore`)
//! - [`MappedRegion::advise`]: page-cache hints (`madvise`)
//! - [`MappedRegion::sync`]: write-back of dirty pages (`msync`)
//! - [`MappedRegion::unmap`]: release the mapping (`munmap`)
//!
//! [`MappedRegion`] 接管调用方已创建的映射（直接调用 `mmap` 或通过 [`memmap2`]），
//! 并提供范围操作，在调用操作系统之前把任意字节范围对齐到页边界：
//!
//! - [`MappedRegion::incore`]：查询哪些页驻留在内存（`mincore`）
//! - [`MappedRegion::advise`]：页缓存提示（`madvise`）
//! - [`MappedRegion::sync`]：回写脏页（`msync`）
//! - [`MappedRegion::unmap`]：释放映射（`munmap`）
//!
//! # Alignment
//!
//! A region's usable range may start `page_offset` bytes into its first page.
//! A request `(offset, length)` is widened as follows before each system call:
//!
//! ```text
//! offset += page_offset
//! length += offset % page_size
//! offset -= offset % page_size
//! ```
//!
//! # 对齐
//!
//! 区域的可用范围可以从首页内 `page_offset` 字节处开始。
//! 每次系统调用之前，请求 `(offset, length)` 会按上述方式扩展。

mod error;
mod flags;
mod mapped_region;
mod page;
mod sys;


// Re-export public API
// 重新导出公共 API
pub use error::{Error, Result};
pub use flags::{Advice, MapFlags, Protection, SyncMode};
pub use mapped_region::MappedRegion;
pub use page::PageSize;
pub use sys::{Capabilities, CAPABILITIES};
