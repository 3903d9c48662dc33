//! Protection, sharing, advice and flush flag types
//!
//! 保护、共享、建议与刷盘标志类型

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Access permissions a mapping was created with
    ///
    /// 映射创建时的访问权限
    ///
    /// Values are the platform's `PROT_*` bits, so a collaborator that called
    /// `mmap` itself can hand its flags over with [`Protection::from_bits_retain`].
    ///
    /// 取值即平台的 `PROT_*` 位，自行调用 `mmap` 的调用方可以通过
    /// [`Protection::from_bits_retain`] 直接传入其标志。
    ///
    /// # Examples
    ///
    /// ```
    /// use mapped_region::Protection;
    ///
    /// let prot = Protection::READ | Protection::WRITE;
    /// assert!(prot.contains(Protection::READ));
    /// assert!(!prot.contains(Protection::EXEC));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Protection: libc::c_int {
        /// Pages may not be accessed
        ///
        /// 页不可访问
        const NONE = libc::PROT_NONE;

        /// Pages may be read
        ///
        /// 页可读
        const READ = libc::PROT_READ;

        /// Pages may be written
        ///
        /// 页可写
        const WRITE = libc::PROT_WRITE;

        /// Pages may be executed
        ///
        /// 页可执行
        const EXEC = libc::PROT_EXEC;
    }
}

impl fmt::Debug for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(Self::READ) { 'r' } else { '-' };
        let w = if self.contains(Self::WRITE) { 'w' } else { '-' };
        let x = if self.contains(Self::EXEC) { 'x' } else { '-' };
        write!(f, "Protection({r}{w}{x})")
    }
}

bitflags! {
    /// Sharing semantics of a mapping
    ///
    /// 映射的共享语义
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MapFlags: libc::c_int {
        /// Writes are carried through to the backing file
        ///
        /// 写入会反映到底层文件
        const SHARED = libc::MAP_SHARED;

        /// Private copy-on-write mapping
        ///
        /// 私有写时复制映射
        const PRIVATE = libc::MAP_PRIVATE;
    }
}

/// Page-cache advice for a range
///
/// 针对某一范围的页缓存建议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Advice {
    /// No particular access pattern
    ///
    /// 无特定访问模式
    Normal,

    /// Expect random access
    ///
    /// 预期随机访问
    Random,

    /// Expect sequential access
    ///
    /// 预期顺序访问
    Sequential,

    /// The range will be needed soon
    ///
    /// 该范围即将被访问
    WillNeed,

    /// The range will not be needed soon
    ///
    /// 该范围近期不会被访问
    DontNeed,
}

impl Advice {
    /// Platform `MADV_*` value
    ///
    /// 平台的 `MADV_*` 值
    #[inline]
    pub const fn to_raw(self) -> libc::c_int {
        match self {
            Advice::Normal => libc::MADV_NORMAL,
            Advice::Random => libc::MADV_RANDOM,
            Advice::Sequential => libc::MADV_SEQUENTIAL,
            Advice::WillNeed => libc::MADV_WILLNEED,
            Advice::DontNeed => libc::MADV_DONTNEED,
        }
    }
}

bitflags! {
    /// Flush mode for [`MappedRegion::sync`](super::MappedRegion::sync)
    ///
    /// [`MappedRegion::sync`](super::MappedRegion::sync) 的刷盘模式
    ///
    /// Modes combine with `|`, e.g. `SyncMode::SYNC | SyncMode::INVALIDATE`.
    ///
    /// 模式可以用 `|` 组合，例如 `SyncMode::SYNC | SyncMode::INVALIDATE`。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SyncMode: libc::c_int {
        /// Block until the write-back completes
        ///
        /// 阻塞直到回写完成
        const SYNC = libc::MS_SYNC;

        /// Schedule the write-back and return
        ///
        /// 调度回写后立即返回
        const ASYNC = libc::MS_ASYNC;

        /// Invalidate other cached copies of the pages
        ///
        /// 使页的其他缓存副本失效
        const INVALIDATE = libc::MS_INVALIDATE;
    }
}
