//! Page-aligned handle over one memory mapping
//!
//! 单个内存映射的页对齐句柄

use super::error::{Error, Result};
use super::flags::{Advice, MapFlags, Protection, SyncMode};
use super::page::{align_pair, pages_touched, PageSize};
use super::sys;
use log::{debug, error, trace, warn};
use memmap2::MmapRaw;
use std::mem::{self, ManuallyDrop};
use std::ptr::NonNull;

/// Memory-mapped region with page-aligned operations
///
/// 支持页对齐操作的内存映射区域
///
/// Owns one mapping `[base, end)` created by the caller and exposes the usable
/// part `[begin, end)`. All offsets taken by the methods are relative to
/// `begin`; before a system call the requested range is widened to whole
/// pages.
///
/// 持有调用方创建的一个映射 `[base, end)`，对外暴露其中可用的部分
/// `[begin, end)`。所有方法的偏移都相对于 `begin`；在发起系统调用之前，
/// 请求范围会被扩展到整页。
///
/// # Failure channels
///
/// - **Panic**: contract violations. Calling anything but the accessors on an
///   unmapped region, out-of-range input, a failing `munmap`, or `madvise`
///   rejecting the request as malformed.
/// - **[`Result`]**: [`incore`](Self::incore) failures that may be transient.
/// - **`bool`**: [`advise`](Self::advise) and [`sync`](Self::sync) report a
///   declined request as `false`.
///
/// # 失败通道
///
/// - **Panic**：契约违规。在已解除映射的区域上调用访问器以外的方法、
///   越界输入、`munmap` 失败，或 `madvise` 认为请求非法。
/// - **[`Result`]**：可能是暂时性的 [`incore`](Self::incore) 失败。
/// - **`bool`**：[`advise`](Self::advise) 和 [`sync`](Self::sync) 用 `false`
///   报告被拒绝的请求。
///
/// # Lifecycle
///
/// `Valid → unmap() → Invalid`. Dropping a valid region unmaps it.
///
/// # 生命周期
///
/// `Valid → unmap() → Invalid`。丢弃一个有效区域会解除其映射。
///
/// # Examples
///
/// ```
/// use mapped_region::{Advice, MappedRegion, Result, SyncMode};
/// use memmap2::MmapOptions;
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("region.bin");
/// let file = std::fs::OpenOptions::new()
///     .read(true)
///     .write(true)
///     .create(true)
///     .truncate(true)
///     .open(&path)?;
/// file.set_len(64 * 1024)?;
///
/// let mut region = MappedRegion::from_mmap_raw(MmapOptions::new().map_raw(&file)?);
///
/// unsafe { region.write_at(0, b"hello") };
/// assert!(region.sync(0, 5, SyncMode::SYNC));
///
/// region.advise(0, region.size(), Advice::Sequential);
///
/// let mut resident = vec![0u8; region.pages_touched(0, region.size())];
/// region.incore(0, region.size(), &mut resident)?;
///
/// region.unmap();
/// assert!(!region.is_valid());
/// # Ok(())
/// # }
/// ```
pub struct MappedRegion {
    state: State,
    protection: Protection,
    flags: MapFlags,
    page_size: PageSize,
}

enum State {
    Valid(Extent),
    Invalid,
}

#[derive(Clone, Copy)]
struct Extent {
    /// Page-aligned start of the mapping
    base: NonNull<u8>,
    /// `begin - base`
    page_offset: usize,
    /// `end - begin`
    size: usize,
}

impl Extent {
    #[inline]
    fn mapped_len(self) -> usize {
        self.page_offset + self.size
    }
}

impl MappedRegion {
    /// Take ownership of a mapping created by the caller
    ///
    /// 接管调用方创建的映射
    ///
    /// `base` is the address returned by `mmap`; `[begin, end)` is the part of
    /// the mapping callers may address. `begin - base` becomes the region's
    /// page offset.
    ///
    /// `base` 是 `mmap` 返回的地址；`[begin, end)` 是调用方可以访问的部分。
    /// `begin - base` 即区域的页内偏移。
    ///
    /// # Panics
    ///
    /// - `base` is null
    /// - `begin < base` or `end < begin`
    /// - `begin - base >= page_size`
    /// - `base` is not a multiple of `page_size`
    ///
    /// # Safety
    ///
    /// `[base, end)` must be a live mapping created with `protection` and
    /// `flags`, and nothing else may unmap it. The region unmaps it on
    /// [`unmap`](Self::unmap) or drop.
    ///
    /// `[base, end)` 必须是以 `protection` 和 `flags` 创建的有效映射，
    /// 且不得被其他代码解除映射。区域会在 [`unmap`](Self::unmap) 或 drop
/// 时解除映射。
    pub unsafe fn from_raw_parts(
        base: *mut u8,
        begin: *mut u8,
        end: *mut u8,
        protection: Protection,
        flags: MapFlags,
        page_size: PageSize,
    ) -> Self {
        let Some(base) = NonNull::new(base) else {
            panic!("MappedRegion received a null base address");
        };

        let base_addr = base.as_ptr() as usize;
        let (begin_addr, end_addr) = (begin as usize, end as usize);
        assert!(
            base_addr <= begin_addr && begin_addr <= end_addr,
            "MappedRegion received inverted bounds: \
             base {base_addr:#x}, begin {begin_addr:#x}, end {end_addr:#x}"
        );

        let page_offset = begin_addr - base_addr;
        assert!(
            page_offset < page_size.get(),
            "MappedRegion received a page offset {page_offset} >= page size {}",
            page_size.get()
        );
        assert!(
            page_size.is_aligned(base_addr),
            "MappedRegion base address {base_addr:#x} is not aligned to a page"
        );

        let extent = Extent {
            base,
            page_offset,
            size: end_addr - begin_addr,
        };
        debug!(
            "mapped region at {:#x}: page offset {}, size {}, {:?}",
            base_addr, extent.page_offset, extent.size, protection
        );

        Self {
            state: State::Valid(extent),
            protection,
            flags,
            page_size,
        }
    }

    /// Take ownership of a read-write memmap2 mapping
    ///
    /// 接管 memmap2 的读写映射
    ///
    /// For mappings created with [`MmapOptions::map_raw`](memmap2::MmapOptions::map_raw);
    /// the region records `READ | WRITE`. Use
    /// [`from_mmap_raw_read_only`](Self::from_mmap_raw_read_only) for
    /// `map_raw_read_only` mappings.
    ///
    /// 适用于 [`MmapOptions::map_raw`](memmap2::MmapOptions::map_raw) 创建的映射，
    /// 区域记录为 `READ | WRITE`。`map_raw_read_only` 创建的映射请使用
    /// [`from_mmap_raw_read_only`](Self::from_mmap_raw_read_only)。
    ///
    /// The usable range is exactly the bytes `raw` exposes; when `raw` was
    /// created at a file offset that is not page-aligned, the leading part of
    /// its first page becomes the page offset. `raw`'s destructor never runs.
    ///
    /// 可用范围正好是 `raw` 暴露的字节；若 `raw` 创建时的文件偏移不是页对齐的，
    /// 其首页前部即成为页内偏移。`raw` 的析构函数不会运行。
    ///
    /// # Panics
    ///
    /// Panics if `raw` is empty.
    ///
    /// 如果 `raw` 为空则 panic。
    pub fn from_mmap_raw(raw: MmapRaw) -> Self {
        Self::adopt_mmap_raw(raw, Protection::READ | Protection::WRITE)
    }

    /// Take ownership of a read-only memmap2 mapping
    ///
    /// 接管 memmap2 的只读映射
    ///
    /// For mappings created with
    /// [`MmapOptions::map_raw_read_only`](memmap2::MmapOptions::map_raw_read_only);
    /// the region records `READ`, so [`write_at`](Self::write_at) is rejected.
    ///
    /// 适用于
    /// [`MmapOptions::map_raw_read_only`](memmap2::MmapOptions::map_raw_read_only)
    /// 创建的映射，区域记录为 `READ`，因此 [`write_at`](Self::write_at) 会被拒绝。
    ///
    /// # Panics
    ///
    /// Panics if `raw` is empty.
    ///
    /// 如果 `raw` 为空则 panic。
    pub fn from_mmap_raw_read_only(raw: MmapRaw) -> Self {
        Self::adopt_mmap_raw(raw, Protection::READ)
    }

    fn adopt_mmap_raw(raw: MmapRaw, protection: Protection) -> Self {
        assert!(raw.len() > 0, "MappedRegion cannot take over an empty mapping");

        let page_size = PageSize::system();
        let raw = ManuallyDrop::new(raw);
        let begin = raw.as_mut_ptr();
        let base = page_size.align_down(begin as usize);

        // Safety: memmap2 mapped [base, begin + len) shared with `protection`,
        // and ManuallyDrop keeps it from unmapping that range again
        // Safety: memmap2 以 `protection` 共享映射了 [base, begin + len)，
        // ManuallyDrop 保证它不会再次解除映射
        unsafe {
            Self::from_raw_parts(
                begin.wrapping_sub(begin as usize - base),
                begin,
                begin.add(raw.len()),
                protection,
                MapFlags::SHARED,
                page_size,
            )
        }
    }

    /// Whether the region still refers to a live mapping
    ///
    /// 区域是否仍指向有效映射
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self.state, State::Valid(_))
    }

    /// Whether `[offset, offset + length)` lies inside `[0, size)`
    ///
    /// `[offset, offset + length)` 是否位于 `[0, size)` 之内
    ///
    /// Always `false` once the region is unmapped.
    ///
    /// 区域解除映射后始终为 `false`。
    #[inline]
    pub fn is_valid_range(&self, offset: usize, length: usize) -> bool {
        match self.state {
            State::Valid(extent) => offset
                .checked_add(length)
                .is_some_and(|end| end <= extent.size),
            State::Invalid => false,
        }
    }

    /// Usable size `end - begin`, `0` once unmapped
    ///
    /// 可用大小 `end - begin`，解除映射后为 `0`
    #[inline]
    pub fn size(&self) -> usize {
        match self.state {
            State::Valid(extent) => extent.size,
            State::Invalid => 0,
        }
    }

    /// Distance from the mapping base to `begin`
    ///
    /// 映射基址到 `begin` 的距离
    #[inline]
    pub fn page_offset(&self) -> usize {
        match self.state {
            State::Valid(extent) => extent.page_offset,
            State::Invalid => 0,
        }
    }

    /// Page size the region was checked against
    ///
    /// 区域构造时校验所用的页大小
    #[inline]
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Access permissions the mapping was created with
    ///
    /// 映射创建时的访问权限
    #[inline]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Sharing semantics the mapping was created with
    ///
    /// 映射创建时的共享语义
    #[inline]
    pub fn flags(&self) -> MapFlags {
        self.flags
    }

    /// Whether the mapping allows reads
    ///
    /// 映射是否可读
    #[inline]
    pub fn is_readable(&self) -> bool {
        self.protection.contains(Protection::READ)
    }

    /// Whether the mapping allows writes
    ///
    /// 映射是否可写
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.protection.contains(Protection::WRITE)
    }

    /// Whether the mapping allows execution
    ///
    /// 映射是否可执行
    #[inline]
    pub fn is_exec(&self) -> bool {
        self.protection.contains(Protection::EXEC)
    }

    /// Page-aligned start of the mapping, `None` once unmapped
    ///
    /// 映射的页对齐起始地址，解除映射后为 `None`
    #[inline]
    pub fn base_ptr(&self) -> Option<*mut u8> {
        match self.state {
            State::Valid(extent) => Some(extent.base.as_ptr()),
            State::Invalid => None,
        }
    }

    /// Start of the usable range, `None` once unmapped
    ///
    /// 可用范围的起始地址，解除映射后为 `None`
    #[inline]
    pub fn begin_ptr(&self) -> Option<*mut u8> {
        self.base_ptr()
            .map(|base| base.wrapping_add(self.page_offset()))
    }

    /// End of the usable range, `None` once unmapped
    ///
    /// 可用范围的结束地址，解除映射后为 `None`
    #[inline]
    pub fn end_ptr(&self) -> Option<*mut u8> {
        self.begin_ptr().map(|begin| begin.wrapping_add(self.size()))
    }

    /// Number of pages the widened `(offset, length)` range spans
    ///
    /// 扩展后的 `(offset, length)` 范围跨越的页数
    ///
    /// This is the buffer length [`incore`](Self::incore) needs.
    ///
    /// 即 [`incore`](Self::incore) 所需的缓冲区长度。
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped or the range is out of bounds.
    ///
    /// 如果区域已解除映射或范围越界则 panic。
    #[inline]
    pub fn pages_touched(&self, offset: usize, length: usize) -> usize {
        let extent = self.live("pages_touched");
        self.check_range("pages_touched", extent, offset, length);

        pages_touched(self.page_size, extent.page_offset, offset, length)
    }

    /// Unmap the whole mapping `[base, end)`
    ///
    /// 解除整个映射 `[base, end)`
    ///
    /// # Panics
    ///
    /// Panics if the region is already unmapped or `munmap` fails. A failed
    /// `munmap` is not retried, not even on drop.
    ///
    /// 如果区域已解除映射或 `munmap` 失败则 panic。失败的 `munmap`
    /// 不会重试，drop 时也不会。
    pub fn unmap(&mut self) {
        let extent = self.live("unmap");
        self.state = State::Invalid;

        // Safety: the extent was owned by this region and is no longer reachable
        // Safety: 该映射由本区域持有，且之后不可再访问
        let len = extent.mapped_len();
        if let Err(err) = unsafe { sys::unmap(extent.base.as_ptr(), len) } {
            panic!("munmap of {} bytes at {:p} failed: {}", len, extent.base, err);
        }
        debug!("unmapped region at {:p}", extent.base);
    }

    /// Query which pages of a range are resident in memory
    ///
    /// 查询范围内哪些页驻留在内存中
    ///
    /// Writes one flag per page of the widened range into `buf`, in ascending
    /// address order: `1` for resident, `0` otherwise. Returns the number of
    /// flags written, which equals [`pages_touched`](Self::pages_touched).
    /// Builds without the `mincore` feature report every page as resident.
    ///
    /// 按地址升序向 `buf` 写入扩展后范围每一页的标志：`1` 表示驻留，
    /// 否则为 `0`。返回写入的标志数，即 [`pages_touched`](Self::pages_touched)。
    /// 未启用 `mincore` feature 的构建会把所有页报告为驻留。
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buf` is shorter than the page count
    /// - [`Error::Residency`] if the system call fails
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped or the range is out of bounds.
    ///
    /// 如果区域已解除映射或范围越界则 panic。
    pub fn incore(&self, offset: usize, length: usize, buf: &mut [u8]) -> Result<usize> {
        let extent = self.live("incore");
        self.check_range("incore", extent, offset, length);

        let (offset, length) = align_pair(self.page_size, extent.page_offset, offset, length);
        let pages = length.div_ceil(self.page_size.get());
        if buf.len() < pages {
            return Err(Error::BufferTooSmall {
                buffer_len: buf.len(),
                pages,
            });
        }

        trace!("incore {:p}+{} ({} pages)", extent.base, offset, pages);
        // Safety: the widened range is page-aligned and inside [base, end)
        // Safety: 扩展后的范围页对齐且位于 [base, end) 之内
        unsafe { sys::residency(extent.base.as_ptr().add(offset), length, &mut buf[..pages]) }
            .map_err(Error::Residency)?;

        Ok(pages)
    }

    /// Hint the page cache about the expected access to a range
    ///
    /// 向页缓存提示某一范围的预期访问方式
    ///
    /// Returns `false` when the OS declines the hint. Builds without the
    /// `madvise` feature return `true` without a system call.
    ///
    /// 操作系统拒绝该提示时返回 `false`。未启用 `madvise` feature 的构建
    /// 不发起系统调用，直接返回 `true`。
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped, the range is out of bounds, or the OS
    /// reports `EINVAL`, `EBADF`, or `ENOMEM` for advice other than
    /// [`Advice::WillNeed`].
    ///
    /// 如果区域已解除映射、范围越界，或操作系统返回 `EINVAL`、`EBADF`，
    /// 或对 [`Advice::WillNeed`] 以外的建议返回 `ENOMEM`，则 panic。
    pub fn advise(&self, offset: usize, length: usize, advice: Advice) -> bool {
        let extent = self.live("advise");
        self.check_range("advise", extent, offset, length);

        let (offset, length) = align_pair(self.page_size, extent.page_offset, offset, length);

        trace!("advise {:?} {:p}+{} len {}", advice, extent.base, offset, length);
        // Safety: the widened range is page-aligned and inside [base, end)
        // Safety: 扩展后的范围页对齐且位于 [base, end) 之内
        let addr = unsafe { extent.base.as_ptr().add(offset) };
        let Err(err) = (unsafe { sys::advise(addr, length, advice) }) else {
            return true;
        };

        match classify_advise_failure(err.raw_os_error(), advice) {
            AdviseFailure::Fatal => {
                panic!("madvise({advice:?}) rejected range {offset}+{length}: {err}")
            }
            AdviseFailure::Declined => {
                warn!("madvise({:?}) declined for {}+{}: {}", advice, offset, length, err);
                false
            }
        }
    }

    /// Write modified pages of a range back to the file
    ///
    /// 将范围内被修改的页回写到文件
    ///
    /// Returns whether `msync` succeeded. The caller decides what to do about
    /// a failed flush.
    ///
    /// 返回 `msync` 是否成功。刷盘失败后的处理由调用方决定。
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped or the range is out of bounds.
    ///
    /// 如果区域已解除映射或范围越界则 panic。
    pub fn sync(&self, offset: usize, length: usize, mode: SyncMode) -> bool {
        let extent = self.live("sync");
        self.check_range("sync", extent, offset, length);

        let (offset, length) = align_pair(self.page_size, extent.page_offset, offset, length);

        trace!("sync {:?} {:p}+{} len {}", mode, extent.base, offset, length);
        // Safety: the widened range is page-aligned and inside [base, end)
        // Safety: 扩展后的范围页对齐且位于 [base, end) 之内
        match unsafe { sys::sync(extent.base.as_ptr().add(offset), length, mode) } {
            Ok(()) => true,
            Err(err) => {
                warn!("msync {}+{} failed: {}", offset, length, err);
                false
            }
        }
    }

    /// Copy `data` into the region at `offset`
    ///
    /// 在 `offset` 处将 `data` 复制到区域中
    ///
    /// # Safety
    ///
    /// The caller must ensure no other thread reads or writes the same bytes
    /// concurrently.
    ///
    /// 调用者需要确保没有其他线程并发读写相同的字节。
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped, not writable, or the range is out of
    /// bounds.
    ///
    /// 如果区域已解除映射、不可写或范围越界则 panic。
    pub unsafe fn write_at(&self, offset: usize, data: &[u8]) {
        let extent = self.live("write_at");
        assert!(self.is_writable(), "write_at called on a region without write access");
        self.check_range("write_at", extent, offset, data.len());

        unsafe {
            let dst = extent.base.as_ptr().add(extent.page_offset + offset);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
    }

    /// Copy bytes at `offset` into `buf`
    ///
    /// 将 `offset` 处的字节复制到 `buf`
    ///
    /// # Safety
    ///
    /// The caller must ensure no other thread writes the same bytes
    /// concurrently.
    ///
    /// 调用者需要确保没有其他线程并发写入相同的字节。
    ///
    /// # Panics
    ///
    /// Panics if the region is unmapped, not readable, or the range is out of
    /// bounds.
    ///
    /// 如果区域已解除映射、不可读或范围越界则 panic。
    pub unsafe fn read_at(&self, offset: usize, buf: &mut [u8]) {
        let extent = self.live("read_at");
        assert!(self.is_readable(), "read_at called on a region without read access");
        self.check_range("read_at", extent, offset, buf.len());

        unsafe {
            let src = extent.base.as_ptr().add(extent.page_offset + offset);
            std::ptr::copy_nonoverlapping(src, buf.as_mut_ptr(), buf.len());
        }
    }

    #[inline]
    fn live(&self, op: &str) -> Extent {
        match self.state {
            State::Valid(extent) => extent,
            State::Invalid => panic!("{op} called on an invalid MappedRegion"),
        }
    }

    #[inline]
    fn check_range(&self, op: &str, extent: Extent, offset: usize, length: usize) {
        if !self.is_valid_range(offset, length) {
            panic!(
                "{op} received out-of-range input: offset {offset}, length {length}, size {}",
                extent.size
            );
        }
    }
}

/// How a failed `madvise` is reported
///
/// `madvise` 失败时的报告方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AdviseFailure {
    /// The OS chose not to honor the hint; `advise` returns `false`
    Declined,
    /// The request broke the call's contract; `advise` panics
    Fatal,
}

/// `EINVAL` and `EBADF` always break the contract; so does `ENOMEM`, except
/// while asking for readahead with [`Advice::WillNeed`]
pub(super) fn classify_advise_failure(errno: Option<i32>, advice: Advice) -> AdviseFailure {
    match errno {
        Some(libc::EINVAL) | Some(libc::EBADF) => AdviseFailure::Fatal,
        Some(libc::ENOMEM) if advice != Advice::WillNeed => AdviseFailure::Fatal,
        _ => AdviseFailure::Declined,
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let State::Valid(extent) = mem::replace(&mut self.state, State::Invalid) {
            // Safety: the extent is owned by this region and dies with it
            // Safety: 该映射由本区域持有，随区域一起销毁
            let len = extent.mapped_len();
            if let Err(err) = unsafe { sys::unmap(extent.base.as_ptr(), len) } {
                error!("munmap of {} bytes at {:p} failed on drop: {}", len, extent.base, err);
            }
        }
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("base", &self.base_ptr())
            .field("page_offset", &self.page_offset())
            .field("size", &self.size())
            .field("protection", &self.protection)
            .field("flags", &self.flags)
            .field("page_size", &self.page_size.get())
            .finish()
    }
}

// Safety: all fields are fixed after construction except `state`, which only
// changes through `&mut self`; concurrent `&self` calls are independent system
// calls
//
// Safety: 除 `state` 外所有字段构造后不变，而 `state` 只能通过 `&mut self`
// 修改；并发的 `&self` 调用是相互独立的系统调用
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}
