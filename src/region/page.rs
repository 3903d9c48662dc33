//! Page size and page alignment arithmetic
//!
//! 页大小与页对齐运算

use super::sys;
use std::num::NonZeroUsize;
use std::sync::OnceLock;

/// Virtual-memory page size
///
/// 虚拟内存页大小
///
/// A validated power-of-two page size. The operating system's value is queried
/// once per process through [`PageSize::system`] and cached; after that it is
/// only ever copied around by value.
///
/// 经过校验的 2 的幂页大小。操作系统的页大小通过 [`PageSize::system`]
/// 在进程内只查询一次并缓存，之后只按值传递。
///
/// # Examples
///
/// ```
/// use mapped_region::PageSize;
///
/// let page = PageSize::system();
/// assert!(page.get().is_power_of_two());
/// assert_eq!(page.align_down(page.get() + 1), page.get());
///
/// assert!(PageSize::new(4096).is_some());
/// assert!(PageSize::new(1000).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Page size of the running system
    ///
    /// 当前系统的页大小
    ///
    /// The first call asks the OS; every later call returns the cached value.
    ///
    /// 首次调用向操作系统查询，之后的调用返回缓存值。
    pub fn system() -> Self {
        static SYSTEM: OnceLock<PageSize> = OnceLock::new();

        *SYSTEM.get_or_init(|| {
            let bytes = sys::page_size();
            match PageSize::new(bytes) {
                Some(page) => page,
                None => panic!("operating system reported an invalid page size: {bytes}"),
            }
        })
    }

    /// Create a page size from a byte count
    ///
    /// 从字节数创建页大小
    ///
    /// Returns `None` unless `bytes` is a non-zero power of two.
    ///
    /// 只有 `bytes` 为非零的 2 的幂时才返回 `Some`。
    #[inline]
    pub const fn new(bytes: usize) -> Option<Self> {
        if bytes.is_power_of_two() {
            match NonZeroUsize::new(bytes) {
                Some(bytes) => Some(Self(bytes)),
                None => None,
            }
        } else {
            None
        }
    }

    /// Page size in bytes
    ///
    /// 页大小（字节）
    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Round `value` down to a page boundary
    ///
    /// 将 `value` 向下对齐到页边界
    #[inline]
    pub const fn align_down(self, value: usize) -> usize {
        value & !(self.get() - 1)
    }

    /// Whether `value` lies on a page boundary
    ///
    /// `value` 是否位于页边界上
    #[inline]
    pub const fn is_aligned(self, value: usize) -> bool {
        value & (self.get() - 1) == 0
    }
}

/// Widen `(offset, length)` to whole pages
///
/// 将 `(offset, length)` 扩展到整页
///
/// `offset` is relative to the usable start of a region that sits
/// `page_offset` bytes into its first page. The returned offset is relative to
/// the page-aligned base of the mapping and is a multiple of the page size; the
/// returned range covers every byte of the requested one.
///
/// `offset` 相对于区域可用起点，该起点位于首页内 `page_offset` 字节处。
/// 返回的偏移相对于映射的页对齐基址，且是页大小的整数倍；
/// 返回的范围覆盖原请求的所有字节。
#[inline]
pub(crate) fn align_pair(
    page_size: PageSize,
    page_offset: usize,
    offset: usize,
    length: usize,
) -> (usize, usize) {
    let offset = offset + page_offset;
    let slack = offset - page_size.align_down(offset);

    (offset - slack, length + slack)
}

/// Number of pages covered by the widened `(offset, length)` range
///
/// 扩展后的 `(offset, length)` 范围覆盖的页数
#[inline]
pub(crate) fn pages_touched(
    page_size: PageSize,
    page_offset: usize,
    offset: usize,
    length: usize,
) -> usize {
    let (_, length) = align_pair(page_size, page_offset, offset, length);
    length.div_ceil(page_size.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [usize; 4] = [512, 4096, 16384, 65536];

    fn page(bytes: usize) -> PageSize {
        PageSize::new(bytes).unwrap()
    }

    #[test]
    fn test_new_rejects_non_powers_of_two() {
        assert!(PageSize::new(0).is_none());
        assert!(PageSize::new(3).is_none());
        assert!(PageSize::new(4095).is_none());
        assert_eq!(PageSize::new(4096).map(PageSize::get), Some(4096));
    }

    #[test]
    fn test_system_page_size_is_cached() {
        let first = PageSize::system();
        let second = PageSize::system();
        assert_eq!(first, second);
        assert!(first.get() >= 512);
    }

    #[test]
    fn test_align_down_and_is_aligned() {
        let p = page(4096);
        assert_eq!(p.align_down(0), 0);
        assert_eq!(p.align_down(4095), 0);
        assert_eq!(p.align_down(4096), 4096);
        assert_eq!(p.align_down(10_000), 8192);
        assert!(p.is_aligned(8192));
        assert!(!p.is_aligned(8193));
    }

    #[test]
    fn test_widen_from_zero_offset_covers_page_offset() {
        // start is the greatest page multiple <= o, end reaches at least o + len
        for size in SIZES {
            let p = page(size);
            for o in [0, 1, size / 2, size - 1] {
                for len in [0, 1, size - 1, size, 3 * size + 7] {
                    let (start, widened) = align_pair(p, o, 0, len);
                    assert_eq!(start, 0);
                    assert!(p.is_aligned(start));
                    assert!(start + widened >= o + len);
                }
            }
        }
    }

    #[test]
    fn test_widen_is_superset_of_request() {
        let p = page(4096);
        for o in [0, 100, 4095] {
            for offset in [0, 1, 4095, 4096, 9000] {
                for len in [0, 1, 4096, 5000] {
                    let (start, widened) = align_pair(p, o, offset, len);
                    assert!(p.is_aligned(start));
                    assert!(start <= offset + o);
                    assert!(start + widened >= offset + o + len);
                    // never more than one page of slack in front
                    assert!(offset + o - start < 4096);
                }
            }
        }
    }

    #[test]
    fn test_widen_small_request_inside_first_page() {
        let p = page(4096);
        assert_eq!(align_pair(p, 0, 10, 5), (0, 15));
        assert_eq!(pages_touched(p, 0, 10, 5), 1);
    }

    #[test]
    fn test_pages_touched_counts_widened_range() {
        let p = page(4096);
        assert_eq!(pages_touched(p, 0, 0, 0), 0);
        assert_eq!(pages_touched(p, 0, 0, 1), 1);
        assert_eq!(pages_touched(p, 0, 0, 4096), 1);
        assert_eq!(pages_touched(p, 0, 0, 4097), 2);
        assert_eq!(pages_touched(p, 0, 4095, 2), 2);
        // the page offset shifts a full page across a boundary
        assert_eq!(pages_touched(p, 100, 0, 4096), 2);
        assert_eq!(pages_touched(p, 100, 3996, 4096), 1);
    }
}
