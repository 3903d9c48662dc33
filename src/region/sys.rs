//! Platform memory-management calls
//!
//! 平台内存管理调用
//!
//! Every `cfg` switch of the crate lives here. Callers always pass
//! page-aligned addresses; lengths are whole pages except for `unmap`, where
//! the kernel rounds up.
//!
//! 本 crate 的所有 `cfg` 分支都集中在这里。调用方总是传入页对齐的地址；
//! 除 `unmap` 外长度都是整页，`unmap` 由内核向上取整。

use super::flags::{Advice, SyncMode};
use std::io;

/// Optional OS facilities compiled into this build
///
/// 本次构建启用的可选操作系统能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `mincore` is used for residency queries; otherwise every page is
    /// reported resident
    ///
    /// 驻留查询使用 `mincore`；否则所有页都报告为驻留
    pub residency: bool,

    /// `madvise` is issued for cache advice; otherwise advice is a no-op
    ///
    /// 缓存建议使用 `madvise`；否则建议为空操作
    pub advice: bool,
}

/// Facilities of the current build, fixed by the `mincore` and `madvise`
/// cargo features
///
/// 当前构建的能力，由 `mincore` 和 `madvise` 两个 cargo feature 决定
pub const CAPABILITIES: Capabilities = Capabilities {
    residency: cfg!(feature = "mincore"),
    advice: cfg!(feature = "madvise"),
};

fn check(ret: libc::c_int) -> io::Result<()> {
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

pub(crate) fn page_size() -> usize {
    // Safety: sysconf has no memory-safety preconditions
    // Safety: sysconf 没有内存安全前置条件
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(ret).unwrap_or(0)
}

/// # Safety
/// `[addr, addr + len)` must be a mapping owned by the caller and never used
/// again.
pub(crate) unsafe fn unmap(addr: *mut u8, len: usize) -> io::Result<()> {
    check(unsafe { libc::munmap(addr.cast(), len) })
}

/// Fill `out` with one `0`/`1` residency flag per page.
///
/// # Safety
/// `addr` must be page-aligned and `[addr, addr + len)` mapped.
#[cfg(feature = "mincore")]
pub(crate) unsafe fn residency(addr: *mut u8, len: usize, out: &mut [u8]) -> io::Result<()> {
    check(unsafe { libc::mincore(addr.cast(), len, out.as_mut_ptr().cast()) })?;

    // only the low bit is defined
    for flag in out.iter_mut() {
        *flag &= 1;
    }
    Ok(())
}

/// Without `mincore` every page counts as resident.
///
/// # Safety
/// Nothing is dereferenced; kept `unsafe` to match the `mincore` build.
#[cfg(not(feature = "mincore"))]
pub(crate) unsafe fn residency(_addr: *mut u8, _len: usize, out: &mut [u8]) -> io::Result<()> {
    out.fill(1);
    Ok(())
}

/// # Safety
/// `addr` must be page-aligned and `[addr, addr + len)` mapped.
#[cfg(feature = "madvise")]
pub(crate) unsafe fn advise(addr: *mut u8, len: usize, advice: Advice) -> io::Result<()> {
    check(unsafe { libc::madvise(addr.cast(), len, advice.to_raw()) })
}

/// # Safety
/// Nothing is dereferenced; kept `unsafe` to match the `madvise` build.
#[cfg(not(feature = "madvise"))]
pub(crate) unsafe fn advise(_addr: *mut u8, _len: usize, _advice: Advice) -> io::Result<()> {
    Ok(())
}

/// # Safety
/// `addr` must be page-aligned and `[addr, addr + len)` mapped.
pub(crate) unsafe fn sync(addr: *mut u8, len: usize, mode: SyncMode) -> io::Result<()> {
    check(unsafe { libc::msync(addr.cast(), len, mode.bits()) })
}
