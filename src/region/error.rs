//! Error types for mapped-region
//!
//! mapped-region 的错误类型

use std::fmt;
use std::io;

/// Recoverable error of a mapped-region operation
///
/// mapped-region 操作的可恢复错误
///
/// Contract violations (using an unmapped region, out-of-range input,
/// malformed construction) are not represented here; they panic.
///
/// 契约违规（使用已解除映射的区域、越界输入、非法构造）不在此表示，
/// 它们会直接 panic。
#[derive(Debug)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    ///
    /// Region operations never return this variant themselves; it lets
    /// callers mix mapping setup such as `file.set_len(..)?` and region
    /// calls under one `?`.
    ///
    /// 区域操作本身不会返回该变体；它让调用方可以在同一个 `?`
    /// 链中混用映射准备（如 `file.set_len(..)?`）与区域调用。
    Io(io::Error),

    /// The residency query system call failed
    ///
    /// 驻留查询系统调用失败
    Residency(io::Error),

    /// Residency buffer has fewer bytes than the widened range has pages
    ///
    /// 驻留缓冲区字节数少于扩展后范围的页数
    BufferTooSmall {
        buffer_len: usize,
        pages: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Residency(err) => {
                write!(f, "Residency query failed: {} / 驻留查询失败: {}", err, err)
            }
            Error::BufferTooSmall { buffer_len, pages } => {
                write!(
                    f,
                    "Buffer length {} is smaller than page count {} / \
                     缓冲区长度 {} 小于页数 {}",
                    buffer_len, pages, buffer_len, pages
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) | Error::Residency(err) => Some(err),
            Error::BufferTooSmall { .. } => None,
        }
    }
}

/// Convert from io::Error to Error
///
/// 从 io::Error 转换到 Error
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) | Error::Residency(io_err) => io_err,
            Error::BufferTooSmall { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
