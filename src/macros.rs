#![allow(unused_macros)]

/// Helper macro for creating a [`crate::Error::Malformed`] with the source location of the
/// detection site attached.
///
/// ```rust, ignore
///  return Err(malformed_error!("Invalid constant pool tag - {}", tag));
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Helper macro for out of bound reads
///
/// ```rust, ignore
///  if offset > data.len() {
///      return Err(out_of_bounds_error!());
///  }
/// ```
macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}
