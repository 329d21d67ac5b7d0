//! Binary input sources for class descriptors.
//!
//! The binary reader is the only component of this crate that acquires an external resource. This
//! module keeps that resource behind the [`crate::file::Input`] type: it owns either a memory-mapped
//! file ([`crate::file::physical::Physical`]) or an owned buffer ([`crate::file::memory::Memory`])
//! and releases it when dropped. Decoding borrows the bytes for the duration of a single call, so
//! every exit path (completion, decode error, or early termination) releases the input.
//!
//! # Key Components
//!
//! - [`crate::file::Backend`] - Access trait shared by all sources
//! - [`crate::file::Input`] - Owning wrapper handed to the decoder
//! - [`crate::file::parser::Parser`] - Cursor used to decode the bytes

pub mod io;
mod memory;
pub mod parser;
mod physical;

use std::{io::Read, path::Path};

use crate::Result;
use memory::Memory;
use physical::Physical;

/// Backend trait for class descriptor data sources.
///
/// Implementations must be [`Send`] and [`Sync`] so that an [`Input`] can be moved to the thread
/// performing the decode.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Returns the complete data.
    fn data(&self) -> &[u8];

    /// Returns the data length in bytes.
    fn len(&self) -> usize;
}

/// An owned, scoped class descriptor input.
///
/// # Examples
///
/// ```rust,no_run
/// use metadigest::Input;
///
/// let input = Input::from_path("Service.class")?;
/// println!("{} bytes", input.len());
/// // the mapping is released here
/// # Ok::<(), metadigest::Error>(())
/// ```
#[derive(Debug)]
pub struct Input {
    backend: Box<dyn Backend>,
}

impl Input {
    /// Memory-map a class descriptor from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Input> {
        Self::with_backend(Box::new(Physical::new(path)?))
    }

    /// Take ownership of an in-memory class descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<Input> {
        Self::with_backend(Box::new(Memory::new(data)))
    }

    /// Drain a stream into memory.
    ///
    /// The stream is consumed completely and dropped before this function returns.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if reading fails, or [`crate::Error::Empty`] if the
    /// stream yields no bytes.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Input> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_mem(data)
    }

    fn with_backend(backend: Box<dyn Backend>) -> Result<Input> {
        if backend.len() == 0 {
            return Err(crate::Error::Empty);
        }

        Ok(Input { backend })
    }

    /// Returns the complete input.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend.data()
    }

    /// Returns the input length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Returns `true` if the input has no data. Never the case for a constructed [`Input`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn input_from_mem() {
        let input = Input::from_mem(vec![0xCA, 0xFE]).unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input.data(), &[0xCA, 0xFE]);
    }

    #[test]
    fn input_rejects_empty() {
        assert!(matches!(Input::from_mem(Vec::new()), Err(Error::Empty)));
        assert!(matches!(
            Input::from_reader(std::io::empty()),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn input_from_reader() {
        let cursor = std::io::Cursor::new(vec![1u8, 2, 3]);
        let input = Input::from_reader(cursor).unwrap();
        assert_eq!(input.data(), &[1, 2, 3]);
    }

    #[test]
    fn input_from_missing_path() {
        assert!(matches!(
            Input::from_path("/nonexistent/Missing.class"),
            Err(Error::FileError(_))
        ));
    }
}
