//! Low-level byte stream parser for class descriptor decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser used by the class descriptor decoder. It offers bounds-checked access to binary data in
//! big-endian byte order and decodes the modified UTF-8 encoding used by constant pool strings.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::has_more_data`] - Check for remaining input
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_be`] - Read primitive types (big-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a byte range
//! - [`crate::file::parser::Parser::read_modified_utf8`] - Decode a modified UTF-8 string
//!
//! # Usage Examples
//!
//! ```rust
//! use metadigest::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x03];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
//! assert_eq!(parser.read_be::<u16>()?, 3);
//! assert!(!parser.has_more_data());
//! # Ok::<(), metadigest::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, ClassIO},
    Result,
};

/// A cursor over a borrowed byte slice.
///
/// `Parser` maintains an internal position and validates every read against the end of the
/// buffer, so truncated or malicious input surfaces as [`crate::Error::OutOfBounds`] instead of a
/// panic.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `len` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let start = self.position;
        self.advance_by(len)?;
        Ok(&self.data[start..self.position])
    }

    /// Decode `len` bytes of modified UTF-8 into a [`String`].
    ///
    /// Modified UTF-8 differs from standard UTF-8 in two ways: the NUL character is encoded as the
    /// two byte sequence `0xC0 0x80`, and supplementary characters are stored as a surrogate pair
    /// of two three byte sequences. Both are handled by decoding to UTF-16 code units first.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain, or
    /// [`crate::Error::Malformed`] for invalid byte sequences or unpaired surrogates.
    pub fn read_modified_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        if bytes.is_ascii() {
            return Ok(bytes.iter().map(|&b| char::from(b)).collect());
        }

        let mut units = Vec::with_capacity(bytes.len());
        let mut index = 0;
        while index < bytes.len() {
            let first = u16::from(bytes[index]);
            if first & 0x80 == 0 {
                units.push(first);
                index += 1;
            } else if first & 0xE0 == 0xC0 {
                let second = continuation(bytes, index + 1)?;
                units.push(((first & 0x1F) << 6) | second);
                index += 2;
            } else if first & 0xF0 == 0xE0 {
                let second = continuation(bytes, index + 1)?;
                let third = continuation(bytes, index + 2)?;
                units.push(((first & 0x0F) << 12) | (second << 6) | third);
                index += 3;
            } else {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte - 0x{:02X}",
                    first
                ));
            }
        }

        String::from_utf16(&units)
            .map_err(|_| malformed_error!("Unpaired surrogate in modified UTF-8 string"))
    }
}

fn continuation(bytes: &[u8], index: usize) -> Result<u16> {
    match bytes.get(index) {
        Some(&byte) if byte & 0xC0 == 0x80 => Ok(u16::from(byte & 0x3F)),
        Some(&byte) => Err(malformed_error!(
            "Invalid modified UTF-8 continuation byte - 0x{:02X}",
            byte
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}
