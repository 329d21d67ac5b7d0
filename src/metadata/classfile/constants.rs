//! Constant pool decoding.
//!
//! The constant pool is a one-based table of tagged entries. `long` and `double` entries occupy
//! two slots; the slot following them is unusable. Only the entry kinds needed for marker decoding
//! are inspected further, but every standard tag is parsed so the pool can be walked completely.

use strum::FromRepr;

use crate::{
    file::parser::Parser, metadata::classfile::descriptor::internal_to_name, Result,
};

/// Tag byte of a constant pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ConstantTag {
    /// Modified UTF-8 string
    Utf8 = 1,
    /// 32-bit integer (also used for boolean, byte, char and short values)
    Integer = 3,
    /// 32-bit float
    Float = 4,
    /// 64-bit integer, two slots
    Long = 5,
    /// 64-bit float, two slots
    Double = 6,
    /// Class or interface reference
    Class = 7,
    /// String literal
    String = 8,
    /// Field reference
    FieldRef = 9,
    /// Method reference
    MethodRef = 10,
    /// Interface method reference
    InterfaceMethodRef = 11,
    /// Name and type descriptor pair
    NameAndType = 12,
    /// Method handle
    MethodHandle = 15,
    /// Method type
    MethodType = 16,
    /// Dynamically-computed constant
    Dynamic = 17,
    /// Dynamically-computed call site
    InvokeDynamic = 18,
    /// Module
    Module = 19,
    /// Package
    Package = 20,
}

/// A decoded constant pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the second slot of `long`/`double` entries
    Unusable,
    /// String content
    Utf8(String),
    /// 32-bit integer
    Integer(i32),
    /// 32-bit float
    Float(f32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Index of the internal class name
    Class(u16),
    /// Index of the string content
    String(u16),
    /// Field, method or interface method reference
    Reference {
        /// Kind of the reference
        tag: ConstantTag,
        /// Index of the owning class entry
        class: u16,
        /// Index of the name and type entry
        name_and_type: u16,
    },
    /// Name and descriptor indices
    NameAndType {
        /// Index of the name
        name: u16,
        /// Index of the descriptor
        descriptor: u16,
    },
    /// Method handle
    MethodHandle {
        /// Reference kind
        kind: u8,
        /// Index of the referenced member
        reference: u16,
    },
    /// Index of a method descriptor
    MethodType(u16),
    /// Dynamic constant or call site
    Dynamic {
        /// Kind of the entry
        tag: ConstantTag,
        /// Index into the bootstrap method table
        bootstrap: u16,
        /// Index of the name and type entry
        name_and_type: u16,
    },
    /// Index of a module name
    Module(u16),
    /// Index of a package name
    Package(u16),
}

/// The decoded constant pool of a class descriptor
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Decode the pool count and all entries at the current parser position.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown tags or an empty pool, and
    /// [`crate::Error::OutOfBounds`] if the data ends early.
    pub fn parse(parser: &mut Parser) -> Result<Self> {
        let count = parser.read_be::<u16>()?;
        if count == 0 {
            return Err(malformed_error!("Constant pool count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(Constant::Unusable);

        while entries.len() < usize::from(count) {
            let tag_byte = parser.read_be::<u8>()?;
            let Some(tag) = ConstantTag::from_repr(tag_byte) else {
                return Err(malformed_error!(
                    "Invalid constant pool tag {} at index {}",
                    tag_byte,
                    entries.len()
                ));
            };

            let entry = match tag {
                ConstantTag::Utf8 => {
                    let length = parser.read_be::<u16>()?;
                    Constant::Utf8(parser.read_modified_utf8(usize::from(length))?)
                }
                ConstantTag::Integer => Constant::Integer(parser.read_be::<i32>()?),
                ConstantTag::Float => Constant::Float(parser.read_be::<f32>()?),
                ConstantTag::Long => Constant::Long(parser.read_be::<i64>()?),
                ConstantTag::Double => Constant::Double(parser.read_be::<f64>()?),
                ConstantTag::Class => Constant::Class(parser.read_be::<u16>()?),
                ConstantTag::String => Constant::String(parser.read_be::<u16>()?),
                ConstantTag::FieldRef
                | ConstantTag::MethodRef
                | ConstantTag::InterfaceMethodRef => Constant::Reference {
                    tag,
                    class: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                ConstantTag::NameAndType => Constant::NameAndType {
                    name: parser.read_be::<u16>()?,
                    descriptor: parser.read_be::<u16>()?,
                },
                ConstantTag::MethodHandle => Constant::MethodHandle {
                    kind: parser.read_be::<u8>()?,
                    reference: parser.read_be::<u16>()?,
                },
                ConstantTag::MethodType => Constant::MethodType(parser.read_be::<u16>()?),
                ConstantTag::Dynamic | ConstantTag::InvokeDynamic => Constant::Dynamic {
                    tag,
                    bootstrap: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                ConstantTag::Module => Constant::Module(parser.read_be::<u16>()?),
                ConstantTag::Package => Constant::Package(parser.read_be::<u16>()?),
            };

            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                if entries.len() >= usize::from(count) {
                    return Err(malformed_error!(
                        "Two-slot constant in the last constant pool slot"
                    ));
                }
                entries.push(Constant::Unusable);
            }
        }

        Ok(ConstantPool { entries })
    }

    /// Number of slots, including slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is out of range or unusable.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => Err(malformed_error!(
                "Invalid constant pool index {}",
                index
            )),
            Some(entry) => Ok(entry),
        }
    }

    /// Returns the string content of the `Utf8` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a `Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            other => Err(malformed_error!(
                "Expected Utf8 constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Returns the dotted class name of the `Class` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            Constant::Class(name_index) => Ok(internal_to_name(self.utf8(*name_index)?)),
            other => Err(malformed_error!(
                "Expected Class constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Returns the value of the `Integer` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not an `Integer` entry.
    pub fn integer(&self, index: u16) -> Result<i32> {
        match self.get(index)? {
            Constant::Integer(value) => Ok(*value),
            other => Err(malformed_error!(
                "Expected Integer constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Returns the value of the `Long` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a `Long` entry.
    pub fn long(&self, index: u16) -> Result<i64> {
        match self.get(index)? {
            Constant::Long(value) => Ok(*value),
            other => Err(malformed_error!(
                "Expected Long constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Returns the value of the `Float` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a `Float` entry.
    pub fn float(&self, index: u16) -> Result<f32> {
        match self.get(index)? {
            Constant::Float(value) => Ok(*value),
            other => Err(malformed_error!(
                "Expected Float constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Returns the value of the `Double` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a `Double` entry.
    pub fn double(&self, index: u16) -> Result<f64> {
        match self.get(index)? {
            Constant::Double(value) => Ok(*value),
            other => Err(malformed_error!(
                "Expected Double constant at index {}, found {:?}",
                index,
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn parses_all_kinds_and_wide_slots() {
        #[rustfmt::skip]
        let data = [
            0x00, 0x0A,                               // count = 10
            0x01, 0x00, 0x03, b'F', b'o', b'o',       // #1 Utf8 "Foo"
            0x07, 0x00, 0x01,                         // #2 Class #1
            0x05, 0, 0, 0, 0, 0, 0, 0, 0x2A,          // #3 Long 42 (+ #4 unusable)
            0x03, 0xFF, 0xFF, 0xFF, 0xFF,             // #5 Integer -1
            0x0F, 0x06, 0x00, 0x02,                   // #6 MethodHandle
            0x0C, 0x00, 0x01, 0x00, 0x01,             // #7 NameAndType
            0x12, 0x00, 0x00, 0x00, 0x07,             // #8 InvokeDynamic
            0x14, 0x00, 0x01,                         // #9 Package
        ];
        let mut parser = Parser::new(&data);
        let pool = ConstantPool::parse(&mut parser).unwrap();

        assert_eq!(pool.len(), 10);
        assert!(!parser.has_more_data());
        assert_eq!(pool.utf8(1).unwrap(), "Foo");
        assert_eq!(pool.class_name(2).unwrap(), "Foo");
        assert_eq!(pool.long(3).unwrap(), 42);
        assert!(pool.get(4).is_err());
        assert_eq!(pool.integer(5).unwrap(), -1);
        assert!(matches!(
            pool.get(6).unwrap(),
            Constant::MethodHandle { kind: 6, reference: 2 }
        ));
        assert!(pool.get(0).is_err());
        assert!(pool.get(10).is_err());
        assert!(matches!(pool.utf8(2), Err(Error::Malformed { .. })));
    }

    #[test]
    fn rejects_unknown_tag() {
        let data = [0x00, 0x02, 0x02, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            ConstantPool::parse(&mut parser),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_pool() {
        let data = [0x00, 0x02, 0x01, 0x00, 0x05, b'a'];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            ConstantPool::parse(&mut parser),
            Err(Error::OutOfBounds)
        ));
    }
}
