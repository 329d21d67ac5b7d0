//! Single-pass decoder for class descriptors.
//!
//! The decoder validates the magic number, decodes the constant pool and the class header, skips
//! the field and method tables, and turns the class-level marker attributes into
//! [`ClassVisitor`] callbacks. All other attributes are skipped by length.
//!
//! # Element Values
//!
//! | Tag | Value                          |
//! |-----|--------------------------------|
//! | `B` `C` `I` `S` `Z` | `Integer` constant, narrowed (surrogate `C` units stay `Int`) |
//! | `J` `F` `D` | `Long`, `Float`, `Double` constant |
//! | `s` | `Utf8` constant |
//! | `e` | enum type descriptor + constant name |
//! | `c` | class descriptor (`V` for `void`) |
//! | `@` | nested marker |
//! | `[` | array of element values |

use std::ops::ControlFlow;

use strum::FromRepr;
use tracing::warn;

use crate::{
    file::parser::Parser,
    metadata::{
        classfile::{
            constants::ConstantPool,
            descriptor::descriptor_to_name,
            visitor::{ClassAccessFlags, ClassHeader, ClassVisitor},
        },
        digest::DigestOptions,
        properties::ScalarValue,
    },
    Error, Result,
};

/// Magic number at the start of every class descriptor
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;
/// Class attribute holding markers visible at run time
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
/// Class attribute holding markers retained in the descriptor only
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// Propagates a visitor `Break` out of a decoding function.
macro_rules! visit {
    ($flow:expr) => {
        if let ControlFlow::Break(()) = $flow {
            return Ok(ControlFlow::Break(()));
        }
    };
}

/// Tag byte of an element value
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
enum ElementTag {
    Byte = b'B',
    Char = b'C',
    Double = b'D',
    Float = b'F',
    Int = b'I',
    Long = b'J',
    Short = b'S',
    Boolean = b'Z',
    String = b's',
    Enum = b'e',
    Class = b'c',
    Annotation = b'@',
    Array = b'[',
}

/// Decodes class descriptors into [`ClassVisitor`] callbacks
#[derive(Debug, Clone, Copy)]
pub struct ClassFileDecoder {
    max_nesting_depth: usize,
    include_invisible: bool,
}

impl Default for ClassFileDecoder {
    fn default() -> Self {
        Self::new(&DigestOptions::default())
    }
}

impl ClassFileDecoder {
    /// Create a decoder honouring the binary-source settings of `options`.
    #[must_use]
    pub fn new(options: &DigestOptions) -> Self {
        ClassFileDecoder {
            max_nesting_depth: options.max_nesting_depth,
            include_invisible: options.include_invisible,
        }
    }

    /// Decode `data`, reporting its structure to `visitor`.
    ///
    /// Returns `Ok(ControlFlow::Break(()))` if the visitor stopped the decode, and
    /// `Ok(ControlFlow::Continue(()))` after the whole descriptor was visited.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if `data` does not start with the class magic,
    /// [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for damaged descriptors, and
    /// [`crate::Error::RecursionLimit`] if markers nest deeper than allowed.
    pub fn decode<V: ClassVisitor + ?Sized>(
        &self,
        data: &[u8],
        visitor: &mut V,
    ) -> Result<ControlFlow<()>> {
        let mut parser = Parser::new(data);
        if parser.read_be::<u32>()? != CLASS_MAGIC {
            return Err(Error::NotSupported);
        }

        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        let pool = ConstantPool::parse(&mut parser)?;

        let access_flags = ClassAccessFlags::from_bits_retain(parser.read_be::<u16>()?);
        let name = pool.class_name(parser.read_be::<u16>()?)?;
        let super_name = match parser.read_be::<u16>()? {
            0 => None,
            index => Some(pool.class_name(index)?),
        };
        let interface_count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(parser.read_be::<u16>()?)?);
        }

        let header = ClassHeader {
            minor_version,
            major_version,
            access_flags,
            name,
            super_name,
            interfaces,
        };
        visit!(visitor.visit_class(&header));

        // fields, then methods
        Self::skip_members(&mut parser)?;
        Self::skip_members(&mut parser)?;

        let attribute_count = parser.read_be::<u16>()?;
        for _ in 0..attribute_count {
            let attribute_name = pool.utf8(parser.read_be::<u16>()?)?;
            let length = parser.read_be::<u32>()? as usize;
            let body = parser.read_bytes(length)?;

            let visible = match attribute_name {
                RUNTIME_VISIBLE_ANNOTATIONS => true,
                RUNTIME_INVISIBLE_ANNOTATIONS if self.include_invisible => false,
                _ => continue,
            };

            let mut attribute = Parser::new(body);
            let count = attribute.read_be::<u16>()?;
            for _ in 0..count {
                visit!(self.annotation(&mut attribute, &pool, None, visible, 1, visitor)?);
            }
            if attribute.has_more_data() {
                return Err(malformed_error!(
                    "Trailing data in {} attribute",
                    attribute_name
                ));
            }
        }

        visitor.visit_end();
        Ok(ControlFlow::Continue(()))
    }

    fn skip_members(parser: &mut Parser) -> Result<()> {
        let count = parser.read_be::<u16>()?;
        for _ in 0..count {
            // access_flags, name_index, descriptor_index
            parser.advance_by(6)?;
            let attribute_count = parser.read_be::<u16>()?;
            for _ in 0..attribute_count {
                parser.advance_by(2)?;
                let length = parser.read_be::<u32>()? as usize;
                parser.advance_by(length)?;
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_nesting_depth {
            return Err(Error::RecursionLimit(self.max_nesting_depth));
        }
        Ok(())
    }

    fn annotation<V: ClassVisitor + ?Sized>(
        &self,
        parser: &mut Parser,
        pool: &ConstantPool,
        attribute: Option<&str>,
        visible: bool,
        depth: usize,
        visitor: &mut V,
    ) -> Result<ControlFlow<()>> {
        self.check_depth(depth)?;

        let annotation_type = descriptor_to_name(pool.utf8(parser.read_be::<u16>()?)?)?;
        visit!(visitor.visit_marker_start(&annotation_type, attribute, visible));

        let pair_count = parser.read_be::<u16>()?;
        for _ in 0..pair_count {
            let name = pool.utf8(parser.read_be::<u16>()?)?;
            visit!(self.element_value(parser, pool, Some(name), visible, depth, visitor)?);
        }

        visit!(visitor.visit_marker_end(&annotation_type));
        Ok(ControlFlow::Continue(()))
    }

    /// Decodes one element value. `name` is `None` for array elements.
    fn element_value<V: ClassVisitor + ?Sized>(
        &self,
        parser: &mut Parser,
        pool: &ConstantPool,
        name: Option<&str>,
        visible: bool,
        depth: usize,
        visitor: &mut V,
    ) -> Result<ControlFlow<()>> {
        let tag_byte = parser.read_be::<u8>()?;
        let Some(tag) = ElementTag::from_repr(tag_byte) else {
            return Err(malformed_error!(
                "Invalid element value tag - 0x{:02X}",
                tag_byte
            ));
        };

        let value = match tag {
            ElementTag::Byte => {
                let value = pool.integer(parser.read_be::<u16>()?)?;
                ScalarValue::Byte(narrow(value)?)
            }
            ElementTag::Short => {
                let value = pool.integer(parser.read_be::<u16>()?)?;
                ScalarValue::Short(narrow(value)?)
            }
            ElementTag::Char => {
                let value = pool.integer(parser.read_be::<u16>()?)?;
                let unit: u16 = narrow(value)?;
                match char::from_u32(u32::from(unit)) {
                    Some(character) => ScalarValue::Char(character),
                    None => {
                        // lone surrogate code unit, not representable as a char
                        warn!(
                            property = name.unwrap_or_default(),
                            unit = format_args!("0x{unit:04X}"),
                            "char constant is a surrogate, keeping it as int"
                        );
                        ScalarValue::Int(value)
                    }
                }
            }
            ElementTag::Boolean => ScalarValue::Bool(pool.integer(parser.read_be::<u16>()?)? != 0),
            ElementTag::Int => ScalarValue::Int(pool.integer(parser.read_be::<u16>()?)?),
            ElementTag::Long => ScalarValue::Long(pool.long(parser.read_be::<u16>()?)?),
            ElementTag::Float => ScalarValue::Float(pool.float(parser.read_be::<u16>()?)?),
            ElementTag::Double => ScalarValue::Double(pool.double(parser.read_be::<u16>()?)?),
            ElementTag::String => {
                ScalarValue::String(pool.utf8(parser.read_be::<u16>()?)?.to_string())
            }
            ElementTag::Enum => {
                let type_name = descriptor_to_name(pool.utf8(parser.read_be::<u16>()?)?)?;
                let constant = pool.utf8(parser.read_be::<u16>()?)?.to_string();
                ScalarValue::Enum {
                    type_name,
                    constant,
                }
            }
            ElementTag::Class => {
                ScalarValue::Class(descriptor_to_name(pool.utf8(parser.read_be::<u16>()?)?)?)
            }
            ElementTag::Annotation => {
                return self.annotation(parser, pool, name, visible, depth + 1, visitor);
            }
            ElementTag::Array => {
                let Some(array_name) = name else {
                    return Err(malformed_error!("Nested arrays are not permitted"));
                };
                self.check_depth(depth + 1)?;

                visit!(visitor.visit_array_start(array_name));
                let count = parser.read_be::<u16>()?;
                for _ in 0..count {
                    visit!(self.element_value(parser, pool, None, visible, depth + 1, visitor)?);
                }
                visit!(visitor.visit_array_end(array_name));
                return Ok(ControlFlow::Continue(()));
            }
        };

        Ok(visitor.visit_value(name, value))
    }
}

fn narrow<T: TryFrom<i32>>(value: i32) -> Result<T> {
    T::try_from(value).map_err(|_| malformed_error!("Constant {} out of range", value))
}
