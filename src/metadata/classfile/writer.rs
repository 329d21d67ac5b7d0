//! Writer for class descriptors carrying class-level markers.
//!
//! [`ClassFileBuilder`] produces minimal but well-formed class descriptors: a deduplicated
//! constant pool, the class header, field and method tables without attributes, arbitrary raw
//! class attributes and the two marker attributes. It is the counterpart of
//! [`crate::metadata::classfile::ClassFileDecoder`] and is used to produce fixtures.
//!
//! # Example
//!
//! ```rust
//! use metadigest::metadata::{
//!     classfile::ClassFileBuilder,
//!     datum::MetadataDatum,
//!     properties::PropertySet,
//!     reader::{BinaryReader, MetadataReader},
//! };
//!
//! let named: MetadataDatum =
//!     MetadataDatum::new("demo.Named", PropertySet::from([("value", "primary")]), None)?;
//! let bytes = ClassFileBuilder::new("demo.Service").annotation(named).build()?;
//!
//! let reader = BinaryReader::from_mem(bytes, None)?;
//! assert_eq!(reader.type_name(), "demo.Service");
//! # Ok::<(), metadigest::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    metadata::{
        classfile::{
            constants::ConstantTag,
            decoder::{CLASS_MAGIC, RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS},
            descriptor::{name_to_descriptor, name_to_internal},
            visitor::ClassAccessFlags,
        },
        datum::MetadataDatum,
        properties::{PropertyValue, ScalarValue},
    },
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
}

#[derive(Default)]
struct PoolWriter {
    data: Vec<u8>,
    next: u16,
    known: HashMap<PoolKey, u16>,
}

impl PoolWriter {
    fn new() -> Self {
        PoolWriter {
            next: 1,
            ..PoolWriter::default()
        }
    }

    fn intern(&mut self, key: PoolKey) -> Result<u16> {
        if let Some(&index) = self.known.get(&key) {
            return Ok(index);
        }

        let index = self.next;
        let slots = if matches!(key, PoolKey::Long(_) | PoolKey::Double(_)) {
            2
        } else {
            1
        };
        self.next = index
            .checked_add(slots)
            .filter(|&next| next < u16::MAX)
            .ok_or_else(|| Error::Error("Constant pool overflow".to_string()))?;

        match &key {
            PoolKey::Utf8(value) => {
                let encoded = encode_modified_utf8(value);
                let length = u16::try_from(encoded.len())
                    .map_err(|_| Error::Error(format!("String constant too long - {value}")))?;
                self.data.push(ConstantTag::Utf8 as u8);
                self.data.extend_from_slice(&length.to_be_bytes());
                self.data.extend_from_slice(&encoded);
            }
            PoolKey::Integer(value) => {
                self.data.push(ConstantTag::Integer as u8);
                self.data.extend_from_slice(&value.to_be_bytes());
            }
            PoolKey::Float(bits) => {
                self.data.push(ConstantTag::Float as u8);
                self.data.extend_from_slice(&bits.to_be_bytes());
            }
            PoolKey::Long(value) => {
                self.data.push(ConstantTag::Long as u8);
                self.data.extend_from_slice(&value.to_be_bytes());
            }
            PoolKey::Double(bits) => {
                self.data.push(ConstantTag::Double as u8);
                self.data.extend_from_slice(&bits.to_be_bytes());
            }
            PoolKey::Class(name_index) => {
                self.data.push(ConstantTag::Class as u8);
                self.data.extend_from_slice(&name_index.to_be_bytes());
            }
        }

        self.known.insert(key, index);
        Ok(index)
    }

    fn utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(PoolKey::Utf8(value.to_string()))
    }

    fn class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.utf8(&name_to_internal(name))?;
        self.intern(PoolKey::Class(name_index))
    }
}

/// Encode a string the way class descriptors store it: NUL as two bytes, supplementary
/// characters as surrogate pairs.
fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => encoded.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                encoded.push(0xC0 | (unit >> 6) as u8);
                encoded.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                encoded.push(0xE0 | (unit >> 12) as u8);
                encoded.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                encoded.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    encoded
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn count(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::Error(format!("Too many {what} - {len}")))
}

/// Builds class descriptors
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    access_flags: ClassAccessFlags,
    major_version: u16,
    minor_version: u16,
    fields: Vec<(String, String)>,
    methods: Vec<(String, String)>,
    attributes: Vec<(String, Vec<u8>)>,
    visible: Vec<MetadataDatum>,
    invisible: Vec<MetadataDatum>,
}

impl ClassFileBuilder {
    /// Start a public class named `name` (dotted), extending `java.lang.Object`.
    pub fn new(name: impl Into<String>) -> Self {
        ClassFileBuilder {
            name: name.into(),
            super_name: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            major_version: 52,
            minor_version: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            visible: Vec::new(),
            invisible: Vec::new(),
        }
    }

    /// Set the superclass (dotted name).
    #[must_use]
    pub fn super_class(mut self, name: impl Into<String>) -> Self {
        self.super_name = Some(name.into());
        self
    }

    /// Write no superclass, as for the root type.
    #[must_use]
    pub fn no_super_class(mut self) -> Self {
        self.super_name = None;
        self
    }

    /// Add an implemented interface (dotted name).
    #[must_use]
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Replace the access flags.
    #[must_use]
    pub fn access_flags(mut self, flags: ClassAccessFlags) -> Self {
        self.access_flags = flags;
        self
    }

    /// Set the format version.
    #[must_use]
    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    /// Add a field with a raw field descriptor, e.g. `Ljava/lang/String;`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.fields.push((name.into(), descriptor.into()));
        self
    }

    /// Add a method with a raw method descriptor, e.g. `(I)V`.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.methods.push((name.into(), descriptor.into()));
        self
    }

    /// Add a raw class attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, body: Vec<u8>) -> Self {
        self.attributes.push((name.into(), body));
        self
    }

    /// Add a run-time visible class marker.
    #[must_use]
    pub fn annotation(mut self, datum: MetadataDatum) -> Self {
        self.visible.push(datum);
        self
    }

    /// Add a class marker that is retained in the descriptor only.
    #[must_use]
    pub fn invisible_annotation(mut self, datum: MetadataDatum) -> Self {
        self.invisible.push(datum);
        self
    }

    /// Serialize the class descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if a table or the constant pool exceeds its size limit.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut pool = PoolWriter::new();
        let mut body = Vec::new();

        push_u16(&mut body, self.access_flags.bits());
        push_u16(&mut body, pool.class(&self.name)?);
        match &self.super_name {
            Some(super_name) => push_u16(&mut body, pool.class(super_name)?),
            None => push_u16(&mut body, 0),
        }
        push_u16(&mut body, count(self.interfaces.len(), "interfaces")?);
        for interface in &self.interfaces {
            push_u16(&mut body, pool.class(interface)?);
        }

        for members in [&self.fields, &self.methods] {
            push_u16(&mut body, count(members.len(), "members")?);
            for (name, descriptor) in members {
                push_u16(&mut body, 0x0001);
                push_u16(&mut body, pool.utf8(name)?);
                push_u16(&mut body, pool.utf8(descriptor)?);
                push_u16(&mut body, 0);
            }
        }

        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        for (name, raw) in &self.attributes {
            attributes.push((pool.utf8(name)?, raw.clone()));
        }
        for (name, markers) in [
            (RUNTIME_VISIBLE_ANNOTATIONS, &self.visible),
            (RUNTIME_INVISIBLE_ANNOTATIONS, &self.invisible),
        ] {
            if markers.is_empty() {
                continue;
            }
            let mut content = Vec::new();
            push_u16(&mut content, count(markers.len(), "markers")?);
            for marker in markers {
                write_annotation(&mut pool, &mut content, marker)?;
            }
            attributes.push((pool.utf8(name)?, content));
        }

        push_u16(&mut body, count(attributes.len(), "attributes")?);
        for (name_index, content) in attributes {
            let length = u32::try_from(content.len())
                .map_err(|_| Error::Error("Attribute too long".to_string()))?;
            push_u16(&mut body, name_index);
            body.extend_from_slice(&length.to_be_bytes());
            body.extend_from_slice(&content);
        }

        let mut out = Vec::with_capacity(10 + pool.data.len() + body.len());
        out.extend_from_slice(&CLASS_MAGIC.to_be_bytes());
        push_u16(&mut out, self.minor_version);
        push_u16(&mut out, self.major_version);
        push_u16(&mut out, pool.next);
        out.extend_from_slice(&pool.data);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn write_annotation(pool: &mut PoolWriter, out: &mut Vec<u8>, datum: &MetadataDatum) -> Result<()> {
    push_u16(out, pool.utf8(&name_to_descriptor(datum.annotation_type()))?);

    let entries: Vec<(&str, &PropertyValue)> = datum.properties().iter().collect();
    push_u16(out, count(entries.len(), "marker properties")?);
    for (name, value) in entries {
        push_u16(out, pool.utf8(name)?);
        write_element(pool, out, value)?;
    }
    Ok(())
}

fn write_element(pool: &mut PoolWriter, out: &mut Vec<u8>, value: &PropertyValue) -> Result<()> {
    match value {
        PropertyValue::Scalar(scalar) => write_scalar(pool, out, scalar),
        PropertyValue::Array(values) => {
            out.push(b'[');
            push_u16(out, count(values.len(), "array elements")?);
            for scalar in values {
                write_scalar(pool, out, scalar)?;
            }
            Ok(())
        }
        PropertyValue::Datum(datum) => {
            out.push(b'@');
            write_annotation(pool, out, datum)
        }
        PropertyValue::DatumArray(data) => {
            out.push(b'[');
            push_u16(out, count(data.len(), "array elements")?);
            for datum in data {
                out.push(b'@');
                write_annotation(pool, out, datum)?;
            }
            Ok(())
        }
    }
}

fn write_scalar(pool: &mut PoolWriter, out: &mut Vec<u8>, value: &ScalarValue) -> Result<()> {
    let (tag, index) = match value {
        ScalarValue::Bool(value) => (b'Z', pool.intern(PoolKey::Integer(i32::from(*value)))?),
        ScalarValue::Char(value) => (b'C', pool.intern(PoolKey::Integer(*value as i32))?),
        ScalarValue::Byte(value) => (b'B', pool.intern(PoolKey::Integer(i32::from(*value)))?),
        ScalarValue::Short(value) => (b'S', pool.intern(PoolKey::Integer(i32::from(*value)))?),
        ScalarValue::Int(value) => (b'I', pool.intern(PoolKey::Integer(*value))?),
        ScalarValue::Long(value) => (b'J', pool.intern(PoolKey::Long(*value))?),
        ScalarValue::Float(value) => (b'F', pool.intern(PoolKey::Float(value.to_bits()))?),
        ScalarValue::Double(value) => (b'D', pool.intern(PoolKey::Double(value.to_bits()))?),
        ScalarValue::String(value) => (b's', pool.utf8(value)?),
        ScalarValue::Class(name) => (b'c', pool.utf8(&name_to_descriptor(name))?),
        ScalarValue::Enum {
            type_name,
            constant,
        } => {
            out.push(b'e');
            push_u16(out, pool.utf8(&name_to_descriptor(type_name))?);
            push_u16(out, pool.utf8(constant)?);
            return Ok(());
        }
    };

    out.push(tag);
    push_u16(out, index);
    Ok(())
}
