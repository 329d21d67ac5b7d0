//! Layered property storage backing every [`crate::metadata::datum::MetadataDatum`].
//!
//! A [`PropertySet`] is an ordered name → [`PropertyValue`] map with an optional parent. Lookups
//! that miss in the own layer fall through to the parent chain ("shadowing"). Layers are
//! reference-counted and copy-on-write: inserting into a set whose layer is shared clones the
//! layer first, so a parent that is reachable from other sets is never modified.
//!
//! # Value Model
//!
//! [`PropertyValue`] is a closed sum type:
//! - [`PropertyValue::Scalar`] - a single [`ScalarValue`]
//! - [`PropertyValue::Array`] - an ordered array of scalars (empty arrays always use this form)
//! - [`PropertyValue::Datum`] - a nested marker
//! - [`PropertyValue::DatumArray`] - an ordered marker array
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::properties::{PropertySet, PropertyValue};
//!
//! let parent = PropertySet::from([("extra", "x"), ("value", "1")]);
//! let mut child = PropertySet::with_parent(parent);
//! child.insert("value", "42");
//!
//! assert_eq!(child.get("value"), Some(&PropertyValue::from("42")));
//! assert_eq!(child.get("extra"), Some(&PropertyValue::from("x")));
//!
//! let orphan = child.orphan();
//! assert!(orphan.get("extra").is_none());
//! ```

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::IndexMap;
use strum::IntoStaticStr;

use crate::metadata::datum::MetadataDatum;

/// A single scalar marker value.
///
/// Floating point values compare and hash by their bit pattern, which makes `ScalarValue` usable
/// as part of a datum identity.
#[derive(Debug, Clone, IntoStaticStr)]
pub enum ScalarValue {
    /// Boolean value
    #[strum(serialize = "boolean")]
    Bool(bool),
    /// Character value
    #[strum(serialize = "char")]
    Char(char),
    /// Signed 8-bit integer
    #[strum(serialize = "byte")]
    Byte(i8),
    /// Signed 16-bit integer
    #[strum(serialize = "short")]
    Short(i16),
    /// Signed 32-bit integer
    #[strum(serialize = "int")]
    Int(i32),
    /// Signed 64-bit integer
    #[strum(serialize = "long")]
    Long(i64),
    /// 32-bit floating point
    #[strum(serialize = "float")]
    Float(f32),
    /// 64-bit floating point
    #[strum(serialize = "double")]
    Double(f64),
    /// String value
    #[strum(serialize = "string")]
    String(String),
    /// Enum constant
    #[strum(serialize = "enum")]
    Enum {
        /// Fully-qualified name of the enum type
        type_name: String,
        /// Name of the constant
        constant: String,
    },
    /// Class literal, as fully-qualified type name
    #[strum(serialize = "class")]
    Class(String),
}

impl ScalarValue {
    /// Returns the kind of this value, e.g. `"int"` or `"string"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Returns the string content if this is a [`ScalarValue::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Convenience constructor for [`ScalarValue::Enum`].
    pub fn enum_constant(type_name: impl Into<String>, constant: impl Into<String>) -> Self {
        ScalarValue::Enum {
            type_name: type_name.into(),
            constant: constant.into(),
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::{Bool, Byte, Char, Class, Double, Enum, Float, Int, Long, Short, String};
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) | (Class(a), Class(b)) => a == b,
            (
                Enum {
                    type_name: a_type,
                    constant: a_constant,
                },
                Enum {
                    type_name: b_type,
                    constant: b_constant,
                },
            ) => a_type == b_type && a_constant == b_constant,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Bool(value) => value.hash(state),
            ScalarValue::Char(value) => value.hash(state),
            ScalarValue::Byte(value) => value.hash(state),
            ScalarValue::Short(value) => value.hash(state),
            ScalarValue::Int(value) => value.hash(state),
            ScalarValue::Long(value) => value.hash(state),
            ScalarValue::Float(value) => value.to_bits().hash(state),
            ScalarValue::Double(value) => value.to_bits().hash(state),
            ScalarValue::String(value) | ScalarValue::Class(value) => value.hash(state),
            ScalarValue::Enum {
                type_name,
                constant,
            } => {
                type_name.hash(state);
                constant.hash(state);
            }
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(value) => write!(f, "{value}"),
            ScalarValue::Char(value) => write!(f, "{value}"),
            ScalarValue::Byte(value) => write!(f, "{value}"),
            ScalarValue::Short(value) => write!(f, "{value}"),
            ScalarValue::Int(value) => write!(f, "{value}"),
            ScalarValue::Long(value) => write!(f, "{value}"),
            ScalarValue::Float(value) => write!(f, "{value}"),
            ScalarValue::Double(value) => write!(f, "{value}"),
            ScalarValue::String(value) | ScalarValue::Class(value) => f.write_str(value),
            ScalarValue::Enum {
                type_name,
                constant,
            } => write!(f, "{type_name}.{constant}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    ScalarValue::$variant(value.into())
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    &str => String,
}

/// A value stored in a [`PropertySet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    /// A single scalar
    Scalar(ScalarValue),
    /// An ordered array of scalars
    Array(Vec<ScalarValue>),
    /// A nested marker
    Datum(MetadataDatum),
    /// An ordered array of nested markers
    DatumArray(Vec<MetadataDatum>),
}

impl PropertyValue {
    /// Returns the scalar if this is a [`PropertyValue::Scalar`].
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the nested marker if this is a [`PropertyValue::Datum`].
    #[must_use]
    pub fn as_datum(&self) -> Option<&MetadataDatum> {
        match self {
            PropertyValue::Datum(datum) => Some(datum),
            _ => None,
        }
    }

    /// Returns the nested markers if this is a [`PropertyValue::DatumArray`].
    #[must_use]
    pub fn as_datum_array(&self) -> Option<&[MetadataDatum]> {
        match self {
            PropertyValue::DatumArray(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the string content if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(ScalarValue::as_str)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(value) => write!(f, "{value}"),
            PropertyValue::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            PropertyValue::Datum(datum) => write!(f, "@{}", datum.annotation_type()),
            PropertyValue::DatumArray(data) => {
                f.write_str("[")?;
                for (index, datum) in data.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "@{}", datum.annotation_type())?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! property_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Scalar(value.into())
                }
            }
        )*
    };
}

property_from_scalar!(ScalarValue, bool, char, i8, i16, i32, i64, f32, f64, String, &str);

impl From<MetadataDatum> for PropertyValue {
    fn from(datum: MetadataDatum) -> Self {
        PropertyValue::Datum(datum)
    }
}

impl From<Vec<MetadataDatum>> for PropertyValue {
    fn from(data: Vec<MetadataDatum>) -> Self {
        PropertyValue::DatumArray(data)
    }
}

impl From<Vec<ScalarValue>> for PropertyValue {
    fn from(values: Vec<ScalarValue>) -> Self {
        PropertyValue::Array(values)
    }
}

#[derive(Clone, Default)]
struct Layer {
    entries: IndexMap<String, PropertyValue>,
    parent: Option<PropertySet>,
}

/// An ordered, shadow-chained key → value store.
///
/// Cloning a `PropertySet` is cheap: layers are shared until one of the clones is modified.
#[derive(Clone, Default)]
pub struct PropertySet {
    layer: Arc<Layer>,
}

impl PropertySet {
    /// Creates an empty set without a parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set whose lookups fall back to `parent`.
    #[must_use]
    pub fn with_parent(parent: PropertySet) -> Self {
        PropertySet {
            layer: Arc::new(Layer {
                entries: IndexMap::new(),
                parent: Some(parent),
            }),
        }
    }

    /// Inserts a value into the own layer, returning the previous own value for `key`.
    ///
    /// If the layer is shared with other sets it is copied first.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        Arc::make_mut(&mut self.layer)
            .entries
            .insert(key.into(), value.into())
    }

    /// Looks up `key`, following the parent chain.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.layers().find_map(|set| set.layer.entries.get(key))
    }

    /// Looks up `key` in the own layer only.
    #[must_use]
    pub fn get_own(&self, key: &str) -> Option<&PropertyValue> {
        self.layer.entries.get(key)
    }

    /// Returns `true` if `key` resolves in this set or any parent.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the parent set, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&PropertySet> {
        self.layer.parent.as_ref()
    }

    /// Number of layers in the chain, including this one.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers().count()
    }

    /// Returns a copy of the own layer with the parent link removed.
    ///
    /// Entries that were only reachable through the parent are not part of the result.
    #[must_use]
    pub fn orphan(&self) -> PropertySet {
        PropertySet {
            layer: Arc::new(Layer {
                entries: self.layer.entries.clone(),
                parent: None,
            }),
        }
    }

    /// Returns a single-layer set holding the resolved entries of the whole chain.
    #[must_use]
    pub fn flatten(&self) -> PropertySet {
        PropertySet {
            layer: Arc::new(Layer {
                entries: self
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
                parent: None,
            }),
        }
    }

    /// Returns a set holding the resolved entries of `self` on top of `parent`.
    ///
    /// Entries of `self` win; everything else resolves through `parent`. Neither input is
    /// modified.
    #[must_use]
    pub fn shadowing(&self, parent: &PropertySet) -> PropertySet {
        let mut flattened = self.flatten();
        Arc::make_mut(&mut flattened.layer).parent = Some(parent.clone());
        flattened
    }

    /// Iterates over the resolved entries: own keys in insertion order, then every parent key
    /// that is not shadowed.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        let mut resolved: IndexMap<&str, &PropertyValue> = IndexMap::new();
        for set in self.layers() {
            for (key, value) in &set.layer.entries {
                resolved.entry(key.as_str()).or_insert(value);
            }
        }
        resolved.into_iter()
    }

    /// Iterates over the own layer only.
    pub fn own_entries(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.layer
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Resolved keys, in the same order as [`PropertySet::iter`].
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(key, _)| key)
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no key resolves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers().all(|set| set.layer.entries.is_empty())
    }

    fn layers(&self) -> impl Iterator<Item = &PropertySet> {
        std::iter::successors(Some(self), |set| set.layer.parent.as_ref())
    }
}

impl PartialEq for PropertySet {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.layer, &other.layer) {
            return true;
        }

        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for PropertySet {}

impl Hash for PropertySet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // order independent, to agree with PartialEq
        let mut combined = 0u64;
        let mut count = 0usize;
        for (key, value) in self.iter() {
            let mut entry_hasher = DefaultHasher::new();
            key.hash(&mut entry_hasher);
            value.hash(&mut entry_hasher);
            combined = combined.wrapping_add(entry_hasher.finish());
            count += 1;
        }
        state.write_usize(count);
        state.write_u64(combined);
    }
}

impl fmt::Debug for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl<K: Into<String>, V: Into<PropertyValue>, const N: usize> From<[(K, V); N]> for PropertySet {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}
