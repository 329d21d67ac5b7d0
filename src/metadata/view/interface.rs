//! Target interfaces for views.
//!
//! An [`InterfaceDescriptor`] names a marker type and declares the methods a
//! [`crate::metadata::view::View`] answers, each with a [`ReturnType`] and an optional default
//! value.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::metadata::properties::PropertyValue;

/// Reference-counted interface description, shared between views and nested return types
pub type InterfaceRc = Arc<InterfaceDescriptor>;

/// Declared return type of an interface method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// `boolean`
    Bool,
    /// `char`
    Char,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `java.lang.String`
    String,
    /// Constant of the named enum type
    Enum(String),
    /// Class literal
    Class,
    /// Array of a scalar type
    Array(Box<ReturnType>),
    /// Nested marker, materialized as a view of the interface
    Marker(InterfaceRc),
    /// Marker array, every element materialized as a view of the interface
    MarkerArray(InterfaceRc),
}

impl ReturnType {
    /// Shorthand for [`ReturnType::Array`].
    #[must_use]
    pub fn array_of(element: ReturnType) -> Self {
        ReturnType::Array(Box::new(element))
    }

    /// Returns `true` for the marker and marker-array types.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        matches!(self, ReturnType::Marker(_) | ReturnType::MarkerArray(_))
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Bool => f.write_str("boolean"),
            ReturnType::Char => f.write_str("char"),
            ReturnType::Byte => f.write_str("byte"),
            ReturnType::Short => f.write_str("short"),
            ReturnType::Int => f.write_str("int"),
            ReturnType::Long => f.write_str("long"),
            ReturnType::Float => f.write_str("float"),
            ReturnType::Double => f.write_str("double"),
            ReturnType::String => f.write_str("java.lang.String"),
            ReturnType::Enum(name) => f.write_str(name),
            ReturnType::Class => f.write_str("java.lang.Class"),
            ReturnType::Array(element) => write!(f, "{element}[]"),
            ReturnType::Marker(interface) => f.write_str(&interface.annotation_type),
            ReturnType::MarkerArray(interface) => write!(f, "{}[]", interface.annotation_type),
        }
    }
}

/// One method of an [`InterfaceDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    /// Method name, equal to the property it reads
    pub name: String,
    /// Declared return type
    pub return_type: ReturnType,
    /// Value used when the property is absent
    pub default: Option<PropertyValue>,
    /// Absence without default is an error instead of `None`
    pub required: bool,
}

impl InterfaceMethod {
    /// An optional method without default.
    pub fn new(name: impl Into<String>, return_type: ReturnType) -> Self {
        InterfaceMethod {
            name: name.into(),
            return_type,
            default: None,
            required: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the method as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The shape a view is materialized against: a marker type and its methods.
///
/// # Examples
///
/// ```rust
/// use metadigest::metadata::view::{InterfaceDescriptor, InterfaceMethod, ReturnType};
///
/// let column = InterfaceDescriptor::new("demo.Column")
///     .method(InterfaceMethod::new("name", ReturnType::String).required())
///     .method(InterfaceMethod::new("length", ReturnType::Int).default_value(255))
///     .build();
///
/// assert_eq!(column.methods().count(), 2);
/// assert!(column.method_named("length").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    /// Fully-qualified marker type name
    pub annotation_type: String,
    methods: IndexMap<String, InterfaceMethod>,
}

impl InterfaceDescriptor {
    /// An interface without methods.
    pub fn new(annotation_type: impl Into<String>) -> Self {
        InterfaceDescriptor {
            annotation_type: annotation_type.into(),
            methods: IndexMap::new(),
        }
    }

    /// Adds `method`, replacing an earlier one with the same name.
    #[must_use]
    pub fn method(mut self, method: InterfaceMethod) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// Wraps the descriptor for sharing.
    #[must_use]
    pub fn build(self) -> InterfaceRc {
        Arc::new(self)
    }

    /// Declared methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &InterfaceMethod> {
        self.methods.values()
    }

    /// The method called `name`.
    #[must_use]
    pub fn method_named(&self, name: &str) -> Option<&InterfaceMethod> {
        self.methods.get(name)
    }
}
