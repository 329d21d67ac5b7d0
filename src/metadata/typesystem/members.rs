//! Annotated members of a [`crate::metadata::typesystem::TypeDescriptor`].
//!
//! Members are identified by their declaring type name plus their signature, so two descriptors
//! built independently for the same member compare equal and hash alike. This lets them serve as
//! keys of the per-member maps produced by the readers.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bitflags::bitflags;

use crate::metadata::typesystem::AnnotationList;

/// Return type name of methods that produce no value
pub const VOID: &str = "void";

/// A vector that holds a list of `FieldDescriptor`
pub type FieldList = Arc<boxcar::Vec<FieldRc>>;
/// Reference to a `FieldDescriptor`
pub type FieldRc = Arc<FieldDescriptor>;
/// A vector that holds a list of `MethodDescriptor`
pub type MethodList = Arc<boxcar::Vec<MethodRc>>;
/// Reference to a `MethodDescriptor`
pub type MethodRc = Arc<MethodDescriptor>;
/// A vector that holds a list of `ConstructorDescriptor`
pub type ConstructorList = Arc<boxcar::Vec<ConstructorRc>>;
/// Reference to a `ConstructorDescriptor`
pub type ConstructorRc = Arc<ConstructorDescriptor>;
/// Reference to a `ParameterDescriptor`
pub type ParameterRc = Arc<ParameterDescriptor>;

bitflags! {
    /// Modifiers of a [`MethodDescriptor`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        /// Class-level method; never overrides and is never overridden
        const STATIC = 0x0001;
        /// Not visible to subtypes; never overrides and is never overridden
        const PRIVATE = 0x0002;
    }
}

/// Name, parameter types and return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Method name
    pub name: String,
    /// Fully-qualified parameter type names, in declaration order
    pub parameter_types: Vec<String>,
    /// Fully-qualified return type name, [`VOID`] if none
    pub return_type: String,
}

impl MemberSignature {
    /// Create a new signature.
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<String>,
        return_type: impl Into<String>,
    ) -> Self {
        MemberSignature {
            name: name.into(),
            parameter_types,
            return_type: return_type.into(),
        }
    }

    /// Returns `true` for methods taking no parameters and returning nothing.
    #[must_use]
    pub fn is_void_no_arg(&self) -> bool {
        self.parameter_types.is_empty() && self.return_type == VOID
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.return_type,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

/// A field declared by a type.
#[derive(Debug)]
pub struct FieldDescriptor {
    /// Fully-qualified name of the declaring type
    pub declaring_type: String,
    /// Field name
    pub name: String,
    /// Fully-qualified type name of the field
    pub field_type: String,
    /// Markers declared on the field
    pub annotations: AnnotationList,
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type && self.name == other.name
    }
}

impl Eq for FieldDescriptor {}

impl Hash for FieldDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// A method declared by a type.
#[derive(Debug)]
pub struct MethodDescriptor {
    /// Fully-qualified name of the declaring type
    pub declaring_type: String,
    /// Name, parameter and return types
    pub signature: MemberSignature,
    /// Modifiers
    pub flags: MethodFlags,
    /// Parameters, indexed by position
    pub parameters: Vec<ParameterRc>,
    /// Markers declared on the method
    pub annotations: AnnotationList,
}

impl MethodDescriptor {
    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Returns `true` for methods hidden from subtypes.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.flags.contains(MethodFlags::PRIVATE)
    }

    /// Returns `true` if at least one marker is declared directly on this method.
    #[must_use]
    pub fn has_annotations(&self) -> bool {
        self.annotations.count() > 0
    }

    /// Returns `true` if any parameter carries a marker.
    #[must_use]
    pub fn has_parameter_annotations(&self) -> bool {
        self.parameters
            .iter()
            .any(|parameter| parameter.annotations.count() > 0)
    }
}

impl PartialEq for MethodDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type && self.signature == other.signature
    }
}

impl Eq for MethodDescriptor {}

impl Hash for MethodDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        self.signature.hash(state);
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.declaring_type,
            self.signature.name,
            self.signature.parameter_types.join(", ")
        )
    }
}

/// A constructor declared by a type.
#[derive(Debug)]
pub struct ConstructorDescriptor {
    /// Fully-qualified name of the declaring type
    pub declaring_type: String,
    /// Parameters, indexed by position
    pub parameters: Vec<ParameterRc>,
    /// Markers declared on the constructor
    pub annotations: AnnotationList,
}

impl ConstructorDescriptor {
    /// Fully-qualified parameter type names, in declaration order.
    pub fn parameter_types(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .map(|parameter| parameter.parameter_type.as_str())
    }

    /// Returns `true` if any parameter carries a marker.
    #[must_use]
    pub fn has_parameter_annotations(&self) -> bool {
        self.parameters
            .iter()
            .any(|parameter| parameter.annotations.count() > 0)
    }
}

impl PartialEq for ConstructorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type
            && self.parameter_types().eq(other.parameter_types())
    }
}

impl Eq for ConstructorDescriptor {}

impl Hash for ConstructorDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        for parameter_type in self.parameter_types() {
            parameter_type.hash(state);
        }
    }
}

impl fmt::Display for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.<init>({})",
            self.declaring_type,
            self.parameter_types().collect::<Vec<_>>().join(", ")
        )
    }
}

/// A method or constructor parameter.
#[derive(Debug)]
pub struct ParameterDescriptor {
    /// Rendered identity of the owning method or constructor
    pub member: String,
    /// Zero-based position
    pub index: usize,
    /// Declared name, when known
    pub name: Option<String>,
    /// Fully-qualified type name
    pub parameter_type: String,
    /// Markers declared on the parameter
    pub annotations: AnnotationList,
}

impl PartialEq for ParameterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member && self.index == other.index
    }
}

impl Eq for ParameterDescriptor {}

impl Hash for ParameterDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.hash(state);
        self.index.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(declaring_type: &str, name: &str, ret: &str) -> MethodDescriptor {
        MethodDescriptor {
            declaring_type: declaring_type.to_string(),
            signature: MemberSignature::new(name, vec!["int".to_string()], ret),
            flags: MethodFlags::empty(),
            parameters: Vec::new(),
            annotations: Arc::new(boxcar::Vec::new()),
        }
    }

    #[test]
    fn method_identity_is_declaring_type_and_signature() {
        assert_eq!(method("a.A", "f", "int"), method("a.A", "f", "int"));
        assert_ne!(method("a.A", "f", "int"), method("a.B", "f", "int"));
        assert_ne!(method("a.A", "f", "int"), method("a.A", "f", "long"));
        assert_eq!(method("a.A", "f", "int").to_string(), "a.A.f(int)");
    }

    #[test]
    fn void_no_arg() {
        assert!(MemberSignature::new("run", Vec::new(), VOID).is_void_no_arg());
        assert!(!MemberSignature::new("name", Vec::new(), "java.lang.String").is_void_no_arg());
        assert!(!MemberSignature::new("set", vec!["int".into()], VOID).is_void_no_arg());
    }
}
