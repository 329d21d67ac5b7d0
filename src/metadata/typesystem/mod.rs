//! Host type model introspected by the live reader.
//!
//! Types registered by the host are described by [`TypeDescriptor`]s. A descriptor holds the
//! directly-declared members and markers of one type together with links to its base type and
//! implemented interfaces. Nothing here resolves inheritance; that is the job of
//! [`type_chain`] and the [`crate::metadata::resolver`].
//!
//! # Key Components
//!
//! - [`TypeDescriptor`]: a class or interface with its declared members and markers
//! - [`FieldDescriptor`], [`MethodDescriptor`], [`ConstructorDescriptor`],
//!   [`ParameterDescriptor`]: annotated members
//! - [`TypeBuilder`]: fluent construction of descriptors
//! - [`TypeRegistry`]: concurrent name → type lookup answering assignability queries
//! - [`type_chain`]: the ordered list of types a live digest inspects
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::typesystem::{type_chain, TypeBuilder, TypeFlags};
//!
//! let root = TypeBuilder::class("lang.Object").flags(TypeFlags::ROOT).build();
//! let named = TypeBuilder::interface("demo.Named").build();
//! let base = TypeBuilder::class("demo.Base").extends(&root).implements(&named).build();
//! let service = TypeBuilder::class("demo.Service").extends(&base).build();
//!
//! let names: Vec<String> = type_chain(&service, true, false)
//!     .iter()
//!     .map(|ty| ty.name.clone())
//!     .collect();
//! assert_eq!(names, ["demo.Service", "demo.Base", "demo.Named"]);
//! ```

mod builder;
mod chain;
mod members;
mod registry;

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use bitflags::bitflags;

pub use builder::{ConstructorBuilder, FieldBuilder, MethodBuilder, ParameterBuilder, TypeBuilder};
pub use chain::type_chain;
pub use members::{
    ConstructorDescriptor, ConstructorList, ConstructorRc, FieldDescriptor, FieldList, FieldRc,
    MemberSignature, MethodDescriptor, MethodFlags, MethodList, MethodRc, ParameterDescriptor,
    ParameterRc, VOID,
};
pub use registry::{ExactTypes, TypeHierarchy, TypeRegistry};

use crate::{
    metadata::datum::{simple_name, MetadataDatum},
    Result,
};

/// A vector that holds a list of `TypeDescriptor`
pub type TypeList = Arc<boxcar::Vec<TypeRc>>;
/// Reference to a `TypeDescriptor`
pub type TypeRc = Arc<TypeDescriptor>;
/// Directly-declared markers of a type or member
pub type AnnotationList = Arc<boxcar::Vec<MetadataDatum>>;

bitflags! {
    /// Kind and modifiers of a [`TypeDescriptor`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// The type is an interface
        const INTERFACE = 0x0001;
        /// The type is abstract
        const ABSTRACT = 0x0002;
        /// The type is itself a marker type
        const ANNOTATION = 0x0004;
        /// The type is an enumeration
        const ENUM = 0x0008;
        /// The type cannot be extended
        const FINAL = 0x0010;
        /// The universal base type; excluded from type chains unless requested
        const ROOT = 0x0020;
    }
}

/// A class or interface registered by the host.
///
/// Member and marker lists are append-only and may be filled after the descriptor has been
/// shared. The base type can be set exactly once.
pub struct TypeDescriptor {
    /// Fully-qualified name
    pub name: String,
    /// Kind and modifiers
    pub flags: TypeFlags,
    /// This types base aka 'extends'
    base: OnceLock<TypeRc>,
    /// All interfaces this type directly implements (or extends, for interfaces)
    pub interfaces: TypeList,
    /// All fields declared by this type
    pub fields: FieldList,
    /// All methods declared by this type
    pub methods: MethodList,
    /// All constructors declared by this type
    pub constructors: ConstructorList,
    /// All markers declared directly on this type
    pub annotations: AnnotationList,
}

impl TypeDescriptor {
    /// Create a new descriptor without base type, members or markers.
    pub fn new(name: impl Into<String>, flags: TypeFlags) -> Self {
        TypeDescriptor {
            name: name.into(),
            flags,
            base: OnceLock::new(),
            interfaces: Arc::new(boxcar::Vec::new()),
            fields: Arc::new(boxcar::Vec::new()),
            methods: Arc::new(boxcar::Vec::new()),
            constructors: Arc::new(boxcar::Vec::new()),
            annotations: Arc::new(boxcar::Vec::new()),
        }
    }

    /// The base type, if one was set.
    #[must_use]
    pub fn base(&self) -> Option<TypeRc> {
        self.base.get().cloned()
    }

    /// Set the base type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if a base type was already set.
    pub fn set_base(&self, base: TypeRc) -> Result<()> {
        self.base.set(base).map_err(|rejected| {
            crate::Error::Error(format!(
                "Base type of '{}' already set, cannot set '{}'",
                self.name, rejected.name
            ))
        })
    }

    /// The type name without its package or enclosing type.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeFlags::INTERFACE)
    }

    /// Returns `true` for the universal base type.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.flags.contains(TypeFlags::ROOT)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("base", &self.base.get().map(|base| base.name.as_str()))
            .field("interfaces", &self.interfaces.count())
            .field("fields", &self.fields.count())
            .field("methods", &self.methods.count())
            .field("constructors", &self.constructors.count())
            .field("annotations", &self.annotations.count())
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
