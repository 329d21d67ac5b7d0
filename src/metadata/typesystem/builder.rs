//! Fluent construction of [`TypeDescriptor`]s.
//!
//! Members are described through closures that receive a fresh member builder and return it
//! configured, so a whole type reads as a single expression.
//!
//! # Example
//!
//! ```rust
//! use metadigest::metadata::{
//!     datum::MetadataDatum,
//!     properties::PropertySet,
//!     typesystem::{MethodFlags, TypeBuilder},
//! };
//!
//! let inject: MetadataDatum = MetadataDatum::new("demo.Inject", PropertySet::new(), None)?;
//! let service = TypeBuilder::class("demo.Service")
//!     .field("name", "java.lang.String", |field| field.annotation(inject.clone()))
//!     .method("configure", |method| {
//!         method
//!             .parameter("int", |parameter| parameter.name("retries").annotation(inject.clone()))
//!             .flags(MethodFlags::PRIVATE)
//!     })
//!     .build();
//!
//! assert_eq!(service.fields.count(), 1);
//! assert_eq!(service.methods.count(), 1);
//! # Ok::<(), metadigest::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use crate::metadata::{
    datum::MetadataDatum,
    typesystem::{
        AnnotationList, ConstructorDescriptor, FieldDescriptor, MemberSignature,
        MethodDescriptor, MethodFlags, ParameterDescriptor, ParameterRc, TypeDescriptor,
        TypeFlags, TypeRc, VOID,
    },
};

fn annotation_list(annotations: Vec<MetadataDatum>) -> AnnotationList {
    let list = Arc::new(boxcar::Vec::with_capacity(annotations.len()));
    for annotation in annotations {
        list.push(annotation);
    }
    list
}

/// Provides a fluent API for building type descriptors
pub struct TypeBuilder {
    name: String,
    flags: TypeFlags,
    base: Option<TypeRc>,
    interfaces: Vec<TypeRc>,
    fields: Vec<FieldBuilder>,
    methods: Vec<MethodBuilder>,
    constructors: Vec<ConstructorBuilder>,
    annotations: Vec<MetadataDatum>,
}

impl TypeBuilder {
    /// Start building a class.
    pub fn class(name: impl Into<String>) -> Self {
        TypeBuilder {
            name: name.into(),
            flags: TypeFlags::empty(),
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Start building an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::class(name).flags(TypeFlags::INTERFACE | TypeFlags::ABSTRACT)
    }

    /// Add type flags.
    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the base type.
    #[must_use]
    pub fn extends(mut self, base: &TypeRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add a directly implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: &TypeRc) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declare a marker on the type.
    #[must_use]
    pub fn annotation(mut self, annotation: MetadataDatum) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declare a field.
    #[must_use]
    pub fn field<F>(mut self, name: impl Into<String>, field_type: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        self.fields.push(f(FieldBuilder {
            name: name.into(),
            field_type: field_type.into(),
            annotations: Vec::new(),
        }));
        self
    }

    /// Declare a method. The method returns [`VOID`] and takes no parameters unless configured.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.methods.push(f(MethodBuilder {
            name: name.into(),
            return_type: VOID.to_string(),
            flags: MethodFlags::empty(),
            parameters: Vec::new(),
            annotations: Vec::new(),
        }));
        self
    }

    /// Declare a constructor.
    #[must_use]
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ConstructorBuilder) -> ConstructorBuilder,
    {
        self.constructors.push(f(ConstructorBuilder {
            parameters: Vec::new(),
            annotations: Vec::new(),
        }));
        self
    }

    /// Finish the descriptor.
    #[must_use]
    pub fn build(self) -> TypeRc {
        let mut descriptor = TypeDescriptor::new(self.name, self.flags);
        if let Some(base) = self.base {
            descriptor.base = OnceLock::from(base);
        }

        for interface in self.interfaces {
            descriptor.interfaces.push(interface);
        }
        for annotation in self.annotations {
            descriptor.annotations.push(annotation);
        }
        for field in self.fields {
            descriptor.fields.push(Arc::new(FieldDescriptor {
                declaring_type: descriptor.name.clone(),
                name: field.name,
                field_type: field.field_type,
                annotations: annotation_list(field.annotations),
            }));
        }
        for method in self.methods {
            let parameter_types = method
                .parameters
                .iter()
                .map(|parameter| parameter.parameter_type.clone())
                .collect::<Vec<_>>();
            let member = format!(
                "{}.{}({})",
                descriptor.name,
                method.name,
                parameter_types.join(", ")
            );

            descriptor.methods.push(Arc::new(MethodDescriptor {
                declaring_type: descriptor.name.clone(),
                signature: MemberSignature::new(method.name, parameter_types, method.return_type),
                flags: method.flags,
                parameters: build_parameters(&member, method.parameters),
                annotations: annotation_list(method.annotations),
            }));
        }
        for constructor in self.constructors {
            let member = format!(
                "{}.<init>({})",
                descriptor.name,
                constructor
                    .parameters
                    .iter()
                    .map(|parameter| parameter.parameter_type.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            descriptor.constructors.push(Arc::new(ConstructorDescriptor {
                declaring_type: descriptor.name.clone(),
                parameters: build_parameters(&member, constructor.parameters),
                annotations: annotation_list(constructor.annotations),
            }));
        }

        Arc::new(descriptor)
    }
}

fn build_parameters(member: &str, parameters: Vec<ParameterBuilder>) -> Vec<ParameterRc> {
    parameters
        .into_iter()
        .enumerate()
        .map(|(index, parameter)| {
            Arc::new(ParameterDescriptor {
                member: member.to_string(),
                index,
                name: parameter.name,
                parameter_type: parameter.parameter_type,
                annotations: annotation_list(parameter.annotations),
            })
        })
        .collect()
}

/// Configures a field declared through [`TypeBuilder::field`]
pub struct FieldBuilder {
    name: String,
    field_type: String,
    annotations: Vec<MetadataDatum>,
}

impl FieldBuilder {
    /// Declare a marker on the field.
    #[must_use]
    pub fn annotation(mut self, annotation: MetadataDatum) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Configures a method declared through [`TypeBuilder::method`]
pub struct MethodBuilder {
    name: String,
    return_type: String,
    flags: MethodFlags,
    parameters: Vec<ParameterBuilder>,
    annotations: Vec<MetadataDatum>,
}

impl MethodBuilder {
    /// Set the fully-qualified return type name.
    #[must_use]
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// Add method flags.
    #[must_use]
    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn parameter<F>(mut self, parameter_type: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ParameterBuilder) -> ParameterBuilder,
    {
        self.parameters.push(f(ParameterBuilder::new(parameter_type)));
        self
    }

    /// Declare a marker on the method.
    #[must_use]
    pub fn annotation(mut self, annotation: MetadataDatum) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Configures a constructor declared through [`TypeBuilder::constructor`]
pub struct ConstructorBuilder {
    parameters: Vec<ParameterBuilder>,
    annotations: Vec<MetadataDatum>,
}

impl ConstructorBuilder {
    /// Append a parameter.
    #[must_use]
    pub fn parameter<F>(mut self, parameter_type: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ParameterBuilder) -> ParameterBuilder,
    {
        self.parameters.push(f(ParameterBuilder::new(parameter_type)));
        self
    }

    /// Declare a marker on the constructor.
    #[must_use]
    pub fn annotation(mut self, annotation: MetadataDatum) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Configures a parameter of a method or constructor
pub struct ParameterBuilder {
    parameter_type: String,
    name: Option<String>,
    annotations: Vec<MetadataDatum>,
}

impl ParameterBuilder {
    fn new(parameter_type: impl Into<String>) -> Self {
        ParameterBuilder {
            parameter_type: parameter_type.into(),
            name: None,
            annotations: Vec::new(),
        }
    }

    /// Set the declared parameter name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a marker on the parameter.
    #[must_use]
    pub fn annotation(mut self, annotation: MetadataDatum) -> Self {
        self.annotations.push(annotation);
        self
    }
}
