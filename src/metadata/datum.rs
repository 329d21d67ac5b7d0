//! The unit of captured marker data.
//!
//! A [`MetadataDatum`] couples the identifier of a marker type with the [`PropertySet`] holding its
//! values, and optionally with the program element the marker was read from. The element is
//! generic: live readers attach [`crate::metadata::typesystem::TypeRc`],
//! [`crate::metadata::typesystem::MethodRc`] and friends, while nested markers and binary decodes
//! carry no element.
//!
//! Equality and hashing only look at the annotation type and the resolved properties. Two data
//! read from different members compare equal when they carry the same values.
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::{datum::MetadataDatum, properties::PropertySet};
//!
//! let datum: MetadataDatum = MetadataDatum::new(
//!     "com.example.Named",
//!     PropertySet::from([("value", "primary")]),
//!     None,
//! )?;
//!
//! let overlay = PropertySet::from([("value", "secondary")]);
//! let derived = datum.with_shadowing_properties(&overlay);
//!
//! assert_eq!(datum.get("value").and_then(|v| v.as_str()), Some("primary"));
//! assert_eq!(derived.get("value").and_then(|v| v.as_str()), Some("secondary"));
//! assert_eq!(derived.simple_name(), "Named");
//! # Ok::<(), metadigest::Error>(())
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    metadata::properties::{PropertySet, PropertyValue},
    Result,
};

/// An immutable marker instance.
///
/// `E` is the kind of program element the marker is attached to. Derivations return new data and
/// never modify `self`.
#[derive(Debug, Clone)]
pub struct MetadataDatum<E = ()> {
    annotation_type: Arc<str>,
    properties: PropertySet,
    element: Option<E>,
}

impl<E> MetadataDatum<E> {
    /// Create a new datum.
    ///
    /// # Arguments
    /// * `annotation_type` - Fully-qualified name of the marker type
    /// * `properties` - The marker's values
    /// * `element` - The annotated program element, if known
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `annotation_type` is empty or only whitespace.
    pub fn new(
        annotation_type: impl Into<String>,
        properties: PropertySet,
        element: Option<E>,
    ) -> Result<Self> {
        let annotation_type = annotation_type.into();
        if annotation_type.trim().is_empty() {
            return Err(malformed_error!("Marker datum without annotation type"));
        }

        Ok(MetadataDatum {
            annotation_type: Arc::from(annotation_type),
            properties,
            element,
        })
    }

    /// Fully-qualified name of the marker type.
    #[must_use]
    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    /// The marker type name without its package or enclosing type.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        simple_name(&self.annotation_type)
    }

    /// The marker's values.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// The annotated program element, if known.
    #[must_use]
    pub fn element(&self) -> Option<&E> {
        self.element.as_ref()
    }

    /// Resolve a single property, following shadow parents.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.properties.get(property)
    }

    /// Returns a datum with the same type and properties, attached to `element`.
    #[must_use]
    pub fn with_element<F>(&self, element: Option<F>) -> MetadataDatum<F> {
        MetadataDatum {
            annotation_type: Arc::clone(&self.annotation_type),
            properties: self.properties.clone(),
            element,
        }
    }

    /// Returns a datum with the same type and properties and no element.
    #[must_use]
    pub fn detached(&self) -> MetadataDatum {
        self.with_element(None)
    }
}

impl<E: Clone> MetadataDatum<E> {
    /// Returns a datum whose properties are `overlay` layered on top of the current ones.
    ///
    /// Entries of `overlay` win; every other entry stays reachable through the shadow chain.
    #[must_use]
    pub fn with_shadowing_properties(&self, overlay: &PropertySet) -> Self {
        MetadataDatum {
            annotation_type: Arc::clone(&self.annotation_type),
            properties: overlay.shadowing(&self.properties),
            element: self.element.clone(),
        }
    }

    /// Returns a datum whose properties are cut off from their shadow parents.
    #[must_use]
    pub fn shallow(&self) -> Self {
        MetadataDatum {
            annotation_type: Arc::clone(&self.annotation_type),
            properties: self.properties.orphan(),
            element: self.element.clone(),
        }
    }
}

impl<E> PartialEq for MetadataDatum<E> {
    fn eq(&self, other: &Self) -> bool {
        self.annotation_type == other.annotation_type && self.properties == other.properties
    }
}

impl<E> Eq for MetadataDatum<E> {}

impl<E> Hash for MetadataDatum<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation_type.hash(state);
        self.properties.hash(state);
    }
}

impl<E> fmt::Display for MetadataDatum<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.annotation_type)?;
        for (index, (key, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str(")")
    }
}

/// Strip the package and enclosing types from a fully-qualified name.
pub(crate) fn simple_name(name: &str) -> &str {
    name.rsplit(['.', '$']).next().unwrap_or(name)
}
