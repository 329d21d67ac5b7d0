//! Typed views over captured markers.
//!
//! A [`View`] answers the methods of an [`InterfaceDescriptor`] from the properties of one
//! [`MetadataDatum`]. Materialization builds a dispatch table once: every declared method maps to
//! a closure that reads the property of the same name and converts it to the declared
//! [`ReturnType`]. Nested markers and marker arrays become views of their own, built lazily on
//! access.
//!
//! # Resolution
//!
//! Invoking a method:
//! 1. reads the property, following shadowing parents unless the view is
//!    [`MaterializeMode::Shallow`]
//! 2. if absent, falls back to the declared default, returns `None`, or fails with
//!    [`crate::Error::MissingProperty`] for required methods
//! 3. materializes nested markers for marker return types
//! 4. otherwise converts the value, failing with [`crate::Error::Coercion`]
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::{
//!     datum::MetadataDatum,
//!     properties::PropertySet,
//!     view::{materialize, InterfaceDescriptor, InterfaceMethod, ReturnType},
//! };
//!
//! let datum: MetadataDatum =
//!     MetadataDatum::new("demo.Limit", PropertySet::from([("value", "42")]), None)?;
//! let limit = InterfaceDescriptor::new("demo.Limit")
//!     .method(InterfaceMethod::new("value", ReturnType::Int))
//!     .build();
//!
//! let view = materialize(&datum, &limit);
//! assert_eq!(view.get::<i32>("value")?, Some(42));
//! # Ok::<(), metadigest::Error>(())
//! ```

mod coerce;
mod interface;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

pub use coerce::{coerce, coerce_scalar, ConversionError};
pub use interface::{InterfaceDescriptor, InterfaceMethod, InterfaceRc, ReturnType};

use crate::{
    metadata::{
        datum::MetadataDatum,
        properties::{PropertySet, PropertyValue, ScalarValue},
    },
    Error, Result,
};

/// Whether a view sees inherited (shadowed) properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterializeMode {
    /// Properties are resolved through the whole shadowing chain
    #[default]
    Deep,
    /// Only the datum's own layer is visible
    Shallow,
}

/// Result of invoking a view method.
#[derive(Debug, Clone)]
pub enum ViewValue {
    /// A scalar converted to the declared type
    Scalar(ScalarValue),
    /// A scalar array converted element-wise
    Array(Vec<ScalarValue>),
    /// A nested marker
    View(View),
    /// A nested marker array
    Views(Vec<View>),
}

type Accessor = Box<dyn Fn(&ViewInner) -> Result<Option<ViewValue>> + Send + Sync>;

struct ViewInner {
    interface: InterfaceRc,
    datum: MetadataDatum,
    mode: MaterializeMode,
    dispatch: IndexMap<String, Accessor>,
}

/// An interface implemented by reading marker properties.
///
/// Views are immutable and cheap to clone.
#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

fn coercion_error(
    inner: &ViewInner,
    method: &InterfaceMethod,
    value: &PropertyValue,
    source: ConversionError,
) -> Error {
    Error::Coercion {
        annotation_type: inner.datum.annotation_type().to_string(),
        property: method.name.clone(),
        value: value.to_string(),
        target: method.return_type.to_string(),
        source,
    }
}

fn convert(inner: &ViewInner, method: &InterfaceMethod, value: &PropertyValue) -> Result<ViewValue> {
    match (&method.return_type, value) {
        (ReturnType::Marker(interface), PropertyValue::Datum(datum)) => Ok(ViewValue::View(
            materialize_with(datum, interface, inner.mode, None),
        )),
        (ReturnType::MarkerArray(interface), PropertyValue::DatumArray(data)) => Ok(
            ViewValue::Views(
                data.iter()
                    .map(|datum| materialize_with(datum, interface, inner.mode, None))
                    .collect(),
            ),
        ),
        (ReturnType::MarkerArray(interface), PropertyValue::Datum(datum)) => Ok(ViewValue::Views(
            vec![materialize_with(datum, interface, inner.mode, None)],
        )),
        (ReturnType::MarkerArray(_), PropertyValue::Array(items)) if items.is_empty() => {
            Ok(ViewValue::Views(Vec::new()))
        }
        (ReturnType::Marker(_) | ReturnType::MarkerArray(_), other) => Err(coercion_error(
            inner,
            method,
            other,
            ConversionError::Incompatible {
                from: match other {
                    PropertyValue::Scalar(scalar) => scalar.kind(),
                    PropertyValue::Array(_) => "array",
                    PropertyValue::Datum(_) => "marker",
                    PropertyValue::DatumArray(_) => "marker array",
                },
                target: method.return_type.to_string(),
            },
        )),
        (return_type, stored) => match coerce(stored, return_type) {
            Ok(PropertyValue::Scalar(scalar)) => Ok(ViewValue::Scalar(scalar)),
            Ok(PropertyValue::Array(items)) => Ok(ViewValue::Array(items)),
            Ok(_) => Err(Error::Error(format!(
                "'{}' converted to a non-scalar value",
                method.name
            ))),
            Err(source) => Err(coercion_error(inner, method, stored, source)),
        },
    }
}

fn accessor(method: InterfaceMethod) -> Accessor {
    Box::new(move |inner: &ViewInner| {
        match inner
            .datum
            .properties()
            .get(&method.name)
            .or(method.default.as_ref())
        {
            Some(value) => convert(inner, &method, value).map(Some),
            None if method.required => Err(Error::MissingProperty {
                annotation_type: inner.datum.annotation_type().to_string(),
                property: method.name.clone(),
            }),
            None => Ok(None),
        }
    })
}

/// Materialize `datum` as a deep view of `interface`.
pub fn materialize<E>(datum: &MetadataDatum<E>, interface: &InterfaceRc) -> View {
    materialize_with(datum, interface, MaterializeMode::Deep, None)
}

/// Materialize `datum` as a view of `interface` that ignores inherited properties.
pub fn materialize_shallow<E>(datum: &MetadataDatum<E>, interface: &InterfaceRc) -> View {
    materialize_with(datum, interface, MaterializeMode::Shallow, None)
}

/// Materialize `datum` as a view of `interface`.
///
/// In [`MaterializeMode::Shallow`] the datum's properties are orphaned first. `overlay`, if given,
/// is then layered on top of them; the datum itself is never modified.
pub fn materialize_with<E>(
    datum: &MetadataDatum<E>,
    interface: &InterfaceRc,
    mode: MaterializeMode,
    overlay: Option<&PropertySet>,
) -> View {
    let mut datum = datum.detached();
    if mode == MaterializeMode::Shallow {
        datum = datum.shallow();
    }
    if let Some(overlay) = overlay {
        datum = datum.with_shadowing_properties(overlay);
    }

    let dispatch = interface
        .methods()
        .map(|method| (method.name.clone(), accessor(method.clone())))
        .collect();

    View {
        inner: Arc::new(ViewInner {
            interface: interface.clone(),
            datum,
            mode,
            dispatch,
        }),
    }
}

/// Materialize `datum` as the typed view `T`.
///
/// # Errors
/// Returns the error of [`MarkerView::from_view`].
pub fn materialize_as<T: MarkerView, E>(datum: &MetadataDatum<E>) -> Result<T> {
    T::from_view(materialize(datum, &T::interface()))
}

impl View {
    /// The interface this view implements.
    #[must_use]
    pub fn interface(&self) -> &InterfaceRc {
        &self.inner.interface
    }

    /// Marker type of the backing datum.
    #[must_use]
    pub fn annotation_type(&self) -> &str {
        self.inner.datum.annotation_type()
    }

    /// The backing datum, with the mode and overlay applied.
    #[must_use]
    pub fn datum(&self) -> &MetadataDatum {
        &self.inner.datum
    }

    /// The materialization mode.
    #[must_use]
    pub fn mode(&self) -> MaterializeMode {
        self.inner.mode
    }

    /// Names of the methods the view answers.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.inner.dispatch.keys().map(String::as_str)
    }

    /// Invoke `method`.
    ///
    /// # Errors
    /// - [`Error::UnknownMethod`] if the interface does not declare `method`
    /// - [`Error::MissingProperty`] if a required property is absent
    /// - [`Error::Coercion`] if the stored value does not convert to the declared type
    pub fn invoke(&self, method: &str) -> Result<Option<ViewValue>> {
        match self.inner.dispatch.get(method) {
            Some(accessor) => accessor(&self.inner),
            None => Err(Error::UnknownMethod {
                interface: self.inner.interface.annotation_type.clone(),
                method: method.to_string(),
            }),
        }
    }

    /// Invoke `method` and convert the result to `T`.
    ///
    /// # Errors
    /// Returns the errors of [`View::invoke`], and [`Error::Coercion`] if the value is not a `T`.
    pub fn get<T: FromViewValue>(&self, method: &str) -> Result<Option<T>> {
        let Some(value) = self.invoke(method)? else {
            return Ok(None);
        };

        let rendered = format!("{value:?}");
        T::from_view_value(value).map(Some).map_err(|source| Error::Coercion {
            annotation_type: self.annotation_type().to_string(),
            property: method.to_string(),
            value: rendered,
            target: std::any::type_name::<T>().to_string(),
            source,
        })
    }

    /// Like [`View::get`], but absence is an error.
    ///
    /// # Errors
    /// Returns the errors of [`View::get`], and [`Error::MissingProperty`] if the property is
    /// absent and has no default.
    pub fn require<T: FromViewValue>(&self, method: &str) -> Result<T> {
        self.get(method)?.ok_or_else(|| Error::MissingProperty {
            annotation_type: self.annotation_type().to_string(),
            property: method.to_string(),
        })
    }

    /// Invoke a marker-typed `method` and convert the nested view to `T`.
    ///
    /// # Errors
    /// Returns the errors of [`View::get`] and [`MarkerView::from_view`].
    pub fn nested<T: MarkerView>(&self, method: &str) -> Result<Option<T>> {
        self.get::<View>(method)?.map(T::from_view).transpose()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("interface", &self.inner.interface.annotation_type)
            .field("mode", &self.inner.mode)
            .field("properties", self.inner.datum.properties())
            .finish()
    }
}

/// A Rust type a [`View`] can be turned into.
pub trait MarkerView: Sized {
    /// The interface instances are materialized against.
    fn interface() -> InterfaceRc;

    /// Read the typed value out of a view.
    ///
    /// # Errors
    /// Returns the errors of the view accesses.
    fn from_view(view: View) -> Result<Self>;
}

/// Conversion from a [`ViewValue`] to a Rust type.
pub trait FromViewValue: Sized {
    /// Convert `value`.
    ///
    /// # Errors
    /// Returns [`ConversionError::Incompatible`] if `value` holds a different kind.
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError>;
}

fn view_value_kind(value: &ViewValue) -> &'static str {
    match value {
        ViewValue::Scalar(scalar) => scalar.kind(),
        ViewValue::Array(_) => "array",
        ViewValue::View(_) => "marker",
        ViewValue::Views(_) => "marker array",
    }
}

fn mismatch<T>(value: &ViewValue) -> ConversionError {
    ConversionError::Incompatible {
        from: view_value_kind(value),
        target: std::any::type_name::<T>().to_string(),
    }
}

macro_rules! from_view_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromViewValue for $ty {
                fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
                    match value {
                        ViewValue::Scalar(ScalarValue::$variant(inner)) => Ok(inner),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

from_view_scalar! {
    bool => Bool,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl FromViewValue for String {
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
        match value {
            ViewValue::Scalar(ScalarValue::String(inner) | ScalarValue::Class(inner)) => Ok(inner),
            ViewValue::Scalar(ScalarValue::Enum { constant, .. }) => Ok(constant),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromViewValue for ScalarValue {
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
        match value {
            ViewValue::Scalar(inner) => Ok(inner),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromViewValue for View {
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
        match value {
            ViewValue::View(inner) => Ok(inner),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromViewValue for ViewValue {
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
        Ok(value)
    }
}

impl<T: FromViewValue> FromViewValue for Vec<T> {
    fn from_view_value(value: ViewValue) -> std::result::Result<Self, ConversionError> {
        match value {
            ViewValue::Array(items) => items
                .into_iter()
                .map(|item| T::from_view_value(ViewValue::Scalar(item)))
                .collect(),
            ViewValue::Views(views) => views
                .into_iter()
                .map(|view| T::from_view_value(ViewValue::View(view)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{marker, marker_with};

    fn limit() -> InterfaceRc {
        InterfaceDescriptor::new("demo.Limit")
            .method(InterfaceMethod::new("value", ReturnType::Int))
            .method(InterfaceMethod::new("extra", ReturnType::String))
            .build()
    }

    #[test]
    fn shallow_hides_parent_properties() {
        let parent = PropertySet::from([("extra", "x")]);
        let own = PropertySet::from([("value", "42")]);
        let datum: MetadataDatum =
            MetadataDatum::new("demo.Limit", own.shadowing(&parent), None).unwrap();

        let deep = materialize(&datum, &limit());
        assert_eq!(deep.get::<i32>("value").unwrap(), Some(42));
        assert_eq!(deep.get::<String>("extra").unwrap().as_deref(), Some("x"));

        let shallow = materialize_shallow(&datum, &limit());
        assert_eq!(shallow.get::<i32>("value").unwrap(), Some(42));
        assert_eq!(shallow.get::<String>("extra").unwrap(), None);
        assert_eq!(shallow.mode(), MaterializeMode::Shallow);
    }

    #[test]
    fn overlay_shadows_without_mutating() {
        let datum = marker("demo.Limit", &[("value", "1")]);
        let overlay = PropertySet::from([("value", "2")]);

        let view = materialize_with(&datum, &limit(), MaterializeMode::Deep, Some(&overlay));
        assert_eq!(view.get::<i32>("value").unwrap(), Some(2));
        assert_eq!(datum.get("value"), Some(&PropertyValue::from("1")));
    }

    #[test]
    fn defaults_required_and_unknown() {
        let interface = InterfaceDescriptor::new("demo.Column")
            .method(InterfaceMethod::new("name", ReturnType::String).required())
            .method(InterfaceMethod::new("length", ReturnType::Int).default_value("255"))
            .build();
        let view = materialize(&marker("demo.Column", &[]), &interface);

        assert_eq!(view.get::<i32>("length").unwrap(), Some(255));
        assert!(matches!(
            view.invoke("name"),
            Err(Error::MissingProperty { ref property, .. }) if property == "name"
        ));
        assert!(matches!(
            view.invoke("nope"),
            Err(Error::UnknownMethod { .. })
        ));
        assert_eq!(view.methods().collect::<Vec<_>>(), ["name", "length"]);
    }

    #[test]
    fn coercion_error_names_datum_property_and_types() {
        let view = materialize(&marker("demo.Limit", &[("value", "lots")]), &limit());

        match view.get::<i32>("value") {
            Err(Error::Coercion {
                annotation_type,
                property,
                value,
                target,
                source: ConversionError::Integer(_),
            }) => {
                assert_eq!(annotation_type, "demo.Limit");
                assert_eq!(property, "value");
                assert_eq!(value, "lots");
                assert_eq!(target, "int");
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
        assert_eq!(view.get::<String>("extra").unwrap(), None);
    }

    #[test]
    fn nested_markers_become_views() {
        let join = InterfaceDescriptor::new("demo.JoinColumn")
            .method(InterfaceMethod::new("name", ReturnType::String))
            .build();
        let table = InterfaceDescriptor::new("demo.Table")
            .method(InterfaceMethod::new("primary", ReturnType::Marker(join.clone())))
            .method(InterfaceMethod::new("joins", ReturnType::MarkerArray(join.clone())))
            .method(InterfaceMethod::new("none", ReturnType::MarkerArray(join)))
            .method(InterfaceMethod::new(
                "tags",
                ReturnType::array_of(ReturnType::String),
            ))
            .build();

        let datum = marker_with(
            "demo.Table",
            [
                (
                    "primary",
                    PropertyValue::from(marker("demo.JoinColumn", &[("name", "id")])),
                ),
                (
                    "joins",
                    PropertyValue::from(vec![
                        marker("demo.JoinColumn", &[("name", "a")]),
                        marker("demo.JoinColumn", &[("name", "b")]),
                    ]),
                ),
                ("none", PropertyValue::Array(Vec::new())),
                ("tags", PropertyValue::from("single")),
            ],
        );

        let view = materialize(&datum, &table);
        let primary = view.require::<View>("primary").unwrap();
        assert_eq!(primary.annotation_type(), "demo.JoinColumn");
        assert_eq!(primary.require::<String>("name").unwrap(), "id");

        let joins = view.require::<Vec<View>>("joins").unwrap();
        let names: Vec<String> = joins
            .iter()
            .map(|join| join.require::<String>("name").unwrap())
            .collect();
        assert_eq!(names, ["a", "b"]);

        assert!(view.require::<Vec<View>>("none").unwrap().is_empty());
        assert_eq!(view.require::<Vec<String>>("tags").unwrap(), ["single"]);
    }

    struct Limit {
        value: i32,
    }

    impl MarkerView for Limit {
        fn interface() -> InterfaceRc {
            limit()
        }

        fn from_view(view: View) -> Result<Self> {
            Ok(Limit {
                value: view.require("value")?,
            })
        }
    }

    #[test]
    fn typed_views() {
        let datum = marker("demo.Limit", &[("value", "42")]);
        let limit: Limit = materialize_as(&datum).unwrap();
        assert_eq!(limit.value, 42);

        let holder = InterfaceDescriptor::new("demo.Holder")
            .method(InterfaceMethod::new("limit", ReturnType::Marker(Limit::interface())))
            .build();
        let outer = marker_with("demo.Holder", [("limit", PropertyValue::from(datum))]);
        let nested: Option<Limit> = materialize(&outer, &holder).nested("limit").unwrap();
        assert_eq!(nested.map(|limit| limit.value), Some(42));

        assert!(matches!(
            materialize(&outer, &holder).get::<i32>("limit"),
            Err(Error::Coercion { .. })
        ));
    }
}
