//! Single-pass reader over compiled class descriptors.
//!
//! The reader drives a [`ClassFileDecoder`] with a collecting visitor. Open markers and arrays are
//! kept on a frame stack; when a marker ends, its datum is filed into the enclosing array, or
//! into the enclosing marker under its attribute name, or into the top-level type-marker map
//! where the first marker of each type wins.
//!
//! When a target marker type is given, decoding stops right after the first marker of that type
//! has been filed, wherever it is nested. The reader still succeeds and reports what it collected
//! up to that point.

use std::{io::Read, ops::ControlFlow, path::Path};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    file::Input,
    metadata::{
        classfile::{ClassAccessFlags, ClassFileDecoder, ClassHeader, ClassVisitor},
        datum::MetadataDatum,
        digest::DigestOptions,
        properties::{PropertySet, PropertyValue, ScalarValue},
        reader::{
            ConstructorMarkers, ConstructorParameterMarkers, FieldMarkers, MetadataReader,
            MethodMarkers, MethodParameterMarkers, TypeMarkers,
        },
    },
    Error, Result,
};

enum Frame {
    Marker {
        annotation_type: String,
        attribute: Option<String>,
        properties: PropertySet,
    },
    Array {
        name: String,
        values: Vec<ScalarValue>,
        data: Vec<MetadataDatum>,
    },
}

struct MarkerCollector<'t> {
    target: Option<&'t str>,
    header: Option<ClassHeader>,
    stack: Vec<Frame>,
    markers: IndexMap<String, MetadataDatum>,
    error: Option<Error>,
}

impl<'t> MarkerCollector<'t> {
    fn new(target: Option<&'t str>) -> Self {
        MarkerCollector {
            target,
            header: None,
            stack: Vec::new(),
            markers: IndexMap::new(),
            error: None,
        }
    }

    /// Records a structural error and stops the decode.
    fn fail(&mut self, error: Error) -> ControlFlow<()> {
        self.error = Some(error);
        ControlFlow::Break(())
    }

    fn set_property(&mut self, name: Option<&str>, value: PropertyValue) -> ControlFlow<()> {
        let outcome = match (self.stack.last_mut(), name) {
            (Some(Frame::Marker { properties, .. }), Some(name)) => {
                properties.insert(name, value);
                Ok(())
            }
            (Some(Frame::Marker { .. }), None) => {
                Err(malformed_error!("Unnamed value inside a marker"))
            }
            (Some(Frame::Array { values, data, .. }), _) => match value {
                PropertyValue::Scalar(scalar) if data.is_empty() => {
                    values.push(scalar);
                    Ok(())
                }
                PropertyValue::Datum(datum) if values.is_empty() => {
                    data.push(datum);
                    Ok(())
                }
                _ => Err(malformed_error!("Mixed or nested array elements")),
            },
            (None, _) => Err(malformed_error!("Value outside of a marker")),
        };

        match outcome {
            Ok(()) => ControlFlow::Continue(()),
            Err(error) => self.fail(error),
        }
    }
}

impl ClassVisitor for MarkerCollector<'_> {
    fn visit_class(&mut self, header: &ClassHeader) -> ControlFlow<()> {
        self.header = Some(header.clone());
        ControlFlow::Continue(())
    }

    fn visit_marker_start(
        &mut self,
        annotation_type: &str,
        attribute: Option<&str>,
        _visible: bool,
    ) -> ControlFlow<()> {
        self.stack.push(Frame::Marker {
            annotation_type: annotation_type.to_string(),
            attribute: attribute.map(str::to_string),
            properties: PropertySet::new(),
        });
        ControlFlow::Continue(())
    }

    fn visit_value(&mut self, name: Option<&str>, value: ScalarValue) -> ControlFlow<()> {
        self.set_property(name, PropertyValue::Scalar(value))
    }

    fn visit_array_start(&mut self, name: &str) -> ControlFlow<()> {
        self.stack.push(Frame::Array {
            name: name.to_string(),
            values: Vec::new(),
            data: Vec::new(),
        });
        ControlFlow::Continue(())
    }

    fn visit_array_end(&mut self, _name: &str) -> ControlFlow<()> {
        let Some(Frame::Array { name, values, data }) = self.stack.pop() else {
            return self.fail(malformed_error!("Array end without open array"));
        };

        let value = if data.is_empty() {
            PropertyValue::Array(values)
        } else {
            PropertyValue::DatumArray(data)
        };
        self.set_property(Some(&name), value)
    }

    fn visit_marker_end(&mut self, _annotation_type: &str) -> ControlFlow<()> {
        let Some(Frame::Marker {
            annotation_type,
            attribute,
            properties,
        }) = self.stack.pop()
        else {
            return self.fail(malformed_error!("Marker end without open marker"));
        };

        let datum = match MetadataDatum::new(annotation_type.as_str(), properties, None) {
            Ok(datum) => datum,
            Err(error) => return self.fail(error),
        };

        let filed = if self.stack.is_empty() {
            self.markers
                .entry(annotation_type.clone())
                .or_insert(datum);
            ControlFlow::Continue(())
        } else {
            self.set_property(attribute.as_deref(), PropertyValue::Datum(datum))
        };

        if filed.is_continue() && self.target == Some(annotation_type.as_str()) {
            return ControlFlow::Break(());
        }
        filed
    }
}

/// Class-level markers decoded from a compiled class descriptor.
///
/// The input is owned only for the duration of the constructor call and released on every path.
///
/// # Examples
///
/// ```rust,no_run
/// use metadigest::metadata::reader::{BinaryReader, MetadataReader};
///
/// let reader = BinaryReader::from_path("Service.class", Some("com.example.Component"))?;
/// for (name, datum) in reader.type_markers() {
///     println!("{name}: {datum}");
/// }
/// # Ok::<(), metadigest::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader {
    header: ClassHeader,
    markers: IndexMap<String, MetadataDatum>,
    terminated_early: bool,
}

impl BinaryReader {
    /// Decode the class descriptor at `path` with default options.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, and any decoding error
    /// of [`BinaryReader::decode`].
    pub fn from_path(path: impl AsRef<Path>, target: Option<&str>) -> Result<Self> {
        Self::from_input(Input::from_path(path)?, target, &DigestOptions::default())
    }

    /// Decode an in-memory class descriptor with default options.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, and any decoding error of
    /// [`BinaryReader::decode`].
    pub fn from_mem(data: Vec<u8>, target: Option<&str>) -> Result<Self> {
        Self::from_input(Input::from_mem(data)?, target, &DigestOptions::default())
    }

    /// Drain `reader` and decode the class descriptor with default options.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if reading fails, and any decoding error of
    /// [`BinaryReader::decode`].
    pub fn from_reader<R: Read>(reader: R, target: Option<&str>) -> Result<Self> {
        Self::from_input(Input::from_reader(reader)?, target, &DigestOptions::default())
    }

    /// Decode an owned input, releasing it before returning.
    ///
    /// # Errors
    /// Returns any decoding error of [`BinaryReader::decode`].
    pub fn from_input(input: Input, target: Option<&str>, options: &DigestOptions) -> Result<Self> {
        Self::decode(input.data(), target, options)
    }

    /// Decode a borrowed class descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if `data` is not a class descriptor,
    /// [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if it is damaged, and
    /// [`crate::Error::RecursionLimit`] if markers nest deeper than
    /// [`DigestOptions::max_nesting_depth`].
    pub fn decode(data: &[u8], target: Option<&str>, options: &DigestOptions) -> Result<Self> {
        let mut collector = MarkerCollector::new(target);
        let flow = ClassFileDecoder::new(options).decode(data, &mut collector)?;

        if let Some(error) = collector.error {
            return Err(error);
        }
        let Some(header) = collector.header else {
            return Err(malformed_error!("Class descriptor without header"));
        };

        let terminated_early = flow.is_break();
        if terminated_early {
            debug!(
                type_name = %header.name,
                target = target.unwrap_or_default(),
                markers = collector.markers.len(),
                "class descriptor decode stopped at target marker"
            );
        }

        Ok(BinaryReader {
            header,
            markers: collector.markers,
            terminated_early,
        })
    }

    /// The decoded class header.
    #[must_use]
    pub fn header(&self) -> &ClassHeader {
        &self.header
    }

    /// Dotted name of the superclass, if any.
    #[must_use]
    pub fn super_name(&self) -> Option<&str> {
        self.header.super_name.as_deref()
    }

    /// Dotted names of the directly implemented interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.header.interfaces
    }

    /// Access flags of the class.
    #[must_use]
    pub fn access_flags(&self) -> ClassAccessFlags {
        self.header.access_flags
    }

    /// Returns `true` if decoding stopped at the target marker.
    #[must_use]
    pub fn terminated_early(&self) -> bool {
        self.terminated_early
    }
}

impl MetadataReader for BinaryReader {
    fn type_name(&self) -> &str {
        &self.header.name
    }

    fn type_markers(&self) -> TypeMarkers {
        self.markers
            .iter()
            .map(|(name, datum)| (name.clone(), datum.with_element(None)))
            .collect()
    }

    fn all_method_markers(&self) -> MethodMarkers {
        MethodMarkers::new()
    }

    fn all_field_markers(&self) -> FieldMarkers {
        FieldMarkers::new()
    }

    fn all_constructor_markers(&self) -> ConstructorMarkers {
        ConstructorMarkers::new()
    }

    fn all_method_parameter_markers(&self) -> MethodParameterMarkers {
        MethodParameterMarkers::new()
    }

    fn all_constructor_parameter_markers(&self) -> ConstructorParameterMarkers {
        ConstructorParameterMarkers::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::classfile::ClassFileBuilder,
        test::{marker, marker_with},
    };

    #[test]
    fn stops_after_target() {
        let data = ClassFileBuilder::new("demo.Service")
            .annotation(marker("demo.X", &[]))
            .annotation(marker("demo.Target", &[]))
            .annotation(marker("demo.Y", &[]))
            .build()
            .unwrap();

        let reader = BinaryReader::from_mem(data.clone(), Some("demo.Target")).unwrap();
        assert!(reader.terminated_early());
        assert_eq!(
            reader.type_markers().keys().collect::<Vec<_>>(),
            ["demo.X", "demo.Target"]
        );

        let reader = BinaryReader::from_mem(data, None).unwrap();
        assert!(!reader.terminated_early());
        assert_eq!(reader.type_markers().len(), 3);
    }

    #[test]
    fn nested_target_stops_inside_parent() {
        let nested = marker_with(
            "demo.Outer",
            [("inner", PropertyValue::from(marker("demo.Target", &[])))],
        );
        let data = ClassFileBuilder::new("demo.Service")
            .annotation(nested)
            .annotation(marker("demo.Y", &[]))
            .build()
            .unwrap();

        let reader = BinaryReader::from_mem(data, Some("demo.Target")).unwrap();
        assert!(reader.terminated_early());
        // the parent never ended, so nothing reached the top level
        assert!(reader.type_markers().is_empty());
    }

    #[test]
    fn nested_markers_and_arrays_are_filed() {
        let outer = marker_with(
            "demo.Routes",
            [
                (
                    "value",
                    PropertyValue::DatumArray(vec![
                        marker("demo.Route", &[("path", "/a")]),
                        marker("demo.Route", &[("path", "/b")]),
                    ]),
                ),
                (
                    "methods",
                    PropertyValue::Array(vec![ScalarValue::from("GET"), ScalarValue::from("PUT")]),
                ),
                ("empty", PropertyValue::Array(Vec::new())),
                (
                    "scope",
                    PropertyValue::from(ScalarValue::enum_constant("demo.Scope", "SINGLETON")),
                ),
                ("type", PropertyValue::from(ScalarValue::Class("demo.Handler".into()))),
            ],
        );
        let data = ClassFileBuilder::new("demo.Service")
            .annotation(outer.clone())
            .build()
            .unwrap();

        let reader = BinaryReader::from_mem(data, None).unwrap();
        let markers = reader.type_markers();
        let routes = &markers["demo.Routes"];

        assert_eq!(routes, &outer.with_element(None));
        let Some(PropertyValue::DatumArray(data)) = routes.get("value") else {
            panic!("expected marker array");
        };
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].get("path").and_then(|v| v.as_str()), Some("/b"));
        assert_eq!(routes.get("empty"), Some(&PropertyValue::Array(Vec::new())));
        assert!(routes.element().is_none());
    }

    #[test]
    fn first_top_level_marker_wins() {
        let data = ClassFileBuilder::new("demo.Service")
            .annotation(marker("demo.Scope", &[("value", "first")]))
            .annotation(marker("demo.Scope", &[("value", "second")]))
            .build()
            .unwrap();

        let reader = BinaryReader::from_mem(data, None).unwrap();
        let markers = reader.type_markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(
            markers["demo.Scope"].get("value").and_then(|v| v.as_str()),
            Some("first")
        );
    }

    #[test]
    fn header_and_member_queries() {
        let data = ClassFileBuilder::new("demo.Service")
            .super_class("demo.Base")
            .interface("demo.Named")
            .build()
            .unwrap();

        let reader = BinaryReader::from_reader(std::io::Cursor::new(data), None).unwrap();
        assert_eq!(reader.type_name(), "demo.Service");
        assert_eq!(reader.super_name(), Some("demo.Base"));
        assert_eq!(reader.interfaces(), &["demo.Named".to_string()]);
        assert!(reader.access_flags().contains(ClassAccessFlags::PUBLIC));
        assert!(reader.all_method_markers().is_empty());
        assert!(reader.all_field_markers().is_empty());
        assert!(reader.all_constructor_markers().is_empty());
        assert!(reader.all_method_parameter_markers().is_empty());
        assert!(reader.all_constructor_parameter_markers().is_empty());
    }

    #[test]
    fn decode_errors_are_reported() {
        assert!(matches!(
            BinaryReader::from_mem(Vec::new(), None),
            Err(Error::Empty)
        ));
        assert!(matches!(
            BinaryReader::from_mem(vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00], None),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            BinaryReader::from_mem(vec![0x00; 16], None),
            Err(Error::NotSupported)
        ));
    }
}
