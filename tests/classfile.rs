//! Integration tests for digests of compiled class descriptors.

use std::io::Write;

use metadigest::{
    metadata::classfile::{descriptor_to_name, ClassAccessFlags, ClassFileDecoder},
    prelude::*,
    Result,
};

fn marker(annotation_type: &str, properties: &[(&str, &str)]) -> MetadataDatum {
    MetadataDatum::new(
        annotation_type,
        properties.iter().copied().collect::<PropertySet>(),
        None,
    )
    .unwrap()
}

fn service_class() -> Result<Vec<u8>> {
    ClassFileBuilder::new("demo.Service")
        .interface("demo.Named")
        .field("host", "Ljava/lang/String;")
        .method("name", "()Ljava/lang/String;")
        .annotation(marker("demo.X", &[]))
        .annotation(marker("demo.Target", &[("value", "t")]))
        .annotation(marker("demo.Y", &[]))
        .build()
}

#[test]
fn decoding_stops_after_the_target_marker() -> Result<()> {
    let data = service_class()?;

    let reader = BinaryReader::decode(&data, Some("demo.Target"), &DigestOptions::default())?;
    assert!(reader.terminated_early());
    assert_eq!(reader.type_markers().len(), 2);

    let digest = Digest::from_class_bytes(data, Some("demo.Target"), &DigestOptions::default())?;
    let collected: Vec<&String> = digest.class_data().keys().collect();
    assert_eq!(collected, ["demo.X", "demo.Target"]);
    assert!(digest.class_datum("demo.Y").is_none());
    Ok(())
}

#[test]
fn missing_target_reads_everything() -> Result<()> {
    let data = service_class()?;

    let reader = BinaryReader::from_mem(data, Some("demo.Absent"))?;
    assert!(!reader.terminated_early());
    assert_eq!(reader.type_markers().len(), 3);
    assert_eq!(reader.type_name(), "demo.Service");
    assert_eq!(reader.super_name(), Some("java.lang.Object"));
    assert_eq!(reader.interfaces(), ["demo.Named".to_string()]);
    assert!(reader.access_flags().contains(ClassAccessFlags::PUBLIC));

    // binary sources carry no member information
    assert!(reader.all_field_markers().is_empty());
    assert!(reader.all_method_markers().is_empty());
    Ok(())
}

#[test]
fn decodes_from_a_file_and_a_stream() -> Result<()> {
    let data = service_class()?;
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&data)?;
    file.flush()?;

    let digest = Digest::from_class_file(file.path(), None, &DigestOptions::default())?;
    assert_eq!(digest.type_name(), "demo.Service");
    assert_eq!(digest.marker_types(), ["demo.X", "demo.Target", "demo.Y"]);

    let reader = BinaryReader::from_reader(std::io::Cursor::new(data), None)?;
    assert_eq!(reader.type_markers().len(), 3);
    Ok(())
}

#[test]
fn element_values_keep_their_kinds() -> Result<()> {
    let nested = marker("demo.Join", &[("name", "owner_id")]);
    let datum = MetadataDatum::new(
        "demo.Mapping",
        PropertySet::from([
            ("flag", PropertyValue::from(true)),
            ("letter", PropertyValue::from('q')),
            ("small", PropertyValue::from(7_i8)),
            ("short", PropertyValue::from(-300_i16)),
            ("count", PropertyValue::from(42)),
            ("big", PropertyValue::from(1_i64 << 40)),
            ("ratio", PropertyValue::from(0.5_f32)),
            ("precise", PropertyValue::from(2.25_f64)),
            ("name", PropertyValue::from("mapping")),
            (
                "level",
                PropertyValue::Scalar(ScalarValue::enum_constant("demo.Level", "HIGH")),
            ),
            (
                "type",
                PropertyValue::Scalar(ScalarValue::Class("demo.Service".into())),
            ),
            (
                "tags",
                PropertyValue::Array(vec!["a".into(), "b".into()]),
            ),
            ("empty", PropertyValue::Array(Vec::new())),
            ("join", PropertyValue::from(nested.clone())),
            (
                "joins",
                PropertyValue::from(vec![nested.clone(), marker("demo.Join", &[])]),
            ),
        ]),
        None,
    )?;

    let data = ClassFileBuilder::new("demo.Service")
        .annotation(datum.clone())
        .build()?;
    let digest = Digest::from_class_bytes(data, None, &DigestOptions::default())?;

    let decoded = digest.class_datum("demo.Mapping").expect("marker decoded");
    assert_eq!(decoded.detached(), datum);
    assert!(decoded.element().is_none());
    assert_eq!(decoded.get("join").and_then(PropertyValue::as_datum), Some(&nested));
    assert_eq!(
        decoded
            .get("joins")
            .and_then(PropertyValue::as_datum_array)
            .map(<[MetadataDatum]>::len),
        Some(2)
    );
    Ok(())
}

#[test]
fn invisible_markers_need_the_option() -> Result<()> {
    let data = ClassFileBuilder::new("demo.Service")
        .annotation(marker("demo.Visible", &[]))
        .invisible_annotation(marker("demo.BuildOnly", &[]))
        .build()?;

    let digest = Digest::from_class_bytes(data.clone(), None, &DigestOptions::default())?;
    assert!(!digest.has_marker("demo.BuildOnly"));

    let options = DigestOptions {
        include_invisible: true,
        ..DigestOptions::default()
    };
    let digest = Digest::from_class_bytes(data, None, &options)?;
    assert!(digest.has_marker("demo.BuildOnly"));
    assert!(digest.has_marker("demo.Visible"));
    Ok(())
}

#[test]
fn broken_input_is_rejected() -> Result<()> {
    let options = DigestOptions::default();

    assert!(matches!(
        Digest::from_class_bytes(Vec::new(), None, &options),
        Err(Error::Empty)
    ));
    assert!(matches!(
        Digest::from_class_bytes(b"not a class".to_vec(), None, &options),
        Err(Error::NotSupported)
    ));

    let data = service_class()?;
    let truncated = data[..data.len() - 3].to_vec();
    assert!(Digest::from_class_bytes(truncated, None, &options).is_err());

    let mut nested = marker("demo.Leaf", &[]);
    for _ in 0..8 {
        nested = MetadataDatum::new(
            "demo.Node",
            PropertySet::from([("next", nested)]),
            None,
        )?;
    }
    let deep = ClassFileBuilder::new("demo.Service").annotation(nested).build()?;
    let shallow_limit = DigestOptions {
        max_nesting_depth: 4,
        ..DigestOptions::default()
    };
    assert!(matches!(
        Digest::from_class_bytes(deep.clone(), None, &shallow_limit),
        Err(Error::RecursionLimit(4))
    ));
    assert!(Digest::from_class_bytes(deep, None, &options).is_ok());
    Ok(())
}

#[test]
fn visitors_can_stop_the_decode() -> Result<()> {
    struct FirstMarker(Option<String>);

    impl ClassVisitor for FirstMarker {
        fn visit_marker_start(
            &mut self,
            annotation_type: &str,
            _attribute: Option<&str>,
            _visible: bool,
        ) -> std::ops::ControlFlow<()> {
            self.0 = Some(annotation_type.to_string());
            std::ops::ControlFlow::Break(())
        }
    }

    let mut visitor = FirstMarker(None);
    let flow = ClassFileDecoder::default().decode(&service_class()?, &mut visitor)?;
    assert!(flow.is_break());
    assert_eq!(visitor.0.as_deref(), Some("demo.X"));
    assert_eq!(descriptor_to_name("[Ldemo/X;")?, "demo.X[]");
    Ok(())
}
