//! Integration tests for materializing digest data as views.

use metadigest::{
    metadata::view::{ConversionError, InterfaceRc},
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

fn value_interface() -> InterfaceRc {
    InterfaceDescriptor::new("demo.Value")
        .method(InterfaceMethod::new("value", ReturnType::Int))
        .method(InterfaceMethod::new("extra", ReturnType::String))
        .build()
}

#[test]
fn string_property_reads_as_int() -> Result<()> {
    let datum = marker("demo.Value", &[("value", "42")]);
    let view = materialize(&datum, &value_interface());

    assert_eq!(view.get::<i32>("value")?, Some(42));
    assert!(matches!(view.invoke("value")?, Some(ViewValue::Scalar(ScalarValue::Int(42)))));
    Ok(())
}

#[test]
fn shallow_views_do_not_see_shadowed_parents() -> Result<()> {
    let parent = PropertySet::from([("extra", "x")]);
    let own = PropertySet::from([("value", "42")]);
    let datum: MetadataDatum = MetadataDatum::new("demo.Value", own.shadowing(&parent), None)?;

    let deep = materialize(&datum, &value_interface());
    assert_eq!(deep.get::<String>("extra")?.as_deref(), Some("x"));

    let shallow = materialize_shallow(&datum, &value_interface());
    assert_eq!(shallow.get::<String>("extra")?, None);
    assert_eq!(shallow.get::<i32>("value")?, Some(42));

    // materializing never changes the datum
    assert!(datum.properties().parent().is_some());
    Ok(())
}

#[test]
fn overlay_applies_on_top_of_the_mode() -> Result<()> {
    let datum = marker("demo.Value", &[("value", "1")]);
    let overlay = PropertySet::from([("extra", "overlay")]);

    let view = materialize_with(
        &datum,
        &value_interface(),
        MaterializeMode::Shallow,
        Some(&overlay),
    );
    assert_eq!(view.get::<i32>("value")?, Some(1));
    assert_eq!(view.get::<String>("extra")?.as_deref(), Some("overlay"));
    assert!(datum.get("extra").is_none());
    Ok(())
}

#[test]
fn coercion_failure_is_local_to_one_property() {
    let datum = marker("demo.Value", &[("value", "many"), ("extra", "fine")]);
    let view = materialize(&datum, &value_interface());

    let error = view.get::<i32>("value").unwrap_err();
    match &error {
        Error::Coercion {
            annotation_type,
            property,
            value,
            target,
            source,
        } => {
            assert_eq!(annotation_type, "demo.Value");
            assert_eq!(property, "value");
            assert_eq!(value, "many");
            assert_eq!(target, "int");
            assert!(matches!(source, ConversionError::Integer(_)));
        }
        other => panic!("expected coercion error, got {other:?}"),
    }
    assert!(std::error::Error::source(&error).is_some());

    assert_eq!(view.get::<String>("extra").unwrap().as_deref(), Some("fine"));
}

struct Column {
    name: String,
    length: i32,
    nullable: bool,
}

impl MarkerView for Column {
    fn interface() -> InterfaceRc {
        InterfaceDescriptor::new("demo.Column")
            .method(InterfaceMethod::new("name", ReturnType::String).required())
            .method(InterfaceMethod::new("length", ReturnType::Int).default_value(255))
            .method(InterfaceMethod::new("nullable", ReturnType::Bool).default_value(true))
            .build()
    }

    fn from_view(view: View) -> Result<Self> {
        Ok(Column {
            name: view.require("name")?,
            length: view.require("length")?,
            nullable: view.require("nullable")?,
        })
    }
}

#[test]
fn typed_views_over_digest_data() -> Result<()> {
    let base = TypeBuilder::class("demo.Base")
        .field("email", "java.lang.String", |f| {
            f.annotation(marker(
                "demo.Column",
                &[("name", "email"), ("length", "320"), ("nullable", "false")],
            ))
        })
        .method("name", |m| {
            m.returns("java.lang.String")
                .annotation(marker("demo.Column", &[("name", "display_name")]))
        })
        .build();
    let service = TypeBuilder::class("demo.Service")
        .extends(&base)
        .method("name", |m| m.returns("java.lang.String"))
        .build();
    let digest = Digest::from_type(&service, &ExactTypes, &DigestOptions::default());

    let columns = digest
        .accessible_index("demo.Column")?
        .values()
        .map(|accessible| materialize_as::<Column, _>(&accessible.datum()))
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].name, "email");
    assert_eq!(columns[0].length, 320);
    assert!(!columns[0].nullable);
    assert_eq!(columns[1].name, "display_name");
    assert_eq!(columns[1].length, 255);
    assert!(columns[1].nullable);

    let unnamed = marker("demo.Column", &[]);
    assert!(matches!(
        materialize_as::<Column, _>(&unnamed),
        Err(Error::MissingProperty { .. })
    ));
    Ok(())
}

#[test]
fn views_of_decoded_nested_markers() -> Result<()> {
    let join = InterfaceDescriptor::new("demo.JoinColumn")
        .method(InterfaceMethod::new("name", ReturnType::String))
        .build();
    let table = InterfaceDescriptor::new("demo.Table")
        .method(InterfaceMethod::new("joins", ReturnType::MarkerArray(join)))
        .method(InterfaceMethod::new(
            "indexes",
            ReturnType::array_of(ReturnType::Int),
        ))
        .build();

    let datum = MetadataDatum::new(
        "demo.Table",
        PropertySet::from([
            (
                "joins",
                PropertyValue::from(vec![
                    marker("demo.JoinColumn", &[("name", "a")]),
                    marker("demo.JoinColumn", &[("name", "b")]),
                ]),
            ),
            (
                "indexes",
                PropertyValue::Array(vec![ScalarValue::Int(1), ScalarValue::Int(3)]),
            ),
        ]),
        None,
    )?;
    let data = ClassFileBuilder::new("demo.Service").annotation(datum).build()?;
    let digest = Digest::from_class_bytes(data, Some("demo.Table"), &DigestOptions::default())?;

    let decoded = digest.class_datum("demo.Table").expect("decoded");
    let view = materialize(decoded, &table);
    let names = view
        .require::<Vec<View>>("joins")?
        .iter()
        .map(|join| join.require::<String>("name"))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(names, ["a", "b"]);
    assert_eq!(view.require::<Vec<i32>>("indexes")?, [1, 3]);
    Ok(())
}
