//! Factories shared by the unit tests.

use crate::metadata::{
    classfile::ClassFileBuilder,
    datum::MetadataDatum,
    properties::{PropertySet, PropertyValue},
    typesystem::{TypeBuilder, TypeFlags, TypeRc, TypeRegistry},
};

/// A marker with string properties.
pub fn marker(annotation_type: &str, properties: &[(&str, &str)]) -> MetadataDatum {
    MetadataDatum::new(
        annotation_type,
        properties.iter().copied().collect::<PropertySet>(),
        None,
    )
    .unwrap()
}

/// A marker with arbitrary property values.
pub fn marker_with<const N: usize>(
    annotation_type: &str,
    properties: [(&str, PropertyValue); N],
) -> MetadataDatum {
    MetadataDatum::new(annotation_type, PropertySet::from(properties), None).unwrap()
}

/// `demo.Base` and `demo.Service extends demo.Base`, registered in `registry`.
///
/// - `demo.Base` carries `@demo.Component`, a field `id` marked `@demo.Id` and a method
///   `String name()` marked `@demo.Column(value = "name")`
/// - `demo.Service` overrides `name()` without markers and declares a field `email` marked
///   `@demo.Column`
pub fn service_hierarchy(registry: &TypeRegistry) -> (TypeRc, TypeRc) {
    let object = registry.get("java.lang.Object").unwrap_or_else(|| {
        let object = TypeBuilder::class("java.lang.Object")
            .flags(TypeFlags::ROOT)
            .build();
        registry.register(object.clone()).unwrap();
        object
    });

    let base = TypeBuilder::class("demo.Base")
        .extends(&object)
        .annotation(marker("demo.Component", &[]))
        .field("id", "long", |f| f.annotation(marker("demo.Id", &[])))
        .method("name", |m| {
            m.returns("java.lang.String")
                .annotation(marker("demo.Column", &[("value", "name")]))
        })
        .build();
    let service = TypeBuilder::class("demo.Service")
        .extends(&base)
        .field("email", "java.lang.String", |f| {
            f.annotation(marker("demo.Column", &[]))
        })
        .method("name", |m| m.returns("java.lang.String"))
        .build();

    registry.register(base.clone()).unwrap();
    registry.register(service.clone()).unwrap();
    (base, service)
}

/// A class descriptor for `name` carrying `markers` as visible class-level markers, in order.
pub fn class_with_markers(name: &str, markers: &[MetadataDatum]) -> Vec<u8> {
    markers
        .iter()
        .fold(ClassFileBuilder::new(name), |builder, datum| {
            builder.annotation(datum.clone())
        })
        .build()
        .unwrap()
}
