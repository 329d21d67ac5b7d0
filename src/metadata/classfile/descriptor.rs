//! Conversion between descriptor, internal and dotted type names.
//!
//! Class descriptors name types in three forms:
//! - field descriptors: `Lcom/example/Foo;`, `I`, `[Ljava/lang/String;`
//! - internal names: `com/example/Foo`
//! - dotted names, used everywhere else in this crate: `com.example.Foo`, `int`, `java.lang.String[]`

use crate::Result;

/// Convert an internal name (`com/example/Foo`) to a dotted name.
#[must_use]
pub fn internal_to_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Convert a dotted name to an internal name.
#[must_use]
pub fn name_to_internal(name: &str) -> String {
    name.replace('.', "/")
}

/// Convert a field descriptor (or `V`) to a dotted type name.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `descriptor` is not a valid field descriptor.
pub fn descriptor_to_name(descriptor: &str) -> Result<String> {
    let dimensions = descriptor.bytes().take_while(|&b| b == b'[').count();
    let element = &descriptor[dimensions..];

    let mut name = match element.as_bytes() {
        [b'L', .., b';'] if element.len() > 2 => internal_to_name(&element[1..element.len() - 1]),
        [tag] => match primitive_name(*tag) {
            Some(primitive) => primitive.to_string(),
            None => return Err(malformed_error!("Invalid type descriptor - {}", descriptor)),
        },
        _ => return Err(malformed_error!("Invalid type descriptor - {}", descriptor)),
    };

    if dimensions > 0 && name == "void" {
        return Err(malformed_error!("Array of void - {}", descriptor));
    }

    for _ in 0..dimensions {
        name.push_str("[]");
    }
    Ok(name)
}

/// Convert a dotted type name to a field descriptor.
#[must_use]
pub fn name_to_descriptor(name: &str) -> String {
    let mut element = name;
    let mut dimensions = 0;
    while let Some(stripped) = element.strip_suffix("[]") {
        element = stripped;
        dimensions += 1;
    }

    let mut descriptor = "[".repeat(dimensions);
    match primitive_tag(element) {
        Some(tag) => descriptor.push(char::from(tag)),
        None => {
            descriptor.push('L');
            descriptor.push_str(&name_to_internal(element));
            descriptor.push(';');
        }
    }
    descriptor
}

fn primitive_name(tag: u8) -> Option<&'static str> {
    Some(match tag {
        b'B' => "byte",
        b'C' => "char",
        b'D' => "double",
        b'F' => "float",
        b'I' => "int",
        b'J' => "long",
        b'S' => "short",
        b'Z' => "boolean",
        b'V' => "void",
        _ => return None,
    })
}

fn primitive_tag(name: &str) -> Option<u8> {
    Some(match name {
        "byte" => b'B',
        "char" => b'C',
        "double" => b'D',
        "float" => b'F',
        "int" => b'I',
        "long" => b'J',
        "short" => b'S',
        "boolean" => b'Z',
        "void" => b'V',
        _ => return None,
    })
}
