//! Compiled class descriptor support.
//!
//! This module reads and writes the class-file layout: a magic number, the format version, a
//! constant pool, the class header and the field, method and attribute tables. Only the parts
//! that carry class-level markers are decoded in depth; everything else is walked structurally.
//!
//! # Key Components
//!
//! - [`ClassFileDecoder`] - single forward pass turning a descriptor into visitor callbacks
//! - [`ClassVisitor`] - the callback protocol, with [`std::ops::ControlFlow`] based early exit
//! - [`ConstantPool`] - decoded constant pool with typed accessors
//! - [`ClassFileBuilder`] - writes descriptors, mainly for fixtures
//! - [`descriptor_to_name`] / [`name_to_descriptor`] - type name conversion

mod constants;
mod decoder;
mod descriptor;
mod visitor;
mod writer;

pub use constants::{Constant, ConstantPool, ConstantTag};
pub use decoder::{
    ClassFileDecoder, CLASS_MAGIC, RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS,
};
pub use descriptor::{descriptor_to_name, internal_to_name, name_to_descriptor, name_to_internal};
pub use visitor::{ClassAccessFlags, ClassHeader, ClassVisitor};
pub use writer::ClassFileBuilder;
