//! Structural visitor protocol of the class descriptor decoder.
//!
//! The decoder walks a class descriptor once and reports what it finds through a [`ClassVisitor`].
//! Every callback returns a [`ControlFlow`]: returning [`ControlFlow::Break`] stops the decode
//! immediately. Stopping early is a normal outcome, not an error; the decoder reports it back to
//! its caller as `Ok(ControlFlow::Break(()))`.
//!
//! For a marker `@Outer(inner = @Inner(1), list = {@A, @B})` the callback sequence is:
//!
//! ```text
//! visit_marker_start("Outer", None)
//!   visit_marker_start("Inner", Some("inner"))
//!     visit_value(Some("value"), Int(1))
//!   visit_marker_end("Inner")
//!   visit_array_start("list")
//!     visit_marker_start("A", None)
//!     visit_marker_end("A")
//!     visit_marker_start("B", None)
//!     visit_marker_end("B")
//!   visit_array_end("list")
//! visit_marker_end("Outer")
//! ```

use std::ops::ControlFlow;

use bitflags::bitflags;

use crate::metadata::properties::ScalarValue;

bitflags! {
    /// Access flags of a class descriptor header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassAccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final
        const FINAL = 0x0010;
        /// Treat superclass methods specially on invokespecial
        const SUPER = 0x0020;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Declared as a marker type
        const ANNOTATION = 0x2000;
        /// Declared as an enum
        const ENUM = 0x4000;
        /// Is a module descriptor
        const MODULE = 0x8000;
    }
}

/// The declaration of the decoded class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    /// Minor format version
    pub minor_version: u16,
    /// Major format version
    pub major_version: u16,
    /// Access flags
    pub access_flags: ClassAccessFlags,
    /// Dotted name of the class
    pub name: String,
    /// Dotted name of the superclass, absent for the root type and module descriptors
    pub super_name: Option<String>,
    /// Dotted names of the directly implemented interfaces
    pub interfaces: Vec<String>,
}

/// Receives the structure of a class descriptor, one callback at a time.
///
/// All callbacks default to continuing, so implementations only override what they consume.
pub trait ClassVisitor {
    /// The class header has been decoded.
    fn visit_class(&mut self, _header: &ClassHeader) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// A marker starts.
    ///
    /// `attribute` names the property of the enclosing marker that holds this one. It is `None`
    /// for top-level markers and for elements of a marker array.
    fn visit_marker_start(
        &mut self,
        _annotation_type: &str,
        _attribute: Option<&str>,
        _visible: bool,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// A scalar, enum or class value. `name` is `None` for elements of an array.
    fn visit_value(&mut self, _name: Option<&str>, _value: ScalarValue) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// An array property starts.
    fn visit_array_start(&mut self, _name: &str) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// An array property ends.
    fn visit_array_end(&mut self, _name: &str) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// The innermost open marker ends.
    fn visit_marker_end(&mut self, _annotation_type: &str) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// The whole descriptor has been decoded. Not called when decoding stopped early.
    fn visit_end(&mut self) {}
}
