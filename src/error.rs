use thiserror::Error;

use crate::metadata::view::ConversionError;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - Corrupted class descriptor or invalid marker data
/// - [`Error::OutOfBounds`] - Attempted to read beyond the input boundaries
/// - [`Error::NotSupported`] - Input is not a class descriptor
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::RecursionLimit`] - Marker nesting exceeded the configured depth
///
/// ## Digest Errors
/// - [`Error::Conflict`] - A field and a method share a simple name under the same marker type
///
/// ## View Errors
/// - [`Error::MissingProperty`] - A required interface method has no backing property
/// - [`Error::Coercion`] - A stored value could not be converted to the declared return type
/// - [`Error::UnknownMethod`] - The invoked method is not declared by the view's interface
///
/// # Examples
///
/// ```rust,no_run
/// use metadigest::{
///     metadata::reader::{BinaryReader, MetadataReader},
///     Error,
/// };
///
/// match BinaryReader::from_path("Service.class", None) {
///     Ok(reader) => println!("Decoded {}", reader.type_name()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed class: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged or violates a structural rule and could not be processed.
    ///
    /// Raised for broken class descriptors as well as for invalid marker data, such as a
    /// [`crate::metadata::datum::MetadataDatum`] without an annotation type. The error includes the
    /// source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The input is not a class descriptor.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// Recursion limit reached.
    ///
    /// Nested markers and arrays inside a class descriptor are bounded by
    /// [`crate::metadata::digest::DigestOptions::max_nesting_depth`].
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A field and a method carrying the same marker type share a simple name.
    ///
    /// The accessible index for `annotation_type` is withheld instead of picking one of them.
    #[error("Accessible member '{name}' is declared as both field and method for '{annotation_type}'")]
    Conflict {
        /// The marker type whose accessible index was withheld
        annotation_type: String,
        /// The colliding member name
        name: String,
    },

    /// A view method was declared as required but the datum has no value for it.
    #[error("Required property '{property}' is missing on '{annotation_type}'")]
    MissingProperty {
        /// The marker type of the datum backing the view
        annotation_type: String,
        /// The property (interface method) name
        property: String,
    },

    /// A stored value could not be converted to the declared return type of a view method.
    ///
    /// Coercion errors are local to one property access; the view and the digest stay usable.
    #[error("Cannot convert '{value}' of '{annotation_type}.{property}' to {target}: {source}")]
    Coercion {
        /// The marker type of the datum backing the view
        annotation_type: String,
        /// The property (interface method) name
        property: String,
        /// The stored value, rendered for diagnostics
        value: String,
        /// The declared return type
        target: String,
        /// The underlying conversion failure
        #[source]
        source: ConversionError,
    },

    /// The invoked method is not part of the interface the view was materialized for.
    #[error("Interface '{interface}' declares no method '{method}'")]
    UnknownMethod {
        /// The interface name
        interface: String,
        /// The requested method
        method: String,
    },
}
