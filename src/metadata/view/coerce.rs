//! Conversion of stored scalars to declared return types.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::metadata::{
    properties::{PropertyValue, ScalarValue},
    view::ReturnType,
};

/// Why a stored value could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// A string did not parse as an integer.
    #[error("invalid integer: {0}")]
    Integer(#[from] ParseIntError),

    /// A string did not parse as a floating point number.
    #[error("invalid floating point number: {0}")]
    Float(#[from] ParseFloatError),

    /// A string was neither `true` nor `false`.
    #[error("invalid boolean '{0}'")]
    Bool(String),

    /// An integer does not fit the target width.
    #[error("{value} is out of range for {target}")]
    Range {
        /// The stored value
        value: i64,
        /// The target primitive
        target: &'static str,
    },

    /// No conversion exists between the two kinds.
    #[error("no conversion from {from} to {target}")]
    Incompatible {
        /// Kind of the stored value
        from: &'static str,
        /// The requested type
        target: String,
    },
}

fn incompatible(from: &'static str, target: &ReturnType) -> ConversionError {
    ConversionError::Incompatible {
        from,
        target: target.to_string(),
    }
}

fn integer(value: &ScalarValue, target: &ReturnType) -> Result<i64, ConversionError> {
    match value {
        ScalarValue::Byte(v) => Ok(i64::from(*v)),
        ScalarValue::Short(v) => Ok(i64::from(*v)),
        ScalarValue::Int(v) => Ok(i64::from(*v)),
        ScalarValue::Long(v) => Ok(*v),
        ScalarValue::Char(v) => Ok(i64::from(u32::from(*v))),
        ScalarValue::String(v) => Ok(v.trim().parse::<i64>()?),
        other => Err(incompatible(other.kind(), target)),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T, ConversionError> {
    T::try_from(value).map_err(|_| ConversionError::Range { value, target })
}

fn float(value: &ScalarValue, target: &ReturnType) -> Result<f64, ConversionError> {
    match value {
        ScalarValue::Float(v) => Ok(f64::from(*v)),
        ScalarValue::Double(v) => Ok(*v),
        ScalarValue::Byte(v) => Ok(f64::from(*v)),
        ScalarValue::Short(v) => Ok(f64::from(*v)),
        ScalarValue::Int(v) => Ok(f64::from(*v)),
        #[allow(clippy::cast_precision_loss)]
        ScalarValue::Long(v) => Ok(*v as f64),
        ScalarValue::String(v) => Ok(v.trim().parse::<f64>()?),
        other => Err(incompatible(other.kind(), target)),
    }
}

/// Convert one scalar to the scalar type `target`.
///
/// # Errors
/// Returns a [`ConversionError`] describing why the conversion is impossible.
pub fn coerce_scalar(value: &ScalarValue, target: &ReturnType) -> Result<ScalarValue, ConversionError> {
    let converted = match target {
        ReturnType::Bool => match value {
            ScalarValue::Bool(v) => ScalarValue::Bool(*v),
            ScalarValue::String(v) if v.eq_ignore_ascii_case("true") => ScalarValue::Bool(true),
            ScalarValue::String(v) if v.eq_ignore_ascii_case("false") => ScalarValue::Bool(false),
            ScalarValue::String(v) => return Err(ConversionError::Bool(v.clone())),
            other => return Err(incompatible(other.kind(), target)),
        },
        ReturnType::Char => match value {
            ScalarValue::Char(v) => ScalarValue::Char(*v),
            ScalarValue::String(v) => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => ScalarValue::Char(c),
                    _ => return Err(incompatible("string", target)),
                }
            }
            other => return Err(incompatible(other.kind(), target)),
        },
        ReturnType::Byte => ScalarValue::Byte(narrow(integer(value, target)?, "byte")?),
        ReturnType::Short => ScalarValue::Short(narrow(integer(value, target)?, "short")?),
        ReturnType::Int => ScalarValue::Int(narrow(integer(value, target)?, "int")?),
        ReturnType::Long => ScalarValue::Long(integer(value, target)?),
        #[allow(clippy::cast_possible_truncation)]
        ReturnType::Float => ScalarValue::Float(float(value, target)? as f32),
        ReturnType::Double => ScalarValue::Double(float(value, target)?),
        ReturnType::String => match value {
            ScalarValue::Enum { constant, .. } => ScalarValue::String(constant.clone()),
            other => ScalarValue::String(other.to_string()),
        },
        ReturnType::Enum(type_name) => match value {
            ScalarValue::Enum {
                type_name: stored, ..
            } if stored == type_name => value.clone(),
            ScalarValue::String(constant) => ScalarValue::enum_constant(type_name, constant),
            other => return Err(incompatible(other.kind(), target)),
        },
        ReturnType::Class => match value {
            ScalarValue::Class(name) | ScalarValue::String(name) => ScalarValue::Class(name.clone()),
            other => return Err(incompatible(other.kind(), target)),
        },
        ReturnType::Array(_) | ReturnType::Marker(_) | ReturnType::MarkerArray(_) => {
            return Err(incompatible(value.kind(), target))
        }
    };
    Ok(converted)
}

/// Convert a stored property value to a scalar or scalar-array `target`.
///
/// A single scalar stored for an array type becomes a one-element array. Nested markers are not
/// handled here.
///
/// # Errors
/// Returns a [`ConversionError`] for the first element that cannot be converted.
pub fn coerce(value: &PropertyValue, target: &ReturnType) -> Result<PropertyValue, ConversionError> {
    match (value, target) {
        (PropertyValue::Scalar(scalar), ReturnType::Array(element)) => {
            Ok(PropertyValue::Array(vec![coerce_scalar(scalar, element)?]))
        }
        (PropertyValue::Scalar(scalar), _) => Ok(PropertyValue::Scalar(coerce_scalar(scalar, target)?)),
        (PropertyValue::Array(items), ReturnType::Array(element)) => Ok(PropertyValue::Array(
            items
                .iter()
                .map(|item| coerce_scalar(item, element))
                .collect::<Result<_, _>>()?,
        )),
        (PropertyValue::Array(_), _) => Err(incompatible("array", target)),
        (PropertyValue::Datum(_), _) => Err(incompatible("marker", target)),
        (PropertyValue::DatumArray(_), _) => Err(incompatible("marker array", target)),
    }
}
