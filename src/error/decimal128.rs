use thiserror::Error as ThisError;

use crate::error::{Error, ErrorKind};

/// The kinds of errors that can occur when parsing a [`Decimal128`](crate::Decimal128) from text.
#[derive(Clone, Debug, ThisError)]
#[non_exhaustive]
pub enum Decimal128ErrorKind {
    /// An exponent marker was not followed by any digits.
    #[error("empty exponent")]
    EmptyExponent,

    /// The exponent could not be parsed.
    #[error("invalid exponent: {message}")]
    #[non_exhaustive]
    InvalidExponent {
        /// A message describing the error.
        message: String,
    },

    /// The coefficient could not be parsed.
    #[error("invalid coefficient: {message}")]
    #[non_exhaustive]
    InvalidCoefficient {
        /// A message describing the error.
        message: String,
    },

    /// The value is too large to be represented.
    #[error("overflow")]
    Overflow,

    /// The value is too small to be represented.
    #[error("underflow")]
    Underflow,

    /// Representing the value would require discarding non-zero digits.
    #[error("inexact rounding")]
    InexactRounding,

    /// The text is not a decimal number.
    #[error("unparseable input \"{input}\"")]
    #[non_exhaustive]
    Unparseable {
        /// The rejected text.
        input: String,
    },
}

impl Error {
    pub(crate) fn decimal128(kind: Decimal128ErrorKind) -> Self {
        ErrorKind::Decimal128 { kind }.into()
    }

    #[cfg(test)]
    pub(crate) fn is_decimal128_unparseable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Decimal128 {
                kind: Decimal128ErrorKind::Unparseable { .. },
            }
        )
    }

    #[cfg(test)]
    pub(crate) fn is_decimal128_overflow(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Decimal128 {
                kind: Decimal128ErrorKind::Overflow,
            }
        )
    }
}
