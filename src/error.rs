//! Contains the error-related types for the `bson_codec` crate.

mod datetime;
mod decimal128;
mod oid;
mod state;

use thiserror::Error;

pub use self::{
    datetime::DateTimeErrorKind,
    decimal128::Decimal128ErrorKind,
    oid::ObjectIdErrorKind,
};
use crate::state::{ContextType, State, one_of};
use crate::spec::ElementType;

/// The result type for all methods that can return an error in the `bson_codec` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bson_codec` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "Error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `bson_codec` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An operation was invoked from a reader or writer state in which it is not legal.
    #[error(
        "{operation} can only be called when State is {}, not when State is {actual}.",
        one_of::<State>(.valid)
    )]
    #[non_exhaustive]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,

        /// The state the reader or writer was in.
        actual: State,

        /// The states from which the operation is legal.
        valid: Vec<State>,
    },

    /// An operation was invoked inside a context type in which it is not legal.
    #[error(
        "{operation} can only be called when ContextType is {}, not when ContextType is \
         {actual}.",
        one_of::<ContextType>(.valid)
    )]
    #[non_exhaustive]
    InvalidContext {
        /// The operation that was attempted.
        operation: &'static str,

        /// The context type the reader or writer was in.
        actual: ContextType,

        /// The context types in which the operation is legal.
        valid: Vec<ContextType>,
    },

    /// A typed read was attempted while the reader was positioned on a value of another type.
    #[error(
        "{operation} can only be called when CurrentBSONType is {expected}, not when \
         CurrentBSONType is {actual}."
    )]
    #[non_exhaustive]
    UnexpectedType {
        /// The operation that was attempted.
        operation: &'static str,

        /// The type the operation reads.
        expected: ElementType,

        /// The type of the value the reader is positioned on.
        actual: ElementType,
    },

    /// An operation was attempted that is not valid for the current position.
    #[error("{message}")]
    #[non_exhaustive]
    InvalidOperation { message: String },

    /// The reader or writer has been closed.
    #[error("{operation} cannot be called once the reader or writer is closed.")]
    #[non_exhaustive]
    Closed { operation: &'static str },

    /// A mark was requested while another one was still outstanding.
    #[error("A mark is already outstanding; reset or discard it before taking another.")]
    MarkOutstanding,

    /// A reset was requested without an outstanding mark.
    #[error("Cannot reset without a valid mark.")]
    NoMark,

    /// Malformed JSON text was encountered.
    #[error("{message}")]
    #[non_exhaustive]
    Parse {
        /// A message describing the error.
        message: String,

        /// The character offset into the input at which the error was detected, if known.
        position: Option<usize>,
    },

    /// A structural violation of the BSON format was detected.
    #[error("{message}")]
    #[non_exhaustive]
    Serialization { message: String },

    /// Malformed BSON bytes were encountered.
    #[error("Malformed BSON: {message}")]
    #[non_exhaustive]
    MalformedValue { message: String },

    /// A numeric conversion would have lost precision.
    #[error("{message}")]
    #[non_exhaustive]
    Conversion { message: String },

    /// A caller-supplied argument violated a precondition.
    #[error("{message}")]
    #[non_exhaustive]
    IllegalArgument { message: String },

    /// An error related to the [`ObjectId`](crate::oid::ObjectId) type occurred.
    #[error("An ObjectId-related error occurred: {kind}")]
    #[non_exhaustive]
    ObjectId {
        /// The kind of error that occurred.
        kind: ObjectIdErrorKind,
    },

    /// An error related to the [`DateTime`](crate::DateTime) type occurred.
    #[error("A DateTime-related error occurred: {kind}")]
    #[non_exhaustive]
    DateTime {
        /// The kind of error that occurred.
        kind: DateTimeErrorKind,
    },

    /// An error related to the [`Decimal128`](crate::Decimal128) type occurred.
    #[error("A Decimal128-related error occurred: {kind}")]
    #[non_exhaustive]
    Decimal128 {
        /// The kind of error that occurred.
        kind: Decimal128ErrorKind,
    },

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// A [`std::io::Error`] occurred.
    #[error("An IO error occurred: {0}")]
    Io(std::io::Error),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::Io(value).into()
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn parse_at(message: impl ToString, position: usize) -> Self {
        ErrorKind::Parse {
            message: message.to_string(),
            position: Some(position),
        }
        .into()
    }

    pub(crate) fn serialization(message: impl ToString) -> Self {
        ErrorKind::Serialization {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn malformed_value(message: impl ToString) -> Self {
        ErrorKind::MalformedValue {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn conversion(message: impl ToString) -> Self {
        ErrorKind::Conversion {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn illegal_argument(message: impl ToString) -> Self {
        ErrorKind::IllegalArgument {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_operation(message: impl ToString) -> Self {
        ErrorKind::InvalidOperation {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn utf8_encoding() -> Self {
        ErrorKind::Utf8Encoding.into()
    }

    /// The character offset at which a JSON parse error was detected, if this is one.
    pub fn parse_position(&self) -> Option<usize> {
        match self.kind {
            ErrorKind::Parse { position, .. } => position,
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_parse(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_malformed_value(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedValue { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_illegal_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::IllegalArgument { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::Conversion { .. })
    }
}
