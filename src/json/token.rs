use std::fmt;

use crate::bson::Regex;

/// A lexical token of JSON, Extended JSON or shell-mode text.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Double(f64),
    Int32(i32),
    Int64(i64),
    /// A quoted string with its escapes resolved.
    String(String),
    /// A bare identifier such as a field name, `true` or `ObjectId`.
    UnquotedString(String),
    RegularExpression(Regex),
    EndOfFile,
}

/// The kind of a [`JsonToken`], without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonTokenType {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Double,
    Int32,
    Int64,
    String,
    UnquotedString,
    RegularExpression,
    EndOfFile,
}

impl JsonToken {
    pub fn token_type(&self) -> JsonTokenType {
        match self {
            Self::BeginObject => JsonTokenType::BeginObject,
            Self::EndObject => JsonTokenType::EndObject,
            Self::BeginArray => JsonTokenType::BeginArray,
            Self::EndArray => JsonTokenType::EndArray,
            Self::LeftParen => JsonTokenType::LeftParen,
            Self::RightParen => JsonTokenType::RightParen,
            Self::Colon => JsonTokenType::Colon,
            Self::Comma => JsonTokenType::Comma,
            Self::Double(_) => JsonTokenType::Double,
            Self::Int32(_) => JsonTokenType::Int32,
            Self::Int64(_) => JsonTokenType::Int64,
            Self::String(_) => JsonTokenType::String,
            Self::UnquotedString(_) => JsonTokenType::UnquotedString,
            Self::RegularExpression(_) => JsonTokenType::RegularExpression,
            Self::EndOfFile => JsonTokenType::EndOfFile,
        }
    }

    /// The text of a string or identifier token.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::UnquotedString(s) => Some(s),
            _ => None,
        }
    }

    /// The value of an integral token, widened to 64 bits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(i) => Some(i64::from(*i)),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this is an identifier token spelling `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Self::UnquotedString(s) if s == word)
    }
}

/// Renders the lexeme, as used in parse error messages.
impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeginObject => f.write_str("{"),
            Self::EndObject => f.write_str("}"),
            Self::BeginArray => f.write_str("["),
            Self::EndArray => f.write_str("]"),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::Colon => f.write_str(":"),
            Self::Comma => f.write_str(","),
            Self::Double(d) => write!(f, "{d}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::String(s) | Self::UnquotedString(s) => f.write_str(s),
            Self::RegularExpression(r) => write!(f, "{r}"),
            Self::EndOfFile => f.write_str("<eof>"),
        }
    }
}
