//! States and context types shared by the reader and writer state machines.

use std::fmt::{self, Display};

/// The position of a reader or writer within the grammar of a BSON value stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum State {
    /// Nothing has been read or written yet.
    Initial,
    /// The next thing to be read is an element's type.
    Type,
    /// The next thing to be read or written is an element's name.
    Name,
    /// The next thing to be read or written is a value.
    Value,
    /// A JavaScript-with-scope code string has been handled and its scope document is next.
    ScopeDocument,
    /// The end of a document has been reached.
    EndOfDocument,
    /// The end of an array has been reached.
    EndOfArray,
    /// A complete top-level value has been read or written.
    Done,
    /// The reader or writer has been closed.
    Closed,
}

impl Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Initial => "INITIAL",
            State::Type => "TYPE",
            State::Name => "NAME",
            State::Value => "VALUE",
            State::ScopeDocument => "SCOPE_DOCUMENT",
            State::EndOfDocument => "END_OF_DOCUMENT",
            State::EndOfArray => "END_OF_ARRAY",
            State::Done => "DONE",
            State::Closed => "CLOSED",
        })
    }
}

/// The kind of structure a reader or writer is currently inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextType {
    TopLevel,
    Document,
    Array,
    JavaScriptWithScope,
    ScopeDocument,
}

impl Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextType::TopLevel => "TOP_LEVEL",
            ContextType::Document => "DOCUMENT",
            ContextType::Array => "ARRAY",
            ContextType::JavaScriptWithScope => "JAVASCRIPT_WITH_SCOPE",
            ContextType::ScopeDocument => "SCOPE_DOCUMENT",
        })
    }
}

/// Renders `[a, b, c]` as `a, b or c`.
pub(crate) fn one_of<T: Display>(items: &[T]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(ToString::to_string).collect();
            format!("{} or {}", init.join(", "), last)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_of_joins_with_or() {
        assert_eq!(one_of::<State>(&[]), "");
        assert_eq!(one_of(&[State::Value]), "VALUE");
        assert_eq!(
            one_of(&[State::Initial, State::Value, State::Done]),
            "INITIAL, VALUE or DONE"
        );
    }
}
