use std::fmt::Write as _;

use log::trace;

use crate::{
    error::{Error, Result},
    state::{ContextType, State},
};

#[derive(Debug, Clone)]
struct StrictContext {
    context_type: ContextType,
    indentation: String,
    has_elements: bool,
}

/// The formatting knobs of a [`StrictJsonWriter`].
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub(crate) indent: bool,
    pub(crate) new_line_characters: String,
    pub(crate) indent_characters: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            indent: false,
            new_line_characters: "\n".to_string(),
            indent_characters: "  ".to_string(),
        }
    }
}

/// A writer of plain JSON text with its own object/array state machine.
///
/// This is the surface a [`Converter`](super::Converter) writes through: it knows nothing about
/// BSON types, only objects, arrays, names and JSON scalars, plus [`write_raw`] for shell
/// constructors such as `ObjectId("...")`.
///
/// [`write_raw`]: StrictJsonWriter::write_raw
#[derive(Debug, Clone)]
pub struct StrictJsonWriter {
    output: String,
    layout: Layout,
    contexts: Vec<StrictContext>,
    state: State,
}

impl Default for StrictJsonWriter {
    fn default() -> Self {
        Self::with_layout(Layout::default())
    }
}

impl StrictJsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_layout(layout: Layout) -> Self {
        Self {
            output: String::new(),
            layout,
            contexts: vec![StrictContext {
                context_type: ContextType::TopLevel,
                indentation: String::new(),
                has_elements: false,
            }],
            state: State::Initial,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn into_string(self) -> String {
        self.output
    }

    fn context(&self) -> &StrictContext {
        // The top-level context is never popped.
        &self.contexts[self.contexts.len() - 1]
    }

    fn context_mut(&mut self) -> &mut StrictContext {
        let last = self.contexts.len() - 1;
        &mut self.contexts[last]
    }

    fn set_state(&mut self, state: State) {
        trace!("strict json writer state {} -> {state}", self.state);
        self.state = state;
    }

    fn check_state(&self, operation: &'static str, valid: &[State]) -> Result<()> {
        if valid.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::invalid_state(operation, self.state, valid))
        }
    }

    fn check_value_state(&self, operation: &'static str) -> Result<()> {
        self.check_state(operation, &[State::Initial, State::Value])
    }

    fn pre_write_value(&mut self) {
        let indent = self.layout.indent;
        let context = self.context();
        if context.context_type == ContextType::Array {
            let has_elements = context.has_elements;
            let indentation = context.indentation.clone();
            if has_elements {
                self.output.push(',');
            }
            if indent {
                let new_line = self.layout.new_line_characters.clone();
                self.output.push_str(&new_line);
                self.output.push_str(&indentation);
            } else if has_elements {
                self.output.push(' ');
            }
        }
        self.context_mut().has_elements = true;
    }

    fn set_next_state(&mut self) {
        let next = match self.context().context_type {
            ContextType::Array => State::Value,
            ContextType::TopLevel => State::Done,
            _ => State::Name,
        };
        self.set_state(next);
    }

    fn push_context(&mut self, context_type: ContextType) {
        let indentation = format!(
            "{}{}",
            self.context().indentation,
            self.layout.indent_characters
        );
        self.contexts.push(StrictContext {
            context_type,
            indentation,
            has_elements: false,
        });
    }

    fn pop_context(&mut self) -> Result<StrictContext> {
        if self.contexts.len() <= 1 {
            return Err(Error::invalid_operation(
                "There is no object or array to end.",
            ));
        }
        self.contexts
            .pop()
            .ok_or_else(|| Error::invalid_operation("There is no object or array to end."))
    }

    /// Writes the separator and indentation that close a structure.
    fn write_closing_whitespace(&mut self, closed: &StrictContext) {
        if self.layout.indent && closed.has_elements {
            let new_line = self.layout.new_line_characters.clone();
            self.output.push_str(&new_line);
            let indentation = self.context().indentation.clone();
            self.output.push_str(&indentation);
        } else if closed.context_type == ContextType::Document {
            self.output.push(' ');
        }
    }

    pub fn write_start_object(&mut self) -> Result<()> {
        self.check_value_state("write_start_object")?;
        self.pre_write_value();
        self.output.push('{');
        self.push_context(ContextType::Document);
        self.set_state(State::Name);
        Ok(())
    }

    pub fn write_end_object(&mut self) -> Result<()> {
        self.check_state("write_end_object", &[State::Name])?;
        if self.context().context_type != ContextType::Document {
            return Err(Error::invalid_context(
                "write_end_object",
                self.context().context_type,
                &[ContextType::Document],
            ));
        }
        let closed = self.pop_context()?;
        self.write_closing_whitespace(&closed);
        self.output.push('}');
        self.set_next_state();
        Ok(())
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.check_value_state("write_start_array")?;
        self.pre_write_value();
        self.output.push('[');
        self.push_context(ContextType::Array);
        self.set_state(State::Value);
        Ok(())
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        self.check_state("write_end_array", &[State::Value])?;
        if self.context().context_type != ContextType::Array {
            return Err(Error::invalid_context(
                "write_end_array",
                self.context().context_type,
                &[ContextType::Array],
            ));
        }
        let closed = self.pop_context()?;
        self.write_closing_whitespace(&closed);
        self.output.push(']');
        self.set_next_state();
        Ok(())
    }

    pub fn write_name(&mut self, name: &str) -> Result<()> {
        self.check_state("write_name", &[State::Name])?;
        let context = self.context();
        let has_elements = context.has_elements;
        let indentation = context.indentation.clone();
        if has_elements {
            self.output.push(',');
        }
        if self.layout.indent {
            let new_line = self.layout.new_line_characters.clone();
            self.output.push_str(&new_line);
            self.output.push_str(&indentation);
        } else {
            self.output.push(' ');
        }
        write_quoted(&mut self.output, name);
        self.output.push_str(" : ");
        self.context_mut().has_elements = true;
        self.set_state(State::Value);
        Ok(())
    }

    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_raw(if value { "true" } else { "false" })
    }

    /// Writes an already formatted number.
    pub fn write_number(&mut self, value: &str) -> Result<()> {
        self.write_raw(value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.check_value_state("write_string")?;
        self.pre_write_value();
        write_quoted(&mut self.output, value);
        self.set_next_state();
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write_raw("null")
    }

    /// Writes `value` verbatim in a value position.
    pub fn write_raw(&mut self, value: &str) -> Result<()> {
        self.check_value_state("write_raw")?;
        self.pre_write_value();
        self.output.push_str(value);
        self.set_next_state();
        Ok(())
    }
}

fn write_quoted(output: &mut String, value: &str) {
    output.push('"');
    for c in value.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{08}' => output.push_str("\\b"),
            '\u{0c}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                // Writing to a String cannot fail.
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn separates_names_and_elements() {
        let mut writer = StrictJsonWriter::new();
        writer.write_start_object().unwrap();
        writer.write_name("a").unwrap();
        writer.write_number("1").unwrap();
        writer.write_name("b").unwrap();
        writer.write_start_array().unwrap();
        writer.write_boolean(true).unwrap();
        writer.write_null().unwrap();
        writer.write_end_array().unwrap();
        writer.write_name("c").unwrap();
        writer.write_start_object().unwrap();
        writer.write_end_object().unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(writer.state(), State::Done);
        assert_eq!(
            writer.into_string(),
            r#"{ "a" : 1, "b" : [true, null], "c" : { } }"#
        );
    }

    #[test]
    fn indents_nested_structures() {
        let mut writer = StrictJsonWriter::with_layout(Layout {
            indent: true,
            ..Layout::default()
        });
        writer.write_start_object().unwrap();
        writer.write_name("a").unwrap();
        writer.write_start_array().unwrap();
        writer.write_number("1").unwrap();
        writer.write_end_array().unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(writer.into_string(), "{\n  \"a\" : [\n    1\n  ]\n}");
    }

    #[test]
    fn escapes_strings() {
        let mut writer = StrictJsonWriter::new();
        writer.write_string("q\"b\\\n\t\u{1}é").unwrap();
        assert_eq!(writer.into_string(), r#""q\"b\\\n\t\u0001é""#);
    }

    #[test]
    fn rejects_names_in_value_position() {
        let mut writer = StrictJsonWriter::new();
        let error = writer.write_name("a").unwrap_err();
        assert!(error.is_invalid_state());
        writer.write_start_array().unwrap();
        assert!(writer.write_end_object().unwrap_err().is_invalid_state());
    }
}
