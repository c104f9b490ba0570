// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The push-style writer state machine shared by the binary, JSON and document writers.

use std::{fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    state::{ContextType, State},
};

/// The default limit on nested documents and arrays.
pub const DEFAULT_MAX_SERIALIZATION_DEPTH: usize = 1024;

/// Settings shared by every writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct WriterSettings {
    /// The maximum number of nested documents and arrays a writer accepts before failing.
    pub max_serialization_depth: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            max_serialization_depth: DEFAULT_MAX_SERIALIZATION_DEPTH,
        }
    }
}

impl WriterSettings {
    pub fn with_max_serialization_depth(mut self, max_serialization_depth: usize) -> Self {
        self.max_serialization_depth = max_serialization_depth;
        self
    }
}

/// Decides which field names a writer accepts.
///
/// A writer consults the validator on top of its validator stack for each name, and asks that
/// validator for the one to use inside each nested document. This lets a validator, for
/// instance, reject `$`-prefixed names only at the top level of a document.
pub trait FieldNameValidator: Send + Sync {
    /// Whether `name` may be written at the current level.
    fn validate(&self, name: &str) -> bool;

    /// The validator to use for the document stored under `name`.
    fn validator_for(self: Arc<Self>, name: &str) -> Arc<dyn FieldNameValidator>;
}

/// Accepts every field name at every level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpFieldNameValidator;

impl FieldNameValidator for NoOpFieldNameValidator {
    fn validate(&self, _name: &str) -> bool {
        true
    }

    fn validator_for(self: Arc<Self>, _name: &str) -> Arc<dyn FieldNameValidator> {
        self
    }
}

/// One level of the writer's context stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterContext {
    context_type: ContextType,
    name: Option<String>,
    index: usize,
}

impl WriterContext {
    fn new(context_type: ContextType) -> Self {
        Self {
            context_type,
            name: None,
            index: 0,
        }
    }

    pub fn context_type(&self) -> ContextType {
        self.context_type
    }

    /// The name of the field being written in this context, if one has been written.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The index of the next element, for array contexts.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The structural state every writer carries.
pub struct WriterCore {
    state: State,
    context: WriterContext,
    parents: Vec<WriterContext>,
    validator: Arc<dyn FieldNameValidator>,
    parent_validators: Vec<Arc<dyn FieldNameValidator>>,
    depth: usize,
    settings: WriterSettings,
    closed: bool,
}

impl fmt::Debug for WriterCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterCore")
            .field("state", &self.state)
            .field("context", &self.context)
            .field("depth", &self.depth)
            .field("settings", &self.settings)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Default for WriterCore {
    fn default() -> Self {
        Self::new(WriterSettings::default())
    }
}

impl WriterCore {
    pub fn new(settings: WriterSettings) -> Self {
        Self::with_validator(settings, Arc::new(NoOpFieldNameValidator))
    }

    pub fn with_validator(settings: WriterSettings, validator: Arc<dyn FieldNameValidator>) -> Self {
        Self {
            state: State::Initial,
            context: WriterContext::new(ContextType::TopLevel),
            parents: Vec::new(),
            validator,
            parent_validators: Vec::new(),
            depth: 0,
            settings,
            closed: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        trace!("writer state {} -> {}", self.state, state);
        self.state = state;
    }

    pub fn context(&self) -> &WriterContext {
        &self.context
    }

    pub fn context_type(&self) -> ContextType {
        self.context.context_type
    }

    pub fn parent_context_type(&self) -> Option<ContextType> {
        self.parents.last().map(|c| c.context_type)
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// The number of documents and arrays currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The key under which the next value is stored: the field name inside a document, the
    /// decimal index inside an array, and nothing at the top level.
    pub fn element_name(&self) -> Option<String> {
        match self.context.context_type {
            ContextType::Array => Some(self.context.index.to_string()),
            ContextType::TopLevel => None,
            _ => self.context.name.clone(),
        }
    }

    fn push_context(&mut self, context_type: ContextType) {
        trace!("writer enters {}", context_type);
        let parent = std::mem::replace(&mut self.context, WriterContext::new(context_type));
        self.parents.push(parent);
    }

    fn pop_context(&mut self) -> Result<WriterContext> {
        match self.parents.pop() {
            Some(parent) => {
                let popped = std::mem::replace(&mut self.context, parent);
                trace!("writer leaves {}", popped.context_type);
                Ok(popped)
            }
            None => Err(Error::invalid_operation(
                "Cannot leave the top-level context.",
            )),
        }
    }

    fn push_validator(&mut self) {
        let next = match self.context.name.as_deref() {
            Some(name) if self.context.context_type != ContextType::Array => {
                self.validator.clone().validator_for(name)
            }
            _ => self.validator.clone(),
        };
        let parent = std::mem::replace(&mut self.validator, next);
        self.parent_validators.push(parent);
    }

    fn pop_validator(&mut self) {
        if let Some(parent) = self.parent_validators.pop() {
            self.validator = parent;
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.settings.max_serialization_depth {
            debug!(
                "serialization depth {} exceeds the maximum of {}",
                self.depth, self.settings.max_serialization_depth
            );
            return Err(Error::serialization(
                "Maximum serialization depth exceeded (does the object being serialized have a \
                 circular reference?).",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Moves to the state that follows a completed value.
    fn complete_value(&mut self) {
        let next = match self.context.context_type {
            ContextType::TopLevel => State::Done,
            ContextType::Array => {
                self.context.index += 1;
                State::Value
            }
            _ => State::Name,
        };
        self.set_state(next);
    }

    fn close(&mut self) {
        self.closed = true;
        self.state = State::Closed;
    }
}

/// A sink for a stream of BSON values.
///
/// The provided methods enforce the writer grammar and keep the context and validator stacks
/// and the depth counter; implementors emit output in the `do_write_*` hooks, which see the
/// context of the value being written through [`WriterCore::element_name`].
pub trait BsonWriter {
    fn core(&self) -> &WriterCore;
    fn core_mut(&mut self) -> &mut WriterCore;

    /// Emits the opening of a document, or of the scope when the writer is in
    /// [`State::ScopeDocument`]. Called before the new context is pushed.
    fn do_write_start_document(&mut self) -> Result<()>;
    /// Emits the closing of a document. Called before its context is popped.
    fn do_write_end_document(&mut self) -> Result<()>;
    fn do_write_start_array(&mut self) -> Result<()>;
    fn do_write_end_array(&mut self) -> Result<()>;
    fn do_write_binary_data(&mut self, value: &Binary) -> Result<()>;
    fn do_write_boolean(&mut self, value: bool) -> Result<()>;
    fn do_write_date_time(&mut self, value: DateTime) -> Result<()>;
    fn do_write_db_pointer(&mut self, value: &DbPointer) -> Result<()>;
    fn do_write_decimal128(&mut self, value: Decimal128) -> Result<()>;
    fn do_write_double(&mut self, value: f64) -> Result<()>;
    fn do_write_int32(&mut self, value: i32) -> Result<()>;
    fn do_write_int64(&mut self, value: i64) -> Result<()>;
    fn do_write_java_script(&mut self, code: &str) -> Result<()>;
    /// Emits the code of a code-with-scope value; the scope document follows.
    fn do_write_java_script_with_scope(&mut self, code: &str) -> Result<()>;
    /// Finishes a code-with-scope value after its scope document has been closed.
    fn do_write_end_java_script_with_scope(&mut self) -> Result<()>;
    fn do_write_max_key(&mut self) -> Result<()>;
    fn do_write_min_key(&mut self) -> Result<()>;
    fn do_write_null(&mut self) -> Result<()>;
    fn do_write_object_id(&mut self, value: ObjectId) -> Result<()>;
    fn do_write_regular_expression(&mut self, value: &Regex) -> Result<()>;
    fn do_write_string(&mut self, value: &str) -> Result<()>;
    fn do_write_symbol(&mut self, value: &str) -> Result<()>;
    fn do_write_timestamp(&mut self, value: Timestamp) -> Result<()>;
    fn do_write_undefined(&mut self) -> Result<()>;

    fn state(&self) -> State {
        self.core().state()
    }

    fn is_closed(&self) -> bool {
        self.core().is_closed()
    }

    fn close(&mut self) {
        self.core_mut().close();
    }

    fn write_start_document(&mut self) -> Result<()> {
        const OPERATION: &str = "write_start_document";
        let state = verify_state(
            self,
            OPERATION,
            &[
                State::Initial,
                State::Value,
                State::ScopeDocument,
                State::Done,
            ],
        )?;

        let core = self.core_mut();
        core.push_validator();
        core.enter()?;

        self.do_write_start_document()?;
        let context_type = if state == State::ScopeDocument {
            ContextType::ScopeDocument
        } else {
            ContextType::Document
        };
        let core = self.core_mut();
        core.push_context(context_type);
        core.set_state(State::Name);
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        const OPERATION: &str = "write_end_document";
        verify_state(self, OPERATION, &[State::Name])?;
        let context_type = self.core().context_type();
        if !matches!(
            context_type,
            ContextType::Document | ContextType::ScopeDocument
        ) {
            return Err(Error::invalid_context(
                OPERATION,
                context_type,
                &[ContextType::Document, ContextType::ScopeDocument],
            ));
        }

        self.do_write_end_document()?;
        let core = self.core_mut();
        let popped = core.pop_context()?;
        core.pop_validator();
        core.leave();

        if popped.context_type == ContextType::ScopeDocument {
            self.do_write_end_java_script_with_scope()?;
            self.core_mut().pop_context()?;
        }
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        verify_state(self, "write_start_array", &[State::Value, State::Initial])?;

        let core = self.core_mut();
        core.push_validator();
        core.enter()?;

        self.do_write_start_array()?;
        let core = self.core_mut();
        core.push_context(ContextType::Array);
        core.set_state(State::Value);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        const OPERATION: &str = "write_end_array";
        verify_state(self, OPERATION, &[State::Value])?;
        let context_type = self.core().context_type();
        if context_type != ContextType::Array {
            return Err(Error::invalid_context(
                OPERATION,
                context_type,
                &[ContextType::Array],
            ));
        }

        self.do_write_end_array()?;
        let core = self.core_mut();
        core.pop_context()?;
        core.pop_validator();
        core.leave();
        core.complete_value();
        Ok(())
    }

    /// Writes the name of the next field, which must pass the current field-name validator.
    fn write_name(&mut self, name: &str) -> Result<()> {
        verify_state(self, "write_name", &[State::Name])?;
        if !self.core().validator.validate(name) {
            return Err(Error::illegal_argument(format!(
                "Invalid BSON field name {name}"
            )));
        }

        let core = self.core_mut();
        core.context.name = Some(name.to_string());
        core.set_state(State::Value);
        Ok(())
    }

    fn write_binary_data(&mut self, value: &Binary) -> Result<()> {
        verify_value_state(self, "write_binary_data")?;
        self.do_write_binary_data(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        verify_value_state(self, "write_boolean")?;
        self.do_write_boolean(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_date_time(&mut self, value: DateTime) -> Result<()> {
        verify_value_state(self, "write_date_time")?;
        self.do_write_date_time(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_db_pointer(&mut self, value: &DbPointer) -> Result<()> {
        verify_value_state(self, "write_db_pointer")?;
        self.do_write_db_pointer(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        verify_value_state(self, "write_decimal128")?;
        self.do_write_decimal128(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        verify_value_state(self, "write_double")?;
        self.do_write_double(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<()> {
        verify_value_state(self, "write_int32")?;
        self.do_write_int32(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        verify_value_state(self, "write_int64")?;
        self.do_write_int64(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_java_script(&mut self, code: &str) -> Result<()> {
        verify_value_state(self, "write_java_script")?;
        self.do_write_java_script(code)?;
        self.core_mut().complete_value();
        Ok(())
    }

    /// Starts a code-with-scope value. The scope must follow as a document written with
    /// [`write_start_document`](BsonWriter::write_start_document) and
    /// [`write_end_document`](BsonWriter::write_end_document), which completes the value.
    fn write_java_script_with_scope(&mut self, code: &str) -> Result<()> {
        verify_value_state(self, "write_java_script_with_scope")?;
        self.do_write_java_script_with_scope(code)?;
        let core = self.core_mut();
        core.push_context(ContextType::JavaScriptWithScope);
        core.set_state(State::ScopeDocument);
        Ok(())
    }

    fn write_max_key(&mut self) -> Result<()> {
        verify_value_state(self, "write_max_key")?;
        self.do_write_max_key()?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_min_key(&mut self) -> Result<()> {
        verify_value_state(self, "write_min_key")?;
        self.do_write_min_key()?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        verify_value_state(self, "write_null")?;
        self.do_write_null()?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_object_id(&mut self, value: ObjectId) -> Result<()> {
        verify_value_state(self, "write_object_id")?;
        self.do_write_object_id(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        verify_value_state(self, "write_regular_expression")?;
        self.do_write_regular_expression(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        verify_value_state(self, "write_string")?;
        self.do_write_string(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_symbol(&mut self, value: &str) -> Result<()> {
        verify_value_state(self, "write_symbol")?;
        self.do_write_symbol(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        verify_value_state(self, "write_timestamp")?;
        self.do_write_timestamp(value)?;
        self.core_mut().complete_value();
        Ok(())
    }

    fn write_undefined(&mut self) -> Result<()> {
        verify_value_state(self, "write_undefined")?;
        self.do_write_undefined()?;
        self.core_mut().complete_value();
        Ok(())
    }
}

fn verify_state<W: BsonWriter + ?Sized>(
    writer: &W,
    operation: &'static str,
    valid: &[State],
) -> Result<State> {
    let core = writer.core();
    if core.is_closed() {
        return Err(Error::closed(operation));
    }
    let state = core.state();
    if !valid.contains(&state) {
        return Err(Error::invalid_state(operation, state, valid));
    }
    Ok(state)
}

fn verify_value_state<W: BsonWriter + ?Sized>(writer: &W, operation: &'static str) -> Result<()> {
    verify_state(writer, operation, &[State::Value, State::Initial]).map(|_| ())
}
