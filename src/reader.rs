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

//! The pull-style reader state machine shared by the binary and JSON readers.
//!
//! A [`BsonReader`] walks a stream of BSON values one element at a time. Every public read
//! method checks that it is legal in the reader's current [`State`], resolves the type of the
//! next element if that has not happened yet, and then hands the actual decoding to a
//! source-specific `do_read_*` hook. Implementors provide the hooks and [`BsonReader::read_bson_type`];
//! the sequencing rules live here.

use log::trace;

use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    state::{ContextType, State},
};

/// One level of the reader's context stack.
///
/// `start` and `size` describe the byte extent of a binary document or array and are left at
/// zero by text readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderContext {
    context_type: ContextType,
    start: usize,
    size: usize,
}

impl ReaderContext {
    /// A context without a byte extent.
    pub fn new(context_type: ContextType) -> Self {
        Self {
            context_type,
            start: 0,
            size: 0,
        }
    }

    /// A context covering `size` bytes beginning at `start`.
    pub fn with_extent(context_type: ContextType, start: usize, size: usize) -> Self {
        Self {
            context_type,
            start,
            size,
        }
    }

    pub fn context_type(&self) -> ContextType {
        self.context_type
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// The structural state every reader carries: the machine state, the context stack, and the
/// type and name of the element the reader is positioned on.
///
/// The core is `Clone` so that readers can snapshot it for [`BsonReader::mark`].
#[derive(Debug, Clone)]
pub struct ReaderCore {
    state: State,
    context: ReaderContext,
    parents: Vec<ReaderContext>,
    current_type: ElementType,
    current_name: Option<String>,
    closed: bool,
}

impl Default for ReaderCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderCore {
    pub fn new() -> Self {
        Self {
            state: State::Initial,
            context: ReaderContext::new(ContextType::TopLevel),
            parents: Vec::new(),
            current_type: ElementType::EndOfDocument,
            current_name: None,
            closed: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        trace!("reader state {} -> {}", self.state, state);
        self.state = state;
    }

    pub fn context(&self) -> &ReaderContext {
        &self.context
    }

    pub fn context_type(&self) -> ContextType {
        self.context.context_type
    }

    /// The context type enclosing the current one, if any.
    pub fn parent_context_type(&self) -> Option<ContextType> {
        self.parents.last().map(|c| c.context_type)
    }

    /// Nesting depth, zero at the top level.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn push_context(&mut self, context: ReaderContext) {
        trace!("reader enters {}", context.context_type);
        let parent = std::mem::replace(&mut self.context, context);
        self.parents.push(parent);
    }

    /// Pops the current context and returns it.
    pub fn pop_context(&mut self) -> Result<ReaderContext> {
        match self.parents.pop() {
            Some(parent) => {
                let popped = std::mem::replace(&mut self.context, parent);
                trace!("reader leaves {}", popped.context_type);
                Ok(popped)
            }
            None => Err(Error::invalid_operation(
                "Cannot leave the top-level context.",
            )),
        }
    }

    pub fn current_type(&self) -> ElementType {
        self.current_type
    }

    pub fn set_current_type(&mut self, element_type: ElementType) {
        self.current_type = element_type;
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    pub fn set_current_name(&mut self, name: Option<String>) {
        self.current_name = name;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        self.closed = true;
        self.state = State::Closed;
    }

    /// The state that follows a completed value in the current context.
    fn next_state(&self) -> Result<State> {
        match self.context.context_type {
            ContextType::Array | ContextType::Document | ContextType::ScopeDocument => {
                Ok(State::Type)
            }
            ContextType::TopLevel => Ok(State::Done),
            other => Err(Error::invalid_context(
                "next_state",
                other,
                &[
                    ContextType::TopLevel,
                    ContextType::Document,
                    ContextType::Array,
                    ContextType::ScopeDocument,
                ],
            )),
        }
    }

    fn advance(&mut self) -> Result<()> {
        let next = self.next_state()?;
        self.set_state(next);
        Ok(())
    }
}

/// A cursor over a stream of BSON values.
///
/// The provided methods implement the reader grammar; implementors supply the structural
/// state through [`core`](BsonReader::core)/[`core_mut`](BsonReader::core_mut), decide the
/// next element type in [`read_bson_type`](BsonReader::read_bson_type) and decode primitives
/// in the `do_*` hooks. The hooks are called only after the state checks have passed and are
/// not meant to be called directly.
///
/// ```
/// use bson_codec::{doc, reader::BsonReader, raw::BinaryReader, spec::ElementType};
///
/// let bytes = doc! { "a": 1, "b": "hi" }.to_bson_bytes()?;
/// let mut reader = BinaryReader::new(&bytes);
/// reader.read_start_document()?;
/// assert_eq!(reader.read_bson_type()?, ElementType::Int32);
/// assert_eq!(reader.read_name()?, "a");
/// assert_eq!(reader.read_int32()?, 1);
/// reader.verify_name("b")?;
/// assert_eq!(reader.read_string()?, "hi");
/// reader.read_end_document()?;
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub trait BsonReader {
    /// The structural state of this reader.
    fn core(&self) -> &ReaderCore;

    /// Mutable access to the structural state of this reader.
    fn core_mut(&mut self) -> &mut ReaderCore;

    /// Advances to the next element and returns its type, or
    /// [`ElementType::EndOfDocument`] when the current document or array has no more
    /// elements.
    fn read_bson_type(&mut self) -> Result<ElementType>;

    /// Snapshots the reader so that a later [`reset`](BsonReader::reset) can return to this
    /// point. Only one mark may be outstanding.
    fn mark(&mut self) -> Result<()>;

    /// Returns the reader to the outstanding mark and clears it.
    fn reset(&mut self) -> Result<()>;

    /// Drops the outstanding mark, if any, without moving the reader.
    fn discard_mark(&mut self);

    fn do_read_binary_data(&mut self) -> Result<Binary>;
    fn do_peek_binary_subtype(&mut self) -> Result<BinarySubtype>;
    fn do_peek_binary_size(&mut self) -> Result<usize>;
    fn do_read_boolean(&mut self) -> Result<bool>;
    fn do_read_date_time(&mut self) -> Result<DateTime>;
    fn do_read_db_pointer(&mut self) -> Result<DbPointer>;
    fn do_read_decimal128(&mut self) -> Result<Decimal128>;
    fn do_read_double(&mut self) -> Result<f64>;
    fn do_read_int32(&mut self) -> Result<i32>;
    fn do_read_int64(&mut self) -> Result<i64>;
    fn do_read_java_script(&mut self) -> Result<String>;
    /// Reads the code of a code-with-scope value and enters its
    /// [`ContextType::JavaScriptWithScope`] context.
    fn do_read_java_script_with_scope(&mut self) -> Result<String>;
    fn do_read_max_key(&mut self) -> Result<()>;
    fn do_read_min_key(&mut self) -> Result<()>;
    fn do_read_null(&mut self) -> Result<()>;
    fn do_read_object_id(&mut self) -> Result<ObjectId>;
    fn do_read_regular_expression(&mut self) -> Result<Regex>;
    fn do_read_string(&mut self) -> Result<String>;
    fn do_read_symbol(&mut self) -> Result<String>;
    fn do_read_timestamp(&mut self) -> Result<Timestamp>;
    fn do_read_undefined(&mut self) -> Result<()>;
    /// Enters a document, pushing a [`ContextType::Document`] context, or a
    /// [`ContextType::ScopeDocument`] one when the parent is a code-with-scope value.
    fn do_read_start_document(&mut self) -> Result<()>;
    /// Leaves a document, popping its context and, for a scope document, the enclosing
    /// code-with-scope context as well.
    fn do_read_end_document(&mut self) -> Result<()>;
    fn do_read_start_array(&mut self) -> Result<()>;
    fn do_read_end_array(&mut self) -> Result<()>;
    fn do_skip_name(&mut self) -> Result<()>;
    fn do_skip_value(&mut self) -> Result<()>;

    /// The current machine state.
    fn state(&self) -> State {
        self.core().state()
    }

    /// The type of the element the reader is positioned on.
    fn current_type(&self) -> ElementType {
        self.core().current_type()
    }

    /// The name of the element the reader is positioned on, if it has one.
    fn current_name(&self) -> Option<&str> {
        self.core().current_name()
    }

    fn is_closed(&self) -> bool {
        self.core().is_closed()
    }

    /// Closes the reader. Closing twice is harmless; every other operation fails afterwards.
    fn close(&mut self) {
        self.core_mut().close();
    }

    fn read_binary_data(&mut self) -> Result<Binary> {
        verify_type(self, "read_binary_data", ElementType::Binary)?;
        self.core_mut().advance()?;
        self.do_read_binary_data()
    }

    /// Returns the subtype of the binary value the reader is positioned on without
    /// consuming it.
    fn peek_binary_subtype(&mut self) -> Result<BinarySubtype> {
        verify_type(self, "peek_binary_subtype", ElementType::Binary)?;
        self.do_peek_binary_subtype()
    }

    /// Returns the length of the binary value the reader is positioned on without
    /// consuming it.
    fn peek_binary_size(&mut self) -> Result<usize> {
        verify_type(self, "peek_binary_size", ElementType::Binary)?;
        self.do_peek_binary_size()
    }

    fn read_boolean(&mut self) -> Result<bool> {
        verify_type(self, "read_boolean", ElementType::Boolean)?;
        self.core_mut().advance()?;
        self.do_read_boolean()
    }

    fn read_date_time(&mut self) -> Result<DateTime> {
        verify_type(self, "read_date_time", ElementType::DateTime)?;
        self.core_mut().advance()?;
        self.do_read_date_time()
    }

    fn read_db_pointer(&mut self) -> Result<DbPointer> {
        verify_type(self, "read_db_pointer", ElementType::DbPointer)?;
        self.core_mut().advance()?;
        self.do_read_db_pointer()
    }

    fn read_decimal128(&mut self) -> Result<Decimal128> {
        verify_type(self, "read_decimal128", ElementType::Decimal128)?;
        self.core_mut().advance()?;
        self.do_read_decimal128()
    }

    fn read_double(&mut self) -> Result<f64> {
        verify_type(self, "read_double", ElementType::Double)?;
        self.core_mut().advance()?;
        self.do_read_double()
    }

    fn read_int32(&mut self) -> Result<i32> {
        verify_type(self, "read_int32", ElementType::Int32)?;
        self.core_mut().advance()?;
        self.do_read_int32()
    }

    fn read_int64(&mut self) -> Result<i64> {
        verify_type(self, "read_int64", ElementType::Int64)?;
        self.core_mut().advance()?;
        self.do_read_int64()
    }

    fn read_java_script(&mut self) -> Result<String> {
        verify_type(self, "read_java_script", ElementType::JavaScriptCode)?;
        self.core_mut().advance()?;
        self.do_read_java_script()
    }

    /// Reads the code of a code-with-scope value. The scope follows and must be read with
    /// [`read_start_document`](BsonReader::read_start_document).
    fn read_java_script_with_scope(&mut self) -> Result<String> {
        verify_type(
            self,
            "read_java_script_with_scope",
            ElementType::JavaScriptCodeWithScope,
        )?;
        self.core_mut().set_state(State::ScopeDocument);
        self.do_read_java_script_with_scope()
    }

    fn read_max_key(&mut self) -> Result<()> {
        verify_type(self, "read_max_key", ElementType::MaxKey)?;
        self.core_mut().advance()?;
        self.do_read_max_key()
    }

    fn read_min_key(&mut self) -> Result<()> {
        verify_type(self, "read_min_key", ElementType::MinKey)?;
        self.core_mut().advance()?;
        self.do_read_min_key()
    }

    fn read_null(&mut self) -> Result<()> {
        verify_type(self, "read_null", ElementType::Null)?;
        self.core_mut().advance()?;
        self.do_read_null()
    }

    fn read_object_id(&mut self) -> Result<ObjectId> {
        verify_type(self, "read_object_id", ElementType::ObjectId)?;
        self.core_mut().advance()?;
        self.do_read_object_id()
    }

    fn read_regular_expression(&mut self) -> Result<Regex> {
        verify_type(
            self,
            "read_regular_expression",
            ElementType::RegularExpression,
        )?;
        self.core_mut().advance()?;
        self.do_read_regular_expression()
    }

    fn read_string(&mut self) -> Result<String> {
        verify_type(self, "read_string", ElementType::String)?;
        self.core_mut().advance()?;
        self.do_read_string()
    }

    fn read_symbol(&mut self) -> Result<String> {
        verify_type(self, "read_symbol", ElementType::Symbol)?;
        self.core_mut().advance()?;
        self.do_read_symbol()
    }

    fn read_timestamp(&mut self) -> Result<Timestamp> {
        verify_type(self, "read_timestamp", ElementType::Timestamp)?;
        self.core_mut().advance()?;
        self.do_read_timestamp()
    }

    fn read_undefined(&mut self) -> Result<()> {
        verify_type(self, "read_undefined", ElementType::Undefined)?;
        self.core_mut().advance()?;
        self.do_read_undefined()
    }

    fn read_start_document(&mut self) -> Result<()> {
        verify_type(self, "read_start_document", ElementType::EmbeddedDocument)?;
        self.do_read_start_document()?;
        self.core_mut().set_state(State::Type);
        Ok(())
    }

    fn read_end_document(&mut self) -> Result<()> {
        const OPERATION: &str = "read_end_document";
        ensure_open(self, OPERATION)?;

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
        if self.core().state() == State::Type {
            self.read_bson_type()?;
        }
        verify_state(self, OPERATION, &[State::EndOfDocument])?;

        self.do_read_end_document()?;
        set_state_on_end(self)
    }

    fn read_start_array(&mut self) -> Result<()> {
        verify_type(self, "read_start_array", ElementType::Array)?;
        self.do_read_start_array()?;
        self.core_mut().set_state(State::Type);
        Ok(())
    }

    fn read_end_array(&mut self) -> Result<()> {
        const OPERATION: &str = "read_end_array";
        ensure_open(self, OPERATION)?;

        let context_type = self.core().context_type();
        if context_type != ContextType::Array {
            return Err(Error::invalid_context(
                OPERATION,
                context_type,
                &[ContextType::Array],
            ));
        }
        if self.core().state() == State::Type {
            self.read_bson_type()?;
        }
        verify_state(self, OPERATION, &[State::EndOfArray])?;

        self.do_read_end_array()?;
        set_state_on_end(self)
    }

    /// Reads the name of the next element.
    fn read_name(&mut self) -> Result<String> {
        const OPERATION: &str = "read_name";
        ensure_open(self, OPERATION)?;
        if self.core().state() == State::Type {
            self.read_bson_type()?;
        }
        verify_state(self, OPERATION, &[State::Name])?;

        self.core_mut().set_state(State::Value);
        Ok(self.core().current_name().unwrap_or_default().to_string())
    }

    /// Reads the name of the next element and fails unless it equals `expected`.
    fn verify_name(&mut self, expected: &str) -> Result<()> {
        let actual = self.read_name()?;
        if actual != expected {
            return Err(Error::invalid_operation(format!(
                "Expected a field named \"{expected}\", not \"{actual}\"."
            )));
        }
        Ok(())
    }

    fn skip_name(&mut self) -> Result<()> {
        const OPERATION: &str = "skip_name";
        ensure_open(self, OPERATION)?;
        verify_state(self, OPERATION, &[State::Name])?;

        self.core_mut().set_state(State::Value);
        self.do_skip_name()
    }

    /// Skips the value the reader is positioned on, including all nested content.
    fn skip_value(&mut self) -> Result<()> {
        const OPERATION: &str = "skip_value";
        ensure_open(self, OPERATION)?;
        if self.core().state() == State::Name {
            self.skip_name()?;
        }
        verify_state(self, OPERATION, &[State::Value])?;

        self.do_skip_value()?;
        self.core_mut().advance()
    }
}

fn ensure_open<R: BsonReader + ?Sized>(reader: &R, operation: &'static str) -> Result<()> {
    if reader.core().is_closed() {
        return Err(Error::closed(operation));
    }
    Ok(())
}

fn verify_state<R: BsonReader + ?Sized>(
    reader: &R,
    operation: &'static str,
    valid: &[State],
) -> Result<()> {
    ensure_open(reader, operation)?;
    let state = reader.core().state();
    if !valid.contains(&state) {
        return Err(Error::invalid_state(operation, state, valid));
    }
    Ok(())
}

fn verify_type<R: BsonReader + ?Sized>(
    reader: &mut R,
    operation: &'static str,
    required: ElementType,
) -> Result<()> {
    ensure_open(reader, operation)?;

    if matches!(
        reader.core().state(),
        State::Initial | State::ScopeDocument | State::Type | State::Done
    ) {
        reader.read_bson_type()?;
    }
    if reader.core().state() == State::Name {
        reader.skip_name()?;
    }
    verify_state(reader, operation, &[State::Value])?;

    let actual = reader.core().current_type();
    if actual != required {
        return Err(Error::unexpected_type(operation, required, actual));
    }
    Ok(())
}

fn set_state_on_end<R: BsonReader + ?Sized>(reader: &mut R) -> Result<()> {
    let state = match reader.core().context_type() {
        ContextType::Array | ContextType::Document | ContextType::ScopeDocument => State::Type,
        ContextType::TopLevel => State::Done,
        other => {
            return Err(Error::invalid_context(
                "set_state_on_end",
                other,
                &[
                    ContextType::TopLevel,
                    ContextType::Document,
                    ContextType::Array,
                    ContextType::ScopeDocument,
                ],
            ));
        }
    };
    reader.core_mut().set_state(state);
    Ok(())
}
