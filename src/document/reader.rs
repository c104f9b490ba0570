use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{Bson, DbPointer, Regex, Timestamp},
    document::Document,
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    reader::{BsonReader, ReaderContext, ReaderCore},
    spec::{BinarySubtype, ElementType},
    state::{ContextType, State},
};

/// The remaining elements of a structure being read.
#[derive(Debug, Clone)]
enum Frame {
    Document(std::vec::IntoIter<(String, Bson)>),
    Array(std::vec::IntoIter<Bson>),
}

#[derive(Debug, Clone)]
struct Snapshot {
    core: ReaderCore,
    frames: Vec<Frame>,
    pending: Option<Bson>,
    current_value: Option<Bson>,
}

/// A [`BsonReader`] that walks an in-memory [`Document`].
///
/// ```
/// use bson_codec::{doc, document::DocumentReader, json::{JsonWriter, JsonWriterSettings}, pipe};
///
/// let mut writer = JsonWriter::new(JsonWriterSettings::default());
/// pipe::pipe(&mut DocumentReader::new(doc! { "a": [1, 2] }), &mut writer)?;
/// assert_eq!(writer.into_string(), r#"{ "a" : [1, 2] }"#);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentReader {
    core: ReaderCore,
    frames: Vec<Frame>,
    /// The top-level document, or a scope document, that the next `read_bson_type` yields.
    pending: Option<Bson>,
    current_value: Option<Bson>,
    mark: Option<Snapshot>,
}

impl DocumentReader {
    pub fn new(document: Document) -> Self {
        Self {
            core: ReaderCore::new(),
            frames: Vec::new(),
            pending: Some(Bson::Document(document)),
            current_value: None,
            mark: None,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            core: self.core.clone(),
            frames: self.frames.clone(),
            pending: self.pending.clone(),
            current_value: self.current_value.clone(),
        }
    }

    fn take_value(&mut self, expected: ElementType) -> Result<Bson> {
        self.current_value.take().ok_or_else(|| {
            Error::invalid_operation(format!("Document reader has no {expected} value to read."))
        })
    }

    fn set_current(&mut self, value: Bson) -> ElementType {
        let element_type = value.element_type();
        self.core.set_current_type(element_type);
        self.current_value = Some(value);
        element_type
    }
}

macro_rules! take {
    ($reader:ident, $element_type:ident, $variant:ident) => {
        match $reader.take_value(ElementType::$element_type)? {
            Bson::$variant(value) => Ok(value),
            other => Err(Error::invalid_operation(format!(
                "Document reader expected a {} value but holds a {} value.",
                ElementType::$element_type,
                other.element_type()
            ))),
        }
    };
}

impl BsonReader for DocumentReader {
    fn core(&self) -> &ReaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        &mut self.core
    }

    fn read_bson_type(&mut self) -> Result<ElementType> {
        const OPERATION: &str = "read_bson_type";
        if self.core.is_closed() {
            return Err(Error::closed(OPERATION));
        }

        match self.core.state() {
            State::Initial | State::ScopeDocument | State::Done => {
                return match self.pending.take() {
                    Some(value) => {
                        self.core.set_state(State::Value);
                        Ok(self.set_current(value))
                    }
                    None => {
                        self.core.set_current_type(ElementType::EndOfDocument);
                        self.core.set_state(State::Done);
                        Ok(ElementType::EndOfDocument)
                    }
                };
            }
            State::Type => {}
            other => return Err(Error::invalid_state(OPERATION, other, &[State::Type])),
        }

        match self.frames.last_mut() {
            Some(Frame::Document(entries)) => match entries.next() {
                Some((name, value)) => {
                    self.core.set_current_name(Some(name));
                    self.core.set_state(State::Name);
                    Ok(self.set_current(value))
                }
                None => {
                    self.core.set_current_type(ElementType::EndOfDocument);
                    self.core.set_state(State::EndOfDocument);
                    Ok(ElementType::EndOfDocument)
                }
            },
            Some(Frame::Array(elements)) => match elements.next() {
                Some(value) => {
                    self.core.set_state(State::Value);
                    Ok(self.set_current(value))
                }
                None => {
                    self.core.set_current_type(ElementType::EndOfDocument);
                    self.core.set_state(State::EndOfArray);
                    Ok(ElementType::EndOfDocument)
                }
            },
            None => Err(Error::invalid_operation(
                "The document reader has no open document or array.",
            )),
        }
    }

    fn mark(&mut self) -> Result<()> {
        if self.mark.is_some() {
            return Err(ErrorKind::MarkOutstanding.into());
        }
        self.mark = Some(self.snapshot());
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let snapshot = self.mark.take().ok_or(ErrorKind::NoMark)?;
        self.core = snapshot.core;
        self.frames = snapshot.frames;
        self.pending = snapshot.pending;
        self.current_value = snapshot.current_value;
        Ok(())
    }

    fn discard_mark(&mut self) {
        self.mark = None;
    }

    fn do_read_binary_data(&mut self) -> Result<Binary> {
        take!(self, Binary, Binary)
    }

    fn do_peek_binary_subtype(&mut self) -> Result<BinarySubtype> {
        match &self.current_value {
            Some(Bson::Binary(binary)) => Ok(binary.subtype),
            _ => Err(Error::invalid_operation("Document reader has no Binary value to peek.")),
        }
    }

    fn do_peek_binary_size(&mut self) -> Result<usize> {
        match &self.current_value {
            Some(Bson::Binary(binary)) => Ok(binary.bytes.len()),
            _ => Err(Error::invalid_operation("Document reader has no Binary value to peek.")),
        }
    }

    fn do_read_boolean(&mut self) -> Result<bool> {
        take!(self, Boolean, Boolean)
    }

    fn do_read_date_time(&mut self) -> Result<DateTime> {
        take!(self, DateTime, DateTime)
    }

    fn do_read_db_pointer(&mut self) -> Result<DbPointer> {
        take!(self, DbPointer, DbPointer)
    }

    fn do_read_decimal128(&mut self) -> Result<Decimal128> {
        take!(self, Decimal128, Decimal128)
    }

    fn do_read_double(&mut self) -> Result<f64> {
        take!(self, Double, Double)
    }

    fn do_read_int32(&mut self) -> Result<i32> {
        take!(self, Int32, Int32)
    }

    fn do_read_int64(&mut self) -> Result<i64> {
        take!(self, Int64, Int64)
    }

    fn do_read_java_script(&mut self) -> Result<String> {
        take!(self, JavaScriptCode, JavaScriptCode)
    }

    fn do_read_java_script_with_scope(&mut self) -> Result<String> {
        let code_with_scope = take!(self, JavaScriptCodeWithScope, JavaScriptCodeWithScope)?;
        self.pending = Some(Bson::Document(code_with_scope.scope));
        self.core
            .push_context(ReaderContext::new(ContextType::JavaScriptWithScope));
        Ok(code_with_scope.code)
    }

    fn do_read_max_key(&mut self) -> Result<()> {
        self.current_value = None;
        Ok(())
    }

    fn do_read_min_key(&mut self) -> Result<()> {
        self.current_value = None;
        Ok(())
    }

    fn do_read_null(&mut self) -> Result<()> {
        self.current_value = None;
        Ok(())
    }

    fn do_read_object_id(&mut self) -> Result<ObjectId> {
        take!(self, ObjectId, ObjectId)
    }

    fn do_read_regular_expression(&mut self) -> Result<Regex> {
        take!(self, RegularExpression, RegularExpression)
    }

    fn do_read_string(&mut self) -> Result<String> {
        take!(self, String, String)
    }

    fn do_read_symbol(&mut self) -> Result<String> {
        take!(self, Symbol, Symbol)
    }

    fn do_read_timestamp(&mut self) -> Result<Timestamp> {
        take!(self, Timestamp, Timestamp)
    }

    fn do_read_undefined(&mut self) -> Result<()> {
        self.current_value = None;
        Ok(())
    }

    fn do_read_start_document(&mut self) -> Result<()> {
        let document = take!(self, EmbeddedDocument, Document)?;
        let entries: Vec<(String, Bson)> = document.into_iter().collect();
        self.frames.push(Frame::Document(entries.into_iter()));
        let context_type = if self.core.context_type() == ContextType::JavaScriptWithScope {
            ContextType::ScopeDocument
        } else {
            ContextType::Document
        };
        self.core.push_context(ReaderContext::new(context_type));
        Ok(())
    }

    fn do_read_end_document(&mut self) -> Result<()> {
        self.frames.pop();
        let document = self.core.pop_context()?;
        if document.context_type() == ContextType::ScopeDocument {
            self.core.pop_context()?;
        }
        Ok(())
    }

    fn do_read_start_array(&mut self) -> Result<()> {
        let array = take!(self, Array, Array)?;
        self.frames.push(Frame::Array(array.into_iter()));
        self.core
            .push_context(ReaderContext::new(ContextType::Array));
        Ok(())
    }

    fn do_read_end_array(&mut self) -> Result<()> {
        self.frames.pop();
        self.core.pop_context()?;
        Ok(())
    }

    fn do_skip_name(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_skip_value(&mut self) -> Result<()> {
        // Nested values are held whole, so skipping never descends.
        self.current_value = None;
        Ok(())
    }
}
