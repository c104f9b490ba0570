use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    writer::{BsonWriter, WriterCore, WriterSettings},
};

/// A structure under construction, with the key it will be stored under in its parent.
#[derive(Debug)]
enum Frame {
    Document {
        key: Option<String>,
        document: Document,
    },
    Array {
        key: Option<String>,
        array: Array,
    },
    CodeWithScope {
        key: Option<String>,
        code: String,
    },
}

/// A [`BsonWriter`] that assembles its output as an in-memory [`Document`].
///
/// ```
/// use bson_codec::{doc, document::DocumentWriter, pipe, raw::BinaryReader};
///
/// let bytes = doc! { "a": { "b": [true] } }.to_bson_bytes()?;
/// let mut writer = DocumentWriter::new();
/// pipe::pipe(&mut BinaryReader::new(&bytes), &mut writer)?;
/// assert_eq!(writer.into_document()?, doc! { "a": { "b": [true] } });
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct DocumentWriter {
    frames: Vec<Frame>,
    result: Option<Bson>,
    core: WriterCore,
}

impl DocumentWriter {
    pub fn new() -> Self {
        Self::with_settings(WriterSettings::default())
    }

    pub fn with_settings(settings: WriterSettings) -> Self {
        Self::with_core(WriterCore::new(settings))
    }

    pub fn with_core(core: WriterCore) -> Self {
        Self {
            frames: Vec::new(),
            result: None,
            core,
        }
    }

    /// The completed top-level value, if one has been written.
    pub fn into_value(self) -> Option<Bson> {
        self.result
    }

    /// The completed top-level document.
    pub fn into_document(self) -> Result<Document> {
        match self.result {
            Some(Bson::Document(document)) => Ok(document),
            Some(other) => Err(Error::invalid_operation(format!(
                "The writer holds a {} value, not a document.",
                other.element_type()
            ))),
            None => Err(Error::invalid_operation(
                "No complete document has been written.",
            )),
        }
    }

    fn add(&mut self, key: Option<String>, value: Bson) -> Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Document { document, .. }) => {
                let key = key.ok_or_else(|| {
                    Error::invalid_operation("A document value needs a field name.")
                })?;
                document.insert(key, value);
                Ok(())
            }
            Some(Frame::Array { array, .. }) => {
                array.push(value);
                Ok(())
            }
            Some(Frame::CodeWithScope { .. }) => Err(Error::invalid_operation(
                "Only the scope document can follow JavaScript code with scope.",
            )),
            None => {
                self.result = Some(value);
                Ok(())
            }
        }
    }

    fn add_value(&mut self, value: Bson) -> Result<()> {
        let key = self.core.element_name();
        self.add(key, value)
    }
}

impl BsonWriter for DocumentWriter {
    fn core(&self) -> &WriterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WriterCore {
        &mut self.core
    }

    fn do_write_start_document(&mut self) -> Result<()> {
        self.frames.push(Frame::Document {
            key: self.core.element_name(),
            document: Document::new(),
        });
        Ok(())
    }

    fn do_write_end_document(&mut self) -> Result<()> {
        let (key, document) = match self.frames.pop() {
            Some(Frame::Document { key, document }) => (key, document),
            _ => return Err(Error::invalid_operation("No document is open.")),
        };
        if let Some(Frame::CodeWithScope { .. }) = self.frames.last() {
            if let Some(Frame::CodeWithScope { key, code }) = self.frames.pop() {
                return self.add(
                    key,
                    Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                        code,
                        scope: document,
                    }),
                );
            }
        }
        self.add(key, Bson::Document(document))
    }

    fn do_write_start_array(&mut self) -> Result<()> {
        self.frames.push(Frame::Array {
            key: self.core.element_name(),
            array: Array::new(),
        });
        Ok(())
    }

    fn do_write_end_array(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Array { key, array }) => self.add(key, Bson::Array(array)),
            _ => Err(Error::invalid_operation("No array is open.")),
        }
    }

    fn do_write_binary_data(&mut self, value: &Binary) -> Result<()> {
        self.add_value(Bson::Binary(value.clone()))
    }

    fn do_write_boolean(&mut self, value: bool) -> Result<()> {
        self.add_value(Bson::Boolean(value))
    }

    fn do_write_date_time(&mut self, value: DateTime) -> Result<()> {
        self.add_value(Bson::DateTime(value))
    }

    fn do_write_db_pointer(&mut self, value: &DbPointer) -> Result<()> {
        self.add_value(Bson::DbPointer(value.clone()))
    }

    fn do_write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.add_value(Bson::Decimal128(value))
    }

    fn do_write_double(&mut self, value: f64) -> Result<()> {
        self.add_value(Bson::Double(value))
    }

    fn do_write_int32(&mut self, value: i32) -> Result<()> {
        self.add_value(Bson::Int32(value))
    }

    fn do_write_int64(&mut self, value: i64) -> Result<()> {
        self.add_value(Bson::Int64(value))
    }

    fn do_write_java_script(&mut self, code: &str) -> Result<()> {
        self.add_value(Bson::JavaScriptCode(code.to_string()))
    }

    fn do_write_java_script_with_scope(&mut self, code: &str) -> Result<()> {
        self.frames.push(Frame::CodeWithScope {
            key: self.core.element_name(),
            code: code.to_string(),
        });
        Ok(())
    }

    fn do_write_end_java_script_with_scope(&mut self) -> Result<()> {
        // The value was stored when its scope document ended.
        Ok(())
    }

    fn do_write_max_key(&mut self) -> Result<()> {
        self.add_value(Bson::MaxKey)
    }

    fn do_write_min_key(&mut self) -> Result<()> {
        self.add_value(Bson::MinKey)
    }

    fn do_write_null(&mut self) -> Result<()> {
        self.add_value(Bson::Null)
    }

    fn do_write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.add_value(Bson::ObjectId(value))
    }

    fn do_write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        self.add_value(Bson::RegularExpression(value.clone()))
    }

    fn do_write_string(&mut self, value: &str) -> Result<()> {
        self.add_value(Bson::String(value.to_string()))
    }

    fn do_write_symbol(&mut self, value: &str) -> Result<()> {
        self.add_value(Bson::Symbol(value.to_string()))
    }

    fn do_write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.add_value(Bson::Timestamp(value))
    }

    fn do_write_undefined(&mut self) -> Result<()> {
        self.add_value(Bson::Undefined)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{doc, pipe};

    #[test]
    fn assembles_code_with_scope_under_its_name() {
        let source = doc! {
            "f": Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: "x".into(),
                scope: doc! { "x": [1, { "y": Bson::Null }] },
            }),
            "after": "z",
        };
        let mut writer = DocumentWriter::new();
        pipe::write_document(&mut writer, &source).unwrap();
        assert_eq!(writer.into_document().unwrap(), source);
    }

    #[test]
    fn keeps_a_top_level_scalar() {
        let mut writer = DocumentWriter::new();
        writer.write_string("alone").unwrap();
        assert!(writer.core().state() == crate::state::State::Done);
        assert_eq!(writer.into_value(), Some(Bson::String("alone".into())));
    }

    #[test]
    fn reports_a_missing_document() {
        let writer = DocumentWriter::new();
        assert!(writer.into_document().is_err());
    }
}
