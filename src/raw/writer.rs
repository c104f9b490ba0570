use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    spec::ElementType,
    state::State,
    writer::{BsonWriter, WriterCore, WriterSettings},
};

/// A [`BsonWriter`] that produces BSON bytes.
///
/// Length prefixes are reserved when a document, array or code-with-scope value is opened
/// and patched when it is closed.
#[derive(Debug)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
    starts: Vec<usize>,
    core: WriterCore,
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::with_settings(WriterSettings::default())
    }

    pub fn with_settings(settings: WriterSettings) -> Self {
        Self::with_core(WriterCore::new(settings))
    }

    /// A writer driven by a preconfigured core, e.g. one carrying a field-name validator.
    pub fn with_core(core: WriterCore) -> Self {
        Self {
            buffer: Vec::new(),
            starts: Vec::new(),
            core,
        }
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn write_cstring(&mut self, value: &str) -> Result<()> {
        if let Some(index) = value.bytes().position(|b| b == 0) {
            return Err(Error::serialization(format!(
                "BSON cstring '{value}' is not valid because it contains a null character at \
                 index {index}"
            )));
        }
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn write_bson_string(&mut self, value: &str) -> Result<()> {
        self.write_i32(to_i32(value.len() + 1)?);
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn write_element_header(&mut self, element_type: ElementType) -> Result<()> {
        match self.core.element_name() {
            Some(name) => {
                self.buffer.push(element_type as u8);
                self.write_cstring(&name)
            }
            None if element_type == ElementType::EmbeddedDocument => Ok(()),
            None => {
                let name = element_type.name();
                let article = if name.starts_with(['A', 'E', 'I', 'O', 'U']) {
                    "An"
                } else {
                    "A"
                };
                Err(Error::serialization(format!(
                    "{article} {name} value cannot be written to the root level of a BSON \
                     document."
                )))
            }
        }
    }

    fn open_length(&mut self) {
        self.starts.push(self.buffer.len());
        self.write_i32(0);
    }

    fn close_length(&mut self) -> Result<()> {
        let start = self
            .starts
            .pop()
            .ok_or_else(|| Error::invalid_operation("No open document to close."))?;
        let len = to_i32(self.buffer.len() - start)?;
        self.buffer[start..start + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

fn to_i32(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Error::serialization(format!("Size {len} is larger than the BSON maximum.")))
}

impl BsonWriter for BinaryWriter {
    fn core(&self) -> &WriterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WriterCore {
        &mut self.core
    }

    fn do_write_start_document(&mut self) -> Result<()> {
        if self.core.state() != State::ScopeDocument {
            self.write_element_header(ElementType::EmbeddedDocument)?;
        }
        self.open_length();
        Ok(())
    }

    fn do_write_end_document(&mut self) -> Result<()> {
        self.buffer.push(0);
        self.close_length()
    }

    fn do_write_start_array(&mut self) -> Result<()> {
        self.write_element_header(ElementType::Array)?;
        self.open_length();
        Ok(())
    }

    fn do_write_end_array(&mut self) -> Result<()> {
        self.buffer.push(0);
        self.close_length()
    }

    fn do_write_binary_data(&mut self, value: &Binary) -> Result<()> {
        self.write_element_header(ElementType::Binary)?;
        let len = to_i32(value.bytes.len())?;
        if value.is_old_binary() {
            self.write_i32(to_i32(value.bytes.len() + 4)?);
            self.buffer.push(value.subtype.into());
            self.write_i32(len);
        } else {
            self.write_i32(len);
            self.buffer.push(value.subtype.into());
        }
        self.buffer.extend_from_slice(&value.bytes);
        Ok(())
    }

    fn do_write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_element_header(ElementType::Boolean)?;
        self.buffer.push(value as u8);
        Ok(())
    }

    fn do_write_date_time(&mut self, value: DateTime) -> Result<()> {
        self.write_element_header(ElementType::DateTime)?;
        self.buffer
            .extend_from_slice(&value.timestamp_millis().to_le_bytes());
        Ok(())
    }

    fn do_write_db_pointer(&mut self, value: &DbPointer) -> Result<()> {
        self.write_element_header(ElementType::DbPointer)?;
        self.write_bson_string(&value.namespace)?;
        self.buffer.extend_from_slice(&value.id.bytes());
        Ok(())
    }

    fn do_write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.write_element_header(ElementType::Decimal128)?;
        self.buffer.extend_from_slice(&value.bytes());
        Ok(())
    }

    fn do_write_double(&mut self, value: f64) -> Result<()> {
        self.write_element_header(ElementType::Double)?;
        self.buffer.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn do_write_int32(&mut self, value: i32) -> Result<()> {
        self.write_element_header(ElementType::Int32)?;
        self.write_i32(value);
        Ok(())
    }

    fn do_write_int64(&mut self, value: i64) -> Result<()> {
        self.write_element_header(ElementType::Int64)?;
        self.buffer.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn do_write_java_script(&mut self, code: &str) -> Result<()> {
        self.write_element_header(ElementType::JavaScriptCode)?;
        self.write_bson_string(code)
    }

    fn do_write_java_script_with_scope(&mut self, code: &str) -> Result<()> {
        self.write_element_header(ElementType::JavaScriptCodeWithScope)?;
        self.open_length();
        self.write_bson_string(code)
    }

    fn do_write_end_java_script_with_scope(&mut self) -> Result<()> {
        self.close_length()
    }

    fn do_write_max_key(&mut self) -> Result<()> {
        self.write_element_header(ElementType::MaxKey)
    }

    fn do_write_min_key(&mut self) -> Result<()> {
        self.write_element_header(ElementType::MinKey)
    }

    fn do_write_null(&mut self) -> Result<()> {
        self.write_element_header(ElementType::Null)
    }

    fn do_write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.write_element_header(ElementType::ObjectId)?;
        self.buffer.extend_from_slice(&value.bytes());
        Ok(())
    }

    fn do_write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        self.write_element_header(ElementType::RegularExpression)?;
        self.write_cstring(&value.pattern)?;
        self.write_cstring(&value.options)
    }

    fn do_write_string(&mut self, value: &str) -> Result<()> {
        self.write_element_header(ElementType::String)?;
        self.write_bson_string(value)
    }

    fn do_write_symbol(&mut self, value: &str) -> Result<()> {
        self.write_element_header(ElementType::Symbol)?;
        self.write_bson_string(value)
    }

    fn do_write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.write_element_header(ElementType::Timestamp)?;
        self.buffer.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn do_write_undefined(&mut self) -> Result<()> {
        self.write_element_header(ElementType::Undefined)
    }
}
