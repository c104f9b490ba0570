use log::debug;

use super::{MIN_BSON_DOCUMENT_SIZE, MIN_BSON_STRING_SIZE, MIN_CODE_WITH_SCOPE_SIZE};
use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    reader::{BsonReader, ReaderContext, ReaderCore},
    spec::{BinarySubtype, ElementType},
    state::{ContextType, State},
};

/// A [`BsonReader`] over a slice of BSON bytes.
///
/// The top level of a binary stream is always a document; several documents may follow each
/// other in the same slice.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    position: usize,
    core: ReaderCore,
    mark: Option<(ReaderCore, usize)>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            core: ReaderCore::new(),
            mark: None,
        }
    }

    /// The offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                Error::serialization(format!(
                    "Unexpected end of input: needed {len} bytes at offset {}, but only {} remain.",
                    self.position,
                    self.bytes.len().saturating_sub(self.position)
                ))
            })?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    fn peek_i32(&self) -> Result<i32> {
        let mut peek = self.clone();
        peek.read_i32()
    }

    fn read_utf8(bytes: &[u8]) -> Result<String> {
        simdutf8::basic::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| Error::utf8_encoding())
    }

    fn read_cstring(&mut self) -> Result<String> {
        let remaining = &self.bytes[self.position..];
        let len = remaining.iter().position(|b| *b == 0).ok_or_else(|| {
            Error::serialization(format!(
                "Unterminated cstring starting at offset {}.",
                self.position
            ))
        })?;
        let value = Self::read_utf8(&remaining[..len])?;
        self.position += len + 1;
        Ok(value)
    }

    fn skip_cstring(&mut self) -> Result<()> {
        self.read_cstring().map(|_| ())
    }

    fn read_bson_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < MIN_BSON_STRING_SIZE - 4 {
            return Err(Error::serialization(format!(
                "While decoding a BSON string found a size that is not a positive number: {len}"
            )));
        }
        let bytes = self.take(len as usize)?;
        let (content, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator != [0] {
            return Err(Error::serialization(
                "While decoding a BSON string found a string that is not terminated by a NUL \
                 byte.",
            ));
        }
        Self::read_utf8(content)
    }

    fn read_object_id_bytes(&mut self) -> Result<ObjectId> {
        Ok(ObjectId::from_bytes(self.take_array()?))
    }

    /// Reads a length prefix at the current position and checks that it describes a value
    /// inside the buffer. `start` is the offset of the prefix.
    fn read_size(&mut self, minimum: i32) -> Result<(usize, usize)> {
        let start = self.position;
        let size = self.read_i32()?;
        if size < minimum {
            return Err(Error::serialization(format!(
                "Invalid length {size} at offset {start}; the minimum is {minimum}."
            )));
        }
        let size = size as usize;
        if start + size > self.bytes.len() {
            return Err(Error::serialization(format!(
                "Length {size} at offset {start} runs past the end of the input ({} bytes).",
                self.bytes.len()
            )));
        }
        Ok((start, size))
    }

    fn verify_size(&self, context: &ReaderContext) -> Result<()> {
        let actual = self.position - context.start();
        if actual != context.size() {
            return Err(Error::serialization(format!(
                "Expected size to be {}, not {actual}.",
                context.size()
            )));
        }
        Ok(())
    }

    fn read_binary_header(&mut self) -> Result<(usize, BinarySubtype)> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(Error::serialization(format!(
                "Binary length cannot be negative: {len}"
            )));
        }
        let subtype = BinarySubtype::from(self.read_u8()?);
        let mut len = len as usize;
        if subtype == BinarySubtype::BinaryOld {
            let inner = self.read_i32()?;
            if len < 4 || inner as i64 != len as i64 - 4 {
                return Err(Error::serialization(
                    "Binary sub type OldBinary has inconsistent sizes",
                ));
            }
            len -= 4;
        }
        Ok((len, subtype))
    }
}

impl BsonReader for BinaryReader<'_> {
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
            State::Initial | State::Done | State::ScopeDocument => {
                // Top-level and scope documents carry no type byte.
                self.core.set_current_type(ElementType::EmbeddedDocument);
                self.core.set_state(State::Value);
                return Ok(ElementType::EmbeddedDocument);
            }
            State::Type => {}
            other => {
                return Err(Error::invalid_state(
                    OPERATION,
                    other,
                    &[
                        State::Initial,
                        State::Done,
                        State::ScopeDocument,
                        State::Type,
                    ],
                ));
            }
        }

        let byte = self.read_u8()?;
        let Some(element_type) = ElementType::from(byte) else {
            let name = self.read_cstring()?;
            debug!("unknown element type {byte:#04x} for field {name:?}");
            return Err(Error::serialization(format!(
                "Detected unknown BSON type \"\\x{byte:02x}\" for fieldname \"{name}\". Are you \
                 using the latest driver version?"
            )));
        };
        self.core.set_current_type(element_type);

        let context_type = self.core.context_type();
        if element_type == ElementType::EndOfDocument {
            let state = match context_type {
                ContextType::Array => State::EndOfArray,
                ContextType::Document | ContextType::ScopeDocument => State::EndOfDocument,
                other => {
                    return Err(Error::invalid_context(
                        OPERATION,
                        other,
                        &[
                            ContextType::Document,
                            ContextType::ScopeDocument,
                            ContextType::Array,
                        ],
                    ));
                }
            };
            self.core.set_state(state);
            return Ok(element_type);
        }

        match context_type {
            ContextType::Array => {
                self.skip_cstring()?;
                self.core.set_state(State::Value);
            }
            ContextType::Document | ContextType::ScopeDocument => {
                let name = self.read_cstring()?;
                self.core.set_current_name(Some(name));
                self.core.set_state(State::Name);
            }
            other => {
                return Err(Error::invalid_context(
                    OPERATION,
                    other,
                    &[
                        ContextType::Document,
                        ContextType::ScopeDocument,
                        ContextType::Array,
                    ],
                ));
            }
        }
        Ok(element_type)
    }

    fn mark(&mut self) -> Result<()> {
        if self.mark.is_some() {
            return Err(ErrorKind::MarkOutstanding.into());
        }
        self.mark = Some((self.core.clone(), self.position));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let (core, position) = self.mark.take().ok_or(ErrorKind::NoMark)?;
        self.core = core;
        self.position = position;
        Ok(())
    }

    fn discard_mark(&mut self) {
        self.mark = None;
    }

    fn do_read_binary_data(&mut self) -> Result<Binary> {
        let (len, subtype) = self.read_binary_header()?;
        let bytes = self.take(len)?.to_vec();
        Ok(Binary { subtype, bytes })
    }

    fn do_peek_binary_subtype(&mut self) -> Result<BinarySubtype> {
        let mut peek = self.clone();
        peek.read_i32()?;
        Ok(BinarySubtype::from(peek.read_u8()?))
    }

    fn do_peek_binary_size(&mut self) -> Result<usize> {
        let mut peek = self.clone();
        peek.read_binary_header().map(|(len, _)| len)
    }

    fn do_read_boolean(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::malformed_value(format!(
                "boolean must be stored as 0 or 1, got {other}"
            ))),
        }
    }

    fn do_read_date_time(&mut self) -> Result<DateTime> {
        Ok(DateTime::from_millis(self.read_i64()?))
    }

    fn do_read_db_pointer(&mut self) -> Result<DbPointer> {
        let namespace = self.read_bson_string()?;
        let id = self.read_object_id_bytes()?;
        Ok(DbPointer { namespace, id })
    }

    fn do_read_decimal128(&mut self) -> Result<Decimal128> {
        Ok(Decimal128::from_bytes(self.take_array()?))
    }

    fn do_read_double(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    fn do_read_int32(&mut self) -> Result<i32> {
        self.read_i32()
    }

    fn do_read_int64(&mut self) -> Result<i64> {
        self.read_i64()
    }

    fn do_read_java_script(&mut self) -> Result<String> {
        self.read_bson_string()
    }

    fn do_read_java_script_with_scope(&mut self) -> Result<String> {
        let (start, size) = self.read_size(MIN_CODE_WITH_SCOPE_SIZE)?;
        self.core.push_context(ReaderContext::with_extent(
            ContextType::JavaScriptWithScope,
            start,
            size,
        ));
        self.read_bson_string()
    }

    fn do_read_max_key(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_read_min_key(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_read_null(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_read_object_id(&mut self) -> Result<ObjectId> {
        self.read_object_id_bytes()
    }

    fn do_read_regular_expression(&mut self) -> Result<Regex> {
        let pattern = self.read_cstring()?;
        let options = self.read_cstring()?;
        Ok(Regex { pattern, options })
    }

    fn do_read_string(&mut self) -> Result<String> {
        self.read_bson_string()
    }

    fn do_read_symbol(&mut self) -> Result<String> {
        self.read_bson_string()
    }

    fn do_read_timestamp(&mut self) -> Result<Timestamp> {
        Ok(Timestamp::from_le_bytes(self.take_array()?))
    }

    fn do_read_undefined(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_read_start_document(&mut self) -> Result<()> {
        let context_type = if self.core.context_type() == ContextType::JavaScriptWithScope {
            ContextType::ScopeDocument
        } else {
            ContextType::Document
        };
        let (start, size) = self.read_size(MIN_BSON_DOCUMENT_SIZE)?;
        self.core
            .push_context(ReaderContext::with_extent(context_type, start, size));
        Ok(())
    }

    fn do_read_end_document(&mut self) -> Result<()> {
        let document = self.core.pop_context()?;
        self.verify_size(&document)?;
        if document.context_type() == ContextType::ScopeDocument {
            let code_with_scope = self.core.pop_context()?;
            self.verify_size(&code_with_scope)?;
        }
        Ok(())
    }

    fn do_read_start_array(&mut self) -> Result<()> {
        let (start, size) = self.read_size(MIN_BSON_DOCUMENT_SIZE)?;
        self.core
            .push_context(ReaderContext::with_extent(ContextType::Array, start, size));
        Ok(())
    }

    fn do_read_end_array(&mut self) -> Result<()> {
        let array = self.core.pop_context()?;
        self.verify_size(&array)
    }

    fn do_skip_name(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_skip_value(&mut self) -> Result<()> {
        let skip = match self.core.current_type() {
            ElementType::Array
            | ElementType::EmbeddedDocument
            | ElementType::JavaScriptCodeWithScope => self.peek_i32()?.max(0) as usize,
            ElementType::Binary => 4 + 1 + self.peek_i32()?.max(0) as usize,
            ElementType::Boolean => 1,
            ElementType::DateTime
            | ElementType::Double
            | ElementType::Int64
            | ElementType::Timestamp => 8,
            ElementType::Int32 => 4,
            ElementType::Decimal128 => 16,
            ElementType::ObjectId => 12,
            ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
                4 + self.peek_i32()?.max(0) as usize
            }
            ElementType::DbPointer => 4 + self.peek_i32()?.max(0) as usize + 12,
            ElementType::RegularExpression => {
                self.skip_cstring()?;
                self.skip_cstring()?;
                0
            }
            ElementType::MaxKey
            | ElementType::MinKey
            | ElementType::Null
            | ElementType::Undefined => 0,
            ElementType::EndOfDocument => {
                return Err(Error::invalid_operation(
                    "Cannot skip past the end of a document.",
                ));
            }
        };
        self.take(skip).map(|_| ())
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    const A1_B_HI: &[u8] = b"\x16\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x02b\x00\x03\x00\x00\x00hi\x00\x00";

    #[test]
    fn reads_elements_in_order() {
        let mut reader = BinaryReader::new(A1_B_HI);
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), ElementType::Int32);
        assert_eq!(reader.read_name().unwrap(), "a");
        assert_eq!(reader.read_int32().unwrap(), 1);
        assert_eq!(reader.read_bson_type().unwrap(), ElementType::String);
        assert_eq!(reader.read_name().unwrap(), "b");
        assert_eq!(reader.read_string().unwrap(), "hi");
        reader.read_end_document().unwrap();
        assert_eq!(reader.state(), State::Done);
        assert_eq!(reader.position(), A1_B_HI.len());
    }

    #[test]
    fn mark_and_reset_restore_position() {
        let mut reader = BinaryReader::new(A1_B_HI);
        reader.read_start_document().unwrap();
        reader.mark().unwrap();
        assert_matches!(
            reader.mark().unwrap_err().kind,
            ErrorKind::MarkOutstanding
        );
        let first = reader.read_int32().unwrap();
        reader.reset().unwrap();
        assert_eq!(reader.state(), State::Type);
        assert_eq!(reader.read_int32().unwrap(), first);
        assert_matches!(reader.reset().unwrap_err().kind, ErrorKind::NoMark);
    }

    #[test]
    fn rejects_a_length_mismatch() {
        let mut bytes = A1_B_HI.to_vec();
        bytes[0] = 0x17;
        bytes.push(0);
        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        reader.read_int32().unwrap();
        reader.read_string().unwrap();
        let error = reader.read_end_document().unwrap_err();
        assert!(error.is_serialization());
        assert_eq!(error.to_string(), "Expected size to be 23, not 22.");
    }

    #[test]
    fn rejects_a_string_without_room_for_its_terminator() {
        let bytes = b"\x0c\x00\x00\x00\x02s\x00\x00\x00\x00\x00\x00";
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document().unwrap();
        let error = reader.read_string().unwrap_err();
        assert!(error.is_serialization());
        assert_eq!(
            error.to_string(),
            "While decoding a BSON string found a size that is not a positive number: 0"
        );
    }

    #[test]
    fn names_the_field_of_an_unknown_type() {
        let bytes = b"\x0c\x00\x00\x00\x14xy\x00\x00\x00\x00\x00";
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document().unwrap();
        let error = reader.read_bson_type().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Detected unknown BSON type \"\\x14\" for fieldname \"xy\". Are you using the latest \
             driver version?"
        );
    }

    #[test]
    fn skips_nested_values() {
        let bytes = crate::doc! { "a": { "x": [1, 2] }, "b": true }
            .to_bson_bytes()
            .unwrap();
        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
        reader.verify_name("b").unwrap();
        assert!(reader.read_boolean().unwrap());
        reader.read_end_document().unwrap();
    }

    #[test]
    fn rejects_non_canonical_booleans() {
        let bytes = b"\x09\x00\x00\x00\x08b\x00\x02\x00";
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document().unwrap();
        assert!(reader.read_boolean().unwrap_err().is_malformed_value());
    }

    #[test]
    fn operations_fail_once_closed() {
        let mut reader = BinaryReader::new(A1_B_HI);
        reader.close();
        assert!(reader.read_start_document().unwrap_err().is_closed());
        assert!(reader.read_bson_type().unwrap_err().is_closed());
    }
}
