//! Decoding values from any [`BsonReader`] and encoding Rust types to any [`BsonWriter`].
//!
//! The built-in decoding of every [`ElementType`] is a single exhaustive match. A
//! [`CodecRegistry`] can replace the decoding of individual element types with a
//! [`ValueDecoder`], and can carry [`Codec`]s that map whole Rust types to and from BSON.
//!
//! ```rust
//! use bson_codec::{codec::CodecRegistry, reader::BsonReader, spec::ElementType, Bson, Document};
//!
//! // Read every string upper-cased.
//! let registry = CodecRegistry::default().with_decoder(
//!     ElementType::String,
//!     |reader: &mut dyn BsonReader, _: &CodecRegistry| {
//!         Ok(Bson::String(reader.read_string()?.to_uppercase()))
//!     },
//! );
//! let mut reader = bson_codec::json::JsonReader::new(r#"{ "a": "shout" }"#);
//! let doc: Document = registry.decode_document(&mut reader)?;
//! assert_eq!(doc.get("a"), Some(&Bson::String("SHOUT".into())));
//! # Ok::<(), bson_codec::error::Error>(())
//! ```

use std::{
    any::{Any, TypeId, type_name},
    fmt,
    sync::Arc,
};

use ahash::AHashMap;

use crate::{
    bson::{Bson, JavaScriptCodeWithScope},
    document::Document,
    error::{Error, Result},
    pipe,
    reader::BsonReader,
    spec::ElementType,
    state::State,
    writer::BsonWriter,
};

/// Decodes the value a reader is positioned on.
///
/// The reader is in [`State::Value`] with [`BsonReader::current_type`] naming the element type
/// when the decoder is called, and the decoder must consume exactly that one value.
pub trait ValueDecoder: Send + Sync {
    fn decode(&self, reader: &mut dyn BsonReader, registry: &CodecRegistry) -> Result<Bson>;
}

impl<F> ValueDecoder for F
where
    F: Fn(&mut dyn BsonReader, &CodecRegistry) -> Result<Bson> + Send + Sync,
{
    fn decode(&self, reader: &mut dyn BsonReader, registry: &CodecRegistry) -> Result<Bson> {
        self(reader, registry)
    }
}

/// Encodes and decodes values of one Rust type.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &T) -> Result<()>;

    fn decode(&self, reader: &mut dyn BsonReader, registry: &CodecRegistry) -> Result<T>;
}

/// The [`Codec`] for [`Document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec;

impl Codec<Document> for DocumentCodec {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &Document) -> Result<()> {
        pipe::write_document(writer, value)
    }

    fn decode(&self, reader: &mut dyn BsonReader, registry: &CodecRegistry) -> Result<Document> {
        registry.decode_document(reader)
    }
}

/// The [`Codec`] for [`Bson`] values of any type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonCodec;

impl Codec<Bson> for BsonCodec {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &Bson) -> Result<()> {
        pipe::write_value(writer, value)
    }

    fn decode(&self, reader: &mut dyn BsonReader, registry: &CodecRegistry) -> Result<Bson> {
        registry.decode_value(reader)
    }
}

/// The [`Codec`] for `i32`.
///
/// Decodes `Int32`, `Int64` and `Double` elements whose value is exactly an `i32`; anything
/// else fails with [`ErrorKind::Conversion`](crate::error::ErrorKind::Conversion).
#[derive(Debug, Clone, Copy, Default)]
pub struct Int32Codec;

impl Codec<i32> for Int32Codec {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &i32) -> Result<()> {
        writer.write_int32(*value)
    }

    fn decode(&self, reader: &mut dyn BsonReader, _: &CodecRegistry) -> Result<i32> {
        match read_number(reader, "i32")? {
            Bson::Int32(value) => Ok(value),
            Bson::Int64(value) => i32::try_from(value).map_err(|_| lossy(value, "i32")),
            Bson::Double(value)
                if value.fract() == 0.0
                    && value >= f64::from(i32::MIN)
                    && value <= f64::from(i32::MAX) =>
            {
                Ok(value as i32)
            }
            other => Err(lossy(other, "i32")),
        }
    }
}

/// The [`Codec`] for `i64`.
///
/// Decodes `Int32`, `Int64` and `Double` elements whose value is exactly an `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int64Codec;

impl Codec<i64> for Int64Codec {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &i64) -> Result<()> {
        writer.write_int64(*value)
    }

    fn decode(&self, reader: &mut dyn BsonReader, _: &CodecRegistry) -> Result<i64> {
        match read_number(reader, "i64")? {
            Bson::Int32(value) => Ok(value.into()),
            Bson::Int64(value) => Ok(value),
            // 2^63 is the first double above the i64 range.
            Bson::Double(value)
                if value.fract() == 0.0 && value >= -TWO_POW_63 && value < TWO_POW_63 =>
            {
                Ok(value as i64)
            }
            other => Err(lossy(other, "i64")),
        }
    }
}

/// The [`Codec`] for `f64`.
///
/// Decodes `Int32`, `Int64` and `Double` elements; an `Int64` that has no exact `f64`
/// representation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleCodec;

impl Codec<f64> for DoubleCodec {
    fn encode(&self, writer: &mut dyn BsonWriter, value: &f64) -> Result<()> {
        writer.write_double(*value)
    }

    fn decode(&self, reader: &mut dyn BsonReader, _: &CodecRegistry) -> Result<f64> {
        match read_number(reader, "f64")? {
            Bson::Int32(value) => Ok(value.into()),
            Bson::Int64(value) => {
                let double = value as f64;
                if double < TWO_POW_63 && double as i64 == value {
                    Ok(double)
                } else {
                    Err(lossy(value, "f64"))
                }
            }
            Bson::Double(value) => Ok(value),
            other => Err(lossy(other, "f64")),
        }
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Reads the numeric value the reader is positioned on.
fn read_number(reader: &mut dyn BsonReader, target: &str) -> Result<Bson> {
    position_on_value(reader)?;
    match reader.current_type() {
        ElementType::Int32 => Ok(Bson::Int32(reader.read_int32()?)),
        ElementType::Int64 => Ok(Bson::Int64(reader.read_int64()?)),
        ElementType::Double => Ok(Bson::Double(reader.read_double()?)),
        other => Err(Error::conversion(format!(
            "Cannot decode a {other} value as {target}."
        ))),
    }
}

fn lossy(value: impl fmt::Display, target: &str) -> Error {
    Error::conversion(format!(
        "Could not convert `{value}` to {target} without losing precision."
    ))
}

/// Reads the type and skips the name of the next element unless the reader is already on a
/// value.
fn position_on_value(reader: &mut dyn BsonReader) -> Result<()> {
    if matches!(
        reader.state(),
        State::Initial | State::Type | State::ScopeDocument | State::Done
    ) {
        reader.read_bson_type()?;
    }
    if reader.state() == State::Name {
        reader.skip_name()?;
    }
    Ok(())
}

/// Names the field that failed, unless a nested value already named one.
fn at_key(error: Error, key: &str) -> Error {
    if error.key.is_some() || error.index.is_some() {
        error
    } else {
        error.with_key(key)
    }
}

fn at_index(error: Error, index: usize) -> Error {
    if error.key.is_some() || error.index.is_some() {
        error
    } else {
        error.with_index(index)
    }
}

/// A lookup of decoders by element type and of codecs by Rust type.
///
/// The default registry decodes every element type with the built-in decoding and carries
/// [`DocumentCodec`], [`BsonCodec`], [`Int32Codec`], [`Int64Codec`] and [`DoubleCodec`].
#[derive(Clone)]
pub struct CodecRegistry {
    decoders: AHashMap<ElementType, Arc<dyn ValueDecoder>>,
    codecs: AHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("codecs", &self.codecs.len())
            .finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::empty()
            .with_codec(DocumentCodec)
            .with_codec(BsonCodec)
            .with_codec(Int32Codec)
            .with_codec(Int64Codec)
            .with_codec(DoubleCodec)
    }
}

impl CodecRegistry {
    /// A registry with no codecs and only the built-in decoding.
    pub fn empty() -> Self {
        Self {
            decoders: AHashMap::new(),
            codecs: AHashMap::new(),
        }
    }

    /// Replaces the decoding of `element_type`.
    pub fn register_decoder(
        &mut self,
        element_type: ElementType,
        decoder: impl ValueDecoder + 'static,
    ) -> &mut Self {
        self.decoders.insert(element_type, Arc::new(decoder));
        self
    }

    pub fn with_decoder(
        mut self,
        element_type: ElementType,
        decoder: impl ValueDecoder + 'static,
    ) -> Self {
        self.register_decoder(element_type, decoder);
        self
    }

    /// Registers `codec` as the codec for `T`, replacing any earlier one.
    pub fn register_codec<T: 'static>(&mut self, codec: impl Codec<T> + 'static) -> &mut Self {
        let codec: Arc<dyn Codec<T>> = Arc::new(codec);
        self.codecs.insert(TypeId::of::<T>(), Arc::new(codec));
        self
    }

    pub fn with_codec<T: 'static>(mut self, codec: impl Codec<T> + 'static) -> Self {
        self.register_codec(codec);
        self
    }

    /// The codec registered for `T`.
    pub fn codec<T: 'static>(&self) -> Result<Arc<dyn Codec<T>>> {
        self.codecs
            .get(&TypeId::of::<T>())
            .and_then(|codec| codec.downcast_ref::<Arc<dyn Codec<T>>>())
            .cloned()
            .ok_or_else(|| {
                Error::invalid_operation(format!("No codec registered for {}.", type_name::<T>()))
            })
    }

    /// Writes `value` with the codec registered for `T`.
    pub fn encode<T: 'static>(&self, writer: &mut dyn BsonWriter, value: &T) -> Result<()> {
        self.codec::<T>()?.encode(writer, value)
    }

    /// Reads a `T` with the codec registered for it.
    pub fn decode<T: 'static>(&self, reader: &mut dyn BsonReader) -> Result<T> {
        self.codec::<T>()?.decode(reader, self)
    }

    /// Decodes the next value, reading its type first if the reader has not done so yet.
    pub fn decode_value(&self, reader: &mut dyn BsonReader) -> Result<Bson> {
        position_on_value(reader)?;

        let element_type = reader.current_type();
        match self.decoders.get(&element_type) {
            Some(decoder) => decoder.decode(reader, self),
            None => self.decode_builtin(reader, element_type),
        }
    }

    /// Decodes a complete document, including its start and end.
    ///
    /// A failure inside a field records the innermost key or array index on the error.
    pub fn decode_document(&self, reader: &mut dyn BsonReader) -> Result<Document> {
        reader.read_start_document()?;
        let mut document = Document::new();
        while reader.read_bson_type()? != ElementType::EndOfDocument {
            let name = reader.read_name()?;
            let value = self
                .decode_value(reader)
                .map_err(|error| at_key(error, &name))?;
            document.insert(name, value);
        }
        reader.read_end_document()?;
        Ok(document)
    }

    fn decode_array(&self, reader: &mut dyn BsonReader) -> Result<Vec<Bson>> {
        reader.read_start_array()?;
        let mut array = Vec::new();
        while reader.read_bson_type()? != ElementType::EndOfDocument {
            let index = array.len();
            let value = self
                .decode_value(reader)
                .map_err(|error| at_index(error, index))?;
            array.push(value);
        }
        reader.read_end_array()?;
        Ok(array)
    }

    fn decode_builtin(
        &self,
        reader: &mut dyn BsonReader,
        element_type: ElementType,
    ) -> Result<Bson> {
        let value = match element_type {
            ElementType::Double => Bson::Double(reader.read_double()?),
            ElementType::String => Bson::String(reader.read_string()?),
            ElementType::EmbeddedDocument => Bson::Document(self.decode_document(reader)?),
            ElementType::Array => Bson::Array(self.decode_array(reader)?),
            ElementType::Binary => Bson::Binary(reader.read_binary_data()?),
            ElementType::Undefined => {
                reader.read_undefined()?;
                Bson::Undefined
            }
            ElementType::ObjectId => Bson::ObjectId(reader.read_object_id()?),
            ElementType::Boolean => Bson::Boolean(reader.read_boolean()?),
            ElementType::DateTime => Bson::DateTime(reader.read_date_time()?),
            ElementType::Null => {
                reader.read_null()?;
                Bson::Null
            }
            ElementType::RegularExpression => {
                Bson::RegularExpression(reader.read_regular_expression()?)
            }
            ElementType::DbPointer => Bson::DbPointer(reader.read_db_pointer()?),
            ElementType::JavaScriptCode => Bson::JavaScriptCode(reader.read_java_script()?),
            ElementType::Symbol => Bson::Symbol(reader.read_symbol()?),
            ElementType::JavaScriptCodeWithScope => {
                let code = reader.read_java_script_with_scope()?;
                let scope = self.decode_document(reader)?;
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope })
            }
            ElementType::Int32 => Bson::Int32(reader.read_int32()?),
            ElementType::Timestamp => Bson::Timestamp(reader.read_timestamp()?),
            ElementType::Int64 => Bson::Int64(reader.read_int64()?),
            ElementType::Decimal128 => Bson::Decimal128(reader.read_decimal128()?),
            ElementType::MaxKey => {
                reader.read_max_key()?;
                Bson::MaxKey
            }
            ElementType::MinKey => {
                reader.read_min_key()?;
                Bson::MinKey
            }
            ElementType::EndOfDocument => {
                return Err(Error::invalid_operation(
                    "There is no value to decode at the end of a document.",
                ));
            }
        };
        Ok(value)
    }
}
