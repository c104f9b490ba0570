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

//! Streaming values between readers and writers.
//!
//! [`pipe`] copies the value a [`BsonReader`] is positioned on into a [`BsonWriter`] element by
//! element, so that BSON can be converted to JSON (or the reverse) without building a
//! [`Document`] in between. [`write_document`] and [`write_value`] drive a writer from an
//! in-memory value instead.
//!
//! ```rust
//! use bson_codec::{
//!     doc,
//!     json::{JsonWriter, JsonWriterSettings},
//!     pipe,
//!     raw::BinaryReader,
//! };
//!
//! let bytes = doc! { "a": [1, "two"] }.to_bson_bytes()?;
//! let mut writer = JsonWriter::new(JsonWriterSettings::default());
//! pipe::pipe(&mut BinaryReader::new(&bytes), &mut writer)?;
//! assert_eq!(writer.into_string(), r#"{ "a" : [1, "two"] }"#);
//! # Ok::<(), bson_codec::error::Error>(())
//! ```

use crate::{
    bson::{Bson, JavaScriptCodeWithScope},
    document::Document,
    error::{Error, Result},
    reader::BsonReader,
    spec::ElementType,
    state::State,
    writer::BsonWriter,
};

/// Copies the next complete value from `reader` to `writer`.
///
/// A fresh binary reader yields its top-level document; a JSON reader yields whatever value
/// the text holds.
pub fn pipe<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: BsonReader + ?Sized,
    W: BsonWriter + ?Sized,
{
    if matches!(
        reader.state(),
        State::Initial | State::Type | State::ScopeDocument | State::Done
    ) {
        reader.read_bson_type()?;
    }
    if reader.state() == State::Name {
        reader.skip_name()?;
    }
    pipe_value(reader, writer)
}

/// Copies the document `reader` is positioned on, from its start to its end.
pub fn pipe_document<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: BsonReader + ?Sized,
    W: BsonWriter + ?Sized,
{
    reader.read_start_document()?;
    writer.write_start_document()?;
    while reader.read_bson_type()? != ElementType::EndOfDocument {
        let name = reader.read_name()?;
        writer.write_name(&name)?;
        pipe_value(reader, writer)?;
    }
    reader.read_end_document()?;
    writer.write_end_document()
}

/// Copies the array `reader` is positioned on, from its start to its end.
pub fn pipe_array<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: BsonReader + ?Sized,
    W: BsonWriter + ?Sized,
{
    reader.read_start_array()?;
    writer.write_start_array()?;
    while reader.read_bson_type()? != ElementType::EndOfDocument {
        pipe_value(reader, writer)?;
    }
    reader.read_end_array()?;
    writer.write_end_array()
}

/// Copies the value of the current element. The reader must already know its type.
pub fn pipe_value<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: BsonReader + ?Sized,
    W: BsonWriter + ?Sized,
{
    match reader.current_type() {
        ElementType::EmbeddedDocument => pipe_document(reader, writer),
        ElementType::Array => pipe_array(reader, writer),
        ElementType::JavaScriptCodeWithScope => {
            let code = reader.read_java_script_with_scope()?;
            writer.write_java_script_with_scope(&code)?;
            pipe_document(reader, writer)
        }
        ElementType::Double => writer.write_double(reader.read_double()?),
        ElementType::String => writer.write_string(&reader.read_string()?),
        ElementType::Binary => writer.write_binary_data(&reader.read_binary_data()?),
        ElementType::Undefined => {
            reader.read_undefined()?;
            writer.write_undefined()
        }
        ElementType::ObjectId => writer.write_object_id(reader.read_object_id()?),
        ElementType::Boolean => writer.write_boolean(reader.read_boolean()?),
        ElementType::DateTime => writer.write_date_time(reader.read_date_time()?),
        ElementType::Null => {
            reader.read_null()?;
            writer.write_null()
        }
        ElementType::RegularExpression => {
            writer.write_regular_expression(&reader.read_regular_expression()?)
        }
        ElementType::DbPointer => writer.write_db_pointer(&reader.read_db_pointer()?),
        ElementType::JavaScriptCode => writer.write_java_script(&reader.read_java_script()?),
        ElementType::Symbol => writer.write_symbol(&reader.read_symbol()?),
        ElementType::Int32 => writer.write_int32(reader.read_int32()?),
        ElementType::Timestamp => writer.write_timestamp(reader.read_timestamp()?),
        ElementType::Int64 => writer.write_int64(reader.read_int64()?),
        ElementType::Decimal128 => writer.write_decimal128(reader.read_decimal128()?),
        ElementType::MaxKey => {
            reader.read_max_key()?;
            writer.write_max_key()
        }
        ElementType::MinKey => {
            reader.read_min_key()?;
            writer.write_min_key()
        }
        ElementType::EndOfDocument => Err(Error::invalid_operation(
            "Unhandled type EndOfDocument: there is no value to pipe.",
        )),
    }
}

/// Writes `document` as a complete document in the writer's current position.
pub fn write_document<W>(writer: &mut W, document: &Document) -> Result<()>
where
    W: BsonWriter + ?Sized,
{
    writer.write_start_document()?;
    for (name, value) in document {
        writer.write_name(name)?;
        write_value(writer, value)?;
    }
    writer.write_end_document()
}

/// Writes `value` in the writer's current position.
pub fn write_value<W>(writer: &mut W, value: &Bson) -> Result<()>
where
    W: BsonWriter + ?Sized,
{
    match value {
        Bson::Double(d) => writer.write_double(*d),
        Bson::String(s) => writer.write_string(s),
        Bson::Array(array) => {
            writer.write_start_array()?;
            for element in array {
                write_value(writer, element)?;
            }
            writer.write_end_array()
        }
        Bson::Document(document) => write_document(writer, document),
        Bson::Boolean(b) => writer.write_boolean(*b),
        Bson::Null => writer.write_null(),
        Bson::RegularExpression(regex) => writer.write_regular_expression(regex),
        Bson::JavaScriptCode(code) => writer.write_java_script(code),
        Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
            writer.write_java_script_with_scope(code)?;
            write_document(writer, scope)
        }
        Bson::Int32(i) => writer.write_int32(*i),
        Bson::Int64(i) => writer.write_int64(*i),
        Bson::Timestamp(ts) => writer.write_timestamp(*ts),
        Bson::Binary(binary) => writer.write_binary_data(binary),
        Bson::ObjectId(id) => writer.write_object_id(*id),
        Bson::DateTime(dt) => writer.write_date_time(*dt),
        Bson::Symbol(s) => writer.write_symbol(s),
        Bson::Decimal128(d) => writer.write_decimal128(*d),
        Bson::Undefined => writer.write_undefined(),
        Bson::MaxKey => writer.write_max_key(),
        Bson::MinKey => writer.write_min_key(),
        Bson::DbPointer(pointer) => writer.write_db_pointer(pointer),
    }
}
