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

//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity.
//! We call this entity a document.
//!
//! This library reads and writes BSON bytes and MongoDB Extended JSON through one pair of
//! state machines. A [`reader::BsonReader`] pulls a stream of typed values from a source and a
//! [`writer::BsonWriter`] pushes one into a sink, both enforcing the same grammar of documents,
//! arrays and named fields. [`raw`] implements them over BSON bytes, [`json`] over JSON text and
//! [`document`] over an in-memory [`Document`]; [`pipe`] streams any reader into any writer.
//!
//! ## Basic usage
//!
//! ```rust
//! use bson_codec::{doc, json::{JsonMode, JsonWriterSettings}, Document};
//!
//! let doc = doc! { "a": 1, "b": "hi" };
//!
//! let bytes = doc.to_bson_bytes()?;
//! assert_eq!(bytes.len(), 22);
//! assert_eq!(Document::from_bson_bytes(&bytes)?, doc);
//!
//! let json = bson_codec::bson_to_json(&bytes, JsonWriterSettings::new(JsonMode::Relaxed))?;
//! assert_eq!(json, r#"{ "a" : 1, "b" : "hi" }"#);
//! assert_eq!(bson_codec::json_to_bson(&json)?, bytes);
//! # Ok::<(), bson_codec::error::Error>(())
//! ```

pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    oid::ObjectId,
};

#[macro_use]
mod macros;
mod base64;
pub mod binary;
mod bson;
pub mod codec;
pub mod datetime;
pub mod decimal128;
pub mod document;
pub mod error;
pub mod json;
pub mod oid;
pub mod pipe;
pub mod raw;
pub mod reader;
pub mod spec;
mod state;
pub mod writer;

pub use self::state::{ContextType, State};

use crate::{
    error::Result,
    json::{JsonReader, JsonWriter, JsonWriterSettings},
    raw::{BinaryReader, BinaryWriter},
};

/// Converts JSON, Extended JSON or shell-mode text holding one document to BSON bytes.
pub fn json_to_bson(text: &str) -> Result<Vec<u8>> {
    let mut reader = JsonReader::new(text);
    let mut writer = BinaryWriter::new();
    pipe::pipe(&mut reader, &mut writer)?;
    reader.verify_end_of_input()?;
    Ok(writer.into_bytes())
}

/// Renders the BSON document in `bytes` as JSON.
pub fn bson_to_json(bytes: &[u8], settings: JsonWriterSettings) -> Result<String> {
    let mut reader = BinaryReader::new(bytes);
    let mut writer = JsonWriter::new(settings);
    pipe::pipe(&mut reader, &mut writer)?;
    Ok(writer.into_string())
}
