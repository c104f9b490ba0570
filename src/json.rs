//! Reading and writing JSON, Extended JSON and mongo shell syntax.
//!
//! Text is read by a [`JsonReader`], which layers Extended JSON and shell constructor
//! recognition over a [`JsonScanner`] that turns characters from a [`JsonBuffer`] into
//! [`JsonToken`]s. Text is written by a [`JsonWriter`], which renders each BSON type through a
//! [`Converter`] chosen by [`JsonMode`] onto a [`StrictJsonWriter`].
//!
//! ```rust
//! use bson_codec::{
//!     doc,
//!     json::{JsonMode, JsonWriterSettings},
//!     oid::ObjectId,
//!     Document,
//! };
//!
//! let id = ObjectId::parse_str("4d0ce088e447ad08b4721a37")?;
//! let doc = doc! { "_id": id, "n": 1_i64 };
//!
//! let canonical = doc.to_json(JsonWriterSettings::new(JsonMode::Extended))?;
//! assert_eq!(
//!     canonical,
//!     r#"{ "_id" : { "$oid" : "4d0ce088e447ad08b4721a37" }, "n" : { "$numberLong" : "1" } }"#
//! );
//! assert_eq!(Document::from_json(&canonical)?, doc);
//!
//! let shell = doc.to_json(JsonWriterSettings::new(JsonMode::Shell))?;
//! assert_eq!(
//!     shell,
//!     r#"{ "_id" : ObjectId("4d0ce088e447ad08b4721a37"), "n" : NumberLong(1) }"#
//! );
//! assert_eq!(Document::from_json(&shell)?, doc);
//! # Ok::<(), bson_codec::error::Error>(())
//! ```

mod buffer;
mod converter;
mod reader;
mod scanner;
mod settings;
mod strict;
mod token;
mod writer;

pub use self::{
    buffer::JsonBuffer,
    reader::JsonReader,
    scanner::JsonScanner,
    settings::{Converter, JsonMode, JsonWriterSettings},
    strict::StrictJsonWriter,
    token::{JsonToken, JsonTokenType},
    writer::JsonWriter,
};
