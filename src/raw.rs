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

//! Readers and writers for the BSON binary format.
//!
//! A BSON document on the wire is an `int32` total length (including the length itself and
//! the trailing NUL) followed by `(type byte, cstring name, value)` elements and a `0x00`
//! terminator. All integers are little-endian.
//!
//! ```
//! use bson_codec::{doc, raw::BinaryWriter, writer::BsonWriter};
//!
//! let mut writer = BinaryWriter::new();
//! writer.write_start_document()?;
//! writer.write_name("a")?;
//! writer.write_int32(1)?;
//! writer.write_end_document()?;
//! assert_eq!(writer.into_bytes(), doc! { "a": 1 }.to_bson_bytes()?);
//! # Ok::<(), bson_codec::error::Error>(())
//! ```

mod reader;
mod writer;

pub use self::{reader::BinaryReader, writer::BinaryWriter};

/// The smallest possible document: the length prefix and the terminator.
pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1;

/// The smallest possible string: the length prefix and the terminating NUL.
pub(crate) const MIN_BSON_STRING_SIZE: i32 = 4 + 1;

/// The smallest possible code-with-scope value: its length, an empty string and an empty
/// document.
pub(crate) const MIN_CODE_WITH_SCOPE_SIZE: i32 = 4 + MIN_BSON_STRING_SIZE + MIN_BSON_DOCUMENT_SIZE;

#[cfg(test)]
mod test;
