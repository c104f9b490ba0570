//! A BSON document represented as an associative HashMap with insertion ordering.

use std::fmt::{self, Debug, Display, Formatter};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    bson::{Array, Bson},
    error::Result,
    codec::CodecRegistry,
    json::{JsonReader, JsonWriter, JsonWriterSettings},
    pipe,
    raw::{BinaryReader, BinaryWriter},
};

mod reader;
mod writer;

pub use self::{reader::DocumentReader, writer::DocumentWriter};

/// A BSON document represented as an associative HashMap with insertion ordering.
///
/// Two documents are equal only when they hold the same fields in the same order.
#[derive(Clone, Default)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.inner.len() == other.inner.len() && self.inner.iter().eq(other.inner.iter())
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        Debug::fmt(&self.inner, fmt)?;
        write!(fmt, ")")
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = indexmap::map::IntoIter<String, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = indexmap::map::Iter<'a, String, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::default(),
        }
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Bson> {
        self.inner.iter()
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    /// Get a reference to a document for this key if it exists and has the correct type.
    pub fn get_document(&self, key: impl AsRef<str>) -> Option<&Document> {
        self.get(key).and_then(Bson::as_document)
    }

    /// Get a reference to an array for this key if it exists and has the correct type.
    pub fn get_array(&self, key: impl AsRef<str>) -> Option<&Array> {
        self.get(key).and_then(Bson::as_array)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Bson> {
        self.inner.keys()
    }

    /// Gets a collection of all values in the document.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Bson> {
        self.inner.values()
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets the value of the entry with the OccupiedEntry's key,
    /// and returns the entry's old value. Accepts any type that
    /// can be converted into Bson.
    pub fn insert<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Takes the value of the entry out of the document, and returns it, preserving the order
    /// of the remaining entries.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }

    /// Encodes this document as BSON bytes.
    ///
    /// ```
    /// use bson_codec::{doc, Document};
    ///
    /// let bytes = doc! { "a": 1 }.to_bson_bytes()?;
    /// assert_eq!(Document::from_bson_bytes(&bytes)?, doc! { "a": 1 });
    /// # Ok::<(), bson_codec::error::Error>(())
    /// ```
    pub fn to_bson_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::new();
        pipe::write_document(&mut writer, self)?;
        Ok(writer.into_bytes())
    }

    /// Decodes a document from BSON bytes.
    pub fn from_bson_bytes(bytes: &[u8]) -> Result<Document> {
        let mut reader = BinaryReader::new(bytes);
        CodecRegistry::default().decode_document(&mut reader)
    }

    /// Renders this document as Extended JSON.
    ///
    /// ```
    /// use bson_codec::{doc, json::JsonWriterSettings};
    ///
    /// let json = doc! { "a": 1 }.to_json(JsonWriterSettings::default())?;
    /// assert_eq!(json, r#"{ "a" : 1 }"#);
    /// # Ok::<(), bson_codec::error::Error>(())
    /// ```
    pub fn to_json(&self, settings: JsonWriterSettings) -> Result<String> {
        let mut writer = JsonWriter::new(settings);
        pipe::write_document(&mut writer, self)?;
        Ok(writer.into_string())
    }

    /// Parses a document from JSON, Extended JSON or shell-mode text.
    ///
    /// The text must hold exactly one document; anything but whitespace after it is a parse
    /// error.
    pub fn from_json(text: &str) -> Result<Document> {
        let mut reader = JsonReader::new(text);
        let document = CodecRegistry::default().decode_document(&mut reader)?;
        reader.verify_end_of_input()?;
        Ok(document)
    }
}
