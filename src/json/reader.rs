use log::{debug, trace};

use super::{scanner::JsonScanner, token::JsonToken};
use crate::{
    Binary,
    Bson,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    reader::{BsonReader, ReaderContext, ReaderCore},
    spec::{BinarySubtype, ElementType},
    state::{ContextType, State},
};

/// A [`BsonReader`] over JSON, Extended JSON (canonical, relaxed and legacy) or shell-mode
/// text.
///
/// Objects whose first key is an Extended JSON sigil such as `$oid` or `$date` are read as the
/// value they encode. The legacy `$binary`/`$type`, `$regex`/`$options` and `$ref`/`$id` forms
/// are parsed speculatively: if the object turns out not to match, the reader rolls back and
/// reads it as an ordinary document.
///
/// ```
/// use bson_codec::{Bson, Document, oid::ObjectId};
///
/// let doc = Document::from_json(r#"{ "_id": ObjectId("4d0ce088e447ad08b4721a37"), "n": 1 }"#)?;
/// assert_eq!(
///     doc.get("_id"),
///     Some(&Bson::ObjectId(ObjectId::parse_str("4d0ce088e447ad08b4721a37")?))
/// );
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonReader {
    scanner: JsonScanner,
    core: ReaderCore,
    pushed_token: Option<JsonToken>,
    current_value: Option<Bson>,
    mark: Option<Snapshot>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    core: ReaderCore,
    pushed_token: Option<JsonToken>,
    current_value: Option<Bson>,
    position: usize,
}

const UUID_CONSTRUCTORS: &[&str] = &[
    "UUID", "GUID", "CSUUID", "CSGUID", "JUUID", "JGUID", "PYUUID", "PYGUID",
];

impl JsonReader {
    pub fn new(text: &str) -> Self {
        Self {
            scanner: JsonScanner::new(text),
            core: ReaderCore::new(),
            pushed_token: None,
            current_value: None,
            mark: None,
        }
    }

    /// Fails unless only whitespace remains after the values read so far.
    pub fn verify_end_of_input(&mut self) -> Result<()> {
        let token = self.pop_token()?;
        if token != JsonToken::EndOfFile {
            return Err(self.parse_error(format!(
                "JSON reader expected the end of the input but found '{token}'."
            )));
        }
        self.push_token(token)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            core: self.core.clone(),
            pushed_token: self.pushed_token.clone(),
            current_value: self.current_value.clone(),
            position: self.scanner.buffer_position(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        self.core = snapshot.core;
        self.pushed_token = snapshot.pushed_token;
        self.current_value = snapshot.current_value;
        self.scanner.set_buffer_position(snapshot.position)
    }

    /// Runs `parse`, rolling the reader back to where it started if it fails.
    fn speculate<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        let snapshot = self.snapshot();
        match parse(self) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                debug!("rolling back speculative Extended JSON parse: {error}");
                self.restore(snapshot)?;
                Ok(None)
            }
        }
    }

    fn pop_token(&mut self) -> Result<JsonToken> {
        match self.pushed_token.take() {
            Some(token) => Ok(token),
            None => self.scanner.next_token(),
        }
    }

    fn push_token(&mut self, token: JsonToken) -> Result<()> {
        if self.pushed_token.is_some() {
            return Err(Error::invalid_operation("There is already a pending token."));
        }
        self.pushed_token = Some(token);
        Ok(())
    }

    fn parse_error(&self, message: impl ToString) -> Error {
        Error::parse_at(message, self.scanner.buffer_position())
    }

    fn verify_token(&mut self, expected: JsonToken) -> Result<()> {
        let token = self.pop_token()?;
        if token != expected {
            return Err(self.parse_error(format!(
                "JSON reader expected '{expected}' but found '{token}'."
            )));
        }
        Ok(())
    }

    /// Expects a quoted or unquoted key spelling `expected`.
    fn verify_string(&mut self, expected: &str) -> Result<()> {
        let token = self.pop_token()?;
        if token.as_str() != Some(expected) {
            return Err(self.parse_error(format!(
                "JSON reader expected '{expected}' but found '{token}'."
            )));
        }
        Ok(())
    }

    fn read_string_token(&mut self) -> Result<String> {
        match self.pop_token()? {
            JsonToken::String(s) => Ok(s),
            other => Err(self.parse_error(format!(
                "JSON reader expected a string but found '{other}'."
            ))),
        }
    }

    fn read_key(&mut self) -> Result<String> {
        match self.pop_token()? {
            JsonToken::String(s) | JsonToken::UnquotedString(s) => Ok(s),
            other => Err(self.parse_error(format!(
                "JSON reader expected a name but found '{other}'."
            ))),
        }
    }

    fn read_u32_token(&mut self) -> Result<u32> {
        let token = self.pop_token()?;
        token
            .as_i64()
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| {
                self.parse_error(format!(
                    "JSON reader expected an unsigned 32-bit integer but found '{token}'."
                ))
            })
    }

    fn consume_optional_comma(&mut self) -> Result<()> {
        if matches!(
            self.core.context_type(),
            ContextType::Array | ContextType::Document | ContextType::ScopeDocument
        ) {
            let token = self.pop_token()?;
            if token != JsonToken::Comma {
                self.push_token(token)?;
            }
        }
        Ok(())
    }

    fn take_value(&mut self, expected: ElementType) -> Result<Bson> {
        self.current_value.take().ok_or_else(|| {
            Error::invalid_operation(format!("JSON reader has no {expected} value to read."))
        })
    }

    fn value_mismatch<T>(expected: ElementType, actual: &Bson) -> Result<T> {
        Err(Error::invalid_operation(format!(
            "JSON reader expected a {expected} value but holds a {} value.",
            actual.element_type()
        )))
    }

    fn visit_value(&mut self, token: JsonToken) -> Result<ElementType> {
        let (element_type, value) = match token {
            JsonToken::BeginArray => (ElementType::Array, None),
            JsonToken::BeginObject => return self.visit_extended_json(),
            JsonToken::Double(d) => (ElementType::Double, Some(Bson::Double(d))),
            JsonToken::Int32(i) => (ElementType::Int32, Some(Bson::Int32(i))),
            JsonToken::Int64(i) => (ElementType::Int64, Some(Bson::Int64(i))),
            JsonToken::RegularExpression(r) => (
                ElementType::RegularExpression,
                Some(Bson::RegularExpression(r)),
            ),
            JsonToken::String(s) => (ElementType::String, Some(Bson::String(s))),
            JsonToken::UnquotedString(word) => match self.visit_unquoted(&word)? {
                Some(value) => (value.element_type(), Some(value)),
                None => {
                    return Err(self.parse_error(format!(
                        "JSON reader was expecting a value but found '{word}'."
                    )));
                }
            },
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader was expecting a value but found '{other}'."
                )));
            }
        };
        self.current_value = value;
        Ok(element_type)
    }

    fn visit_unquoted(&mut self, word: &str) -> Result<Option<Bson>> {
        let value = match word {
            "true" => Bson::Boolean(true),
            "false" => Bson::Boolean(false),
            "Infinity" => Bson::Double(f64::INFINITY),
            "NaN" => Bson::Double(f64::NAN),
            "null" => Bson::Null,
            "undefined" => Bson::Undefined,
            "Date" => Bson::String(self.visit_date_without_new()?),
            "new" => {
                let name = match self.pop_token()? {
                    JsonToken::UnquotedString(name) => name,
                    other => {
                        return Err(self.parse_error(format!(
                            "JSON reader expected a type name but found '{other}'."
                        )));
                    }
                };
                match self.visit_constructor(&name, true)? {
                    Some(value) => value,
                    None => {
                        return Err(self.parse_error(format!(
                            "JSON reader expected a type name but found '{name}'."
                        )));
                    }
                }
            }
            constructor => return self.visit_constructor(constructor, false),
        };
        Ok(Some(value))
    }

    fn visit_constructor(&mut self, name: &str, with_new: bool) -> Result<Option<Bson>> {
        let value = match name {
            "MinKey" => {
                self.visit_empty_constructor()?;
                Bson::MinKey
            }
            "MaxKey" => {
                self.visit_empty_constructor()?;
                Bson::MaxKey
            }
            "BinData" => Bson::Binary(self.visit_bin_data_constructor()?),
            "HexData" => Bson::Binary(self.visit_hex_data_constructor()?),
            "Date" if with_new => Bson::DateTime(self.visit_date_constructor()?),
            "ISODate" => Bson::DateTime(self.visit_iso_date_constructor()?),
            "NumberInt" => Bson::Int32(self.visit_number_int_constructor()?),
            "NumberLong" => Bson::Int64(self.visit_number_long_constructor()?),
            "NumberDecimal" => Bson::Decimal128(self.visit_number_decimal_constructor()?),
            "ObjectId" => Bson::ObjectId(self.visit_object_id_constructor()?),
            "Timestamp" => Bson::Timestamp(self.visit_timestamp_constructor()?),
            "RegExp" => Bson::RegularExpression(self.visit_regular_expression_constructor()?),
            "DBPointer" => Bson::DbPointer(self.visit_db_pointer_constructor()?),
            uuid if UUID_CONSTRUCTORS.contains(&uuid) => {
                Bson::Binary(self.visit_uuid_constructor(uuid)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn visit_empty_constructor(&mut self) -> Result<()> {
        let token = self.pop_token()?;
        if token == JsonToken::LeftParen {
            self.verify_token(JsonToken::RightParen)
        } else {
            self.push_token(token)
        }
    }

    fn read_subtype_token(&mut self) -> Result<BinarySubtype> {
        let token = self.pop_token()?;
        match token.as_i64().and_then(|i| u8::try_from(i).ok()) {
            Some(subtype) => Ok(BinarySubtype::from(subtype)),
            None => Err(self.parse_error(format!(
                "JSON reader expected a binary subtype but found '{token}'."
            ))),
        }
    }

    fn visit_bin_data_constructor(&mut self) -> Result<Binary> {
        self.verify_token(JsonToken::LeftParen)?;
        let subtype = self.read_subtype_token()?;
        self.verify_token(JsonToken::Comma)?;
        let base64 = match self.pop_token()? {
            JsonToken::String(s) | JsonToken::UnquotedString(s) => s,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected a string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        Binary::from_base64(base64, subtype)
    }

    fn visit_hex_data_constructor(&mut self) -> Result<Binary> {
        self.verify_token(JsonToken::LeftParen)?;
        let subtype = self.read_subtype_token()?;
        self.verify_token(JsonToken::Comma)?;
        let mut hex = self.read_string_token()?;
        self.verify_token(JsonToken::RightParen)?;

        if hex.len() % 2 != 0 {
            hex.insert(0, '0');
        }
        let bytes = hex::decode(&hex)
            .map_err(|e| Error::illegal_argument(format!("Invalid hex string {hex:?}: {e}")))?;
        Ok(Binary { subtype, bytes })
    }

    fn visit_uuid_constructor(&mut self, name: &str) -> Result<Binary> {
        self.verify_token(JsonToken::LeftParen)?;
        let text = self.read_string_token()?;
        self.verify_token(JsonToken::RightParen)?;

        let hex: String = text
            .chars()
            .filter(|c| !matches!(c, '{' | '}' | '-'))
            .collect();
        let bytes = hex::decode(&hex)
            .map_err(|e| Error::illegal_argument(format!("Invalid UUID string {text:?}: {e}")))?;
        let uuid = uuid::Uuid::from_slice(&bytes)
            .map_err(|e| Error::illegal_argument(format!("Invalid UUID string {text:?}: {e}")))?;
        let subtype = if name == "UUID" {
            BinarySubtype::Uuid
        } else {
            BinarySubtype::UuidOld
        };
        Ok(Binary::from_uuid(uuid, subtype))
    }

    fn visit_regular_expression_constructor(&mut self) -> Result<Regex> {
        self.verify_token(JsonToken::LeftParen)?;
        let pattern = self.read_string_token()?;
        let token = self.pop_token()?;
        let options = if token == JsonToken::Comma {
            self.read_string_token()?
        } else {
            self.push_token(token)?;
            String::new()
        };
        self.verify_token(JsonToken::RightParen)?;
        Ok(Regex::new(pattern, options))
    }

    fn visit_object_id_constructor(&mut self) -> Result<ObjectId> {
        self.verify_token(JsonToken::LeftParen)?;
        let id = ObjectId::parse_str(self.read_string_token()?)?;
        self.verify_token(JsonToken::RightParen)?;
        Ok(id)
    }

    fn visit_timestamp_constructor(&mut self) -> Result<Timestamp> {
        self.verify_token(JsonToken::LeftParen)?;
        let time = self.read_u32_token()?;
        self.verify_token(JsonToken::Comma)?;
        let increment = self.read_u32_token()?;
        self.verify_token(JsonToken::RightParen)?;
        Ok(Timestamp { time, increment })
    }

    fn visit_db_pointer_constructor(&mut self) -> Result<DbPointer> {
        self.verify_token(JsonToken::LeftParen)?;
        let namespace = self.read_string_token()?;
        self.verify_token(JsonToken::Comma)?;
        let id = match self.pop_token()? {
            JsonToken::String(hex) => ObjectId::parse_str(hex)?,
            token if token.is_word("ObjectId") => self.visit_object_id_constructor()?,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected an ObjectId but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        Ok(DbPointer { namespace, id })
    }

    fn visit_number_int_constructor(&mut self) -> Result<i32> {
        self.verify_token(JsonToken::LeftParen)?;
        let value = match self.pop_token()? {
            JsonToken::Int32(i) => i,
            JsonToken::String(s) => s.parse().map_err(|_| {
                self.parse_error(format!("Exception converting value '{s}' to type Int32."))
            })?,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected an integer or a string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        Ok(value)
    }

    fn visit_number_long_constructor(&mut self) -> Result<i64> {
        self.verify_token(JsonToken::LeftParen)?;
        let value = match self.pop_token()? {
            JsonToken::Int32(i) => i64::from(i),
            JsonToken::Int64(i) => i,
            JsonToken::String(s) => s.parse().map_err(|_| {
                self.parse_error(format!("Exception converting value '{s}' to type Int64."))
            })?,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected an integer or a string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        Ok(value)
    }

    fn visit_number_decimal_constructor(&mut self) -> Result<Decimal128> {
        self.verify_token(JsonToken::LeftParen)?;
        let text = match self.pop_token()? {
            JsonToken::Int32(i) => i.to_string(),
            JsonToken::Int64(i) => i.to_string(),
            JsonToken::Double(d) => d.to_string(),
            JsonToken::String(s) => s,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected a number or a string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        text.parse()
    }

    fn visit_iso_date_constructor(&mut self) -> Result<DateTime> {
        self.verify_token(JsonToken::LeftParen)?;
        let text = match self.pop_token()? {
            JsonToken::RightParen => return Ok(DateTime::now()),
            JsonToken::String(s) => s,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected a string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::RightParen)?;
        DateTime::parse_iso_str(&text)
            .map_err(|_| self.parse_error(format!("Invalid date format '{text}'.")))
    }

    /// `new Date()`, `new Date(ms)`, `new Date("text")` or
    /// `new Date(year, month0, day[, hour[, minute[, second[, ms]]]])` in UTC.
    fn visit_date_constructor(&mut self) -> Result<DateTime> {
        self.verify_token(JsonToken::LeftParen)?;
        match self.pop_token()? {
            JsonToken::RightParen => Ok(DateTime::now()),
            JsonToken::String(text) => {
                self.verify_token(JsonToken::RightParen)?;
                DateTime::parse_iso_str(&text)
                    .or_else(|_| DateTime::parse_shell_str(&text))
                    .map_err(|_| {
                        self.parse_error(format!(
                            "JSON reader expected a date in 'EEE MMM dd yyyy HH:mm:ss z' format \
                             but found '{text}'."
                        ))
                    })
            }
            first @ (JsonToken::Int32(_) | JsonToken::Int64(_)) => {
                let mut token = first;
                let mut values = Vec::with_capacity(7);
                loop {
                    match token.as_i64() {
                        Some(value) if values.len() < 7 => values.push(value),
                        Some(_) => {
                            return Err(self.parse_error(
                                "JSON reader expected 1 or 3-7 integers but found more.",
                            ));
                        }
                        None => {
                            return Err(self.parse_error(format!(
                                "JSON reader expected an integer but found '{token}'."
                            )));
                        }
                    }
                    match self.pop_token()? {
                        JsonToken::RightParen => break,
                        JsonToken::Comma => token = self.pop_token()?,
                        other => {
                            return Err(self.parse_error(format!(
                                "JSON reader expected a ',' or a ')' but found '{other}'."
                            )));
                        }
                    }
                }
                self.date_from_components(&values)
            }
            other => Err(self.parse_error(format!(
                "JSON reader expected an integer or a string but found '{other}'."
            ))),
        }
    }

    fn date_from_components(&self, values: &[i64]) -> Result<DateTime> {
        match values.len() {
            1 => return Ok(DateTime::from_millis(values[0])),
            3..=7 => {}
            n => {
                return Err(self.parse_error(format!(
                    "JSON reader expected 1 or 3-7 integers but found {n}."
                )));
            }
        }
        let component = |index: usize| values.get(index).copied().unwrap_or(0);
        let out_of_range = |_| self.parse_error("Date component out of range.");

        let year = i32::try_from(component(0)).map_err(out_of_range)?;
        let month = u8::try_from(component(1) + 1).map_err(out_of_range)?;
        let day = u8::try_from(component(2)).map_err(out_of_range)?;
        let hour = u8::try_from(component(3)).map_err(out_of_range)?;
        let minute = u8::try_from(component(4)).map_err(out_of_range)?;
        let second = u8::try_from(component(5)).map_err(out_of_range)?;
        let millisecond = u16::try_from(component(6)).map_err(out_of_range)?;
        DateTime::from_components(year, month, day, hour, minute, second, millisecond)
    }

    /// `Date(...)` called without `new` ignores its arguments and yields the current date as a
    /// string, like the shell.
    fn visit_date_without_new(&mut self) -> Result<String> {
        self.verify_token(JsonToken::LeftParen)?;
        loop {
            match self.pop_token()? {
                JsonToken::RightParen => break,
                JsonToken::EndOfFile => {
                    return Err(self.parse_error("JSON reader expected a ')' but found '<eof>'."));
                }
                _ => {}
            }
        }
        DateTime::now().to_shell_string()
    }

    fn visit_extended_json(&mut self) -> Result<ElementType> {
        let name_token = self.pop_token()?;
        if let Some(key) = name_token.as_str().map(str::to_string) {
            if let Some(value) = self.visit_extended_json_key(&key)? {
                let element_type = value.element_type();
                self.current_value = Some(value);
                return Ok(element_type);
            }
        }

        self.push_token(name_token)?;
        self.current_value = None;
        Ok(ElementType::EmbeddedDocument)
    }

    /// Reads the rest of an object whose first key is `key`, if that key introduces an
    /// Extended JSON value. Returns `None` when the object is an ordinary document, leaving the
    /// reader positioned just after the key.
    fn visit_extended_json_key(&mut self, key: &str) -> Result<Option<Bson>> {
        let value = match key {
            "$binary" | "$type" => {
                if key == "$binary" {
                    let snapshot = self.snapshot();
                    self.verify_token(JsonToken::Colon)?;
                    if self.pop_token()? == JsonToken::BeginObject {
                        return self.visit_binary_extended_json().map(|b| Some(Bson::Binary(b)));
                    }
                    self.restore(snapshot)?;
                }
                return Ok(self
                    .speculate(|r| r.visit_legacy_binary_extended_json(key))?
                    .map(Bson::Binary));
            }
            "$regex" | "$options" => {
                return Ok(self
                    .speculate(|r| r.visit_legacy_regex_extended_json(key))?
                    .map(Bson::RegularExpression));
            }
            "$ref" => {
                return Ok(self
                    .speculate(|r| r.visit_legacy_db_pointer())?
                    .map(Bson::DbPointer));
            }
            "$code" => self.visit_java_script_extended_json()?,
            "$date" => Bson::DateTime(self.visit_date_extended_json()?),
            "$maxKey" => {
                self.visit_key_extended_json()?;
                Bson::MaxKey
            }
            "$minKey" => {
                self.visit_key_extended_json()?;
                Bson::MinKey
            }
            "$oid" => Bson::ObjectId(self.visit_object_id_extended_json()?),
            "$regularExpression" => {
                Bson::RegularExpression(self.visit_regular_expression_extended_json()?)
            }
            "$symbol" => {
                self.verify_token(JsonToken::Colon)?;
                let symbol = self.read_string_token()?;
                self.verify_token(JsonToken::EndObject)?;
                Bson::Symbol(symbol)
            }
            "$timestamp" => Bson::Timestamp(self.visit_timestamp_extended_json()?),
            "$undefined" => {
                self.verify_token(JsonToken::Colon)?;
                let token = self.pop_token()?;
                if !token.is_word("true") {
                    return Err(self.parse_error(format!(
                        "JSON reader requires $undefined to have the value of true but found \
                         '{token}'."
                    )));
                }
                self.verify_token(JsonToken::EndObject)?;
                Bson::Undefined
            }
            "$numberLong" => Bson::Int64(self.visit_number_long_extended_json()?),
            "$numberInt" => {
                let text = self.visit_numeric_string()?;
                Bson::Int32(text.parse().map_err(|_| {
                    self.parse_error(format!("Exception converting value '{text}' to type Int32."))
                })?)
            }
            "$numberDouble" => {
                let text = self.visit_numeric_string()?;
                Bson::Double(match text.as_str() {
                    "NaN" => f64::NAN,
                    "Infinity" => f64::INFINITY,
                    "-Infinity" => f64::NEG_INFINITY,
                    _ => text.parse().map_err(|_| {
                        self.parse_error(format!(
                            "Exception converting value '{text}' to type Double."
                        ))
                    })?,
                })
            }
            "$numberDecimal" => Bson::Decimal128(self.visit_numeric_string()?.parse()?),
            "$dbPointer" => Bson::DbPointer(self.visit_db_pointer_extended_json()?),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// `: "text" }`, shared by the single-key numeric wrappers.
    fn visit_numeric_string(&mut self) -> Result<String> {
        self.verify_token(JsonToken::Colon)?;
        let text = self.read_string_token()?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(text)
    }

    fn read_subtype_extended_json(&mut self) -> Result<BinarySubtype> {
        let token = self.pop_token()?;
        let subtype = match &token {
            JsonToken::String(hex) => u8::from_str_radix(hex, 16).ok(),
            other => other.as_i64().and_then(|i| u8::try_from(i).ok()),
        };
        subtype.map(BinarySubtype::from).ok_or_else(|| {
            self.parse_error(format!(
                "JSON reader expected a string or number but found '{token}'."
            ))
        })
    }

    /// `{ "base64": ..., "subType": ... } }` in either key order.
    fn visit_binary_extended_json(&mut self) -> Result<Binary> {
        let (bytes, subtype) = match self.read_key()?.as_str() {
            "base64" => {
                self.verify_token(JsonToken::Colon)?;
                let bytes = crate::base64::decode(self.read_string_token()?)?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("subType")?;
                self.verify_token(JsonToken::Colon)?;
                (bytes, self.read_subtype_extended_json()?)
            }
            "subType" => {
                self.verify_token(JsonToken::Colon)?;
                let subtype = self.read_subtype_extended_json()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("base64")?;
                self.verify_token(JsonToken::Colon)?;
                (crate::base64::decode(self.read_string_token()?)?, subtype)
            }
            other => {
                return Err(self.parse_error(format!("Unexpected key for $binary: {other}")));
            }
        };
        self.verify_token(JsonToken::EndObject)?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(Binary { subtype, bytes })
    }

    fn visit_legacy_binary_extended_json(&mut self, first_key: &str) -> Result<Binary> {
        self.verify_token(JsonToken::Colon)?;
        let (bytes, subtype) = if first_key == "$binary" {
            let bytes = crate::base64::decode(self.read_string_token()?)?;
            self.verify_token(JsonToken::Comma)?;
            self.verify_string("$type")?;
            self.verify_token(JsonToken::Colon)?;
            (bytes, self.read_subtype_extended_json()?)
        } else {
            let subtype = self.read_subtype_extended_json()?;
            self.verify_token(JsonToken::Comma)?;
            self.verify_string("$binary")?;
            self.verify_token(JsonToken::Colon)?;
            (crate::base64::decode(self.read_string_token()?)?, subtype)
        };
        self.verify_token(JsonToken::EndObject)?;
        Ok(Binary { subtype, bytes })
    }

    fn visit_legacy_regex_extended_json(&mut self, first_key: &str) -> Result<Regex> {
        self.verify_token(JsonToken::Colon)?;
        let (pattern, options) = if first_key == "$regex" {
            let pattern = self.read_string_token()?;
            self.verify_token(JsonToken::Comma)?;
            self.verify_string("$options")?;
            self.verify_token(JsonToken::Colon)?;
            (pattern, self.read_string_token()?)
        } else {
            let options = self.read_string_token()?;
            self.verify_token(JsonToken::Comma)?;
            self.verify_string("$regex")?;
            self.verify_token(JsonToken::Colon)?;
            (self.read_string_token()?, options)
        };
        self.verify_token(JsonToken::EndObject)?;
        Ok(Regex::new(pattern, options))
    }

    /// `: "ns", "$id": <ObjectId> }`, the form legacy writers use for a DBPointer.
    fn visit_legacy_db_pointer(&mut self) -> Result<DbPointer> {
        self.verify_token(JsonToken::Colon)?;
        let namespace = self.read_string_token()?;
        self.verify_token(JsonToken::Comma)?;
        self.verify_string("$id")?;
        let id = self.read_db_pointer_id()?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(DbPointer { namespace, id })
    }

    /// `: { "$oid": "hex" }` or `: ObjectId("hex")`.
    fn read_db_pointer_id(&mut self) -> Result<ObjectId> {
        self.verify_token(JsonToken::Colon)?;
        match self.pop_token()? {
            JsonToken::BeginObject => {
                self.verify_string("$oid")?;
                self.visit_object_id_extended_json()
            }
            token if token.is_word("ObjectId") => self.visit_object_id_constructor(),
            other => Err(self.parse_error(format!(
                "JSON reader expected an ObjectId but found '{other}'."
            ))),
        }
    }

    fn visit_db_pointer_extended_json(&mut self) -> Result<DbPointer> {
        self.verify_token(JsonToken::Colon)?;
        self.verify_token(JsonToken::BeginObject)?;
        let (namespace, id) = match self.read_key()?.as_str() {
            "$ref" => {
                self.verify_token(JsonToken::Colon)?;
                let namespace = self.read_string_token()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("$id")?;
                (namespace, self.read_db_pointer_id()?)
            }
            "$id" => {
                let id = self.read_db_pointer_id()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("$ref")?;
                self.verify_token(JsonToken::Colon)?;
                (self.read_string_token()?, id)
            }
            other => {
                return Err(self.parse_error(format!(
                    "Expected $ref and $id fields in $dbPointer document but found {other}"
                )));
            }
        };
        self.verify_token(JsonToken::EndObject)?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(DbPointer { namespace, id })
    }

    /// `$code`, optionally followed by `$scope`. With a scope, the reader is left just before
    /// the scope document.
    fn visit_java_script_extended_json(&mut self) -> Result<Bson> {
        self.verify_token(JsonToken::Colon)?;
        let code = self.read_string_token()?;
        match self.pop_token()? {
            JsonToken::Comma => {
                self.verify_string("$scope")?;
                self.verify_token(JsonToken::Colon)?;
                // The scope is read as a document through the scope-document context, so the
                // value carries only the code.
                Ok(Bson::JavaScriptCodeWithScope(
                    crate::bson::JavaScriptCodeWithScope {
                        code,
                        scope: crate::Document::new(),
                    },
                ))
            }
            JsonToken::EndObject => Ok(Bson::JavaScriptCode(code)),
            other => Err(self.parse_error(format!(
                "JSON reader expected ',' or '}}' but found '{other}'."
            ))),
        }
    }

    fn visit_date_extended_json(&mut self) -> Result<DateTime> {
        self.verify_token(JsonToken::Colon)?;
        let value = match self.pop_token()? {
            JsonToken::BeginObject => {
                let name = self.read_key()?;
                if name != "$numberLong" {
                    return Err(self.parse_error(format!(
                        "JSON reader expected $numberLong within $date, but found {name}"
                    )));
                }
                DateTime::from_millis(self.visit_number_long_extended_json()?)
            }
            JsonToken::Int32(ms) => DateTime::from_millis(i64::from(ms)),
            JsonToken::Int64(ms) => DateTime::from_millis(ms),
            JsonToken::String(text) => DateTime::parse_iso_str(&text).map_err(|_| {
                self.parse_error(format!("Failed to parse string as a date: {text}"))
            })?,
            other => {
                return Err(self.parse_error(format!(
                    "JSON reader expected an integer or string but found '{other}'."
                )));
            }
        };
        self.verify_token(JsonToken::EndObject)?;
        Ok(value)
    }

    /// `: 1 }` after `$minKey` or `$maxKey`.
    fn visit_key_extended_json(&mut self) -> Result<()> {
        self.verify_token(JsonToken::Colon)?;
        self.verify_token(JsonToken::Int32(1))?;
        self.verify_token(JsonToken::EndObject)
    }

    fn visit_object_id_extended_json(&mut self) -> Result<ObjectId> {
        self.verify_token(JsonToken::Colon)?;
        let id = ObjectId::parse_str(self.read_string_token()?)?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(id)
    }

    fn visit_number_long_extended_json(&mut self) -> Result<i64> {
        let text = self.visit_numeric_string()?;
        text.parse().map_err(|_| {
            self.parse_error(format!("Exception converting value '{text}' to type Int64."))
        })
    }

    fn visit_regular_expression_extended_json(&mut self) -> Result<Regex> {
        self.verify_token(JsonToken::Colon)?;
        self.verify_token(JsonToken::BeginObject)?;
        let (pattern, options) = match self.read_key()?.as_str() {
            "pattern" => {
                self.verify_token(JsonToken::Colon)?;
                let pattern = self.read_string_token()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("options")?;
                self.verify_token(JsonToken::Colon)?;
                (pattern, self.read_string_token()?)
            }
            "options" => {
                self.verify_token(JsonToken::Colon)?;
                let options = self.read_string_token()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("pattern")?;
                self.verify_token(JsonToken::Colon)?;
                (self.read_string_token()?, options)
            }
            other => {
                return Err(self.parse_error(format!(
                    "Expected 'pattern' and 'options' fields in $regularExpression document but \
                     found {other}"
                )));
            }
        };
        self.verify_token(JsonToken::EndObject)?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(Regex::new(pattern, options))
    }

    fn visit_timestamp_extended_json(&mut self) -> Result<Timestamp> {
        self.verify_token(JsonToken::Colon)?;
        self.verify_token(JsonToken::BeginObject)?;
        let (time, increment) = match self.read_key()?.as_str() {
            "t" => {
                self.verify_token(JsonToken::Colon)?;
                let time = self.read_u32_token()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("i")?;
                self.verify_token(JsonToken::Colon)?;
                (time, self.read_u32_token()?)
            }
            "i" => {
                self.verify_token(JsonToken::Colon)?;
                let increment = self.read_u32_token()?;
                self.verify_token(JsonToken::Comma)?;
                self.verify_string("t")?;
                self.verify_token(JsonToken::Colon)?;
                (self.read_u32_token()?, increment)
            }
            other => {
                return Err(self.parse_error(format!(
                    "Expected 't' and 'i' fields in $timestamp document but found {other}"
                )));
            }
        };
        self.verify_token(JsonToken::EndObject)?;
        self.verify_token(JsonToken::EndObject)?;
        Ok(Timestamp { time, increment })
    }
}

impl BsonReader for JsonReader {
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
        if matches!(
            self.core.state(),
            State::Initial | State::Done | State::ScopeDocument
        ) {
            // A JSON stream may hold a value of any type at the top level.
            self.core.set_state(State::Type);
        }
        let state = self.core.state();
        if state != State::Type {
            return Err(Error::invalid_state(OPERATION, state, &[State::Type]));
        }

        let context_type = self.core.context_type();
        if matches!(
            context_type,
            ContextType::Document | ContextType::ScopeDocument
        ) {
            match self.pop_token()? {
                JsonToken::String(name) | JsonToken::UnquotedString(name) => {
                    self.core.set_current_name(Some(name));
                }
                JsonToken::EndObject => {
                    self.core.set_current_type(ElementType::EndOfDocument);
                    self.core.set_state(State::EndOfDocument);
                    return Ok(ElementType::EndOfDocument);
                }
                other => {
                    return Err(self.parse_error(format!(
                        "JSON reader was expecting a name but found '{other}'."
                    )));
                }
            }
            let colon = self.pop_token()?;
            if colon != JsonToken::Colon {
                return Err(self.parse_error(format!(
                    "JSON reader was expecting ':' but found '{colon}'."
                )));
            }
        }

        let token = self.pop_token()?;
        match (&token, context_type) {
            (JsonToken::EndArray, ContextType::Array) => {
                self.core.set_current_type(ElementType::EndOfDocument);
                self.core.set_state(State::EndOfArray);
                return Ok(ElementType::EndOfDocument);
            }
            (JsonToken::EndOfFile, ContextType::TopLevel) => {
                self.core.set_current_type(ElementType::EndOfDocument);
                self.core.set_state(State::Done);
                return Ok(ElementType::EndOfDocument);
            }
            (JsonToken::EndOfFile, _) => {
                return Err(self.parse_error("Unexpected end of JSON input."));
            }
            _ => {}
        }

        let element_type = self.visit_value(token)?;
        trace!("json value of type {element_type}");
        self.core.set_current_type(element_type);
        self.consume_optional_comma()?;

        let next = match context_type {
            ContextType::Array | ContextType::JavaScriptWithScope | ContextType::TopLevel => {
                State::Value
            }
            ContextType::Document | ContextType::ScopeDocument => State::Name,
        };
        self.core.set_state(next);
        Ok(element_type)
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
        self.restore(snapshot)
    }

    fn discard_mark(&mut self) {
        self.mark = None;
    }

    fn do_read_binary_data(&mut self) -> Result<Binary> {
        match self.take_value(ElementType::Binary)? {
            Bson::Binary(binary) => Ok(binary),
            other => Self::value_mismatch(ElementType::Binary, &other),
        }
    }

    fn do_peek_binary_subtype(&mut self) -> Result<BinarySubtype> {
        match &self.current_value {
            Some(Bson::Binary(binary)) => Ok(binary.subtype),
            _ => Err(Error::invalid_operation("JSON reader has no Binary value to peek.")),
        }
    }

    fn do_peek_binary_size(&mut self) -> Result<usize> {
        match &self.current_value {
            Some(Bson::Binary(binary)) => Ok(binary.bytes.len()),
            _ => Err(Error::invalid_operation("JSON reader has no Binary value to peek.")),
        }
    }

    fn do_read_boolean(&mut self) -> Result<bool> {
        match self.take_value(ElementType::Boolean)? {
            Bson::Boolean(b) => Ok(b),
            other => Self::value_mismatch(ElementType::Boolean, &other),
        }
    }

    fn do_read_date_time(&mut self) -> Result<DateTime> {
        match self.take_value(ElementType::DateTime)? {
            Bson::DateTime(dt) => Ok(dt),
            other => Self::value_mismatch(ElementType::DateTime, &other),
        }
    }

    fn do_read_db_pointer(&mut self) -> Result<DbPointer> {
        match self.take_value(ElementType::DbPointer)? {
            Bson::DbPointer(pointer) => Ok(pointer),
            other => Self::value_mismatch(ElementType::DbPointer, &other),
        }
    }

    fn do_read_decimal128(&mut self) -> Result<Decimal128> {
        match self.take_value(ElementType::Decimal128)? {
            Bson::Decimal128(d) => Ok(d),
            other => Self::value_mismatch(ElementType::Decimal128, &other),
        }
    }

    fn do_read_double(&mut self) -> Result<f64> {
        match self.take_value(ElementType::Double)? {
            Bson::Double(d) => Ok(d),
            other => Self::value_mismatch(ElementType::Double, &other),
        }
    }

    fn do_read_int32(&mut self) -> Result<i32> {
        match self.take_value(ElementType::Int32)? {
            Bson::Int32(i) => Ok(i),
            other => Self::value_mismatch(ElementType::Int32, &other),
        }
    }

    fn do_read_int64(&mut self) -> Result<i64> {
        match self.take_value(ElementType::Int64)? {
            Bson::Int64(i) => Ok(i),
            other => Self::value_mismatch(ElementType::Int64, &other),
        }
    }

    fn do_read_java_script(&mut self) -> Result<String> {
        match self.take_value(ElementType::JavaScriptCode)? {
            Bson::JavaScriptCode(code) => Ok(code),
            other => Self::value_mismatch(ElementType::JavaScriptCode, &other),
        }
    }

    fn do_read_java_script_with_scope(&mut self) -> Result<String> {
        match self.take_value(ElementType::JavaScriptCodeWithScope)? {
            Bson::JavaScriptCodeWithScope(code_with_scope) => {
                self.core
                    .push_context(ReaderContext::new(ContextType::JavaScriptWithScope));
                Ok(code_with_scope.code)
            }
            other => Self::value_mismatch(ElementType::JavaScriptCodeWithScope, &other),
        }
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
        match self.take_value(ElementType::ObjectId)? {
            Bson::ObjectId(id) => Ok(id),
            other => Self::value_mismatch(ElementType::ObjectId, &other),
        }
    }

    fn do_read_regular_expression(&mut self) -> Result<Regex> {
        match self.take_value(ElementType::RegularExpression)? {
            Bson::RegularExpression(regex) => Ok(regex),
            other => Self::value_mismatch(ElementType::RegularExpression, &other),
        }
    }

    fn do_read_string(&mut self) -> Result<String> {
        match self.take_value(ElementType::String)? {
            Bson::String(s) => Ok(s),
            other => Self::value_mismatch(ElementType::String, &other),
        }
    }

    fn do_read_symbol(&mut self) -> Result<String> {
        match self.take_value(ElementType::Symbol)? {
            Bson::Symbol(s) => Ok(s),
            other => Self::value_mismatch(ElementType::Symbol, &other),
        }
    }

    fn do_read_timestamp(&mut self) -> Result<Timestamp> {
        match self.take_value(ElementType::Timestamp)? {
            Bson::Timestamp(ts) => Ok(ts),
            other => Self::value_mismatch(ElementType::Timestamp, &other),
        }
    }

    fn do_read_undefined(&mut self) -> Result<()> {
        self.current_value = None;
        Ok(())
    }

    fn do_read_start_document(&mut self) -> Result<()> {
        let context_type = if self.core.context_type() == ContextType::JavaScriptWithScope {
            ContextType::ScopeDocument
        } else {
            ContextType::Document
        };
        self.core.push_context(ReaderContext::new(context_type));
        Ok(())
    }

    fn do_read_end_document(&mut self) -> Result<()> {
        let document = self.core.pop_context()?;
        if document.context_type() == ContextType::ScopeDocument {
            self.core.pop_context()?;
            // The closing brace of the enclosing { "$code": ..., "$scope": ... } object.
            self.verify_token(JsonToken::EndObject)?;
        }
        self.consume_optional_comma()
    }

    fn do_read_start_array(&mut self) -> Result<()> {
        self.core
            .push_context(ReaderContext::new(ContextType::Array));
        Ok(())
    }

    fn do_read_end_array(&mut self) -> Result<()> {
        self.core.pop_context()?;
        self.consume_optional_comma()
    }

    fn do_skip_name(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_skip_value(&mut self) -> Result<()> {
        match self.core.current_type() {
            ElementType::Array => {
                self.read_start_array()?;
                while self.read_bson_type()? != ElementType::EndOfDocument {
                    self.skip_value()?;
                }
                self.read_end_array()
            }
            ElementType::EmbeddedDocument => {
                self.read_start_document()?;
                self.skip_document_body()
            }
            ElementType::JavaScriptCodeWithScope => {
                self.read_java_script_with_scope()?;
                self.read_start_document()?;
                self.skip_document_body()
            }
            ElementType::EndOfDocument => Err(Error::invalid_operation(
                "Cannot skip past the end of a document.",
            )),
            _ => {
                self.current_value = None;
                Ok(())
            }
        }
    }
}

impl JsonReader {
    fn skip_document_body(&mut self) -> Result<()> {
        while self.read_bson_type()? != ElementType::EndOfDocument {
            self.skip_name()?;
            self.skip_value()?;
        }
        self.read_end_document()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn read_one(text: &str) -> Bson {
        let mut reader = JsonReader::new(text);
        crate::codec::CodecRegistry::default()
            .decode_value(&mut reader)
            .unwrap()
    }

    #[test]
    fn top_level_scalars_and_end_of_input() {
        let mut reader = JsonReader::new("42");
        assert_eq!(reader.read_int32().unwrap(), 42);
        assert_eq!(reader.state(), State::Done);
        assert_eq!(reader.read_bson_type().unwrap(), ElementType::EndOfDocument);
        assert_eq!(reader.state(), State::Done);
    }

    #[test]
    fn legacy_binary_in_either_key_order() {
        let expected = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        });
        assert_eq!(read_one(r#"{"$binary":"AQID","$type":"0"}"#), expected);
        assert_eq!(read_one(r#"{"$type":"0","$binary":"AQID"}"#), expected);
        assert_eq!(
            read_one(r#"{"$binary":{"subType":"00","base64":"AQID"}}"#),
            expected
        );
    }

    #[test]
    fn a_type_operator_rolls_back_to_a_document() {
        let value = read_one(r#"{ "$type": "string" }"#);
        assert_eq!(value, Bson::Document(crate::doc! { "$type": "string" }));

        let value = read_one(r#"{ "$regex": "^a", "flags": 1 }"#);
        assert_eq!(
            value,
            Bson::Document(crate::doc! { "$regex": "^a", "flags": 1 })
        );
    }

    #[test]
    fn shell_constructors_with_and_without_new() {
        let id = ObjectId::parse_str("4d0ce088e447ad08b4721a37").unwrap();
        assert_eq!(
            read_one(r#"ObjectId("4d0ce088e447ad08b4721a37")"#),
            Bson::ObjectId(id)
        );
        assert_eq!(
            read_one(r#"new ObjectId("4d0ce088e447ad08b4721a37")"#),
            Bson::ObjectId(id)
        );
        assert_eq!(read_one("NumberLong(5)"), Bson::Int64(5));
        assert_eq!(read_one(r#"NumberInt("7")"#), Bson::Int32(7));
        assert_eq!(
            read_one("Timestamp(1, 2)"),
            Bson::Timestamp(Timestamp {
                time: 1,
                increment: 2
            })
        );
        assert_eq!(read_one("MinKey"), Bson::MinKey);
        assert_eq!(read_one("MaxKey()"), Bson::MaxKey);
        assert_eq!(
            read_one(r#"HexData(0, "abc")"#),
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![0x0a, 0xbc],
            })
        );
    }

    #[test]
    fn dates_in_every_form() {
        let epoch = Bson::DateTime(DateTime::from_millis(0));
        assert_eq!(read_one(r#"{"$date": "1970-01-01T00:00:00Z"}"#), epoch);
        assert_eq!(read_one(r#"{"$date": {"$numberLong": "0"}}"#), epoch);
        assert_eq!(read_one(r#"{"$date": 0}"#), epoch);
        assert_eq!(read_one("new Date(0)"), epoch);
        assert_eq!(read_one(r#"ISODate("1970-01-01T00:00:00.000+0000")"#), epoch);
        assert_eq!(read_one("new Date(1970, 0, 1)"), epoch);
        assert_eq!(
            read_one("new Date(2000, 1, 29, 12, 30, 15, 250)"),
            Bson::DateTime(DateTime::from_components(2000, 2, 29, 12, 30, 15, 250).unwrap())
        );
        assert_matches!(read_one("Date()"), Bson::String(_));
    }

    #[test]
    fn code_with_scope_reads_through_the_scope_context() {
        let mut reader = JsonReader::new(r#"{ "f": { "$code": "x", "$scope": { "x": 1 } }, "n": 2 }"#);
        reader.read_start_document().unwrap();
        assert_eq!(
            reader.read_bson_type().unwrap(),
            ElementType::JavaScriptCodeWithScope
        );
        assert_eq!(reader.read_name().unwrap(), "f");
        assert_eq!(reader.read_java_script_with_scope().unwrap(), "x");
        assert_eq!(reader.state(), State::ScopeDocument);
        reader.read_start_document().unwrap();
        reader.verify_name("x").unwrap();
        assert_eq!(reader.read_int32().unwrap(), 1);
        reader.read_end_document().unwrap();
        reader.verify_name("n").unwrap();
        assert_eq!(reader.read_int32().unwrap(), 2);
        reader.read_end_document().unwrap();
        assert_eq!(reader.state(), State::Done);
    }

    #[test]
    fn mark_and_reset_replay_tokens() {
        let mut reader = JsonReader::new(r#"{ "a": "x", "b": [1, 2] }"#);
        reader.read_start_document().unwrap();
        reader.mark().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), ElementType::String);
        assert_eq!(reader.read_name().unwrap(), "a");
        assert_eq!(reader.read_string().unwrap(), "x");
        reader.reset().unwrap();
        assert_eq!(reader.state(), State::Type);
        assert_eq!(reader.read_bson_type().unwrap(), ElementType::String);
        assert_eq!(reader.read_name().unwrap(), "a");
        assert_eq!(reader.read_string().unwrap(), "x");

        reader.mark().unwrap();
        assert_matches!(reader.mark().unwrap_err().kind, ErrorKind::MarkOutstanding);
        reader.discard_mark();
        assert_matches!(reader.reset().unwrap_err().kind, ErrorKind::NoMark);
    }

    #[test]
    fn reports_expected_and_found_tokens() {
        let error = JsonReader::new("ObjectId(1)").read_object_id().unwrap_err();
        assert!(error.is_parse());
        assert_eq!(
            error.to_string(),
            "JSON reader expected a string but found '1'."
        );

        let mut reader = JsonReader::new(r#"{ "a" 1 }"#);
        reader.read_start_document().unwrap();
        let error = reader.read_bson_type().unwrap_err();
        assert_eq!(
            error.to_string(),
            "JSON reader was expecting ':' but found '1'."
        );
    }

    #[test]
    fn skips_nested_values() {
        let mut reader =
            JsonReader::new(r#"{ "a": { "b": [1, { "c": null }], "d": /x/i }, "e": true }"#);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
        reader.verify_name("e").unwrap();
        assert!(reader.read_boolean().unwrap());
        reader.read_end_document().unwrap();
    }
}
