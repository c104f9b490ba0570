use super::{
    converter,
    settings::JsonWriterSettings,
    strict::StrictJsonWriter,
};
use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::Result,
    oid::ObjectId,
    state::{ContextType, State},
    writer::{BsonWriter, WriterCore, WriterSettings},
};

/// A [`BsonWriter`] that renders JSON in one of the [`JsonMode`](super::JsonMode)s.
///
/// ```
/// use bson_codec::{
///     doc,
///     json::{JsonMode, JsonWriter, JsonWriterSettings},
///     pipe,
/// };
///
/// let mut writer = JsonWriter::new(JsonWriterSettings::new(JsonMode::Shell));
/// pipe::write_document(&mut writer, &doc! { "n": 1_i64 << 40 })?;
/// assert_eq!(writer.into_string(), r#"{ "n" : NumberLong("1099511627776") }"#);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub struct JsonWriter {
    strict: StrictJsonWriter,
    settings: JsonWriterSettings,
    core: WriterCore,
}

impl std::fmt::Debug for JsonWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonWriter")
            .field("settings", &self.settings)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new(JsonWriterSettings::default())
    }
}

/// Writes `$value` with the override registered in the settings, if any, or with the mode's
/// built-in converter.
macro_rules! convert {
    ($writer:ident, $field:ident, $value:expr) => {{
        $writer.write_pending_name()?;
        match &$writer.settings.converters.$field {
            Some(converter) => converter.convert($value, &mut $writer.strict),
            None => converter::$field($writer.settings.output_mode, $value, &mut $writer.strict),
        }
    }};
}

impl JsonWriter {
    pub fn new(settings: JsonWriterSettings) -> Self {
        let core = WriterCore::new(
            WriterSettings::default().with_max_serialization_depth(settings.max_serialization_depth),
        );
        Self::with_core(settings, core)
    }

    /// A writer driven by a preconfigured core, e.g. one carrying a field-name validator. The
    /// core's depth limit takes precedence over the one in `settings`.
    pub fn with_core(settings: JsonWriterSettings, core: WriterCore) -> Self {
        Self {
            strict: StrictJsonWriter::with_layout(settings.layout()),
            settings,
            core,
        }
    }

    pub fn settings(&self) -> &JsonWriterSettings {
        &self.settings
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        self.strict.as_str()
    }

    pub fn into_string(self) -> String {
        self.strict.into_string()
    }

    /// Emits the element name recorded by the last `write_name`, if the value being written
    /// belongs to a document.
    fn write_pending_name(&mut self) -> Result<()> {
        if matches!(
            self.core.context_type(),
            ContextType::Document | ContextType::ScopeDocument
        ) {
            if let Some(name) = self.core.context().name() {
                self.strict.write_name(name)?;
            }
        }
        Ok(())
    }
}

impl BsonWriter for JsonWriter {
    fn core(&self) -> &WriterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WriterCore {
        &mut self.core
    }

    fn do_write_start_document(&mut self) -> Result<()> {
        // The scope's name, "$scope", was written with the code.
        if self.core.state() != State::ScopeDocument {
            self.write_pending_name()?;
        }
        self.strict.write_start_object()
    }

    fn do_write_end_document(&mut self) -> Result<()> {
        self.strict.write_end_object()
    }

    fn do_write_start_array(&mut self) -> Result<()> {
        self.write_pending_name()?;
        self.strict.write_start_array()
    }

    fn do_write_end_array(&mut self) -> Result<()> {
        self.strict.write_end_array()
    }

    fn do_write_binary_data(&mut self, value: &Binary) -> Result<()> {
        convert!(self, binary, value)
    }

    fn do_write_boolean(&mut self, value: bool) -> Result<()> {
        convert!(self, boolean, &value)
    }

    fn do_write_date_time(&mut self, value: DateTime) -> Result<()> {
        convert!(self, date_time, &value)
    }

    fn do_write_db_pointer(&mut self, value: &DbPointer) -> Result<()> {
        convert!(self, db_pointer, value)
    }

    fn do_write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        convert!(self, decimal128, &value)
    }

    fn do_write_double(&mut self, value: f64) -> Result<()> {
        convert!(self, double, &value)
    }

    fn do_write_int32(&mut self, value: i32) -> Result<()> {
        convert!(self, int32, &value)
    }

    fn do_write_int64(&mut self, value: i64) -> Result<()> {
        convert!(self, int64, &value)
    }

    fn do_write_java_script(&mut self, code: &str) -> Result<()> {
        convert!(self, java_script, code)
    }

    fn do_write_java_script_with_scope(&mut self, code: &str) -> Result<()> {
        self.write_pending_name()?;
        self.strict.write_start_object()?;
        self.strict.write_name("$code")?;
        self.strict.write_string(code)?;
        self.strict.write_name("$scope")
    }

    fn do_write_end_java_script_with_scope(&mut self) -> Result<()> {
        self.strict.write_end_object()
    }

    fn do_write_max_key(&mut self) -> Result<()> {
        convert!(self, max_key, &())
    }

    fn do_write_min_key(&mut self) -> Result<()> {
        convert!(self, min_key, &())
    }

    fn do_write_null(&mut self) -> Result<()> {
        convert!(self, null, &())
    }

    fn do_write_object_id(&mut self, value: ObjectId) -> Result<()> {
        convert!(self, object_id, &value)
    }

    fn do_write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        convert!(self, regular_expression, value)
    }

    fn do_write_string(&mut self, value: &str) -> Result<()> {
        convert!(self, string, value)
    }

    fn do_write_symbol(&mut self, value: &str) -> Result<()> {
        convert!(self, symbol, value)
    }

    fn do_write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        convert!(self, timestamp, &value)
    }

    fn do_write_undefined(&mut self) -> Result<()> {
        convert!(self, undefined, &())
    }
}
