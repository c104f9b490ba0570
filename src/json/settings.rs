use std::{fmt, sync::Arc};

use super::strict::{Layout, StrictJsonWriter};
use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::Result,
    oid::ObjectId,
    writer::DEFAULT_MAX_SERIALIZATION_DEPTH,
};

/// The flavour of JSON a [`JsonWriter`](super::JsonWriter) produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum JsonMode {
    /// The legacy strict format, e.g. `{ "$date" : 0 }` and `{ "$numberLong" : "1" }`.
    Strict,

    /// Syntax the mongo shell accepts, e.g. `ObjectId("...")` and `NumberLong(1)`.
    Shell,

    /// Canonical Extended JSON: every non-JSON type, including all numbers, is tagged.
    Extended,

    /// Relaxed Extended JSON: numbers and in-range dates are written as native JSON where
    /// nothing is lost.
    #[default]
    Relaxed,
}

/// Renders one BSON value through a [`StrictJsonWriter`].
///
/// Any closure of the right shape is a converter:
///
/// ```
/// use bson_codec::{doc, json::{JsonWriterSettings, StrictJsonWriter}};
///
/// let settings = JsonWriterSettings::default()
///     .with_int32_converter(|value: &i32, writer: &mut StrictJsonWriter| {
///         writer.write_string(&format!("#{value}"))
///     });
/// assert_eq!(doc! { "n": 7 }.to_json(settings)?, r##"{ "n" : "#7" }"##);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub trait Converter<T: ?Sized>: Send + Sync {
    fn convert(&self, value: &T, writer: &mut StrictJsonWriter) -> Result<()>;
}

impl<T: ?Sized, F> Converter<T> for F
where
    F: Fn(&T, &mut StrictJsonWriter) -> Result<()> + Send + Sync,
{
    fn convert(&self, value: &T, writer: &mut StrictJsonWriter) -> Result<()> {
        self(value, writer)
    }
}

/// Per-type overrides of the mode's built-in converters.
#[derive(Clone, Default)]
pub(crate) struct Converters {
    pub(crate) binary: Option<Arc<dyn Converter<Binary>>>,
    pub(crate) boolean: Option<Arc<dyn Converter<bool>>>,
    pub(crate) date_time: Option<Arc<dyn Converter<DateTime>>>,
    pub(crate) db_pointer: Option<Arc<dyn Converter<DbPointer>>>,
    pub(crate) decimal128: Option<Arc<dyn Converter<Decimal128>>>,
    pub(crate) double: Option<Arc<dyn Converter<f64>>>,
    pub(crate) int32: Option<Arc<dyn Converter<i32>>>,
    pub(crate) int64: Option<Arc<dyn Converter<i64>>>,
    pub(crate) java_script: Option<Arc<dyn Converter<str>>>,
    pub(crate) max_key: Option<Arc<dyn Converter<()>>>,
    pub(crate) min_key: Option<Arc<dyn Converter<()>>>,
    pub(crate) null: Option<Arc<dyn Converter<()>>>,
    pub(crate) object_id: Option<Arc<dyn Converter<ObjectId>>>,
    pub(crate) regular_expression: Option<Arc<dyn Converter<Regex>>>,
    pub(crate) string: Option<Arc<dyn Converter<str>>>,
    pub(crate) symbol: Option<Arc<dyn Converter<str>>>,
    pub(crate) timestamp: Option<Arc<dyn Converter<Timestamp>>>,
    pub(crate) undefined: Option<Arc<dyn Converter<()>>>,
}

/// Options for [`JsonWriter`](super::JsonWriter). The default writes relaxed Extended JSON on
/// one line.
#[derive(Clone)]
#[non_exhaustive]
pub struct JsonWriterSettings {
    pub output_mode: JsonMode,
    pub indent: bool,
    pub new_line_characters: String,
    pub indent_characters: String,
    pub max_serialization_depth: usize,
    pub(crate) converters: Converters,
}

impl Default for JsonWriterSettings {
    fn default() -> Self {
        Self::new(JsonMode::default())
    }
}

impl fmt::Debug for JsonWriterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWriterSettings")
            .field("output_mode", &self.output_mode)
            .field("indent", &self.indent)
            .field("new_line_characters", &self.new_line_characters)
            .field("indent_characters", &self.indent_characters)
            .field("max_serialization_depth", &self.max_serialization_depth)
            .finish_non_exhaustive()
    }
}

macro_rules! converter_setters {
    ($($(#[$attr:meta])* $setter:ident => $field:ident: $ty:ty;)*) => {
        $(
            $(#[$attr])*
            pub fn $setter(mut self, converter: impl Converter<$ty> + 'static) -> Self {
                self.converters.$field = Some(Arc::new(converter));
                self
            }
        )*
    };
}

impl JsonWriterSettings {
    pub fn new(output_mode: JsonMode) -> Self {
        Self {
            output_mode,
            indent: false,
            new_line_characters: "\n".to_string(),
            indent_characters: "  ".to_string(),
            max_serialization_depth: DEFAULT_MAX_SERIALIZATION_DEPTH,
            converters: Converters::default(),
        }
    }

    pub fn with_output_mode(mut self, output_mode: JsonMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_new_line_characters(mut self, new_line_characters: impl Into<String>) -> Self {
        self.new_line_characters = new_line_characters.into();
        self
    }

    pub fn with_indent_characters(mut self, indent_characters: impl Into<String>) -> Self {
        self.indent_characters = indent_characters.into();
        self
    }

    pub fn with_max_serialization_depth(mut self, max_serialization_depth: usize) -> Self {
        self.max_serialization_depth = max_serialization_depth;
        self
    }

    converter_setters! {
        with_binary_converter => binary: Binary;
        with_boolean_converter => boolean: bool;
        with_date_time_converter => date_time: DateTime;
        with_db_pointer_converter => db_pointer: DbPointer;
        with_decimal128_converter => decimal128: Decimal128;
        with_double_converter => double: f64;
        with_int32_converter => int32: i32;
        with_int64_converter => int64: i64;
        /// Overrides how JavaScript code without a scope is written. Code with a scope always
        /// uses the `$code`/`$scope` form.
        with_java_script_converter => java_script: str;
        with_max_key_converter => max_key: ();
        with_min_key_converter => min_key: ();
        with_null_converter => null: ();
        with_object_id_converter => object_id: ObjectId;
        with_regular_expression_converter => regular_expression: Regex;
        with_string_converter => string: str;
        with_symbol_converter => symbol: str;
        with_timestamp_converter => timestamp: Timestamp;
        with_undefined_converter => undefined: ();
    }

    pub(crate) fn layout(&self) -> Layout {
        Layout {
            indent: self.indent,
            new_line_characters: self.new_line_characters.clone(),
            indent_characters: self.indent_characters.clone(),
        }
    }
}
