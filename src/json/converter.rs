//! The built-in rendering of each BSON type for every [`JsonMode`].

use super::{settings::JsonMode, strict::StrictJsonWriter};
use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{DbPointer, Regex, Timestamp},
    error::Result,
    oid::ObjectId,
};

/// The last millisecond of 9999-12-31, the latest date relaxed mode writes as an ISO string.
const MAX_RELAXED_DATE_MILLIS: i64 = 253_402_300_799_999;

/// `{ "$name" : "text" }`
fn write_wrapped_string(writer: &mut StrictJsonWriter, name: &str, text: &str) -> Result<()> {
    writer.write_start_object()?;
    writer.write_name(name)?;
    writer.write_string(text)?;
    writer.write_end_object()
}

/// Text of a double that reads back as a double: integral values keep a `.0`.
pub(crate) fn double_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        let text = value.to_string();
        if text.contains(['.', 'e', 'E']) {
            text
        } else {
            format!("{text}.0")
        }
    }
}

pub(crate) fn binary(mode: JsonMode, value: &Binary, writer: &mut StrictJsonWriter) -> Result<()> {
    let subtype = format!("{:02x}", u8::from(value.subtype));
    match mode {
        JsonMode::Extended | JsonMode::Relaxed => {
            writer.write_start_object()?;
            writer.write_name("$binary")?;
            writer.write_start_object()?;
            writer.write_name("base64")?;
            writer.write_string(&value.to_base64())?;
            writer.write_name("subType")?;
            writer.write_string(&subtype)?;
            writer.write_end_object()?;
            writer.write_end_object()
        }
        JsonMode::Strict => {
            writer.write_start_object()?;
            writer.write_name("$binary")?;
            writer.write_string(&value.to_base64())?;
            writer.write_name("$type")?;
            writer.write_string(&subtype)?;
            writer.write_end_object()
        }
        JsonMode::Shell => writer.write_raw(&format!(
            "new BinData({}, \"{}\")",
            u8::from(value.subtype),
            value.to_base64()
        )),
    }
}

pub(crate) fn boolean(_: JsonMode, value: &bool, writer: &mut StrictJsonWriter) -> Result<()> {
    writer.write_boolean(*value)
}

pub(crate) fn date_time(
    mode: JsonMode,
    value: &DateTime,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    let millis = value.timestamp_millis();
    let in_iso_range = (0..=MAX_RELAXED_DATE_MILLIS).contains(&millis);
    match mode {
        JsonMode::Relaxed if in_iso_range => {
            write_wrapped_string(writer, "$date", &value.try_to_rfc3339_string()?)
        }
        JsonMode::Extended | JsonMode::Relaxed => {
            writer.write_start_object()?;
            writer.write_name("$date")?;
            write_wrapped_string(writer, "$numberLong", &millis.to_string())?;
            writer.write_end_object()
        }
        JsonMode::Strict => {
            writer.write_start_object()?;
            writer.write_name("$date")?;
            writer.write_number(&millis.to_string())?;
            writer.write_end_object()
        }
        JsonMode::Shell if in_iso_range => {
            writer.write_raw(&format!("ISODate(\"{}\")", value.to_iso_millis_string()?))
        }
        JsonMode::Shell => writer.write_raw(&format!("new Date({millis})")),
    }
}

pub(crate) fn db_pointer(
    mode: JsonMode,
    value: &DbPointer,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    let write_fields = |writer: &mut StrictJsonWriter| -> Result<()> {
        writer.write_start_object()?;
        writer.write_name("$ref")?;
        writer.write_string(&value.namespace)?;
        writer.write_name("$id")?;
        if mode == JsonMode::Shell {
            writer.write_raw(&format!("ObjectId(\"{}\")", value.id.to_hex()))?;
        } else {
            write_wrapped_string(writer, "$oid", &value.id.to_hex())?;
        }
        writer.write_end_object()
    };
    match mode {
        JsonMode::Extended | JsonMode::Relaxed => {
            writer.write_start_object()?;
            writer.write_name("$dbPointer")?;
            write_fields(writer)?;
            writer.write_end_object()
        }
        JsonMode::Strict | JsonMode::Shell => write_fields(writer),
    }
}

pub(crate) fn decimal128(
    mode: JsonMode,
    value: &Decimal128,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    match mode {
        JsonMode::Shell => writer.write_raw(&format!("NumberDecimal(\"{value}\")")),
        _ => write_wrapped_string(writer, "$numberDecimal", &value.to_string()),
    }
}

pub(crate) fn double(mode: JsonMode, value: &f64, writer: &mut StrictJsonWriter) -> Result<()> {
    match mode {
        JsonMode::Extended => write_wrapped_string(writer, "$numberDouble", &double_text(*value)),
        JsonMode::Relaxed if !value.is_finite() => {
            write_wrapped_string(writer, "$numberDouble", &double_text(*value))
        }
        _ => writer.write_number(&double_text(*value)),
    }
}

pub(crate) fn int32(mode: JsonMode, value: &i32, writer: &mut StrictJsonWriter) -> Result<()> {
    match mode {
        JsonMode::Extended => write_wrapped_string(writer, "$numberInt", &value.to_string()),
        _ => writer.write_number(&value.to_string()),
    }
}

pub(crate) fn int64(mode: JsonMode, value: &i64, writer: &mut StrictJsonWriter) -> Result<()> {
    match mode {
        JsonMode::Relaxed => writer.write_number(&value.to_string()),
        JsonMode::Extended | JsonMode::Strict => {
            write_wrapped_string(writer, "$numberLong", &value.to_string())
        }
        JsonMode::Shell if i32::try_from(*value).is_ok() => {
            writer.write_raw(&format!("NumberLong({value})"))
        }
        JsonMode::Shell => writer.write_raw(&format!("NumberLong(\"{value}\")")),
    }
}

pub(crate) fn java_script(_: JsonMode, code: &str, writer: &mut StrictJsonWriter) -> Result<()> {
    write_wrapped_string(writer, "$code", code)
}

fn key(mode: JsonMode, name: &str, shell: &str, writer: &mut StrictJsonWriter) -> Result<()> {
    match mode {
        JsonMode::Shell => writer.write_raw(shell),
        _ => {
            writer.write_start_object()?;
            writer.write_name(name)?;
            writer.write_number("1")?;
            writer.write_end_object()
        }
    }
}

pub(crate) fn max_key(mode: JsonMode, _: &(), writer: &mut StrictJsonWriter) -> Result<()> {
    key(mode, "$maxKey", "MaxKey", writer)
}

pub(crate) fn min_key(mode: JsonMode, _: &(), writer: &mut StrictJsonWriter) -> Result<()> {
    key(mode, "$minKey", "MinKey", writer)
}

pub(crate) fn null(_: JsonMode, _: &(), writer: &mut StrictJsonWriter) -> Result<()> {
    writer.write_null()
}

pub(crate) fn object_id(
    mode: JsonMode,
    value: &ObjectId,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    match mode {
        JsonMode::Shell => writer.write_raw(&format!("ObjectId(\"{}\")", value.to_hex())),
        _ => write_wrapped_string(writer, "$oid", &value.to_hex()),
    }
}

pub(crate) fn regular_expression(
    mode: JsonMode,
    value: &Regex,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    match mode {
        JsonMode::Extended | JsonMode::Relaxed => {
            writer.write_start_object()?;
            writer.write_name("$regularExpression")?;
            writer.write_start_object()?;
            writer.write_name("pattern")?;
            writer.write_string(&value.pattern)?;
            writer.write_name("options")?;
            writer.write_string(&value.options)?;
            writer.write_end_object()?;
            writer.write_end_object()
        }
        JsonMode::Strict => {
            writer.write_start_object()?;
            writer.write_name("$regex")?;
            writer.write_string(&value.pattern)?;
            writer.write_name("$options")?;
            writer.write_string(&value.options)?;
            writer.write_end_object()
        }
        JsonMode::Shell => {
            let pattern = if value.pattern.is_empty() {
                "(?:)".to_string()
            } else {
                value.pattern.replace('/', "\\/")
            };
            writer.write_raw(&format!("/{pattern}/{}", value.options))
        }
    }
}

pub(crate) fn string(_: JsonMode, value: &str, writer: &mut StrictJsonWriter) -> Result<()> {
    writer.write_string(value)
}

pub(crate) fn symbol(_: JsonMode, value: &str, writer: &mut StrictJsonWriter) -> Result<()> {
    write_wrapped_string(writer, "$symbol", value)
}

pub(crate) fn timestamp(
    mode: JsonMode,
    value: &Timestamp,
    writer: &mut StrictJsonWriter,
) -> Result<()> {
    match mode {
        JsonMode::Shell => {
            writer.write_raw(&format!("Timestamp({}, {})", value.time, value.increment))
        }
        _ => {
            writer.write_start_object()?;
            writer.write_name("$timestamp")?;
            writer.write_start_object()?;
            writer.write_name("t")?;
            writer.write_number(&value.time.to_string())?;
            writer.write_name("i")?;
            writer.write_number(&value.increment.to_string())?;
            writer.write_end_object()?;
            writer.write_end_object()
        }
    }
}

pub(crate) fn undefined(mode: JsonMode, _: &(), writer: &mut StrictJsonWriter) -> Result<()> {
    match mode {
        JsonMode::Shell => writer.write_raw("undefined"),
        _ => {
            writer.write_start_object()?;
            writer.write_name("$undefined")?;
            writer.write_boolean(true)?;
            writer.write_end_object()
        }
    }
}
