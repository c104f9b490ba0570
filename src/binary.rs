//! Module containing functionality related to BSON binary values.

use std::fmt::{self, Display};

use crate::{base64, error::Result, spec::BinarySubtype};

/// Represents a BSON binary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            base64::encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a [`Binary`] from a base64 string and optional [`BinarySubtype`]. If the
    /// `subtype` argument is [`None`], the [`Binary`] constructed will default to
    /// [`BinarySubtype::Generic`].
    ///
    /// ```rust
    /// # use bson_codec::{Binary, spec::BinarySubtype};
    /// let binary = Binary::from_base64("AQID", None)?;
    /// assert_eq!(binary.bytes, vec![1, 2, 3]);
    /// assert_eq!(binary.subtype, BinarySubtype::Generic);
    /// # Ok::<(), bson_codec::error::Error>(())
    /// ```
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = base64::decode(input.as_ref())?;
        let subtype = subtype.into().unwrap_or(BinarySubtype::Generic);
        Ok(Binary { subtype, bytes })
    }

    /// Wraps the bytes of a UUID with the given subtype, normally [`BinarySubtype::Uuid`] or
    /// [`BinarySubtype::UuidOld`].
    pub fn from_uuid(uuid: uuid::Uuid, subtype: BinarySubtype) -> Self {
        Binary {
            subtype,
            bytes: uuid.as_bytes().to_vec(),
        }
    }

    /// The bytes encoded as standard base64.
    pub fn to_base64(&self) -> String {
        base64::encode(&self.bytes)
    }
}
