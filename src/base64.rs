use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{Error, Result};

pub(crate) fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    STANDARD
        .decode(input)
        .map_err(|e| Error::illegal_argument(format!("Invalid base64 data: {e}")))
}

pub(crate) fn encode(input: impl AsRef<[u8]>) -> String {
    STANDARD.encode(input)
}
