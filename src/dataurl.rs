// Self-contained textual image encoding (`data:<mime>;base64,<payload>`).

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::DataUrlError;

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Splits a base64 data url into its mime type and decoded bytes.
pub fn decode(url: &str) -> Result<(String, Vec<u8>), DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingPrefix)?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or(DataUrlError::MissingPrefix)?;
    let bytes = BASE64.decode(payload)?;
    Ok((mime.to_string(), bytes))
}
