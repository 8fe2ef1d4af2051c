//! Inline note attachments: MIME inference and data URL encoding.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::FileAttachment;

/// Largest file accepted as an inline attachment.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Pick a MIME type from the reported content type, falling back to the file
/// extension. Generic `application/octet-stream` defers to the extension.
#[must_use]
pub fn infer_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    if let Some(content_type) = content_type.map(str::trim) {
        if !content_type.is_empty() && !content_type.eq_ignore_ascii_case("application/octet-stream")
        {
            return content_type.to_string();
        }
    }

    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Build an attachment with `bytes` encoded as a `data:` URL.
pub fn encode_attachment(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<FileAttachment> {
    let name = file_name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "attachment name must not be empty".to_string(),
        ));
    }
    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(Error::InvalidInput(format!(
            "attachment '{name}' is {} bytes, limit is {MAX_ATTACHMENT_BYTES}",
            bytes.len()
        )));
    }

    let mime_type = infer_mime_type(content_type, name);
    let encoded = BASE64_STANDARD.encode(bytes);
    Ok(FileAttachment {
        name: name.to_string(),
        data: format!("data:{mime_type};base64,{encoded}"),
        mime_type,
        size: bytes.len() as u64,
        uploaded_at: Utc::now(),
    })
}

/// Decode an attachment's `data:` URL back into raw bytes.
pub fn decode_attachment(attachment: &FileAttachment) -> Result<Vec<u8>> {
    let Some((header, payload)) = attachment
        .data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
    else {
        return Err(Error::InvalidInput(format!(
            "attachment '{}' is not a data URL",
            attachment.name
        )));
    };

    if !header.ends_with(";base64") {
        return Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned());
    }

    BASE64_STANDARD.decode(payload).map_err(|error| {
        Error::InvalidInput(format!(
            "attachment '{}' has invalid base64 content: {error}",
            attachment.name
        ))
    })
}

/// Human-readable byte count, e.g. `1.5 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // display only
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn infers_mime_from_extension_when_generic() {
        assert_eq!(infer_mime_type(None, "photo.png"), "image/png");
        assert_eq!(
            infer_mime_type(Some("application/octet-stream"), "report.pdf"),
            "application/pdf"
        );
        assert_eq!(infer_mime_type(Some("text/csv"), "data.bin"), "text/csv");
        assert_eq!(
            infer_mime_type(None, "mystery"),
            "application/octet-stream"
        );
    }

    #[test]
    fn encode_then_decode_preserves_bytes() {
        let attachment = encode_attachment("hello.txt", None, b"hello world").unwrap();
        assert_eq!(attachment.mime_type, "text/plain");
        assert_eq!(attachment.size, 11);
        assert_eq!(
            attachment.data,
            "data:text/plain;base64,aGVsbG8gd29ybGQ="
        );
        assert_eq!(decode_attachment(&attachment).unwrap(), b"hello world");
    }

    #[test]
    fn rejects_blank_names_and_oversized_files() {
        assert!(encode_attachment("  ", None, b"x").is_err());
        let too_big = vec![0_u8; MAX_ATTACHMENT_BYTES + 1];
        assert!(encode_attachment("big.bin", None, &too_big).is_err());
    }

    #[test]
    fn decodes_plain_data_urls() {
        let mut attachment = encode_attachment("a.txt", None, b"").unwrap();
        attachment.data = "data:text/plain,hi%20there".to_string();
        assert_eq!(decode_attachment(&attachment).unwrap(), b"hi there");

        attachment.data = "not a url".to_string();
        assert!(decode_attachment(&attachment).is_err());
    }

    #[test]
    fn formats_sizes_like_the_file_list() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
