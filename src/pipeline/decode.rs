//! Image decoding: base64 field value → PNG bytes ready for `docx-rs`.
//!
//! Signature fields come from web forms as data-URIs
//! (`data:image/png;base64,iVBOR…`) or as bare base64. Whatever the source
//! format, the picture is re-encoded as PNG in memory so the writer only ever
//! embeds one format. Nothing touches the file system.
//!
//! The step never fails: it returns [`ImageDecode::Fallback`] with the reason
//! and lets the renderer decide what to show instead.

use crate::error::FallbackReason;
use crate::model::EmbeddedImage;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use image::GenericImageView;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;
use tracing::debug;

/// Standard alphabet, padding optional. Form exports often drop the `=`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static DATA_URI_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*data:image/[A-Za-z0-9.+-]+;base64,").unwrap());

/// Outcome of decoding one image field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDecode {
    Embedded(EmbeddedImage),
    Fallback(FallbackReason),
}

impl ImageDecode {
    pub fn is_embedded(&self) -> bool {
        matches!(self, ImageDecode::Embedded(_))
    }
}

/// Strip a leading `data:image/<type>;base64,` marker, if any.
pub fn strip_data_uri(value: &str) -> &str {
    match DATA_URI_PREFIX.find(value) {
        Some(m) => &value[m.end()..],
        None => value,
    }
}

/// Decode a field value into an embeddable PNG.
pub fn decode_image(value: &str) -> ImageDecode {
    match try_decode(value) {
        Ok(img) => ImageDecode::Embedded(img),
        Err(reason) => ImageDecode::Fallback(reason),
    }
}

fn try_decode(value: &str) -> Result<EmbeddedImage, FallbackReason> {
    // Line-wrapped base64 is common in CSV exports.
    let payload: String = strip_data_uri(value)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Err(FallbackReason::Empty);
    }

    let bytes = LENIENT
        .decode(payload.as_bytes())
        .map_err(|e| FallbackReason::InvalidBase64(e.to_string()))?;

    let img = image::load_from_memory(&bytes)
        .map_err(|e| FallbackReason::UndecodableImage(e.to_string()))?;
    let (width_px, height_px) = img.dimensions();

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| FallbackReason::PngEncode(e.to_string()))?;
    debug!(
        "Decoded {}×{} image → {} bytes PNG",
        width_px,
        height_px,
        png.len()
    );

    Ok(EmbeddedImage {
        png,
        width_px,
        height_px,
    })
}
