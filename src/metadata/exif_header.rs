//! Built-in EXIF parser for image and RAW containers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Result};
use exif::{In, Tag, Value};
use tracing::debug;

use super::dates::parse_metadata_datetime;
use super::{plausible_location, Extracted, MetadataSource};
use crate::models::GeoPoint;

/// Containers the parser understands: JPEG, TIFF and TIFF-based RAW,
/// HEIF/AVIF, PNG, WebP.
const EXIF_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "tif", "tiff", "heic", "heif", "avif", "png", "webp", "dng", "nef",
    "nrw", "cr2", "arw", "pef", "srw",
];

const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

pub struct ExifHeader;

pub fn is_exif_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| EXIF_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

impl MetadataSource for ExifHeader {
    fn name(&self) -> &'static str {
        "exif-header"
    }

    fn extract(&self, path: &Path) -> Result<Extracted> {
        if !is_exif_container(path) {
            return Ok(Extracted::default());
        }

        let mut reader = BufReader::new(File::open(path)?);
        let mut exif_reader = exif::Reader::new();
        exif_reader.continue_on_error(true);
        let exif = exif_reader
            .read_from_container(&mut reader)
            .or_else(|e| {
                e.distill_partial_result(|errors| {
                    for err in errors {
                        debug!(path = %path.display(), error = %err, "ignoring malformed EXIF field");
                    }
                })
            })
            .map_err(|e| anyhow!("failed to read EXIF: {}", e))?;

        Ok(Extracted {
            captured_at: DATE_TAGS.iter().find_map(|tag| {
                let field = exif.get_field(*tag, In::PRIMARY)?;
                parse_metadata_datetime(first_ascii(&field.value)?)
            }),
            location: gps_from(&exif),
        })
    }
}

fn first_ascii(value: &Value) -> Option<&str> {
    match value {
        Value::Ascii(parts) => parts.first().and_then(|b| std::str::from_utf8(b).ok()),
        _ => None,
    }
}

fn gps_from(exif: &exif::Exif) -> Option<GeoPoint> {
    let lat = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S')?;
    let lon = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W')?;
    plausible_location(lat, lon)
}

/// Degrees/minutes/seconds rationals to signed decimal degrees.
fn coordinate(exif: &exif::Exif, tag: Tag, ref_tag: Tag, negative: char) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let dms = match &field.value {
        Value::Rational(r) if r.len() >= 3 => r,
        _ => return None,
    };
    let decimal = dms[0].to_f64() + dms[1].to_f64() / 60.0 + dms[2].to_f64() / 3600.0;

    let is_negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| first_ascii(&f.value))
        .and_then(|r| r.trim().chars().next())
        .map(|c| c.eq_ignore_ascii_case(&negative))
        .unwrap_or(false);

    Some(if is_negative { -decimal } else { decimal })
}
