//! External `exiftool` as the richest metadata source.
//!
//! Run with `-json -n` so GPS values come back as signed decimal degrees
//! and dates as raw `YYYY:MM:DD HH:MM:SS` strings. Covers video containers
//! (QuickTime/MP4 `CreateDate`, `MediaCreateDate`) that the header parser
//! cannot read.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use super::dates::parse_metadata_datetime;
use super::{plausible_location, Extracted, MetadataSource};
use crate::models::GeoPoint;

/// Date tags in priority order.
const DATE_TAGS: &[&str] = &[
    "DateTimeOriginal",
    "CreateDate",
    "MediaCreateDate",
    "TrackCreateDate",
    "CreationDate",
    "DateCreated",
    "DateTimeCreated",
];

const GPS_TAGS: &[&str] = &[
    "GPSLatitude",
    "GPSLatitudeRef",
    "GPSLongitude",
    "GPSLongitudeRef",
    "GPSPosition",
    "GPSCoordinates",
];

pub struct ExifTool {
    program: PathBuf,
    missing_reported: AtomicBool,
}

impl ExifTool {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            missing_reported: AtomicBool::new(false),
        }
    }
}

impl MetadataSource for ExifTool {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    fn extract(&self, path: &Path) -> Result<Extracted> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-json", "-n", "-q", "-api", "largefilesupport=1"]);
        for tag in DATE_TAGS.iter().chain(GPS_TAGS) {
            cmd.arg(format!("-{}", tag));
        }
        // A leading '-' would be read as an option
        if path.to_string_lossy().starts_with('-') {
            cmd.arg(Path::new(".").join(path));
        } else {
            cmd.arg(path);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !self.missing_reported.swap(true, Ordering::Relaxed) {
                    warn!(
                        program = %self.program.display(),
                        "exiftool not found; using header parser and file times only"
                    );
                }
                bail!("exiftool not available");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to run {}", self.program.display()))
            }
        };

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                path = %path.display(),
                status = %output.status,
                stderr = %stderr.trim(),
                "exiftool failed"
            );
            bail!("exiftool exited with {}", output.status);
        }

        parse_exiftool_json(&output.stdout)
    }
}

/// Parse `exiftool -json -n` output for a single file.
pub fn parse_exiftool_json(bytes: &[u8]) -> Result<Extracted> {
    let value: Value = serde_json::from_slice(bytes).context("invalid exiftool JSON")?;
    let obj = match value.as_array().and_then(|a| a.first()).and_then(Value::as_object) {
        Some(obj) => obj,
        None => bail!("exiftool returned no record"),
    };

    let captured_at = DATE_TAGS
        .iter()
        .filter_map(|tag| obj.get(*tag))
        .filter_map(Value::as_str)
        .find_map(parse_metadata_datetime);

    Ok(Extracted {
        captured_at,
        location: gps_from(obj),
    })
}

fn gps_from(obj: &Map<String, Value>) -> Option<GeoPoint> {
    if let (Some(lat), Some(lon)) = (number(obj, "GPSLatitude"), number(obj, "GPSLongitude")) {
        let lat = apply_ref(lat, obj.get("GPSLatitudeRef"), 'S');
        let lon = apply_ref(lon, obj.get("GPSLongitudeRef"), 'W');
        if let Some(point) = plausible_location(lat, lon) {
            return Some(point);
        }
    }

    // Composite "lat lon [alt]" forms, already signed under -n
    ["GPSPosition", "GPSCoordinates"]
        .iter()
        .filter_map(|tag| obj.get(*tag).and_then(Value::as_str))
        .find_map(|s| {
            let mut parts = s
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .map(|p| p.parse::<f64>());
            match (parts.next(), parts.next()) {
                (Some(Ok(lat)), Some(Ok(lon))) => plausible_location(lat, lon),
                _ => None,
            }
        })
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Negate a positive magnitude when the reference names the negative
/// hemisphere. Already-signed values are left alone.
fn apply_ref(value: f64, reference: Option<&Value>, negative: char) -> f64 {
    let is_negative = reference
        .and_then(Value::as_str)
        .and_then(|r| r.trim().chars().next())
        .map(|c| c.eq_ignore_ascii_case(&negative))
        .unwrap_or(false);
    if is_negative && value > 0.0 {
        -value
    } else {
        value
    }
}
