//! Capture date and location resolution.
//!
//! Sources are consulted in order and each field is taken from the first
//! source that yields a plausible value:
//!
//! | Order | Source        | Provides        | Applies to                   |
//! |-------|---------------|-----------------|------------------------------|
//! | 1     | `exiftool`    | date, location  | everything (optional tool)   |
//! | 2     | `exif-header` | date, location  | JPEG, TIFF, HEIF, PNG, RAW   |
//! | 3     | `mtime`       | date            | everything                   |
//!
//! Resolution never fails. A source that errors, panics, or returns a
//! placeholder value is skipped; with every source exhausted the file is
//! archived without a capture date.

pub mod dates;
pub mod exif_header;
pub mod exiftool;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::models::GeoPoint;

pub use exif_header::ExifHeader;
pub use exiftool::ExifTool;

/// Raw output of one source, before plausibility filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub captured_at: Option<NaiveDateTime>,
    pub location: Option<GeoPoint>,
}

pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, path: &Path) -> Result<Extracted>;
}

/// Final metadata for a file, with the source each field came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetadata {
    pub captured_at: Option<NaiveDateTime>,
    pub location: Option<GeoPoint>,
    pub date_source: Option<&'static str>,
    pub location_source: Option<&'static str>,
}

/// Accept a coordinate pair only if it is in range and not exactly (0, 0),
/// which devices without a fix commonly write.
pub fn plausible_location(latitude: f64, longitude: f64) -> Option<GeoPoint> {
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    GeoPoint::new(latitude, longitude)
}

/// File modification time as local wall-clock time.
pub struct FileModified;

impl MetadataSource for FileModified {
    fn name(&self) -> &'static str {
        "mtime"
    }

    fn extract(&self, path: &Path) -> Result<Extracted> {
        let modified = std::fs::metadata(path)?.modified()?;
        let local: DateTime<Local> = modified.into();
        Ok(Extracted {
            captured_at: Some(local.naive_local()),
            location: None,
        })
    }
}

pub struct MetadataResolver {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl MetadataResolver {
    /// The standard chain; exiftool is left out when disabled in config.
    pub fn from_config(config: &MetadataConfig) -> Self {
        let mut sources: Vec<Box<dyn MetadataSource>> = Vec::new();
        if config.exiftool {
            sources.push(Box::new(ExifTool::new(&config.exiftool_path)));
        }
        sources.push(Box::new(ExifHeader));
        sources.push(Box::new(FileModified));
        Self { sources }
    }

    pub fn with_sources(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, path: &Path) -> ResolvedMetadata {
        let mut resolved = ResolvedMetadata::default();

        for source in &self.sources {
            if resolved.captured_at.is_some() && resolved.location.is_some() {
                break;
            }

            let extracted = match catch_unwind(AssertUnwindSafe(|| source.extract(path))) {
                Ok(Ok(extracted)) => extracted,
                Ok(Err(e)) => {
                    debug!(
                        path = %path.display(),
                        source = source.name(),
                        error = %format!("{:#}", e),
                        "metadata source failed"
                    );
                    continue;
                }
                Err(_) => {
                    warn!(
                        path = %path.display(),
                        source = source.name(),
                        "metadata source panicked"
                    );
                    continue;
                }
            };

            if resolved.captured_at.is_none() {
                if let Some(dt) = extracted.captured_at.filter(dates::is_plausible) {
                    resolved.captured_at = Some(dt);
                    resolved.date_source = Some(source.name());
                }
            }
            if resolved.location.is_none() {
                if let Some(point) = extracted
                    .location
                    .and_then(|p| plausible_location(p.latitude, p.longitude))
                {
                    resolved.location = Some(point);
                    resolved.location_source = Some(source.name());
                }
            }
        }

        resolved
    }

    /// [`resolve`](Self::resolve) on the blocking pool; exiftool is a
    /// subprocess and header parsing reads the file.
    pub async fn resolve_blocking(self: Arc<Self>, path: PathBuf) -> ResolvedMetadata {
        let shown = path.display().to_string();
        match tokio::task::spawn_blocking(move || self.resolve(&path)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(path = %shown, error = %e, "metadata task failed");
                ResolvedMetadata::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    struct Fixed(&'static str, Extracted);

    impl MetadataSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn extract(&self, _path: &Path) -> Result<Extracted> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    impl MetadataSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn extract(&self, _path: &Path) -> Result<Extracted> {
            bail!("corrupt header")
        }
    }

    struct Panicking;

    impl MetadataSource for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn extract(&self, _path: &Path) -> Result<Extracted> {
            panic!("parser bug")
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint {
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn first_source_wins_per_field() {
        let resolver = MetadataResolver::with_sources(vec![
            Box::new(Fixed(
                "rich",
                Extracted {
                    captured_at: Some(date(2023, 6, 15)),
                    location: None,
                },
            )),
            Box::new(Fixed(
                "header",
                Extracted {
                    captured_at: Some(date(2001, 1, 1)),
                    location: Some(point(37.77, -122.42)),
                },
            )),
        ]);

        let resolved = resolver.resolve(Path::new("/inbox/a.jpg"));
        assert_eq!(resolved.captured_at, Some(date(2023, 6, 15)));
        assert_eq!(resolved.date_source, Some("rich"));
        assert_eq!(resolved.location, Some(point(37.77, -122.42)));
        assert_eq!(resolved.location_source, Some("header"));
    }

    #[test]
    fn failures_and_panics_fall_through() {
        let resolver = MetadataResolver::with_sources(vec![
            Box::new(Failing),
            Box::new(Panicking),
            Box::new(Fixed(
                "last",
                Extracted {
                    captured_at: Some(date(2020, 2, 2)),
                    location: None,
                },
            )),
        ]);
        let resolved = resolver.resolve(Path::new("/inbox/a.jpg"));
        assert_eq!(resolved.captured_at, Some(date(2020, 2, 2)));
        assert_eq!(resolved.date_source, Some("last"));
    }

    #[test]
    fn placeholder_values_are_skipped() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        let resolver = MetadataResolver::with_sources(vec![
            Box::new(Fixed(
                "broken",
                Extracted {
                    captured_at: Some(epoch),
                    location: Some(point(0.0, 0.0)),
                },
            )),
            Box::new(Fixed(
                "good",
                Extracted {
                    captured_at: Some(date(2019, 9, 9)),
                    location: Some(point(-33.86, 151.21)),
                },
            )),
        ]);
        let resolved = resolver.resolve(Path::new("/inbox/a.jpg"));
        assert_eq!(resolved.date_source, Some("good"));
        assert_eq!(resolved.location, Some(point(-33.86, 151.21)));
    }

    #[test]
    fn nothing_resolves_to_empty() {
        let resolver = MetadataResolver::with_sources(vec![Box::new(Failing)]);
        assert_eq!(
            resolver.resolve(Path::new("/inbox/a.jpg")),
            ResolvedMetadata::default()
        );
    }

    #[test]
    fn mtime_fallback_uses_local_time() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("IMG_0001.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let noon = date(2021, 3, 4);
        let system_time: std::time::SystemTime = noon
            .and_local_timezone(Local)
            .single()
            .unwrap()
            .into();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(system_time)
            .unwrap();

        let resolver = MetadataResolver::from_config(&MetadataConfig {
            exiftool: false,
            ..MetadataConfig::default()
        });
        let resolved = resolver.resolve(&path);
        assert_eq!(resolved.captured_at, Some(noon));
        assert_eq!(resolved.date_source, Some("mtime"));
        assert_eq!(resolved.location, None);
    }

    #[tokio::test]
    async fn blocking_resolve_matches_inline_resolve() {
        let resolver = Arc::new(MetadataResolver::with_sources(vec![Box::new(Fixed(
            "fixed",
            Extracted {
                captured_at: Some(date(2022, 5, 5)),
                location: Some(point(1.5, 2.5)),
            },
        ))]));
        let path = PathBuf::from("/inbox/a.jpg");
        let inline = resolver.resolve(&path);
        let blocking = Arc::clone(&resolver).resolve_blocking(path).await;
        assert_eq!(blocking, inline);
        assert_eq!(blocking.date_source, Some("fixed"));
    }

    #[test]
    fn null_island_is_rejected() {
        assert!(plausible_location(0.0, 0.0).is_none());
        assert!(plausible_location(0.0, 12.5).is_some());
        assert!(plausible_location(91.0, 12.5).is_none());
    }
}
