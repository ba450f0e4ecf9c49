use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use librarian::catalog::InMemoryCatalog;
use librarian::config::Config;
use librarian::error::IngestError;
use librarian::ingest::{Ingestor, Outcome, Skip};
use librarian::metadata::{Extracted, FileModified, MetadataResolver, MetadataSource};
use librarian::models::GeoPoint;

/// Metadata source that reports the same values for every file.
struct Fixed(Extracted);

impl MetadataSource for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn extract(&self, _path: &Path) -> Result<Extracted> {
        Ok(self.0.clone())
    }
}

struct Env {
    _tmp: TempDir,
    inbox: PathBuf,
    archive: PathBuf,
    config: Config,
}

fn setup(quiet_window_secs: f64) -> Env {
    let tmp = TempDir::new().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    let inbox = root.join("inbox");
    let archive = root.join("archive");
    fs::create_dir_all(&inbox).unwrap();
    fs::create_dir_all(&archive).unwrap();

    let src = format!(
        r#"[catalog]
path = "{root}/catalog.sqlite"

[inbox]
root = "{inbox}"

[archive]
root = "{archive}"

[stability]
quiet_window_secs = {quiet}
min_file_age_secs = 0.0
check_interval_ms = 10
max_checks = 100

[metadata]
exiftool = false
"#,
        root = root.display(),
        inbox = inbox.display(),
        archive = archive.display(),
        quiet = quiet_window_secs,
    );
    let config: Config = toml::from_str(&src).unwrap();
    config.validate().unwrap();

    Env {
        _tmp: tmp,
        inbox,
        archive,
        config,
    }
}

fn taken_on(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn fixed_resolver(captured_at: Option<NaiveDateTime>, location: Option<GeoPoint>) -> MetadataResolver {
    MetadataResolver::with_sources(vec![Box::new(Fixed(Extracted {
        captured_at,
        location,
    }))])
}

fn ingestor(env: &Env, catalog: Arc<InMemoryCatalog>, resolver: MetadataResolver) -> Arc<Ingestor> {
    Arc::new(Ingestor::with_resolver(&env.config, catalog, resolver).unwrap())
}

fn drop_in(env: &Env, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = env.inbox.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn archives_into_capture_date_partition() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let here = GeoPoint::new(-33.8688, 151.2093);
    let ing = ingestor(
        &env,
        catalog.clone(),
        fixed_resolver(Some(taken_on(2019, 12, 31)), here),
    );

    let src = drop_in(&env, "phone/IMG_1234.HEIC", b"heic bytes");
    let outcome = ing.process_file(&src).await.unwrap();

    let dest = env.archive.join("2019/2019-12-31/IMG_1234.HEIC");
    assert_eq!(outcome, Outcome::Cataloged(dest.clone()));
    assert!(!src.exists());
    assert_eq!(fs::read(&dest).unwrap(), b"heic bytes");

    let entries = catalog.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.original_name, "IMG_1234.HEIC");
    assert_eq!(entry.original_location, src.to_string_lossy());
    assert_eq!(entry.archive_location, dest.to_string_lossy());
    assert_eq!(entry.size_bytes, 10);
    assert_eq!(entry.captured_at, Some(taken_on(2019, 12, 31)));
    assert_eq!(entry.location, here);
    assert!(entry.flags.is_ingested);
    assert!(!entry.flags.is_geocoded);

    assert!(ing.journal().is_empty());
    assert_eq!(ing.status().cataloged, 1);
    assert_eq!(ing.in_flight(), 0);
}

#[tokio::test]
async fn mtime_fallback_without_location() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(
        &env,
        catalog.clone(),
        MetadataResolver::with_sources(vec![Box::new(FileModified)]),
    );

    let src = drop_in(&env, "scan.pdf", b"not an image");
    let noon = taken_on(2021, 7, 4).date().and_hms_opt(12, 0, 0).unwrap();
    let mtime: std::time::SystemTime = noon
        .and_local_timezone(chrono::Local)
        .single()
        .unwrap()
        .into();
    fs::File::options()
        .write(true)
        .open(&src)
        .unwrap()
        .set_modified(mtime)
        .unwrap();

    let outcome = ing.process_file(&src).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Cataloged(env.archive.join("2021/2021-07-04/scan.pdf"))
    );

    let entry = &catalog.entries()[0];
    assert_eq!(entry.captured_at, Some(noon));
    assert_eq!(entry.location, None);
}

#[tokio::test]
async fn no_date_goes_to_unknown_partition() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), MetadataResolver::with_sources(vec![]));

    let src = drop_in(&env, "mystery.bin", b"???");
    let outcome = ing.process_file(&src).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Cataloged(env.archive.join("unknown-date/mystery.bin"))
    );
    assert_eq!(catalog.entries()[0].captured_at, None);
}

#[tokio::test]
async fn true_duplicate_is_discarded_without_new_entry() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2020, 1, 2)), None));

    let first = drop_in(&env, "IMG_0001.jpg", b"same pixels");
    ing.process_file(&first).await.unwrap();
    let before = catalog.entries();

    let second = drop_in(&env, "backup/IMG_0001 (1).jpg", b"same pixels");
    let outcome = ing.process_file(&second).await.unwrap();

    let archived = env.archive.join("2020/2020-01-02/IMG_0001.jpg");
    assert_eq!(
        outcome,
        Outcome::Discarded {
            duplicate_of: archived.to_string_lossy().to_string()
        }
    );
    assert!(!second.exists());
    assert_eq!(catalog.entries(), before);
    assert_eq!(
        files_under(&env.archive),
        vec![PathBuf::from("2020/2020-01-02/IMG_0001.jpg")]
    );
    assert_eq!(ing.status().duplicates, 1);
}

#[tokio::test]
async fn name_collision_keeps_both_files() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2020, 1, 2)), None));

    let a = drop_in(&env, "camera-a/DSC_0001.JPG", b"picture from camera a");
    let b = drop_in(&env, "camera-b/DSC_0001.JPG", b"picture from camera b");
    ing.process_file(&a).await.unwrap();
    let outcome = ing.process_file(&b).await.unwrap();

    let partition = env.archive.join("2020/2020-01-02");
    assert_eq!(outcome, Outcome::Cataloged(partition.join("DSC_0001_1.JPG")));
    assert_eq!(
        fs::read(partition.join("DSC_0001.JPG")).unwrap(),
        b"picture from camera a"
    );
    assert_eq!(
        fs::read(partition.join("DSC_0001_1.JPG")).unwrap(),
        b"picture from camera b"
    );
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn repeated_sweeps_are_idempotent() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2018, 5, 5)), None));

    drop_in(&env, "a.jpg", b"a");
    drop_in(&env, "b.jpg", b"b");
    drop_in(&env, ".thumbnails/a.jpg", b"thumb");

    let first = ing.run_sweep().await.unwrap();
    assert_eq!(first.candidates, 2);
    assert_eq!(first.cataloged, 2);

    let second = ing.run_sweep().await.unwrap();
    assert_eq!(second.candidates, 0);
    assert_eq!(second.cataloged, 0);

    assert_eq!(catalog.len(), 2);
    assert_eq!(files_under(&env.archive).len(), 2);
    // Hidden directory is left alone
    assert!(env.inbox.join(".thumbnails/a.jpg").exists());
}

#[tokio::test]
async fn same_content_in_one_sweep_is_archived_once() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2022, 8, 1)), None));

    for dir in ["one", "two", "three"] {
        drop_in(&env, &format!("{}/IMG_7.jpg", dir), b"shared bytes");
    }

    ing.run_sweep().await.unwrap();
    // Copies skipped because the same content was in flight go next time
    ing.run_sweep().await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(
        files_under(&env.archive),
        vec![PathBuf::from("2022/2022-08-01/IMG_7.jpg")]
    );
    assert!(files_under(&env.inbox).is_empty());
}

#[tokio::test]
async fn catalog_write_failure_leaves_pending_record() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2017, 3, 9)), None));

    catalog.set_writable(false);
    let src = drop_in(&env, "IMG_9.jpg", b"moved before cataloged");
    let outcome = ing.process_file(&src).await.unwrap();

    let dest = env.archive.join("2017/2017-03-09/IMG_9.jpg");
    assert_eq!(outcome, Outcome::PendingCatalog(dest.clone()));
    assert!(!src.exists());
    assert!(dest.exists());
    assert!(catalog.is_empty());
    assert_eq!(ing.journal().len(), 1);
    assert_eq!(ing.status().pending_catalog_writes, 1);

    catalog.set_writable(true);
    let replay = ing.replay_pending().await.unwrap();
    assert_eq!(replay.cataloged, 1);
    assert!(ing.journal().is_empty());

    let entries = catalog.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].archive_location, dest.to_string_lossy());
    assert_eq!(entries[0].original_location, src.to_string_lossy());
    assert_eq!(files_under(&env.archive).len(), 1);
}

#[tokio::test]
async fn pending_record_settles_when_same_bytes_arrive_again() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2017, 3, 9)), None));

    catalog.set_writable(false);
    let src = drop_in(&env, "IMG_9.jpg", b"twice");
    ing.process_file(&src).await.unwrap();
    catalog.set_writable(true);

    // A second copy shows up before any replay ran
    let again = drop_in(&env, "again/IMG_9.jpg", b"twice");
    let outcome = ing.process_file(&again).await.unwrap();

    assert!(matches!(outcome, Outcome::Discarded { .. }));
    assert_eq!(catalog.len(), 1);
    assert!(ing.journal().is_empty());
    assert_eq!(files_under(&env.archive).len(), 1);
}

#[tokio::test]
async fn catalog_outage_leaves_file_in_inbox() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2016, 1, 1)), None));

    catalog.set_available(false);
    let src = drop_in(&env, "IMG_1.jpg", b"wait for catalog");
    let err = ing.process_file(&src).await.unwrap_err();
    assert!(matches!(err, IngestError::CatalogUnavailable { .. }));

    assert!(src.exists());
    assert!(files_under(&env.archive).is_empty());
    assert!(ing.journal().is_empty());
    assert_eq!(ing.status().errors, 1);

    catalog.set_available(true);
    let summary = ing.run_sweep().await.unwrap();
    assert_eq!(summary.cataloged, 1);
    assert!(!src.exists());
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn second_trigger_for_in_flight_path_is_dropped() {
    let env = setup(0.3);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2015, 6, 6)), None));

    let src = drop_in(&env, "IMG_2.jpg", b"one worker only");
    let (a, b) = tokio::join!(ing.process_file(&src), ing.process_file(&src));
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, Outcome::Skipped(_)));

    assert!(matches!(outcomes[0], Outcome::Cataloged(_)));
    assert_eq!(outcomes[1], Outcome::Skipped(Skip::InFlight));
    assert_eq!(catalog.insert_attempts(), 1);
    assert_eq!(ing.in_flight(), 0);
}

#[tokio::test]
async fn excluded_and_vanished_files_are_skipped() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(None, None));

    let hidden = drop_in(&env, ".hidden.jpg", b"hidden");
    assert_eq!(
        ing.process_file(&hidden).await.unwrap(),
        Outcome::Skipped(Skip::Excluded)
    );
    assert!(hidden.exists());

    let gone = env.inbox.join("deleted-before-we-looked.jpg");
    assert_eq!(
        ing.process_file(&gone).await.unwrap(),
        Outcome::Skipped(Skip::Vanished)
    );
    assert_eq!(catalog.insert_attempts(), 0);
}

#[tokio::test]
async fn dry_run_plan_touches_nothing() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2014, 2, 14)), None));

    let seen = drop_in(&env, "seen.jpg", b"already archived");
    ing.process_file(&seen).await.unwrap();
    let copy = drop_in(&env, "copy.jpg", b"already archived");
    let fresh = drop_in(&env, "fresh.jpg", b"new");

    let planned = ing.plan().await.unwrap();
    assert_eq!(planned.len(), 2);

    let copy_plan = planned.iter().find(|p| p.path == copy).unwrap();
    assert!(copy_plan.duplicate_of.is_some());
    let fresh_plan = planned.iter().find(|p| p.path == fresh).unwrap();
    assert_eq!(fresh_plan.duplicate_of, None);
    assert_eq!(fresh_plan.partition, env.archive.join("2014/2014-02-14"));
    assert_eq!(fresh_plan.date_source, Some("fixed"));

    assert!(copy.exists() && fresh.exists());
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn sqlite_catalog_end_to_end() {
    let env = setup(0.0);
    let pool = librarian::db::connect(&env.config).await.unwrap();
    librarian::migrate::apply_schema(&pool).await.unwrap();
    let catalog = Arc::new(librarian::catalog::SqliteCatalog::new(pool));
    let ing = Arc::new(
        Ingestor::with_resolver(
            &env.config,
            catalog.clone(),
            fixed_resolver(Some(taken_on(2013, 10, 20)), GeoPoint::new(51.5, -0.12)),
        )
        .unwrap(),
    );

    drop_in(&env, "IMG_1.jpg", b"first");
    drop_in(&env, "dup/IMG_1.jpg", b"first");
    drop_in(&env, "other/IMG_1.jpg", b"second");

    ing.run_sweep().await.unwrap();
    ing.run_sweep().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_assets")
        .fetch_one(catalog.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(
        files_under(&env.archive),
        vec![
            PathBuf::from("2013/2013-10-20/IMG_1.jpg"),
            PathBuf::from("2013/2013-10-20/IMG_1_1.jpg"),
        ]
    );
    assert!(files_under(&env.inbox).is_empty());
    catalog.close().await;
}

#[tokio::test]
async fn archive_root_reaching_into_inbox_is_refused() {
    let mut env = setup(0.0);
    // Lexically disjoint, but both resolve under the same inbox
    env.config.inbox.root = env.inbox.join("..").join("inbox");
    env.config.archive.root = env.inbox.join("archive");
    env.config.validate().unwrap();

    let err = Ingestor::with_resolver(&env.config, Arc::new(InMemoryCatalog::new()), fixed_resolver(None, None))
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("inside inbox.root"));
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_archive_root_inside_inbox_is_refused() {
    let mut env = setup(0.0);
    let link = env.inbox.parent().unwrap().join("archive-link");
    fs::create_dir_all(env.inbox.join("nested")).unwrap();
    std::os::unix::fs::symlink(env.inbox.join("nested"), &link).unwrap();
    env.config.archive.root = link;

    let err = Ingestor::with_resolver(&env.config, Arc::new(InMemoryCatalog::new()), fixed_resolver(None, None))
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("inside inbox.root"));
}

#[tokio::test]
async fn archive_root_is_used_in_resolved_form() {
    let mut env = setup(0.0);
    env.config.archive.root = env.inbox.join("..").join("archive");
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2021, 7, 4)), None));

    let src = drop_in(&env, "IMG_3.jpg", b"resolved root");
    let dest = env.archive.join("2021/2021-07-04/IMG_3.jpg");
    assert_eq!(ing.process_file(&src).await.unwrap(), Outcome::Cataloged(dest.clone()));
    assert_eq!(catalog.entries()[0].archive_location, dest.to_string_lossy());
}

#[tokio::test]
async fn name_of_deleted_archive_file_is_not_reused() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2020, 1, 2)), None));

    let first = drop_in(&env, "a.jpg", b"first picture");
    let partition = env.archive.join("2020/2020-01-02");
    assert_eq!(
        ing.process_file(&first).await.unwrap(),
        Outcome::Cataloged(partition.join("a.jpg"))
    );
    fs::remove_file(partition.join("a.jpg")).unwrap();

    let second = drop_in(&env, "a.jpg", b"second picture");
    assert_eq!(
        ing.process_file(&second).await.unwrap(),
        Outcome::Cataloged(partition.join("a_1.jpg"))
    );
    assert_eq!(catalog.len(), 2);
    assert!(ing.journal().is_empty());
}

#[tokio::test]
async fn bytes_left_in_archive_by_interrupted_run_are_cataloged_in_place() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2020, 1, 2)), None));

    // Moved by an earlier run that stopped before writing its catalog entry
    let existing = env.archive.join("2020/2020-01-02/IMG.jpg");
    fs::create_dir_all(existing.parent().unwrap()).unwrap();
    fs::write(&existing, b"moved but never cataloged").unwrap();

    let src = drop_in(&env, "IMG.jpg", b"moved but never cataloged");
    assert_eq!(
        ing.process_file(&src).await.unwrap(),
        Outcome::Cataloged(existing.clone())
    );
    assert!(!src.exists());
    assert_eq!(files_under(&env.archive), vec![PathBuf::from("2020/2020-01-02/IMG.jpg")]);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.insert_attempts(), 1);
    assert!(ing.journal().is_empty());
}

/// Appends to the file while metadata is read, as a slow writer would.
struct Growing;

impl MetadataSource for Growing {
    fn name(&self) -> &'static str {
        "growing"
    }

    fn extract(&self, path: &Path) -> Result<Extracted> {
        use std::io::Write;
        fs::OpenOptions::new()
            .append(true)
            .open(path)?
            .write_all(b" and more")?;
        Ok(Extracted::default())
    }
}

#[tokio::test]
async fn file_growing_during_identification_stays_in_inbox() {
    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(
        &env,
        catalog.clone(),
        MetadataResolver::with_sources(vec![Box::new(Growing)]),
    );

    let src = drop_in(&env, "IMG_5.jpg", b"still uploading");
    assert_eq!(
        ing.process_file(&src).await.unwrap(),
        Outcome::Skipped(Skip::ChangedWhileHashing)
    );
    assert!(src.exists());
    assert!(files_under(&env.archive).is_empty());
    assert!(catalog.is_empty());
    assert!(ing.journal().is_empty());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn full_storage_pauses_then_resumes() {
    if !Path::new("/dev/full").exists() {
        return;
    }
    let mut env = setup(0.0);
    env.config.archive.pause_on_full_secs = 1;
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2019, 4, 1)), None));

    let bytes = b"needs space";
    let hash = librarian::hashing::hash_reader(&mut &bytes[..]).unwrap();
    // Every write of the pending record lands on a device with no space
    let temp = ing.journal().dir().join(format!(".{}.tmp", hash));
    std::os::unix::fs::symlink("/dev/full", &temp).unwrap();

    let src = drop_in(&env, "IMG_6.jpg", bytes);
    let err = ing.process_file(&src).await.unwrap_err();
    assert!(err.is_storage_full());
    assert!(src.exists());
    assert!(ing.status().paused);

    assert_eq!(
        ing.process_file(&src).await.unwrap(),
        Outcome::Skipped(Skip::Paused)
    );

    fs::remove_file(&temp).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    assert_eq!(
        ing.process_file(&src).await.unwrap(),
        Outcome::Cataloged(env.archive.join("2019/2019-04-01/IMG_6.jpg"))
    );
    assert!(!ing.status().paused);
    assert_eq!(catalog.len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn non_utf8_name_is_archived_under_lossy_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let env = setup(0.0);
    let catalog = Arc::new(InMemoryCatalog::new());
    let ing = ingestor(&env, catalog.clone(), fixed_resolver(Some(taken_on(2012, 12, 12)), None));

    let src = env.inbox.join(OsStr::from_bytes(b"IMG_\xff.jpg"));
    fs::write(&src, b"latin-1 camera").unwrap();

    let summary = ing.run_sweep().await.unwrap();
    assert_eq!(summary.cataloged, 1);
    assert!(!src.exists());
    assert_eq!(
        files_under(&env.archive),
        vec![PathBuf::from("2012/2012-12-12/IMG_\u{FFFD}.jpg")]
    );
}
