use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use envblock::{Config, EnvLoader, Error, ParseErrorKind, TargetEnv, load, save};

const BASE: &str = include_str!("fixtures/base.env");
const LOCAL: &str = include_str!("fixtures/local.env");

#[test]
fn multi_file_load_uses_last_file_precedence() {
    let dir = make_temp_dir("precedence");
    let base = dir.join(".env");
    let local = dir.join(".env.local");
    write_file(&base, BASE);
    write_file(&local, LOCAL);

    let doc = load([&base, &local]).expect("load should succeed");

    assert_eq!(doc.count(), 10);
    assert_eq!(doc.get("APP_ENV").expect("APP_ENV").value(), "local");
    assert_eq!(doc.get("APP_DEBUG").expect("APP_DEBUG").value(), "true");
    assert_eq!(
        doc.get("APP_URL").expect("APP_URL").value(),
        "http://example.dev"
    );
    assert_eq!(doc.get("APP_NAME").expect("APP_NAME").value(), "Demo App");

    let db_host = doc.get("DB_HOST").expect("DB_HOST");
    assert_eq!(db_host.value(), "localhost");
    assert_eq!(db_host.comment(), "Local database");
}

#[test]
fn load_keeps_block_banners_and_row_comments() {
    let dir = make_temp_dir("banners");
    let base = dir.join(".env");
    write_file(&base, BASE);

    let doc = load([&base]).expect("load should succeed");

    let app = doc.get_block("app").expect("app block");
    assert_eq!(app.comment(), "Application section");
    assert_eq!(
        app.get_row("name").expect("name").comment(),
        "Application name"
    );
    let cache = doc.get_block("CACHE").expect("cache block");
    assert_eq!(cache.comment(), "NGINX cache section");
    assert_eq!(app.get_row("key").expect("key").shadows(), ["old-key"]);
}

#[test]
fn loader_respects_group_threshold() {
    let dir = make_temp_dir("threshold");
    let base = dir.join(".env");
    write_file(&base, BASE);

    let doc = EnvLoader::new()
        .path(&base)
        .config(Config::new().group_threshold(1))
        .load_document()
        .expect("load should succeed");

    assert_eq!(doc.blocks_count(), 3);
    assert_eq!(doc.rows_count(), 1);
    assert_eq!(doc.items()[3].key(), "LOG_LEVEL");
}

#[test]
fn override_existing_false_skips_existing_values() {
    let dir = make_temp_dir("override-false");
    let file = dir.join(".env");
    write_file(&file, "A=from_file\nB=2\n");

    let mut initial = BTreeMap::new();
    initial.insert("A".to_string(), "existing".to_string());

    let mut loader = EnvLoader::new()
        .path(&file)
        .target(TargetEnv::from_memory(initial))
        .override_existing(false);

    let report = loader.load().expect("load should succeed");
    assert_eq!(report.files_read, 1);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped_existing, 1);

    let map = loader.target_env().as_memory().expect("memory target");
    assert_eq!(map.get("A").expect("A should exist"), "existing");
    assert_eq!(map.get("B").expect("B should exist"), "2");
}

#[test]
fn override_existing_true_replaces_values() {
    let dir = make_temp_dir("override-true");
    let file = dir.join(".env");
    write_file(&file, "A=from_file\n");

    let mut initial = BTreeMap::new();
    initial.insert("A".to_string(), "existing".to_string());

    let mut loader = EnvLoader::new()
        .path(&file)
        .target(TargetEnv::from_memory(initial))
        .override_existing(true);

    let report = loader.load().expect("load should succeed");
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped_existing, 0);

    let map = loader.target_env().as_memory().expect("memory target");
    assert_eq!(map.get("A").expect("A should exist"), "from_file");
}

#[test]
fn load_exports_full_keys_of_block_rows() {
    let dir = make_temp_dir("full-keys");
    let file = dir.join(".env");
    write_file(&file, "APP_ENV=prod\nAPP_URL=http://x\n# APP_OLD=1\n");

    let mut loader = EnvLoader::new().path(&file).target(TargetEnv::memory());
    let report = loader.load().expect("load should succeed");

    assert_eq!(report.loaded, 2);
    let map = loader.into_target();
    let map = map.as_memory().expect("memory target");
    assert_eq!(map.get("APP_ENV").expect("APP_ENV"), "prod");
    assert_eq!(map.get("APP_URL").expect("APP_URL"), "http://x");
    assert!(!map.contains_key("APP_OLD"));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = make_temp_dir("missing");
    let present = dir.join(".env");
    write_file(&present, "A=1\n");
    let missing = dir.join("missing.env");

    let err = load([&present, &missing]).expect_err("expected I/O error");

    match err {
        Error::Io(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_file_returns_parse_error() {
    let dir = make_temp_dir("malformed");
    let file = dir.join(".env");
    write_file(&file, "A=ok\nBAD LINE\n");

    let mut loader = EnvLoader::new().path(file);
    let err = loader.load().expect_err("expected parse error");

    match err {
        Error::Parse(parse_err) => {
            assert_eq!(parse_err.kind, ParseErrorKind::MalformedLine);
            assert_eq!(parse_err.line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(loader.target_env().as_memory().expect("memory").is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = make_temp_dir("save");
    let source = dir.join(".env");
    let saved = dir.join(".env.saved");
    write_file(&source, "# Greeting\nAPP_GREETING=\"hi there\"\nAPP_PORT=8080\nHOST=localhost\n");

    let doc = load([&source]).expect("load should succeed");
    save(&doc, &saved).expect("save should succeed");

    let written = std::fs::read_to_string(&saved).expect("saved file should exist");
    assert_eq!(
        written,
        "# Greeting\nAPP_GREETING=\"hi there\"\nAPP_PORT=8080\n\nHOST=\"localhost\""
    );
    assert_eq!(load([&saved]).expect("reload should succeed"), doc);
}

#[test]
fn save_overwrites_existing_file() {
    let dir = make_temp_dir("overwrite");
    let path = dir.join(".env");
    write_file(&path, "OLD=1\nOTHER=2\n");

    let doc = envblock::parse_str("NEW=1\n").expect("parse should succeed");
    save(&doc, &path).expect("save should succeed");

    assert_eq!(
        std::fs::read_to_string(&path).expect("file should exist"),
        "NEW=1"
    );
}

fn make_temp_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    path.push(format!("envblock-{name}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&path).expect("failed to create temp dir");
    path
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).expect("failed to write test file");
}
