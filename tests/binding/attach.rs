//! Attach modes, teardown and config-driven attach

use crate::common::*;
use std::sync::Arc;
use wgbind::CONFIG_FILE_NAME;

// ============================================================================
// Engine primitive per mode
// ============================================================================

#[test]
fn attach_calls_expected_primitive() {
    let cases = [
        (AttachMode::Default, 0, "attach_database"),
        (AttachMode::Default, 416, "attach_database"),
        (AttachMode::Logged, 0, "attach_logged_database"),
        (AttachMode::Logged, 416, "attach_logged_database_mode"),
        (AttachMode::Local, 0, "attach_local_database"),
        (AttachMode::Local, 416, "attach_local_database"),
        (AttachMode::Existing, 0, "attach_existing_database"),
        (AttachMode::Existing, 416, "attach_existing_database"),
    ];
    for (mode, permission, primitive) in cases {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MemoryEngine::with_log_dir(dir.path()));
        let name = unique_name("prim");
        let _owner = match mode {
            AttachMode::Existing => {
                Some(Database::attach(engine.clone(), &name, 0, AttachMode::Default, 0).unwrap())
            }
            _ => None,
        };

        let db = Database::attach(engine.clone(), &name, 0, mode, permission).unwrap();
        assert_eq!(engine.last_attach(), Some(primitive), "{:?} / {}", mode, permission);
        assert_eq!(db.permission(), permission);
    }
}

#[test]
fn default_mode_never_forwards_permission() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(MemoryEngine::with_log_dir(dir.path()));

    let plain = unique_name("plain");
    let _a = Database::attach(engine.clone(), &plain, 0, AttachMode::Default, 416).unwrap();
    assert_eq!(engine.store_permissions(&plain), Some(0));

    let logged = unique_name("logged");
    let _b = Database::attach(engine.clone(), &logged, 0, AttachMode::Logged, 416).unwrap();
    assert_eq!(engine.store_permissions(&logged), Some(416));
}

// ============================================================================
// Teardown by mode
// ============================================================================

#[test]
fn existing_teardown_keeps_store() {
    let TestDb { engine, dir: _dir, db } = TestDb::with_mode(AttachMode::Default);
    let name = db.name().to_string();
    db.create(1).unwrap().set(1, &num(7.0)).unwrap();

    let existing = Database::attach(engine.clone(), &name, 0, AttachMode::Existing, 0).unwrap();
    existing.detach().unwrap();
    assert!(engine.has_store(&name));

    let again = Database::attach(engine.clone(), &name, 0, AttachMode::Existing, 0).unwrap();
    assert_eq!(again.first().unwrap().get(1).unwrap(), Some(num(7.0)));
    again.detach().unwrap();

    db.detach().unwrap();
    assert!(!engine.has_store(&name));
}

#[test]
fn local_teardown_destroys_store() {
    let TestDb { engine, dir: _dir, db } = TestDb::new();
    db.create(2).unwrap();
    assert_eq!(engine.live_local_stores(), 1);
    db.detach().unwrap();
    assert_eq!(engine.live_local_stores(), 0);
}

#[test]
fn drop_runs_teardown() {
    let engine = Arc::new(MemoryEngine::new());
    {
        let _db = Database::attach(engine.clone(), "dropped", 0, AttachMode::Local, 0).unwrap();
        assert_eq!(engine.live_local_stores(), 1);
    }
    assert_eq!(engine.live_local_stores(), 0);
}

#[test]
fn existing_needs_a_store() {
    let engine = Arc::new(MemoryEngine::new());
    let err = Database::attach(engine, "missing", 0, AttachMode::Existing, 0).unwrap_err();
    assert!(matches!(err, Error::EngineFatal { op: "attach", .. }));
}

#[test]
fn empty_name_rejected() {
    let engine = Arc::new(MemoryEngine::new());
    let err = Database::attach(engine, "", 0, AttachMode::Default, 0).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn instances_are_isolated() {
    let a = TestDb::new();
    let b = TestDb::new();
    let rec = a.db.create(1).unwrap();
    let other = b.db.create(1).unwrap();
    let err = other.set(1, &rec.to_value()).unwrap_err();
    assert!(matches!(err, Error::CrossInstanceReference));
    assert_ne!(a.db.id(), b.db.id());
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn attach_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "name = \"from-config\"\nsize = 4096\nmode = \"default\"\npermission = 416\n",
    )
    .unwrap();

    let config = AttachConfig::from_file(&path).unwrap();
    let engine = Arc::new(MemoryEngine::with_log_dir(dir.path()));
    let db = Database::attach_with_config(engine.clone(), &config).unwrap();
    assert_eq!(db.name(), "from-config");
    assert_eq!(db.mode(), AttachMode::Default);
    assert_eq!(db.permission(), 416);
    assert_eq!(db.size(), 4096);
    db.detach().unwrap();
    assert!(!engine.has_store("from-config"));
}

#[test]
fn logged_config_writes_journal() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(MemoryEngine::with_log_dir(dir.path()));
    let config = AttachConfig::new("journaled").with_mode(AttachMode::Logged);
    let db = Database::attach_with_config(engine.clone(), &config).unwrap();
    db.create(1).unwrap();
    assert!(engine.log_path("journaled").exists());
    db.detach().unwrap();
}

#[test]
fn bad_config_mode_is_configuration_error() {
    let err = AttachConfig::from_toml("name = \"x\"\nmode = \"shared\"\n").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AttachConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
