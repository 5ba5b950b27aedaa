//! Dumps, CSV exchange and journal replay

use crate::common::*;

#[test]
fn dump_and_import_restore_content() {
    let t = TestDb::new();
    let child = t.row(&[Value::from("leaf")]);
    t.row(&[num(1.0), child.to_value()]);
    let path = t.path("store.wgdb");
    t.db.dump(&path).unwrap();

    let fresh = TestDb::new();
    fresh.row(&[num(99.0)]);
    fresh.db.import_dump(&path).unwrap();
    assert_eq!(fresh.record_count(), 2);

    let parent = fresh.db.find_one(1, Condition::Equal, &num(1.0)).unwrap().unwrap();
    let link = parent.get(2).unwrap().unwrap().as_record().unwrap();
    let leaf = fresh.db.record(link).unwrap();
    assert_eq!(leaf.get(1).unwrap(), Some(Value::from("leaf")));
}

#[test]
fn import_dump_invalidates_handles() {
    let t = TestDb::new();
    let path = t.path("empty.wgdb");
    t.db.dump(&path).unwrap();
    let rec = t.db.create(1).unwrap();
    t.db.import_dump(&path).unwrap();
    assert!(matches!(rec.get(1).unwrap_err(), Error::StaleHandle { .. }));
    assert_eq!(t.db.live_handles(), 0);
}

#[test]
fn corrupt_dump_is_engine_error() {
    let t = TestDb::new();
    let path = t.path("junk.wgdb");
    std::fs::write(&path, b"not a dump").unwrap();
    assert!(matches!(
        t.db.import_dump(&path).unwrap_err(),
        Error::EngineFatal { op: "import_dump", .. }
    ));
}

#[test]
fn csv_round_trip() {
    let t = TestDb::new();
    t.row(&[num(1.5), Value::from("bolt"), Value::Bool(true)]);
    t.row(&[num(2.0), Value::from("nut, hex")]);
    let path = t.path("rows.csv");
    t.db.export_csv(&path).unwrap();

    let fresh = TestDb::new();
    fresh.db.import_csv(&path).unwrap();
    assert_eq!(fresh.db.render(), t.db.render());
}

#[test]
fn journal_replays_into_fresh_store() {
    let t = TestDb::with_mode(AttachMode::Logged);
    let child = t.row(&[Value::from("c")]);
    t.row(&[num(4.0), child.to_value()]);
    child.set(1, &Value::from("changed")).unwrap();
    let log = t.engine.log_path(t.db.name());

    let fresh = TestDb::new();
    fresh.db.replay_log(&log).unwrap();
    assert_eq!(fresh.db.render(), t.db.render());
}

#[test]
fn logging_toggles() {
    let t = TestDb::new();
    t.db.start_logging().unwrap();
    assert!(t.db.start_logging().is_err());
    t.db.stop_logging().unwrap();
    assert!(matches!(
        t.db.stop_logging().unwrap_err(),
        Error::EngineFatal { op: "stop_logging", .. }
    ));
}

#[test]
fn free_size_shrinks_as_records_grow() {
    let t = TestDb::new();
    let before = t.db.free_size();
    t.db.create(8).unwrap();
    assert!(t.db.free_size() < before);
    assert!(t.db.free_size() <= t.db.size());
}
