//! Lock bookkeeping across instances of one store

use crate::common::*;

#[test]
fn second_begin_write_is_violation() {
    let t = TestDb::new();
    t.db.begin_write().unwrap();
    let err = t.db.begin_write().unwrap_err();
    assert!(matches!(err, Error::LockStateViolation { op: "begin_write", .. }));
    assert!(t.db.has_write_lock());
    t.db.end_write().unwrap();
    assert!(matches!(
        t.db.end_write().unwrap_err(),
        Error::LockStateViolation { op: "end_write", .. }
    ));
}

#[test]
fn reader_blocks_writer_on_shared_store() {
    let t = TestDb::with_mode(AttachMode::Default);
    let other = t.attach_existing();

    other.begin_read().unwrap();
    let err = t.db.begin_write().unwrap_err();
    assert!(matches!(err, Error::EngineFatal { op: "begin_write", code: 0 }));
    assert!(!t.db.has_write_lock());

    other.end_read().unwrap();
    t.db.begin_write().unwrap();
    t.db.end_write().unwrap();
}

#[test]
fn detach_releases_outstanding_locks() {
    let t = TestDb::with_mode(AttachMode::Default);
    let other = t.attach_existing();
    other.begin_read().unwrap();
    other.detach().unwrap();
    t.db.begin_write().unwrap();
    t.db.end_write().unwrap();
}

#[test]
fn with_write_returns_closure_value() {
    let t = TestDb::new();
    let n = t
        .db
        .with_write(|db| {
            let rec = db.create(1)?;
            rec.set(1, &num(3.0))?;
            Ok(rec.field_count()?)
        })
        .unwrap();
    assert_eq!(n, 1);
    assert!(!t.db.has_write_lock());

    let err = t
        .db
        .with_read(|_| -> wgbind::Result<()> { Err(Error::Configuration("boom".into())) })
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!t.db.has_read_lock());
}
