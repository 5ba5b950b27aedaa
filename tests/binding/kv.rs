//! Named fields over records

use crate::common::*;

#[test]
fn set_twice_keeps_one_slot() {
    let t = TestDb::new();
    let kv = KvRecord::new(t.db.create(4).unwrap());
    kv.set("alpha", &num(1.0)).unwrap();
    let records = t.record_count();
    kv.set("alpha", &num(2.0)).unwrap();
    assert_eq!(t.record_count(), records);
    assert_eq!(kv.get("alpha").unwrap(), Some(num(2.0)));
    assert_eq!(kv.free_slots().unwrap(), 3);
}

#[test]
fn names_follow_field_order() {
    let t = TestDb::new();
    let kv = KvRecord::new(t.db.create(3).unwrap());
    kv.set("b", &Value::from("x")).unwrap();
    kv.set("a", &Value::Bool(false)).unwrap();
    assert_eq!(kv.names().unwrap(), vec!["b".to_string(), "a".to_string()]);
    assert!(kv.contains("a").unwrap());
}

#[test]
fn full_record_reports_no_free_slot() {
    let t = TestDb::new();
    let kv = KvRecord::new(t.db.create(1).unwrap());
    kv.set("only", &num(1.0)).unwrap();
    let err = kv.set("more", &num(2.0)).unwrap_err();
    assert!(matches!(err, Error::NoFreeSlot { .. }));
    assert_eq!(kv.get("more").unwrap(), None);
}

#[test]
fn remove_deletes_slot_record() {
    let t = TestDb::new();
    let kv = KvRecord::new(t.db.create(2).unwrap());
    kv.set("gone", &num(1.0)).unwrap();
    assert_eq!(t.record_count(), 2);
    assert!(kv.remove("gone").unwrap());
    assert_eq!(t.record_count(), 1);
    assert_eq!(kv.free_slots().unwrap(), 2);
}

#[test]
fn view_survives_reattach() {
    let t = TestDb::with_mode(AttachMode::Default);
    let rec = t.db.create(2).unwrap();
    KvRecord::new(rec).set("k", &Value::from("v")).unwrap();
    let first = rec.record_ref();

    let other = t.attach_existing();
    let parent = other
        .records()
        .find(|r| r.field_count().unwrap() == 2 && r.get(1).unwrap() != Some(Value::from("k")))
        .unwrap();
    assert_eq!(KvRecord::new(parent).get("k").unwrap(), Some(Value::from("v")));
    assert_ne!(parent.record_ref(), first);
}
