//! Sequential, parent and find cursors

use crate::common::*;

fn seeded() -> TestDb {
    let t = TestDb::new();
    for (n, s) in [(1.0, "a"), (5.0, "b"), (3.0, "a"), (8.0, "c")] {
        t.row(&[num(n), Value::from(s)]);
    }
    t
}

#[test]
fn sequential_scan_follows_creation_order() {
    let t = seeded();
    let firsts: Vec<_> = t.db.records().map(|r| r.get(1).unwrap()).collect();
    assert_eq!(
        firsts,
        vec![Some(num(1.0)), Some(num(5.0)), Some(num(3.0)), Some(num(8.0))]
    );
}

#[test]
fn first_and_next_after_walk_the_store() {
    let t = seeded();
    let mut seen = 0;
    let mut cur = t.db.first();
    while let Some(rec) = cur {
        seen += 1;
        cur = t.db.next_after(&rec).unwrap();
    }
    assert_eq!(seen, 4);
}

#[test]
fn exhausted_cursors_make_no_engine_calls() {
    let t = seeded();
    let mut scan = t.db.records();
    while scan.advance().is_some() {}
    let mut find = t.db.find(2, Condition::Equal, &Value::from("zzz")).unwrap();
    assert!(find.advance().is_none());
    let orphan = t.db.first().unwrap();
    let mut parents = orphan.parents().unwrap();
    assert!(parents.advance().is_none());

    let calls = t.engine.call_count();
    for _ in 0..3 {
        assert!(scan.advance().is_none());
        assert!(find.advance().is_none());
        assert!(parents.advance().is_none());
    }
    assert_eq!(t.engine.call_count(), calls);
}

#[test]
fn find_by_condition() {
    let t = seeded();
    let big: Vec<_> = t
        .db
        .find(1, Condition::GreaterOrEqual, &num(3.0))
        .unwrap()
        .map(|r| r.get(1).unwrap())
        .collect();
    assert_eq!(big, vec![Some(num(5.0)), Some(num(3.0)), Some(num(8.0))]);

    let a_count = t.db.find(2, Condition::Equal, &Value::from("a")).unwrap().count();
    assert_eq!(a_count, 2);

    let not_a = t.db.find_one(2, Condition::NotEqual, &Value::from("a")).unwrap();
    assert_eq!(not_a.unwrap().get(1).unwrap(), Some(num(5.0)));
}

#[test]
fn find_bools_and_nulls() {
    let t = TestDb::new();
    t.row(&[Value::Bool(true)]);
    t.db.create(1).unwrap();
    t.row(&[Value::Bool(false)]);
    assert_eq!(t.db.find(1, Condition::Equal, &Value::Bool(true)).unwrap().count(), 1);
    assert_eq!(t.db.find(1, Condition::Equal, &Value::Null).unwrap().count(), 1);
}

#[test]
fn find_with_unsupported_key_is_empty() {
    let t = seeded();
    let calls = t.engine.call_count();
    assert_eq!(t.db.find(1, Condition::Equal, &Value::Blob(1)).unwrap().count(), 0);
    assert_eq!(t.engine.call_count(), calls);
}

#[test]
fn find_column_zero_rejected() {
    let t = seeded();
    assert!(matches!(
        t.db.find(0, Condition::Equal, &num(1.0)).err().unwrap(),
        Error::Configuration(_)
    ));
}

#[test]
fn parents_listed_once() {
    let t = TestDb::new();
    let child = t.db.create(1).unwrap();
    let p1 = t.row(&[child.to_value(), child.to_value()]);
    let p2 = t.row(&[child.to_value()]);
    let parents: Vec<_> = child.parents().unwrap().collect();
    assert_eq!(parents, vec![p1, p2]);
}

#[test]
fn repeated_scans_reuse_handle_slots() {
    let t = seeded();
    assert_eq!(t.db.live_handles(), 4);
    let first: Vec<_> = t.db.records().collect();
    for _ in 0..10 {
        assert_eq!(t.db.records().count(), 4);
        let q = QueryBuilder::new().term(1, Condition::Greater, 0.0);
        assert_eq!(t.db.query(&q).unwrap().count(), 4);
    }
    assert_eq!(t.db.live_handles(), 4);
    let again: Vec<_> = t.db.records().collect();
    assert_eq!(first, again);
}
