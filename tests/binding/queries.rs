//! Query builder, query cursors and aggregation

use crate::common::*;

fn prices() -> TestDb {
    let t = TestDb::new();
    for (price, kind) in [(4.0, "bolt"), (10.0, "nut"), (6.0, "bolt"), (1.0, "washer")] {
        t.row(&[num(price), Value::from(kind)]);
    }
    t
}

#[test]
fn empty_builder_counts_zero() {
    let t = prices();
    let calls = t.engine.call_count();
    assert_eq!(t.db.count(&QueryBuilder::new()).unwrap(), 0);
    assert_eq!(t.db.count_and_sum(&QueryBuilder::new(), 1).unwrap(), (0, 0.0));
    assert_eq!(t.engine.call_count(), calls);
}

#[test]
fn empty_builder_query_matches_all() {
    let t = prices();
    assert_eq!(t.db.query(&QueryBuilder::new()).unwrap().count(), 4);
}

#[test]
fn groups_are_conjunctive() {
    let t = prices();
    let q = QueryBuilder::new()
        .term(2, Condition::Equal, "bolt")
        .term(1, Condition::Greater, 5.0);
    let matched: Vec<_> = t.db.query(&q).unwrap().map(|r| r.get(1).unwrap()).collect();
    assert_eq!(matched, vec![Some(num(6.0))]);
}

#[test]
fn count_and_sum() {
    let t = prices();
    let q = QueryBuilder::new().term(2, Condition::Equal, "bolt");
    assert_eq!(t.db.count(&q).unwrap(), 2);
    assert_eq!(t.db.count_and_sum(&q, 1).unwrap(), (2, 10.0));
    // text column contributes nothing
    assert_eq!(t.db.count_and_sum(&q, 2).unwrap(), (2, 0.0));
}

#[test]
fn sum_until_stops_at_limit() {
    let t = prices();
    let q = QueryBuilder::new().term(1, Condition::Greater, 0.0);

    let capped = t.db.sum_until(&q, 1, Some(12.0)).unwrap();
    assert_eq!(capped.sum, 14.0);
    let kinds: Vec<_> = capped
        .records
        .iter()
        .map(|r| r.get(2).unwrap())
        .collect();
    assert_eq!(kinds, vec![Some(Value::from("bolt")), Some(Value::from("nut"))]);
    assert_eq!(capped.record(2).unwrap().get(1).unwrap(), Some(num(10.0)));
    assert_eq!(t.db.open_query_count(), 0);

    let zero = t.db.sum_until(&q, 1, Some(0.0)).unwrap();
    assert_eq!((zero.len(), zero.sum), (4, 21.0));
    assert_eq!(t.db.sum_until(&q, 1, None).unwrap(), zero);
}

#[test]
fn json_query_matches_builder() {
    let t = prices();
    let json = r#"[
        {"column": 2, "cond": "=", "value": "bolt"},
        [{"column": 1, "cond": "<", "value": 5}],
        "ignored"
    ]"#;
    let q = QueryBuilder::from_json_str(json).unwrap();
    assert_eq!(q.len(), 2);
    let matched: Vec<_> = t.db.query(&q).unwrap().map(|r| r.get(1).unwrap()).collect();
    assert_eq!(matched, vec![Some(num(4.0))]);
}

#[test]
fn json_query_errors() {
    for bad in [
        "{}",
        "not json",
        r#"[{"column": 0, "cond": "=", "value": 1}]"#,
        r#"[{"column": 1, "cond": "~", "value": 1}]"#,
        r#"[{"column": 1, "cond": "=", "value": [1]}]"#,
    ] {
        assert!(
            matches!(QueryBuilder::from_json_str(bad), Err(Error::Configuration(_))),
            "accepted {}",
            bad
        );
    }
}

#[test]
fn released_cursor_frees_engine_query() {
    let t = prices();
    let mut cursor = t.db.query(&QueryBuilder::new().term(1, Condition::Greater, 0.0)).unwrap();
    assert!(cursor.advance().is_some());
    assert_eq!(t.engine.open_query_count(), 1);
    cursor.release().unwrap();
    assert!(!cursor.is_open());
    assert!(cursor.advance().is_none());
    assert_eq!(t.engine.open_query_count(), 0);
}

#[test]
fn exhausted_query_releases_itself() {
    let t = prices();
    let mut cursor = t.db.query(&QueryBuilder::new().term(2, Condition::Equal, "nut")).unwrap();
    assert!(cursor.advance().is_some());
    assert!(cursor.advance().is_none());
    assert!(!cursor.is_open());
    assert_eq!(t.db.open_query_count(), 0);
}

#[test]
fn indexed_column_gives_same_results() {
    let t = prices();
    let q = QueryBuilder::new().term(1, Condition::GreaterOrEqual, 6.0);
    let before = t.db.count(&q).unwrap();

    assert!(t.db.create_index(1).unwrap());
    assert!(!t.db.create_index(1).unwrap());
    assert!(t.db.has_index(1).unwrap());
    assert_eq!(t.db.count(&q).unwrap(), before);

    assert!(t.db.drop_index(1).unwrap());
    assert!(!t.db.drop_index(1).unwrap());
    assert!(!t.db.has_index(1).unwrap());
}

#[test]
fn multi_index_needs_values() {
    let t = prices();
    assert!(!t.db.create_multi_index(2, &[]).unwrap());
    let seeds = [Value::from("bolt"), Value::from("nut")];
    assert!(t.db.create_multi_index(2, &seeds).unwrap());
    assert!(!t.db.create_multi_index(2, &seeds).unwrap());
    // a seeded index is not a plain index on the column
    assert!(!t.db.has_index(2).unwrap());
    assert!(t.db.drop_index(2).unwrap());
}
