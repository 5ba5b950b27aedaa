//! Record handles: field access, references, delete and clear

use crate::common::*;
use proptest::prelude::*;

// ============================================================================
// Field round trip
// ============================================================================

#[test]
fn every_kind_round_trips() {
    let t = TestDb::new();
    let target = t.db.create(1).unwrap();
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        num(-2.5),
        Value::from("héllo"),
        Value::Blob(0xdead_beef),
        target.to_value(),
    ];
    let rec = t.row(&values);
    let back: Vec<Value> = rec.get_all().unwrap().into_iter().map(Option::unwrap).collect();
    assert_eq!(back, values);
    assert_eq!(rec.field_type(7).unwrap(), Some(FieldType::Record));
}

#[test]
fn record_field_resolves_to_same_record() {
    let t = TestDb::new();
    let target = t.db.create(2).unwrap();
    let holder = t.row(&[target.to_value()]);
    let r = holder.get(1).unwrap().unwrap().as_record().unwrap();
    assert_eq!(t.db.record(r).unwrap(), target);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn text_and_numbers_survive_storage(n in any::<f64>().prop_filter("finite", |n| n.is_finite()), s in ".{0,40}") {
        let t = TestDb::new();
        let rec = t.row(&[num(n), Value::Text(s.clone())]);
        prop_assert_eq!(rec.get(1).unwrap(), Some(num(n)));
        prop_assert_eq!(rec.get(2).unwrap(), Some(Value::Text(s)));
    }
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn field_bounds_are_one_based_and_strict() {
    let t = TestDb::new();
    let rec = t.db.create(2).unwrap();
    for bad in [0, 3] {
        assert!(matches!(
            rec.get(bad).unwrap_err(),
            Error::OutOfRange { index, len: 2 } if index == bad
        ));
        assert!(matches!(
            rec.set(bad, &Value::Null).unwrap_err(),
            Error::OutOfRange { .. }
        ));
    }
}

#[test]
fn set_all_stops_at_arity() {
    let t = TestDb::new();
    let rec = t.db.create(2).unwrap();
    let written = rec.set_all(&[num(1.0), num(2.0), num(3.0)]).unwrap();
    assert_eq!(written, 2);
    assert_eq!(rec.get(2).unwrap(), Some(num(2.0)));
}

// ============================================================================
// Delete and references
// ============================================================================

#[test]
fn referenced_record_refuses_delete_until_unlinked() {
    let t = TestDb::new();
    let child = t.db.create(1).unwrap();
    let parent = t.row(&[num(1.0), child.to_value()]);

    let err = child.delete().unwrap_err();
    assert!(matches!(err, Error::ReferencedByOthers { .. }));
    assert!(err.is_recoverable());

    assert_eq!(parent.unlink_children().unwrap(), 1);
    assert_eq!(parent.get(2).unwrap(), Some(Value::Null));
    child.delete().unwrap();
}

#[test]
fn deleted_record_handle_is_stale() {
    let t = TestDb::new();
    let rec = t.db.create(1).unwrap();
    let r = rec.record_ref();
    rec.delete().unwrap();
    assert!(matches!(rec.get(1).unwrap_err(), Error::StaleHandle { .. }));
    assert!(matches!(t.db.record(r).unwrap_err(), Error::StaleHandle { .. }));

    let holder = t.db.create(1).unwrap();
    assert!(matches!(
        holder.set(1, &Value::Record(r)).unwrap_err(),
        Error::StaleHandle { .. }
    ));
}

#[test]
fn subrecord_is_linked_into_parent() {
    let t = TestDb::new();
    let parent = t.db.create(3).unwrap();
    let child = parent.new_subrecord(2, 4).unwrap();
    assert_eq!(child.field_count().unwrap(), 4);
    assert_eq!(parent.get(2).unwrap(), Some(child.to_value()));
    let parents: Vec<_> = child.parents().unwrap().collect();
    assert_eq!(parents, vec![parent]);
}

#[test]
fn clear_repairs_references() {
    let t = TestDb::new();
    let shared = t.db.create(1).unwrap();
    t.row(&[shared.to_value(), num(1.0)]);
    t.row(&[shared.to_value()]);
    t.row(&[num(3.0)]);

    let stats = t.db.clear().unwrap();
    assert_eq!(stats.deleted, 4);
    assert_eq!(stats.repaired, 1);
    assert_eq!(t.record_count(), 0);
    assert!(matches!(shared.get(1).unwrap_err(), Error::StaleHandle { .. }));
}

#[test]
fn display_renders_fields() {
    let t = TestDb::new();
    let rec = t.row(&[num(1.5), Value::from("a"), Value::Null, Value::Bool(true)]);
    assert_eq!(rec.to_string(), "[1.5, \"a\", null, true]");
}
