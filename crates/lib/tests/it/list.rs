//! ValueList ordering, combinators and list-level events.

use dynattr::{ChangeKind, Value, ValueList};

use crate::helpers::watch_list;

fn abc() -> ValueList {
    ValueList::from(["A", "B", "C"])
}

// ===== Primary value =====

#[test]
fn test_primary_reordering() {
    let mut list = abc();

    assert!(list.set_primary(1));
    assert_eq!(list, ValueList::from(["B", "A", "C"]));

    assert!(list.set_primary_value("C"));
    assert_eq!(list, ValueList::from(["C", "B", "A"]));
    assert_eq!(list.primary(), Some(&Value::from("C")));
}

#[test]
fn test_reordering_missing_value_fails_without_change() {
    let mut list = abc();
    let log = watch_list(&mut list);

    assert!(!list.set_primary_value("Z"));
    assert!(!list.set_primary(3));
    assert_eq!(list, abc());
    assert_eq!(log.total(), 0);
}

#[test]
fn test_insert_primary_keeps_previous_values() {
    let mut list = ValueList::from("Pink Floyd");
    list.insert_primary("The Pink Floyd Sound");

    assert_eq!(list.len(), 2);
    assert_eq!(list.cast::<String>().unwrap(), "The Pink Floyd Sound");
    assert_eq!(list.cast_at::<String>(1).unwrap(), "Pink Floyd");
}

// ===== Combinators =====

#[test]
fn test_add_assign_appends_in_order() {
    let mut list = abc();
    list += &ValueList::from(["D", "A"]);
    assert_eq!(list, ValueList::from(["A", "B", "C", "D", "A"]));
}

#[test]
fn test_sub_assign_removes_each_match_once() {
    let mut list = ValueList::from(["A", "B", "A", "C"]);
    list -= &ValueList::from(["A", "C", "Z"]);
    assert_eq!(list, ValueList::from(["B", "A"]));
}

#[test]
fn test_absent_operand_is_a_no_op() {
    let mut list = abc();
    let log = watch_list(&mut list);

    list += None::<&ValueList>;
    list -= None::<&ValueList>;

    assert_eq!(list, abc());
    assert_eq!(log.total(), 0);
    assert_eq!(abc() + None::<&ValueList>, abc());
}

#[test]
fn test_add_and_sub_by_value() {
    let list = abc() + Value::from(4i32) - Value::from("A");
    assert_eq!(list.len(), 3);
    assert_eq!(list.primary(), Some(&Value::from("B")));
    assert_eq!(list.get(2), Some(&Value::I32(4)));
}

// ===== Events =====

#[test]
fn test_list_event_counts() {
    let mut list = ValueList::new();
    let log = watch_list(&mut list);

    list.push("Main");
    list.extend(["val1", "val2", "val3"]);
    list.push("Main");
    assert_eq!(log.count(ChangeKind::Added), 5);

    assert!(list.set_primary(1));
    assert!(list.set_primary_value("val3"));
    assert_eq!(log.count(ChangeKind::Reordered), 2);

    // [val3, val1, Main, val2, Main]: index 1 is rewritten with its own value
    list.set(0, "x").unwrap();
    list.set(1, "val1").unwrap();
    list.set(2, "y").unwrap();
    assert_eq!(log.count(ChangeKind::Changed), 2);
    assert_eq!(log.total(), 9);
}

#[test]
fn test_events_arrive_in_order() {
    let mut list = ValueList::new();
    let log = watch_list(&mut list);

    list.push(1u8);
    list.set(0, 2u8).unwrap();
    list.remove_at(0);
    list.push(3u8);
    list.clear();

    assert_eq!(
        log.kinds(),
        vec![
            ChangeKind::Added,
            ChangeKind::Changed,
            ChangeKind::Removed,
            ChangeKind::Added,
            ChangeKind::Cleared,
        ]
    );
}

#[test]
fn test_unsubscribed_listener_is_silent() {
    let mut list = ValueList::new();
    let log = crate::helpers::EventLog::default();
    let recorder = log.clone();
    let id = list.subscribe(move |change| recorder.record(change.kind));

    list.push("a");
    assert!(list.unsubscribe(id));
    list.push("b");

    assert_eq!(log.total(), 1);
    assert!(!list.unsubscribe(id));
}

#[test]
fn test_clone_does_not_share_listeners() {
    let mut list = abc();
    let log = watch_list(&mut list);

    let mut copy = list.clone();
    copy.push("D");

    assert_eq!(log.total(), 0);
    assert_eq!(list.len(), 3);
}

#[test]
fn test_setting_identical_nan_is_silent() {
    let mut list = ValueList::from([1.0f64, f64::NAN]);
    let log = watch_list(&mut list);

    list.set(1, f64::NAN).unwrap();
    assert_eq!(log.total(), 0);

    list.set(1, 2.0f64).unwrap();
    assert_eq!(log.kinds(), vec![ChangeKind::Changed]);
}

// ===== Index errors =====

#[test]
fn test_index_errors() {
    let mut list = abc();
    assert!(list.set(3, "D").unwrap_err().is_index_out_of_range());
    assert!(list.insert(4, "D").unwrap_err().is_index_out_of_range());
    assert!(list.try_get(3).unwrap_err().is_index_out_of_range());
    assert!(list.remove_at(3).is_none());

    list.insert(3, "D").unwrap();
    assert_eq!(list.get(3), Some(&Value::from("D")));
}
