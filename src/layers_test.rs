use super::*;
use crate::document::test_helpers::rect;
use crate::document::ShapeSnapshot;

/// Build a stack of shapes named "s1".."sN" with z 1..=N.
fn stack(n: i32) -> Vec<ShapeSnapshot> {
    (1..=n)
        .map(|z| {
            let name = format!("s{z}");
            rect(Some(name.as_str()), "#FF0000", z)
        })
        .collect()
}

fn apply(shapes: &mut [ShapeSnapshot], changes: &[ZChange]) {
    for change in changes {
        let shape = shapes.iter_mut().find(|s| s.id == change.id).unwrap();
        shape.z_index = change.z_index;
    }
}

fn z_of(shapes: &[ShapeSnapshot], name: &str) -> i32 {
    shapes
        .iter()
        .find(|s| s.name.as_deref() == Some(name))
        .unwrap()
        .z_index
}

// =========================================================================
// promote_to_front
// =========================================================================

#[test]
fn promote_sets_max_plus_one() {
    let mut shapes = stack(3);
    let id = shapes[0].id; // z = 1
    let changes = promote_to_front(&shapes, id).unwrap();
    assert_eq!(changes, vec![ZChange { id, z_index: 4 }]);
    apply(&mut shapes, &changes);
    assert_eq!(z_of(&shapes, "s1"), 4);
    assert_eq!(z_of(&shapes, "s2"), 2); // untouched
    assert_eq!(z_of(&shapes, "s3"), 3); // untouched
}

#[test]
fn promote_is_idempotent() {
    let mut shapes = stack(3);
    let id = shapes[0].id;
    let first = promote_to_front(&shapes, id).unwrap();
    apply(&mut shapes, &first);
    let after_one = z_of(&shapes, "s1");

    let second = promote_to_front(&shapes, id).unwrap();
    assert!(second.is_empty());
    apply(&mut shapes, &second);
    assert_eq!(z_of(&shapes, "s1"), after_one);
}

#[test]
fn promote_on_top_shape_is_noop() {
    let shapes = stack(3);
    let top = shapes[2].id;
    assert!(promote_to_front(&shapes, top).unwrap().is_empty());
}

#[test]
fn promote_unknown_shape_fails() {
    let shapes = stack(2);
    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        promote_to_front(&shapes, missing).unwrap_err(),
        LayerError::ShapeNotFound(missing)
    );
}

// =========================================================================
// set_explicit_z_index
// =========================================================================

#[test]
fn forward_move_decrements_passed_range() {
    let mut shapes = stack(5);
    let id = shapes[1].id; // s2, z = 2
    let changes = set_explicit_z_index(&shapes, id, 4).unwrap();
    apply(&mut shapes, &changes);
    assert_eq!(z_of(&shapes, "s1"), 1);
    assert_eq!(z_of(&shapes, "s3"), 2);
    assert_eq!(z_of(&shapes, "s4"), 3);
    assert_eq!(z_of(&shapes, "s2"), 4);
    assert_eq!(z_of(&shapes, "s5"), 5);
}

#[test]
fn backward_move_increments_passed_range() {
    let mut shapes = stack(5);
    let id = shapes[3].id; // s4, z = 4
    let changes = set_explicit_z_index(&shapes, id, 2).unwrap();
    apply(&mut shapes, &changes);
    assert_eq!(z_of(&shapes, "s1"), 1);
    assert_eq!(z_of(&shapes, "s4"), 2);
    assert_eq!(z_of(&shapes, "s2"), 3);
    assert_eq!(z_of(&shapes, "s3"), 4);
    assert_eq!(z_of(&shapes, "s5"), 5);
}

#[test]
fn same_z_twice_is_noop_second_time() {
    let mut shapes = stack(4);
    let id = shapes[0].id;
    let changes = set_explicit_z_index(&shapes, id, 3).unwrap();
    assert!(!changes.is_empty());
    apply(&mut shapes, &changes);

    let again = set_explicit_z_index(&shapes, id, 3).unwrap();
    assert!(again.is_empty());
}

#[test]
fn round_trip_restores_full_ordering() {
    let mut shapes = stack(6);
    let original: Vec<(Option<String>, i32)> = shapes.iter().map(|s| (s.name.clone(), s.z_index)).collect();
    let id = shapes[1].id; // s2

    let there = set_explicit_z_index(&shapes, id, 5).unwrap();
    apply(&mut shapes, &there);
    let back = set_explicit_z_index(&shapes, id, 2).unwrap();
    apply(&mut shapes, &back);

    let restored: Vec<(Option<String>, i32)> = shapes.iter().map(|s| (s.name.clone(), s.z_index)).collect();
    assert_eq!(restored, original);
}

#[test]
fn strict_total_order_is_preserved() {
    let mut shapes = stack(5);
    let id = shapes[4].id;
    let changes = set_explicit_z_index(&shapes, id, 1).unwrap();
    apply(&mut shapes, &changes);

    let mut zs: Vec<i32> = shapes.iter().map(|s| s.z_index).collect();
    zs.sort_unstable();
    assert_eq!(zs, vec![1, 2, 3, 4, 5]);
}

#[test]
fn z_below_one_is_rejected() {
    let shapes = stack(2);
    let id = shapes[0].id;
    assert_eq!(set_explicit_z_index(&shapes, id, 0).unwrap_err(), LayerError::IndexOutOfRange(0));
    assert_eq!(
        set_explicit_z_index(&shapes, id, -3).unwrap_err(),
        LayerError::IndexOutOfRange(-3)
    );
}

#[test]
fn target_change_is_last() {
    let shapes = stack(4);
    let id = shapes[0].id;
    let changes = set_explicit_z_index(&shapes, id, 4).unwrap();
    assert_eq!(changes.last(), Some(&ZChange { id, z_index: 4 }));
}

// =========================================================================
// validate
// =========================================================================

#[test]
fn clean_stack_validates() {
    let report = validate(&stack(4));
    assert!(report.is_clean());
}

#[test]
fn duplicates_and_gaps_are_reported() {
    let mut shapes = stack(4);
    shapes[0].z_index = 2; // duplicate 2, missing 1
    shapes[3].z_index = 9; // missing 4
    let report = validate(&shapes);
    assert_eq!(report.duplicates, vec![2]);
    assert_eq!(report.missing, vec![1, 4]);
    assert!(!report.is_clean());
}

#[test]
fn empty_collection_is_clean() {
    assert!(validate(&[]).is_clean());
}
