use super::*;
use crate::document::ShapeGeometry;

fn create_shape_op() -> Operation {
    Operation::CreateShape {
        x: 10.0,
        y: 20.0,
        geometry: ShapeGeometry::Rectangle { width: 100.0, height: 50.0 },
        color: "#FF0000".into(),
        name: None,
        opacity: None,
    }
}

// =========================================================================
// serde
// =========================================================================

#[test]
fn operation_tag_is_op_field() {
    let json = serde_json::to_value(create_shape_op()).unwrap();
    assert_eq!(json.get("op").and_then(|v| v.as_str()), Some("create_shape"));
    assert_eq!(
        json.pointer("/geometry/type").and_then(|v| v.as_str()),
        Some("rectangle")
    );
}

#[test]
fn operation_round_trip() {
    let ops = vec![
        create_shape_op(),
        Operation::Move { target: "the blue circle".into(), x: 5.0, y: 6.0 },
        Operation::Arrange {
            targets: vec!["a".into(), "b".into()],
            direction: Direction::Horizontal,
            spacing: 10.0,
        },
        Operation::QueryState,
    ];
    let json = serde_json::to_string(&ops).unwrap();
    let restored: Vec<Operation> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, ops);
}

#[test]
fn unknown_op_tag_fails_to_parse() {
    let result: Result<Operation, _> = serde_json::from_str(r#"{"op": "teleport", "target": "x"}"#);
    assert!(result.is_err());
}

#[test]
fn plan_parses_with_missing_optional_fields() {
    let plan: Plan = serde_json::from_str(r#"{"operations": []}"#).unwrap();
    assert!(plan.operations.is_empty());
    assert!(plan.rationale.is_none());
    assert!(plan.clarification.is_none());
}

// =========================================================================
// plan invariant
// =========================================================================

#[test]
fn clarification_with_operations_is_rejected() {
    let plan = Plan {
        operations: vec![Operation::QueryState],
        rationale: None,
        clarification: Some(Clarification { question: "which one?".into(), options: vec!["a".into()] }),
    };
    assert_eq!(
        plan.validate().unwrap_err(),
        ValidationError::ClarificationWithOperations { count: 1 }
    );
}

#[test]
fn clarification_without_operations_is_valid() {
    let plan = Plan {
        operations: vec![],
        rationale: None,
        clarification: Some(Clarification { question: "which one?".into(), options: vec![] }),
    };
    assert!(plan.validate().is_ok());
}

// =========================================================================
// execution-mode preference
// =========================================================================

#[test]
fn small_plans_prefer_client_execution() {
    let plan = Plan { operations: vec![Operation::QueryState; 50], ..Plan::default() };
    assert!(!plan.prefers_server_execution());
}

#[test]
fn oversized_plans_prefer_server_execution() {
    let plan = Plan { operations: vec![Operation::QueryState; 51], ..Plan::default() };
    assert!(plan.prefers_server_execution());
}

#[test]
fn any_grid_prefers_server_execution() {
    let grid = Operation::CreateGrid {
        rows: 2,
        cols: 2,
        cell_width: 50.0,
        cell_height: 50.0,
        spacing: 10.0,
        start_x: 0.0,
        start_y: 0.0,
        kind: crate::document::ShapeKind::Rectangle,
        color: "#FF0000".into(),
        name_prefix: "Grid".into(),
    };
    let plan = Plan { operations: vec![grid], ..Plan::default() };
    assert!(plan.prefers_server_execution());
}

// =========================================================================
// argument validation
// =========================================================================

#[test]
fn create_shape_rejects_bad_opacity() {
    let op = Operation::CreateShape {
        x: 0.0,
        y: 0.0,
        geometry: ShapeGeometry::Circle { radius: 10.0 },
        color: "#FF0000".into(),
        name: None,
        opacity: Some(1.5),
    };
    assert_eq!(op.validate().unwrap_err(), ValidationError::OpacityOutOfRange { value: 1.5 });
}

#[test]
fn create_shape_rejects_non_positive_geometry() {
    let op = Operation::CreateShape {
        x: 0.0,
        y: 0.0,
        geometry: ShapeGeometry::Rectangle { width: 0.0, height: 10.0 },
        color: "#FF0000".into(),
        name: None,
        opacity: None,
    };
    assert_eq!(
        op.validate().unwrap_err(),
        ValidationError::NonPositiveDimension { field: "width" }
    );
}

#[test]
fn move_rejects_non_finite_coordinates() {
    let op = Operation::Move { target: "x".into(), x: f64::NAN, y: 0.0 };
    assert_eq!(op.validate().unwrap_err(), ValidationError::NonFiniteArgument { field: "x" });
}

#[test]
fn update_style_requires_some_field() {
    let op = Operation::UpdateStyle { target: "x".into(), color: None, opacity: None };
    assert_eq!(op.validate().unwrap_err(), ValidationError::EmptyStyleUpdate);

    let op = Operation::UpdateStyle { target: "x".into(), color: Some("#00FF00".into()), opacity: None };
    assert!(op.validate().is_ok());
}

#[test]
fn arrange_rejects_negative_spacing() {
    let op = Operation::Arrange { targets: vec!["a".into()], direction: Direction::Vertical, spacing: -1.0 };
    assert_eq!(op.validate().unwrap_err(), ValidationError::NegativeSpacing { value: -1.0 });
}

#[test]
fn grid_rejects_zero_axis_and_oversize() {
    let mut base = Operation::CreateGrid {
        rows: 0,
        cols: 3,
        cell_width: 50.0,
        cell_height: 50.0,
        spacing: 0.0,
        start_x: 0.0,
        start_y: 0.0,
        kind: crate::document::ShapeKind::Circle,
        color: "#0000FF".into(),
        name_prefix: "Grid".into(),
    };
    assert_eq!(
        base.validate().unwrap_err(),
        ValidationError::NonPositiveDimension { field: "rows" }
    );

    if let Operation::CreateGrid { rows, cols, .. } = &mut base {
        *rows = 100;
        *cols = 100;
    }
    assert_eq!(
        base.validate().unwrap_err(),
        ValidationError::GridTooLarge { cells: 10_000, max: MAX_GRID_CELLS }
    );
}

#[test]
fn delete_multiple_requires_targets() {
    let op = Operation::DeleteMultiple { targets: vec![] };
    assert_eq!(op.validate().unwrap_err(), ValidationError::EmptyTargets);
}

#[test]
fn operation_names_are_wire_tags() {
    assert_eq!(create_shape_op().name(), "create_shape");
    assert_eq!(Operation::QueryState.name(), "query_state");
    assert_eq!(Operation::Delete { target: "x".into() }.name(), "delete");
}
