use super::*;
use crate::error::ErrorCode;
use crate::plan::Operation;

// =========================================================================
// parse_response
// =========================================================================

#[test]
fn parses_plan_with_operations() {
    let json = r##"{
        "operations": [
            {"op": "create_shape", "x": 0, "y": 0,
             "geometry": {"type": "rectangle", "width": 50, "height": 50},
             "color": "#FF0000"},
            {"op": "bring_to_front", "target": "the red square"}
        ],
        "rationale": "two steps"
    }"##;
    let parsed = parse_response(json).unwrap();
    assert_eq!(parsed.plan.operations.len(), 2);
    assert_eq!(parsed.plan.rationale.as_deref(), Some("two steps"));
    assert!(parsed.plan.clarification.is_none());
    assert!(parsed.execution_summary.is_none());
    assert!(matches!(parsed.plan.operations[1], Operation::BringToFront { .. }));
}

#[test]
fn parses_clarification_response() {
    let json = r#"{
        "operations": [],
        "needs_clarification": {
            "question": "Which circle?",
            "options": ["the blue one", "the red one"]
        }
    }"#;
    let parsed = parse_response(json).unwrap();
    assert!(parsed.plan.operations.is_empty());
    let clarification = parsed.plan.clarification.unwrap();
    assert_eq!(clarification.question, "Which circle?");
    assert_eq!(clarification.options.len(), 2);
}

#[test]
fn parses_execute_response_with_summary() {
    let id = uuid::Uuid::new_v4();
    let json = format!(
        r#"{{
            "operations": [],
            "execution_summary": {{
                "operations_applied": 4,
                "shape_ids": ["{id}"],
                "timestamp": 1700000000000
            }}
        }}"#
    );
    let parsed = parse_response(&json).unwrap();
    let summary = parsed.execution_summary.unwrap();
    assert_eq!(summary.operations_applied, 4);
    assert_eq!(summary.shape_ids, vec![id]);
    assert_eq!(summary.timestamp, 1_700_000_000_000);
}

#[test]
fn malformed_body_is_a_parse_error() {
    let err = parse_response("{not json").unwrap_err();
    assert!(matches!(&err, ServiceError::Parse(_)));
    assert_eq!(err.error_code(), "E_API_PARSE");
}

#[test]
fn unknown_operation_is_a_parse_error() {
    let json = r#"{"operations": [{"op": "explode"}]}"#;
    assert!(matches!(parse_response(json).unwrap_err(), ServiceError::Parse(_)));
}

// =========================================================================
// status mapping
// =========================================================================

#[test]
fn auth_statuses_map_to_auth_required() {
    assert!(matches!(map_error_status(401, String::new()), ServiceError::AuthRequired));
    assert!(matches!(map_error_status(403, String::new()), ServiceError::AuthRequired));
}

#[test]
fn throttle_status_maps_to_rate_limited_and_retries() {
    let err = map_error_status(429, String::new());
    assert!(matches!(&err, ServiceError::RateLimited));
    assert!(err.retryable());
}

#[test]
fn other_statuses_carry_status_and_body() {
    let err = map_error_status(500, "oops".into());
    let ServiceError::Api { status, body } = err else {
        panic!("expected Api error");
    };
    assert_eq!(status, 500);
    assert_eq!(body, "oops");
}
