use checklists::codec::decode_checklist;
use checklists::error::{exit_codes, Error, JsonError};
use uuid::Uuid;

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let rejected = Error::InvalidMove {
        item: Uuid::new_v4(),
        target: Uuid::new_v4(),
    };
    assert_eq!(rejected.exit_code(), exit_codes::REJECTED);

    let op = Error::OperationFailed("boom".to_string());
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code() {
    let err = Error::ChecklistNotFound("Groceries".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.kind, "user_error");
    assert!(json.message.contains("Checklist not found"));

    let value = serde_json::to_value(&json).expect("serialize");
    assert_eq!(value["details"]["checklist"], "Groceries");
}

#[test]
fn nesting_too_deep_is_rejected_with_limit() {
    let err = Error::NestingTooDeep {
        item: Uuid::nil(),
        max: 31,
    };
    assert_eq!(err.exit_code(), exit_codes::REJECTED);
    assert_eq!(err.kind(), "rejected");
    let details = err.details().expect("details");
    assert_eq!(details["max_nesting_level"], 31);
}

#[test]
fn import_error_details_carry_path() {
    let decode = decode_checklist(r#"{"title": "x", "items": [{"id": "nope", "title": "a"}]}"#)
        .expect_err("bad uuid");
    let err = Error::from(decode);
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

    let details = err.details().expect("details");
    assert_eq!(details["kind"], "invalid_value");
    assert_eq!(details["field"], "id");
    assert_eq!(details["path"], "items → 0 → id");
    assert!(err.to_string().contains("Path: items → 0 → id"));
}
