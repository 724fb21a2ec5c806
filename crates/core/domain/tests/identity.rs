use domain::{ControlAction, GrantSet, Identity, PermissionMatrix, Role};
use serde_json::json;

#[test]
fn identity_builds() {
    let matrix = PermissionMatrix::new().grant("door", "open");
    let identity = Identity::new("user-1", "alice", Role::User, GrantSet::Matrix(matrix));

    assert_eq!(identity.user_id, "user-1");
    assert_eq!(identity.username, "alice");
    assert!(!identity.is_admin());
    match identity.grants {
        GrantSet::Matrix(matrix) => assert!(matrix.allows("door", "open")),
        GrantSet::LegacyModules(_) => panic!("expected matrix grants"),
    }
}

#[test]
fn permission_matrix_round_trips_as_nested_object() {
    let matrix: PermissionMatrix =
        serde_json::from_value(json!({"alarm": {"snoozeFire": true, "snoozeAll": false}}))
            .expect("matrix");
    assert!(matrix.allows("alarm", "snoozeFire"));
    assert!(!matrix.allows("alarm", "snoozeAll"));
    assert!(!matrix.allows("door", "open"));
}

#[test]
fn awning_modes_share_capability() {
    let auto = ControlAction::from_request(&json!({"action": "set_auto"})).expect("action");
    let manual = ControlAction::from_request(&json!({"action": "set_manual"})).expect("action");
    assert_eq!(auto.required_capability(), manual.required_capability());
    assert_eq!(auto.required_capability().to_string(), "awning.setMode");
}
