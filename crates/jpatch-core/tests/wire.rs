use jpatch_core::{diff, diff_with_flags, DiffFlag, DiffFlags};
use serde_json::json;

#[test]
fn renamed_member_renders_as_move() {
    let patch = diff(&json!({"age": 10}), &json!({"height": 10}));
    assert_eq!(patch.to_json_string().unwrap(), r#"[{"op":"move","from":"/age","path":"/height"}]"#);
}

#[test]
fn duplicated_subtree_renders_as_copy() {
    let patch = diff(&json!({"a": {"b": [1]}}), &json!({"a": {"b": [1]}, "c": {"b": [1]}}));
    assert_eq!(patch.to_json_string().unwrap(), r#"[{"op":"copy","from":"/a","path":"/c"}]"#);
}

#[test]
fn original_value_on_replace() {
    let flags = DiffFlags::defaults().with(DiffFlag::AddOriginalValueOnReplace);
    let patch = diff_with_flags(&json!({"a": "old"}), &json!({"a": "new"}), &flags);
    assert_eq!(
        patch.to_json_string().unwrap(),
        r#"[{"op":"replace","fromValue":"old","path":"/a","value":"new"}]"#
    );
}

#[test]
fn explicit_remove_add_on_replace() {
    let flags = DiffFlags::empty().with(DiffFlag::AddExplicitRemoveAddOnReplace);
    let patch = diff_with_flags(&json!([true]), &json!([false]), &flags);
    assert_eq!(
        patch.to_json_string().unwrap(),
        r#"[{"op":"remove","path":"/0","value":true},{"op":"add","path":"/0","value":false}]"#
    );
}

#[test]
fn test_operations_precede_destructive_ones() {
    let flags = DiffFlags::defaults().with(DiffFlag::EmitTestOperations);
    let patch = diff_with_flags(&json!({"a": 1, "b": 2}), &json!({"b": 3}), &flags);
    assert_eq!(
        patch.to_json_string().unwrap(),
        concat!(
            r#"[{"op":"test","path":"/a","value":1},{"op":"remove","path":"/a"},"#,
            r#"{"op":"test","path":"/b","value":2},{"op":"replace","path":"/b","value":3}]"#
        )
    );
}

#[test]
fn pointer_tokens_are_escaped() {
    let patch = diff(&json!({}), &json!({"a/b": {"c~d": 1}}));
    assert_eq!(
        patch.to_json_string().unwrap(),
        r#"[{"op":"add","path":"/a~1b","value":{"c~d":1}}]"#
    );
}

#[test]
fn added_members_keep_target_order() {
    let patch = diff_with_flags(
        &json!({}),
        &json!({"z": 1, "y": 2, "x": 3}),
        &DiffFlags::dont_normalize_op_into_move_and_copy(),
    );
    assert_eq!(
        patch.to_json_string().unwrap(),
        concat!(
            r#"[{"op":"add","path":"/z","value":1},{"op":"add","path":"/y","value":2},"#,
            r#"{"op":"add","path":"/x","value":3}]"#
        )
    );
}
