use gsm_buttons::{
    AuthoringButton, ButtonType, EntryPoint, classify_button_type, convert_content,
    normalize_button_values, normalize_buttons, validate_basic_payload,
    validate_converted_content, validate_interactive_payload,
};
use gsm_testutil::load_fixture;
use serde_json::{Value, json};

fn authoring_mix() -> Vec<Value> {
    load_fixture!("libs/buttons/tests/fixtures/authoring_mix.json")
        .as_array()
        .cloned()
        .unwrap()
}

#[test]
fn normalizing_twice_changes_nothing() {
    let buttons: Vec<Value> = authoring_mix()
        .iter()
        .filter_map(|content| content.get("interactiveButtons"))
        .filter_map(Value::as_array)
        .flatten()
        .cloned()
        .collect();

    let once = normalize_button_values(&buttons);
    let twice = normalize_button_values(&once);
    assert_eq!(once, twice);
    assert_eq!(once.len(), buttons.len());
}

#[test]
fn canonical_descriptors_pass_through_normalization() {
    let canonical = AuthoringButton::from_value(&json!({
        "name": "cta_call",
        "buttonParamsJson": "{\"display_text\":\"Call\",\"phone_number\":\"+1555\"}"
    }))
    .unwrap();
    assert_eq!(normalize_buttons(&[canonical.clone()]), vec![canonical]);
    assert!(normalize_buttons(&[]).is_empty());
}

#[test]
fn legacy_simple_shape_becomes_quick_reply() {
    let normalized = normalize_button_values(&[json!({"id": "x", "text": "y"})]);
    assert_eq!(normalized[0]["name"], "quick_reply");
    let params: Value =
        serde_json::from_str(normalized[0]["buttonParamsJson"].as_str().unwrap()).unwrap();
    assert_eq!(params, json!({"display_text": "y", "id": "x"}));
}

#[test]
fn converted_output_always_passes_content_validation() {
    for content in authoring_mix() {
        let converted = convert_content(&content);
        let check = validate_converted_content(&converted);
        assert!(
            check.report.is_valid(),
            "converted {content} produced errors: {:?}",
            check.report.errors
        );
    }
}

#[test]
fn classification_is_exclusive() {
    let bodies = [
        (json!({"listMessage": {}, "buttonsMessage": {}}), Some(ButtonType::List)),
        (
            json!({"buttonsMessage": {}, "interactiveMessage": {"nativeFlowMessage": {}}}),
            Some(ButtonType::Buttons),
        ),
        (
            json!({"interactiveMessage": {"nativeFlowMessage": {"buttons": []}}}),
            Some(ButtonType::NativeFlow),
        ),
        (json!({"conversation": "hi"}), None),
    ];
    for (body, expected) in bodies {
        assert_eq!(classify_button_type(&body), expected, "{body}");
    }
}

#[test]
fn independent_defects_are_all_reported() {
    let report = validate_basic_payload(&json!({
        "footer": 42,
        "buttons": []
    }));
    assert!(report.errors.len() >= 3, "{:?}", report.errors);

    let report = validate_interactive_payload(&json!({
        "interactiveButtons": [
            {"name": "send_money", "buttonParamsJson": "{}"},
            {"name": "cta_url", "buttonParamsJson": "{not json"}
        ]
    }));
    assert!(report.errors.len() >= 3, "{:?}", report.errors);
    assert!(report.errors.iter().any(|e| e.contains("text")));
    assert!(report.errors.iter().any(|e| e.contains("send_money")));
    assert!(report.errors.iter().any(|e| e.contains("not valid JSON")));
}

#[test]
fn basic_entry_point_rejects_full_control_names() {
    let report = validate_basic_payload(&json!({
        "text": "hi",
        "buttons": [{"name": "quick_reply", "buttonParamsJson": "{\"display_text\":\"a\",\"id\":\"b\"}"}]
    }));
    assert!(!report.is_valid());
    assert!(report.errors[0].contains(EntryPoint::BasicButtons.context()));
}
