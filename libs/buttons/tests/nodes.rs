use std::sync::Arc;

use gsm_buttons::{Dispatcher, SendOptions, convert_content, synthesize_node_tree};
use gsm_testutil::{RecordingTransport, assert_snapshot_json, load_fixture};
use serde_json::json;

#[tokio::test]
async fn basic_quick_reply_nodes() {
    let transport = Arc::new(RecordingTransport::new());
    let payload = load_fixture!("libs/buttons/tests/fixtures/basic_quick_reply.json");
    Dispatcher::new(transport.clone())
        .send_basic_buttons("15551234567@s.whatsapp.net", &payload, SendOptions::default())
        .await
        .unwrap();

    let delivery = transport.last_delivery();
    assert_snapshot_json!("basic_quick_reply_nodes", delivery.request.additional_nodes);
    assert_snapshot_json!("basic_quick_reply_message", delivery.message);
}

#[test]
fn product_list_node() {
    let tree = synthesize_node_tree(&json!({"listMessage": {"title": "Catalog"}}));
    assert_snapshot_json!("product_list_node", tree);
}

#[test]
fn converted_full_control_content() {
    let content = load_fixture!("libs/buttons/tests/fixtures/interactive_cta_url.json");
    assert_snapshot_json!("converted_cta_url", convert_content(&content));
}
