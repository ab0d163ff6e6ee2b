use serde_json::Value;

use crate::classify::InteractiveBody;
use crate::node::BinaryNode;

/// Version of the `interactive` wrapper node.
pub const INTERACTIVE_VERSION: &str = "1";
/// Version of a `native_flow` node naming a specific flow, and of `list` nodes.
pub const NAMED_FLOW_VERSION: &str = "2";
/// Version of the `native_flow` node used for mixed buttons.
pub const MIXED_FLOW_VERSION: &str = "9";

/// Flows the receiving client renders from a dedicated `native_flow` node.
pub const NAMED_FLOWS: [&str; 6] = [
    "mpm",
    "cta_catalog",
    "send_location",
    "call_permission_request",
    "wa_payment_transaction_details",
    "automated_greeting_message_view_catalog",
];

/// Derives the `biz` node the receiving client needs to render `body`.
///
/// Only the first native flow button decides the variant.
pub fn synthesize_node_tree(body: &Value) -> BinaryNode {
    let biz = BinaryNode::new("biz");
    match InteractiveBody::parse(body) {
        None => biz,
        Some(InteractiveBody::List(_)) => biz.with_child(
            BinaryNode::new("list")
                .with_attr("v", NAMED_FLOW_VERSION)
                .with_attr("type", "product_list"),
        ),
        Some(InteractiveBody::Buttons(_)) => biz.with_child(native_flow("mixed", MIXED_FLOW_VERSION)),
        Some(view @ InteractiveBody::NativeFlow { .. }) => match view.first_button_name() {
            Some("review_and_pay") => biz.with_attr("native_flow_name", "order_details"),
            Some("payment_info") => biz.with_attr("native_flow_name", "payment_info"),
            Some(name) if NAMED_FLOWS.contains(&name) => {
                biz.with_child(native_flow(name, NAMED_FLOW_VERSION))
            }
            _ => biz.with_child(native_flow("mixed", MIXED_FLOW_VERSION)),
        },
    }
}

/// The marker node appended for individual chats.
pub fn bot_node() -> BinaryNode {
    BinaryNode::new("bot").with_attr("biz_bot", "1")
}

fn native_flow(name: &str, version: &str) -> BinaryNode {
    BinaryNode::new("interactive")
        .with_attr("type", "native_flow")
        .with_attr("v", INTERACTIVE_VERSION)
        .with_child(
            BinaryNode::new("native_flow")
                .with_attr("v", version)
                .with_attr("name", name),
        )
}
