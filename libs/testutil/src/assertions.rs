use gsm_buttons::BinaryNode;
use serde_json::Value;

/// Returns true when the payload contains the provided text fragment anywhere in its structure.
pub fn message_contains_text(value: &Value, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let mut stack = vec![value];
    while let Some(current) = stack.pop() {
        match current {
            Value::String(text) => {
                if text.contains(needle) {
                    return true;
                }
            }
            Value::Array(items) => {
                for item in items {
                    stack.push(item);
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    stack.push(item);
                }
            }
            _ => {}
        }
    }
    false
}

/// Depth-first search for the first node with `tag`.
pub fn find_node<'a>(nodes: &'a [BinaryNode], tag: &str) -> Option<&'a BinaryNode> {
    let mut stack: Vec<&BinaryNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.tag == tag {
            return Some(node);
        }
        stack.extend(node.children().iter().rev());
    }
    None
}

/// Follows `path` from the top-level nodes down through first matching children and returns the
/// last node. Panics with the node list when a step is missing.
pub fn assert_node_path<'a>(nodes: &'a [BinaryNode], path: &[&str]) -> &'a BinaryNode {
    let mut level = nodes;
    let mut found: Option<&BinaryNode> = None;
    for tag in path {
        let node = level
            .iter()
            .find(|node| node.tag == *tag)
            .unwrap_or_else(|| panic!("expected node `{tag}` along {path:?}, nodes: {nodes:#?}"));
        level = node.children();
        found = Some(node);
    }
    found.unwrap_or_else(|| panic!("empty node path"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Vec<BinaryNode> {
        vec![
            BinaryNode::new("biz").with_child(
                BinaryNode::new("interactive")
                    .with_child(BinaryNode::new("native_flow").with_attr("v", "9")),
            ),
            BinaryNode::new("bot").with_attr("biz_bot", "1"),
        ]
    }

    #[test]
    fn finds_nested_nodes() {
        let nodes = tree();
        assert_eq!(find_node(&nodes, "native_flow").unwrap().attr("v"), Some("9"));
        assert_eq!(find_node(&nodes, "bot").unwrap().attr("biz_bot"), Some("1"));
        assert!(find_node(&nodes, "list").is_none());
    }

    #[test]
    fn follows_node_paths() {
        let nodes = tree();
        let flow = assert_node_path(&nodes, &["biz", "interactive", "native_flow"]);
        assert_eq!(flow.attr("v"), Some("9"));
    }

    #[test]
    #[should_panic(expected = "expected node `list`")]
    fn missing_path_panics() {
        assert_node_path(&tree(), &["biz", "list"]);
    }

    #[test]
    fn text_search_walks_nested_values() {
        let value = json!({"a": [{"b": "needle in here"}]});
        assert!(message_contains_text(&value, "needle"));
        assert!(!message_contains_text(&value, "haystack"));
    }
}
