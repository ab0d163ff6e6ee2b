use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use gsm_buttons::{
    Dispatcher, DryRunTransport, EntryPoint, SendError, SendOptions, bot_node,
    classify_button_type, example_payload, synthesize_node_tree, validate_authoring_buttons,
    validate_basic_payload, validate_interactive_payload,
};
use serde_json::{Value, json};

use crate::config::PreviewConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entry {
    Basic,
    Interactive,
    Template,
    Cards,
}

/// Outcome of a command: the JSON to print and whether it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub ok: bool,
    pub output: Value,
}

pub fn validate(entry: EntryPoint, payload: &Value) -> Report {
    let strict = match entry {
        EntryPoint::BasicButtons => validate_basic_payload(payload),
        EntryPoint::Interactive => validate_interactive_payload(payload),
    };
    let authoring = validate_authoring_buttons(payload.get(entry.buttons_key()));
    let ok = strict.is_valid() && authoring.report.is_valid();

    let mut output = json!({
        "context": entry.context(),
        "valid": ok,
        "strict": strict,
        "authoring": {
            "report": authoring.report,
            "cleaned": authoring.cleaned,
        },
    });
    if !ok {
        output["example"] = example_payload(entry);
    }
    Report { ok, output }
}

pub fn nodes(body: &Value, group: bool) -> Report {
    let button_type = classify_button_type(body);
    let mut nodes = Vec::new();
    if button_type.is_some() {
        nodes.push(synthesize_node_tree(body));
        if !group {
            nodes.push(bot_node());
        }
    }
    Report {
        ok: true,
        output: json!({ "buttonType": button_type, "nodes": nodes }),
    }
}

pub async fn preview(
    entry: Entry,
    destination: &str,
    payload: &Value,
    options: Option<Value>,
    config: &PreviewConfig,
) -> Result<Report> {
    let options: SendOptions = match options {
        Some(options) => serde_json::from_value(options).context("invalid send options")?,
        None => SendOptions::default(),
    };
    let transport = Arc::new(DryRunTransport::new(config.dry_run()));
    let dispatcher = Dispatcher::new(transport.clone());

    let sent = match entry {
        Entry::Basic => dispatcher.send_basic_buttons(destination, payload, options).await,
        Entry::Interactive => {
            dispatcher
                .send_interactive_message(destination, payload, options)
                .await
        }
        Entry::Template => {
            dispatcher
                .send_template_buttons(destination, payload, options)
                .await
        }
        Entry::Cards => dispatcher.send_cards(destination, payload, options).await,
    };

    match sent {
        Ok(envelope) => Ok(Report {
            ok: true,
            output: json!({
                "envelope": envelope,
                "deliveries": transport.deliveries(),
                "plainSends": transport.plain_sends(),
            }),
        }),
        Err(SendError::Validation(err)) => Ok(Report {
            ok: false,
            output: json!({ "validationError": err.to_json() }),
        }),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_example_on_failure() {
        let report = validate(EntryPoint::BasicButtons, &json!({"text": "", "buttons": []}));
        assert!(!report.ok);
        assert_eq!(report.output["context"], "sendButtons");
        assert!(report.output.get("example").is_some());

        let report = validate(
            EntryPoint::Interactive,
            &example_payload(EntryPoint::Interactive),
        );
        assert!(report.ok);
        assert!(report.output.get("example").is_none());
    }

    #[test]
    fn nodes_skip_plain_bodies_and_bot_for_groups() {
        let plain = nodes(&json!({"conversation": "hi"}), false);
        assert_eq!(plain.output, json!({"buttonType": null, "nodes": []}));

        let list = nodes(&json!({"listMessage": {}}), true);
        assert_eq!(list.output["buttonType"], "list");
        assert_eq!(list.output["nodes"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn preview_records_the_delivery() {
        let config = PreviewConfig::from_lookup(|_| None);
        let report = preview(
            Entry::Basic,
            "15551234567@s.whatsapp.net",
            &json!({"text": "Pick one", "buttons": [{"id": "q1", "text": "Yes"}]}),
            Some(json!({"messageId": "PREVIEW-1", "timestamp": 1})),
            &config,
        )
        .await
        .unwrap();

        assert!(report.ok);
        assert_eq!(report.output["envelope"]["key"]["id"], "PREVIEW-1");
        let delivery = &report.output["deliveries"][0];
        assert_eq!(delivery["request"]["additionalNodes"][1]["tag"], "bot");
    }

    #[tokio::test]
    async fn preview_returns_validation_errors_as_output() {
        let config = PreviewConfig::from_lookup(|_| None);
        let report = preview(
            Entry::Interactive,
            "15551234567@s.whatsapp.net",
            &json!({"text": "x", "interactiveButtons": [{"name": "nope", "buttonParamsJson": "{}"}]}),
            None,
            &config,
        )
        .await
        .unwrap();
        assert!(!report.ok);
        assert_eq!(
            report.output["validationError"]["context"],
            "sendInteractiveMessage"
        );
    }
}
