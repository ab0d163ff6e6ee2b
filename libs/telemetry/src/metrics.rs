use ::metrics::Label;
use tracing::Span;

use crate::context::TelemetryLabels;

pub fn with_common_fields(span: &Span, account: &str, chat_id: Option<&str>, msg_id: Option<&str>) {
    span.record("account", tracing::field::display(account));
    if let Some(chat_id) = chat_id {
        span.record("chat_id", tracing::field::display(chat_id));
    }
    if let Some(msg_id) = msg_id {
        span.record("msg_id", tracing::field::display(msg_id));
    }
}

pub fn record_counter(name: &'static str, value: u64, labels: &TelemetryLabels) {
    ::metrics::counter!(name, metric_labels(labels)).increment(value);
}

pub fn record_histogram(name: &'static str, value: f64, labels: &TelemetryLabels) {
    ::metrics::histogram!(name, metric_labels(labels)).record(value);
}

fn metric_labels(labels: &TelemetryLabels) -> Vec<Label> {
    labels
        .metric_tags()
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect()
}
