/// Labels attached to spans and metrics for one outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryLabels {
    pub account: String,
    pub chat_id: Option<String>,
    pub msg_id: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(3 + self.extra.len());
        tags.push(("account".into(), self.account.clone()));
        if let Some(chat) = &self.chat_id {
            tags.push(("chat_id".into(), chat.clone()));
        }
        if let Some(msg) = &self.msg_id {
            tags.push(("msg_id".into(), msg.clone()));
        }
        for (key, value) in &self.extra {
            tags.push((key.clone(), value.clone()));
        }
        tags
    }

    /// Tags safe to use as metric dimensions; per-chat and per-message ids and empty values are
    /// left out.
    pub fn metric_tags(&self) -> Vec<(String, String)> {
        self.tags()
            .into_iter()
            .filter(|(key, value)| key != "chat_id" && key != "msg_id" && !value.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_tags_drop_identifiers() {
        let labels = TelemetryLabels {
            account: "bot@s.whatsapp.net".into(),
            chat_id: Some("1@s.whatsapp.net".into()),
            msg_id: Some("ABC".into()),
            extra: Vec::new(),
        }
        .with_extra("button_type", "native_flow");

        assert_eq!(labels.tags().len(), 4);
        assert_eq!(
            labels.metric_tags(),
            vec![
                ("account".to_string(), "bot@s.whatsapp.net".to_string()),
                ("button_type".to_string(), "native_flow".to_string()),
            ]
        );
    }
}
