use gsm_buttons::DryRunConfig;

pub const DEFAULT_SENDER_JID: &str = "15550000000@s.whatsapp.net";

/// Settings for `preview`, read from the environment and overridable by flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    pub sender_jid: String,
    pub emit_own_events: bool,
}

impl PreviewConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let sender_jid = lookup("GSM_SENDER_JID")
            .map(|jid| jid.trim().to_string())
            .filter(|jid| !jid.is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_JID.into());
        let emit_own_events = lookup("GSM_EMIT_OWN_EVENTS")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        Self {
            sender_jid,
            emit_own_events,
        }
    }

    pub fn with_overrides(mut self, sender: Option<String>, echo: bool) -> Self {
        if let Some(sender) = sender {
            self.sender_jid = sender;
        }
        self.emit_own_events |= echo;
        self
    }

    pub fn dry_run(&self) -> DryRunConfig {
        DryRunConfig {
            sender_id: Some(self.sender_jid.clone()),
            emit_own_events: self.emit_own_events,
        }
    }
}
