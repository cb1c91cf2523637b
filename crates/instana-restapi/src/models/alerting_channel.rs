use crate::resource::InstanaDataObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertingChannel {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub config: AlertingChannelConfig,
}

/// kind specific settings, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AlertingChannelConfig {
    #[serde(rename = "EMAIL")]
    Email {
        #[serde(default)]
        emails: Vec<String>,
    },
    #[serde(rename = "OPS_GENIE", rename_all = "camelCase")]
    OpsGenie {
        api_key: String,
        /// comma separated tag list.
        #[serde(default)]
        tags: String,
        region: String,
    },
    #[serde(rename = "PAGER_DUTY", rename_all = "camelCase")]
    PagerDuty { service_integration_key: String },
    #[serde(rename = "SLACK", rename_all = "camelCase")]
    Slack {
        webhook_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
    #[serde(rename = "SPLUNK")]
    Splunk { url: String, token: String },
    #[serde(rename = "VICTOR_OPS", rename_all = "camelCase")]
    VictorOps { api_key: String, routing_key: String },
    #[serde(rename = "WEB_HOOK", rename_all = "camelCase")]
    Webhook {
        #[serde(default)]
        webhook_urls: Vec<String>,
        /// headers as `"Key: Value"` strings.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        headers: Vec<String>,
    },
    #[serde(rename = "OFFICE_365", rename_all = "camelCase")]
    Office365 { webhook_url: String },
    #[serde(rename = "GOOGLE_CHAT", rename_all = "camelCase")]
    GoogleChat { webhook_url: String },
    #[serde(other)]
    Unknown,
}

impl AlertingChannelConfig {
    /// wire discriminator of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            AlertingChannelConfig::Email { .. } => "EMAIL",
            AlertingChannelConfig::OpsGenie { .. } => "OPS_GENIE",
            AlertingChannelConfig::PagerDuty { .. } => "PAGER_DUTY",
            AlertingChannelConfig::Slack { .. } => "SLACK",
            AlertingChannelConfig::Splunk { .. } => "SPLUNK",
            AlertingChannelConfig::VictorOps { .. } => "VICTOR_OPS",
            AlertingChannelConfig::Webhook { .. } => "WEB_HOOK",
            AlertingChannelConfig::Office365 { .. } => "OFFICE_365",
            AlertingChannelConfig::GoogleChat { .. } => "GOOGLE_CHAT",
            AlertingChannelConfig::Unknown => "UNKNOWN",
        }
    }
}

impl InstanaDataObject for AlertingChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("id is missing".to_string());
        }
        if self.name.is_empty() {
            return Err("name is missing".to_string());
        }
        Ok(())
    }
}
