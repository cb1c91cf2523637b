use super::common::{CustomPayloadField, Threshold, TimeThreshold};
use crate::resource::InstanaDataObject;
use instana_core::tagfilter::TagFilterModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteAlertConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub severity: i32,
    #[serde(default)]
    pub triggering: bool,
    pub website_id: String,
    #[serde(default)]
    pub tag_filter_expression: TagFilterModel,
    #[serde(default)]
    pub alert_channel_ids: Vec<String>,
    pub granularity: i64,
    #[serde(default)]
    pub custom_payload_fields: Vec<CustomPayloadField>,
    pub rule: WebsiteAlertRule,
    pub threshold: Threshold,
    pub time_threshold: TimeThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMetricRule {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

/// rule comparing a beacon attribute against a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteValueRule {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// website rule, discriminated by `alertType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alertType")]
pub enum WebsiteAlertRule {
    #[serde(rename = "slowness")]
    Slowness(WebsiteMetricRule),
    #[serde(rename = "throughput")]
    Throughput(WebsiteMetricRule),
    #[serde(rename = "specificJsError")]
    SpecificJsError(WebsiteValueRule),
    #[serde(rename = "statusCode")]
    StatusCode(WebsiteValueRule),
    #[serde(other)]
    Unknown,
}

impl InstanaDataObject for WebsiteAlertConfig {
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
        if self.website_id.is_empty() {
            return Err("website id is missing".to_string());
        }
        Ok(())
    }
}
