use super::common::{CustomPayloadField, Threshold, TimeThreshold};
use crate::resource::InstanaDataObject;
use instana_core::tagfilter::TagFilterModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// smart alert on application, service or endpoint level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAlertConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub boundary_scope: String,
    #[serde(default)]
    pub applications: BTreeMap<String, IncludedApplication>,
    pub severity: i32,
    #[serde(default)]
    pub triggering: bool,
    #[serde(default)]
    pub tag_filter_expression: TagFilterModel,
    #[serde(default)]
    pub alert_channel_ids: Vec<String>,
    pub granularity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
    #[serde(default)]
    pub include_internal: bool,
    #[serde(default)]
    pub include_synthetic: bool,
    #[serde(default)]
    pub custom_payload_fields: Vec<CustomPayloadField>,
    pub rule: ApplicationAlertRule,
    pub threshold: Threshold,
    pub time_threshold: TimeThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedApplication {
    pub application_id: String,
    pub inclusive: bool,
    #[serde(default)]
    pub services: BTreeMap<String, IncludedService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedService {
    pub service_id: String,
    pub inclusive: bool,
    #[serde(default)]
    pub endpoints: BTreeMap<String, IncludedEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedEndpoint {
    pub endpoint_id: String,
    pub inclusive: bool,
}

/// metric plus optional aggregation, the common shape of most rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRule {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCodeRule {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code_start: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code_end: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsRule {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub operator: String,
}

/// application rule, discriminated by `alertType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alertType")]
pub enum ApplicationAlertRule {
    #[serde(rename = "throughput")]
    Throughput(MetricRule),
    #[serde(rename = "slowness")]
    Slowness(MetricRule),
    #[serde(rename = "errorRate")]
    ErrorRate(MetricRule),
    #[serde(rename = "errors")]
    Errors(MetricRule),
    #[serde(rename = "statusCode")]
    StatusCode(StatusCodeRule),
    #[serde(rename = "logs")]
    Logs(LogsRule),
    #[serde(other)]
    Unknown,
}

impl InstanaDataObject for ApplicationAlertConfig {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_wire_shape() {
        let rule = ApplicationAlertRule::StatusCode(StatusCodeRule {
            metric_name: "httpStatusCode".to_string(),
            aggregation: Some("SUM".to_string()),
            status_code_start: Some(500),
            status_code_end: Some(599),
        });
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({
                "alertType": "statusCode",
                "metricName": "httpStatusCode",
                "aggregation": "SUM",
                "statusCodeStart": 500,
                "statusCodeEnd": 599
            })
        );
    }

    #[test]
    fn reads_nested_application_scope() {
        let raw = json!({
            "id": "a1",
            "name": "alert",
            "boundaryScope": "INBOUND",
            "applications": {
                "app": {
                    "applicationId": "app",
                    "inclusive": true,
                    "services": {
                        "svc": {"serviceId": "svc", "inclusive": true, "endpoints": {}}
                    }
                }
            },
            "severity": 5,
            "granularity": 600000,
            "rule": {"alertType": "slowness", "metricName": "latency", "aggregation": "P90"},
            "threshold": {"type": "staticThreshold", "operator": ">", "value": 1.0},
            "timeThreshold": {"type": "violationsInSequence", "timeWindow": 600000}
        });
        let config: ApplicationAlertConfig = serde_json::from_value(raw).unwrap();
        assert!(config.tag_filter_expression.is_empty());
        assert_eq!(config.applications["app"].services["svc"].service_id, "svc");
        assert!(matches!(config.rule, ApplicationAlertRule::Slowness(_)));
        assert!(config.validate().is_ok());
    }
}
