//! payload fragments shared by several resource families.

use serde::{Deserialize, Serialize};

/// alert threshold, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Threshold {
    #[serde(rename = "staticThreshold", rename_all = "camelCase")]
    Static {
        operator: String,
        value: f64,
        #[serde(default)]
        last_updated: i64,
    },
    #[serde(rename = "historicBaseline", rename_all = "camelCase")]
    HistoricBaseline {
        operator: String,
        #[serde(default)]
        last_updated: i64,
        seasonality: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        baseline: Vec<Vec<f64>>,
        deviation_factor: f32,
    },
    #[serde(other)]
    Unknown,
}

/// evaluation window of an alert, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimeThreshold {
    #[serde(rename = "violationsInSequence", rename_all = "camelCase")]
    ViolationsInSequence { time_window: i64 },
    #[serde(rename = "violationsInPeriod", rename_all = "camelCase")]
    ViolationsInPeriod { time_window: i64, violations: i32 },
    #[serde(rename = "requestImpact", rename_all = "camelCase")]
    RequestImpact { time_window: i64, requests: i32 },
    #[serde(rename = "userImpactOfViolationsInSequence", rename_all = "camelCase")]
    UserImpactOfViolationsInSequence {
        time_window: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        users: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percentage: Option<f64>,
        impact_measurement_method: String,
    },
    #[serde(other)]
    Unknown,
}

/// extra field attached to alert notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CustomPayloadField {
    #[serde(rename = "staticString")]
    Static { key: String, value: String },
    #[serde(rename = "dynamic")]
    Dynamic { key: String, value: DynamicValue },
    #[serde(other)]
    Unknown,
}

impl CustomPayloadField {
    pub fn key(&self) -> &str {
        match self {
            CustomPayloadField::Static { key, .. } | CustomPayloadField::Dynamic { key, .. } => key,
            CustomPayloadField::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub tag_name: String,
}

/// who may access a dashboard or application perspective.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    pub access_type: String,
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
}

impl AccessRule {
    /// read-write access for every user.
    pub fn global_read_write() -> Self {
        Self {
            access_type: "READ_WRITE".to_string(),
            relation_type: "GLOBAL".to_string(),
            related_id: None,
        }
    }
}
