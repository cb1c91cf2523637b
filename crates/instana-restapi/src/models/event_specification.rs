use crate::resource::InstanaDataObject;
use serde::{Deserialize, Serialize};

/// user defined event raised by one or more rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEventSpecification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub triggering: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rule_logical_operator")]
    pub rule_logical_operator: String,
    #[serde(default)]
    pub rules: Vec<CustomEventRule>,
}

fn default_rule_logical_operator() -> String {
    "AND".to_string()
}

/// rule of a custom event, discriminated by `ruleType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ruleType")]
pub enum CustomEventRule {
    #[serde(rename = "threshold", rename_all = "camelCase")]
    Threshold {
        severity: i32,
        metric_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rollup: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<String>,
        condition_operator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition_value: Option<f64>,
    },
    #[serde(rename = "system", rename_all = "camelCase")]
    System { severity: i32, system_rule_id: String },
    #[serde(rename = "entity_verification", rename_all = "camelCase")]
    EntityVerification {
        severity: i32,
        matching_entity_type: String,
        matching_operator: String,
        matching_entity_label: String,
        offline_duration: i64,
    },
    #[serde(other)]
    Unknown,
}

impl InstanaDataObject for CustomEventSpecification {
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
        if self.entity_type.is_empty() {
            return Err("entity type is missing".to_string());
        }
        Ok(())
    }
}

/// event specification shipped with the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltinEventSpecification {
    pub id: String,
    pub short_plugin_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: i32,
    #[serde(default)]
    pub triggering: bool,
    #[serde(default)]
    pub enabled: bool,
}

impl InstanaDataObject for BuiltinEventSpecification {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
