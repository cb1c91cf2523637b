use super::common::AccessRule;
use crate::resource::InstanaDataObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDashboard {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    /// widget definitions are passed through untouched.
    #[serde(default)]
    pub widgets: serde_json::Value,
}

impl InstanaDataObject for CustomDashboard {
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
        if self.title.is_empty() {
            return Err("title is missing".to_string());
        }
        Ok(())
    }
}

/// website monitored by end user monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMonitoringConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_name: String,
}

impl InstanaDataObject for WebsiteMonitoringConfig {
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
