use crate::resource::InstanaDataObject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticTest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    pub configuration: SyntheticTestConfig,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_playback_mode")]
    pub playback_mode: String,
    #[serde(default = "default_test_frequency")]
    pub test_frequency: i32,
}

fn default_playback_mode() -> String {
    "Simultaneous".to_string()
}

fn default_test_frequency() -> i32 {
    15
}

/// settings every synthetic configuration carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticCommonConfig {
    #[serde(default)]
    pub mark_synthetic_call: bool,
    #[serde(default)]
    pub retries: i32,
    #[serde(default)]
    pub retry_interval: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpActionConfig {
    #[serde(flatten)]
    pub common: SyntheticCommonConfig,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_string: Option<String>,
    #[serde(default)]
    pub follow_redirect: bool,
    #[serde(default)]
    pub allow_insecure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_match: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpScriptConfig {
    #[serde(flatten)]
    pub common: SyntheticCommonConfig,
    pub script: String,
}

/// test configuration, discriminated by `syntheticType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "syntheticType")]
pub enum SyntheticTestConfig {
    #[serde(rename = "HTTPAction")]
    HttpAction(HttpActionConfig),
    #[serde(rename = "HTTPScript")]
    HttpScript(HttpScriptConfig),
    #[serde(other)]
    Unknown,
}

impl InstanaDataObject for SyntheticTest {
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
        if self.label.is_empty() {
            return Err("label is missing".to_string());
        }
        Ok(())
    }
}

/// point of presence running synthetic tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticLocation {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub display_label: String,
    pub location_type: String,
}

impl InstanaDataObject for SyntheticLocation {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
