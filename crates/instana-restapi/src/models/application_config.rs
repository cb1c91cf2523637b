use super::common::AccessRule;
use crate::resource::InstanaDataObject;
use instana_core::tagfilter::TagFilterModel;
use serde::{Deserialize, Serialize};

/// application perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    pub scope: String,
    pub boundary_scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_filter_expression: Option<TagFilterModel>,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
}

impl InstanaDataObject for ApplicationConfig {
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
