use crate::resource::InstanaDataObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permission_set: PermissionSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    #[serde(default)]
    pub application_ids: Vec<ScopeBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_dfq_filter: Option<ScopeBinding>,
    #[serde(default, rename = "kubernetesClusterUUIDs")]
    pub kubernetes_cluster_uuids: Vec<ScopeBinding>,
    #[serde(default, rename = "kubernetesNamespaceUIDs")]
    pub kubernetes_namespace_uids: Vec<ScopeBinding>,
    #[serde(default)]
    pub mobile_app_ids: Vec<ScopeBinding>,
    #[serde(default)]
    pub website_ids: Vec<ScopeBinding>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeBinding {
    pub scope_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_role_id: Option<String>,
}

impl ScopeBinding {
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            scope_role_id: None,
        }
    }
}

impl InstanaDataObject for Group {
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
