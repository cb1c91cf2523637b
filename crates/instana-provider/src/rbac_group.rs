//! rbac groups and their permission sets.

use crate::common::NAME;
use instana_core::{
    Element, FieldSchema, ResourceNameFormatter, Schema, SetHash, StateMap, StateMapExt,
    Validator, Value,
};
use instana_engine::polymorphic::state_map;
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::{Group, PermissionSet, ScopeBinding};
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_rbac_group";
const SCHEMA_VERSION: u32 = 1;

const PERMISSION_SET: &str = "permission_set";
const APPLICATION_IDS: &str = "application_ids";
const INFRA_DFQ_FILTER: &str = "infra_dfq_filter";
const KUBERNETES_CLUSTER_UUIDS: &str = "kubernetes_cluster_uuids";
const KUBERNETES_NAMESPACES_UUIDS: &str = "kubernetes_namespaces_uuids";
const MOBILE_APP_IDS: &str = "mobile_app_ids";
const WEBSITE_IDS: &str = "website_ids";
const PERMISSIONS: &str = "permissions";

pub const PERMISSION_NAMES: &[&str] = &[
    "CAN_CONFIGURE_APPLICATIONS",
    "CAN_SEE_ON_PREM_LICENE_INFORMATION",
    "CAN_CONFIGURE_EUM_APPLICATIONS",
    "CAN_CONFIGURE_AGENTS",
    "CAN_VIEW_TRACE_DETAILS",
    "CAN_VIEW_LOGS",
    "CAN_CONFIGURE_SESSION_SETTINGS",
    "CAN_CONFIGURE_INTEGRATIONS",
    "CAN_CONFIGURE_GLOBAL_APPLICATION_SMART_ALERTS",
    "CAN_CONFIGURE_GLOBAL_SYNTHETIC_SMART_ALERTS",
    "CAN_CONFIGURE_GLOBAL_INFRA_SMART_ALERTS",
    "CAN_CONFIGURE_GLOBAL_LOG_SMART_ALERTS",
    "CAN_CONFIGURE_GLOBAL_ALERT_PAYLOAD",
    "CAN_CONFIGURE_MOBILE_APP_MONITORING",
    "CAN_CONFIGURE_API_TOKENS",
    "CAN_CONFIGURE_SERVICE_LEVEL_CORRECTION_WINDOWS",
    "CAN_CONFIGURE_AUTHENTICATION_METHODS",
    "CAN_CONFIGURE_RELEASES",
    "CAN_VIEW_AUDIT_LOG",
    "CAN_CONFIGURE_EVENTS_AND_ALERTS",
    "CAN_CONFIGURE_MAINTENANCE_WINDOWS",
    "CAN_CONFIGURE_APPLICATION_SMART_ALERTS",
    "CAN_CONFIGURE_WEBSITE_SMART_ALERTS",
    "CAN_CONFIGURE_MOBILE_APP_SMART_ALERTS",
    "CAN_CONFIGURE_USERS",
    "CAN_EDIT_ALL_ACCESSIBLE_CUSTOM_DASHBOARDS",
    "CAN_CONFIGURE_SERVICE_MAPPING",
    "CAN_CONFIGURE_SYNTHETIC_TESTS",
    "CAN_CONFIGURE_SYNTHETIC_LOCATIONS",
    "CAN_CONFIGURE_SYNTHETIC_CREDENTIALS",
    "CAN_CONFIGURE_PERSONAL_API_TOKENS",
    "CAN_CONFIGURE_TEAMS",
    "CAN_CREATE_PUBLIC_CUSTOM_DASHBOARDS",
    "CAN_CONFIGURE_LOG_MANAGEMENT",
    "CAN_CONFIGURE_AUTOMATION_ACTIONS",
    "CAN_RUN_AUTOMATION_ACTIONS",
    "CAN_USE_SYNTHETIC_CREDENTIALS",
    "CAN_CONFIGURE_BIZOPS",
    "ACCESS_INFRASTRUCTURE_ANALYZE",
    "LIMITED_APPLICATIONS_SCOPE",
    "LIMITED_BIZOPS_SCOPE",
    "LIMITED_WEBSITES_SCOPE",
    "LIMITED_KUBERNETES_SCOPE",
    "LIMITED_MOBILE_APPS_SCOPE",
    "LIMITED_INFRASTRUCTURE_SCOPE",
    "LIMITED_SYNTHETICS_SCOPE",
    "LIMITED_VSPHERE_SCOPE",
    "LIMITED_PHMC_SCOPE",
    "LIMITED_PVC_SCOPE",
    "LIMITED_ZHMC_SCOPE",
    "LIMITED_PCF_SCOPE",
    "LIMITED_OPENSTACK_SCOPE",
    "LIMITED_AUTOMATION_SCOPE",
    "LIMITED_LOGS_SCOPE",
    "LIMITED_NUTANIX_SCOPE",
    "LIMITED_XEN_SCOPE",
    "LIMITED_WINDOWS_HYPERVISOR_SCOPE",
    "LIMITED_ALERT_CHANNELS_SCOPE",
    "LIMITED_LINUX_KVM_HYPERVISOR_SCOPE",
];

/// scope binding fields, each a set of ids.
const SCOPE_SETS: &[&str] = &[
    APPLICATION_IDS,
    KUBERNETES_CLUSTER_UUIDS,
    KUBERNETES_NAMESPACES_UUIDS,
    MOBILE_APP_IDS,
    WEBSITE_IDS,
];

fn permission_set_field() -> FieldSchema {
    let schema = Schema::new(
        SCOPE_SETS
            .iter()
            .map(|key| (*key, FieldSchema::string_set().optional())),
    )
    .with(INFRA_DFQ_FILTER, FieldSchema::string().optional())
    .with(
        PERMISSIONS,
        FieldSchema::set(Element::String, SetHash::Element)
            .optional()
            .validate(Validator::OneOf(PERMISSION_NAMES)),
    );
    FieldSchema::block(schema)
        .optional()
        .description("The permission set of the group")
}

fn bindings(state: &StateMap, key: &str) -> Vec<ScopeBinding> {
    state.strings(key).into_iter().map(ScopeBinding::new).collect()
}

fn scope_ids(bindings: &[ScopeBinding]) -> Value {
    Value::string_set(bindings.iter().map(|binding| binding.scope_id.clone()))
}

fn permission_set_from_state(state: &StateMap) -> PermissionSet {
    let Some(set) = state.block(PERMISSION_SET) else {
        return PermissionSet::default();
    };
    PermissionSet {
        application_ids: bindings(set, APPLICATION_IDS),
        infra_dfq_filter: set.opt_string(INFRA_DFQ_FILTER).map(ScopeBinding::new),
        kubernetes_cluster_uuids: bindings(set, KUBERNETES_CLUSTER_UUIDS),
        kubernetes_namespace_uids: bindings(set, KUBERNETES_NAMESPACES_UUIDS),
        mobile_app_ids: bindings(set, MOBILE_APP_IDS),
        website_ids: bindings(set, WEBSITE_IDS),
        permissions: set.strings(PERMISSIONS),
    }
}

fn permission_set_to_state(set: &PermissionSet) -> Value {
    if *set == PermissionSet::default() {
        return Value::empty_list();
    }
    let fields = state_map([
        (APPLICATION_IDS, scope_ids(&set.application_ids)),
        (
            INFRA_DFQ_FILTER,
            Value::from(set.infra_dfq_filter.as_ref().map(|b| b.scope_id.clone())),
        ),
        (KUBERNETES_CLUSTER_UUIDS, scope_ids(&set.kubernetes_cluster_uuids)),
        (KUBERNETES_NAMESPACES_UUIDS, scope_ids(&set.kubernetes_namespace_uids)),
        (MOBILE_APP_IDS, scope_ids(&set.mobile_app_ids)),
        (WEBSITE_IDS, scope_ids(&set.website_ids)),
        (PERMISSIONS, Value::string_set(set.permissions.iter().cloned())),
    ]);
    Value::List(vec![Value::Map(
        fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect(),
    )])
}

pub struct RbacGroupResource {
    metadata: ResourceMetadata,
}

impl RbacGroupResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            NAME.fields("The name of the group")
                .into_iter()
                .chain([(PERMISSION_SET, permission_set_field())]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for RbacGroupResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for RbacGroupResource {
    type Object = Group;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(&'a self, api: &'a dyn InstanaApi) -> &'a dyn RestResource<Group> {
        api.rbac_groups()
    }

    fn set_computed_fields(
        &self,
        data: &mut ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.set_computed(data, formatter)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        group: &Group,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &group.name, formatter)?;
        data.set(PERMISSION_SET, permission_set_to_state(&group.permission_set))?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<Group, ProviderError> {
        Ok(Group {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            permission_set: permission_set_from_state(data.state()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn formatter() -> ResourceNameFormatter {
        ResourceNameFormatter::new("", " (TF managed)")
    }

    #[test]
    fn permission_set_maps_to_scope_bindings() {
        let handle = RbacGroupResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set("name", "ops").unwrap();
        data.set(
            PERMISSION_SET,
            Value::block([
                (APPLICATION_IDS, Value::string_set(["app-1"])),
                (INFRA_DFQ_FILTER, Value::from("entity.zone:eu")),
                (KUBERNETES_NAMESPACES_UUIDS, Value::string_set(["ns-1"])),
                (
                    PERMISSIONS,
                    Value::string_set(["CAN_CONFIGURE_APPLICATIONS", "CAN_VIEW_LOGS"]),
                ),
            ]),
        )
        .unwrap();

        let group = handle
            .map_state_to_data_object(&data, &formatter())
            .unwrap();
        let body = serde_json::to_value(&group).unwrap();
        assert_eq!(body["name"], json!("ops (TF managed)"));
        assert_eq!(
            body["permissionSet"]["applicationIds"],
            json!([{"scopeId": "app-1"}])
        );
        assert_eq!(
            body["permissionSet"]["infraDfqFilter"],
            json!({"scopeId": "entity.zone:eu"})
        );
        assert_eq!(
            body["permissionSet"]["kubernetesNamespaceUIDs"],
            json!([{"scopeId": "ns-1"}])
        );
    }

    #[test]
    fn group_round_trips() {
        let handle = RbacGroupResource::new();
        let group = Group {
            id: "g1".to_string(),
            name: "ops (TF managed)".to_string(),
            permission_set: PermissionSet {
                website_ids: vec![ScopeBinding::new("site-1")],
                permissions: vec!["CAN_CONFIGURE_USERS".to_string()],
                ..PermissionSet::default()
            },
        };
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set_id("g1");
        handle.update_state(&mut data, &group, &formatter()).unwrap();
        assert_eq!(data.string("name"), "ops");
        assert!(handle.metadata().schema.validate(data.state()).is_empty());
        assert_eq!(
            handle
                .map_state_to_data_object(&data, &formatter())
                .unwrap(),
            group
        );
    }

    #[test]
    fn empty_permission_set_is_omitted() {
        let handle = RbacGroupResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set("name", "readers").unwrap();
        let group = handle
            .map_state_to_data_object(&data, &formatter())
            .unwrap();
        assert_eq!(group.permission_set, PermissionSet::default());
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let handle = RbacGroupResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set("name", "ops").unwrap();
        data.set(
            PERMISSION_SET,
            Value::block([(PERMISSIONS, Value::string_set(["CAN_FLY"]))]),
        )
        .unwrap();
        assert!(!handle.metadata().schema.validate(data.state()).is_empty());
    }
}
