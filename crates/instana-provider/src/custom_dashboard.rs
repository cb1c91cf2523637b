//! custom dashboards; widgets travel as opaque json text.

use crate::application_config::{
    access_rule_field, access_rules_from_state, access_rules_to_state, ACCESS_RULE,
};
use crate::common::TITLE;
use instana_core::{FieldSchema, ResourceNameFormatter, Schema, StateMapExt, Validator, Value};
use instana_engine::{
    full_title_to_title, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::CustomDashboard;
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_custom_dashboard";
const SCHEMA_VERSION: u32 = 1;

const WIDGETS: &str = "widgets";

/// compact json text without insignificant whitespace.
/// text that is not json is kept as written so validation can report it.
pub fn normalize_widgets(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn suppress_equal_json(_key: &str, old: &str, new: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(old),
        serde_json::from_str::<serde_json::Value>(new),
    ) {
        (Ok(old), Ok(new)) => old == new,
        _ => old == new,
    }
}

fn validate_widgets(value: &Value, key: &str) -> Result<(), String> {
    let raw = value.as_str().unwrap_or_default();
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(_)) => Ok(()),
        Ok(_) => Err(format!("{key} must be a json array")),
        Err(err) => Err(format!("{key} is not valid json: {err}")),
    }
}

pub struct CustomDashboardResource {
    metadata: ResourceMetadata,
}

impl CustomDashboardResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            TITLE
                .fields("The title of the custom dashboard")
                .into_iter()
                .chain([
                    (ACCESS_RULE, access_rule_field()),
                    (
                        WIDGETS,
                        FieldSchema::string()
                            .required()
                            .state_func(normalize_widgets)
                            .diff_suppress(suppress_equal_json)
                            .validate(Validator::Custom(validate_widgets))
                            .description("The json array of widget definitions"),
                    ),
                ]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for CustomDashboardResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for CustomDashboardResource {
    type Object = CustomDashboard;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_title_to_title)]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<CustomDashboard> {
        api.custom_dashboards()
    }

    fn set_computed_fields(
        &self,
        data: &mut ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        TITLE.set_computed(data, formatter)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        dashboard: &CustomDashboard,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        TITLE.write_state(data, &dashboard.title, formatter)?;
        data.set_all([
            (ACCESS_RULE, access_rules_to_state(&dashboard.access_rules)),
            (WIDGETS, Value::from(dashboard.widgets.to_string())),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<CustomDashboard, ProviderError> {
        let widgets = serde_json::from_str(&data.string(WIDGETS))
            .map_err(|err| ProviderError::invalid(WIDGETS, format!("not valid json: {err}")))?;
        Ok(CustomDashboard {
            id: data.id().to_string(),
            title: TITLE.api_name(data, formatter),
            access_rules: access_rules_from_state(data.state()),
            widgets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instana_restapi::models::AccessRule;
    use serde_json::json;

    fn formatter() -> ResourceNameFormatter {
        ResourceNameFormatter::new("", " (TF managed)")
    }

    #[test]
    fn widgets_are_stored_as_canonical_json() {
        let handle = CustomDashboardResource::new();
        let schema = &handle.metadata().schema;
        let mut data = ResourceData::new(schema);
        data.set(WIDGETS, r#"[ {"id": "w1", "type": "chart"} ]"#)
            .unwrap();
        assert_eq!(data.string(WIDGETS), r#"[{"id":"w1","type":"chart"}]"#);

        let mut planned = data.state().clone();
        planned.insert(
            WIDGETS.to_string(),
            Value::from("[{\n  \"type\": \"chart\",\n  \"id\": \"w1\"\n}]"),
        );
        assert!(schema.diff(data.state(), &planned).is_empty());
    }

    #[test]
    fn invalid_widgets_fail_validation() {
        let handle = CustomDashboardResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set("title", "ops").unwrap();
        data.set(WIDGETS, "[{").unwrap();
        let errors = handle.metadata().schema.validate(data.state());
        assert!(errors.iter().any(|err| err.path == WIDGETS));
        assert!(matches!(
            handle.map_state_to_data_object(&data, &formatter()),
            Err(ProviderError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn dashboard_round_trips() {
        let handle = CustomDashboardResource::new();
        let dashboard = CustomDashboard {
            id: "d1".to_string(),
            title: "ops board (TF managed)".to_string(),
            access_rules: vec![AccessRule::global_read_write()],
            widgets: json!([{"id": "w1", "type": "chart", "config": {"y": 1}}]),
        };
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set_id("d1");
        handle
            .update_state(&mut data, &dashboard, &formatter())
            .unwrap();
        assert_eq!(data.string("title"), "ops board");
        assert_eq!(data.string("full_title"), "ops board (TF managed)");
        assert!(handle.metadata().schema.validate(data.state()).is_empty());
        assert_eq!(
            handle
                .map_state_to_data_object(&data, &formatter())
                .unwrap(),
            dashboard
        );
    }
}
