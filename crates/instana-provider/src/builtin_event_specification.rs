//! lookup of event specifications shipped with the platform.

use crate::common::{DESCRIPTION, SEVERITY, TRIGGERING};
use instana_core::{FieldSchema, ResourceNameFormatter, Schema, StateMapExt, Value};
use instana_engine::{
    DataSourceHandle, ProviderError, ResourceData, ResourceMetadata, Severity,
};
use instana_restapi::models::BuiltinEventSpecification;
use instana_restapi::{InstanaApi, ReadOnlyRestResource};

pub const DATA_SOURCE_NAME: &str = "instana_builtin_event_spec";

const NAME: &str = "name";
const SHORT_PLUGIN_ID: &str = "short_plugin_id";
const ENABLED: &str = "enabled";

pub struct BuiltinEventSpecificationDataSource {
    metadata: ResourceMetadata,
}

impl BuiltinEventSpecificationDataSource {
    pub fn new() -> Self {
        let schema = Schema::new([
            (
                NAME,
                FieldSchema::string()
                    .required()
                    .description("The name of the builtin event specification"),
            ),
            (
                SHORT_PLUGIN_ID,
                FieldSchema::string()
                    .required()
                    .description("The plugin the event belongs to, e.g. host"),
            ),
            (DESCRIPTION, FieldSchema::string().computed()),
            (SEVERITY, FieldSchema::string().computed()),
            (TRIGGERING, FieldSchema::bool().computed()),
            (ENABLED, FieldSchema::bool().computed()),
        ]);
        Self {
            metadata: ResourceMetadata::new(DATA_SOURCE_NAME, schema, 0),
        }
    }
}

impl Default for BuiltinEventSpecificationDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceHandle for BuiltinEventSpecificationDataSource {
    type Object = BuiltinEventSpecification;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn ReadOnlyRestResource<BuiltinEventSpecification> {
        api.builtin_event_specifications()
    }

    fn matches(
        &self,
        data: &ResourceData<'_>,
        spec: &BuiltinEventSpecification,
        _formatter: &ResourceNameFormatter,
    ) -> bool {
        spec.name == data.string(NAME) && spec.short_plugin_id == data.string(SHORT_PLUGIN_ID)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        spec: &BuiltinEventSpecification,
        _formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        data.set_all([
            (DESCRIPTION, Value::from(spec.description.clone())),
            (
                SEVERITY,
                Value::from(Severity::from_api_code(SEVERITY, spec.severity)?.term()),
            ),
            (TRIGGERING, Value::Bool(spec.triggering)),
            (ENABLED, Value::Bool(spec.enabled)),
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, plugin: &str) -> BuiltinEventSpecification {
        BuiltinEventSpecification {
            id: format!("{plugin}.{name}"),
            short_plugin_id: plugin.to_string(),
            name: name.to_string(),
            description: Some("built in".to_string()),
            severity: 10,
            triggering: false,
            enabled: true,
        }
    }

    #[test]
    fn matches_on_name_and_plugin() {
        let handle = BuiltinEventSpecificationDataSource::new();
        let formatter = ResourceNameFormatter::new("", "");
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set(NAME, "System load too high").unwrap();
        data.set(SHORT_PLUGIN_ID, "host").unwrap();

        assert!(handle.matches(&data, &spec("System load too high", "host"), &formatter));
        assert!(!handle.matches(&data, &spec("System load too high", "jvm"), &formatter));
        assert!(!handle.matches(&data, &spec("Disk full", "host"), &formatter));
    }

    #[test]
    fn writes_computed_attributes() {
        let handle = BuiltinEventSpecificationDataSource::new();
        let formatter = ResourceNameFormatter::new("", "");
        let mut data = ResourceData::new(&handle.metadata().schema);
        handle
            .update_state(&mut data, &spec("Disk full", "host"), &formatter)
            .unwrap();
        assert_eq!(data.string(SEVERITY), "critical");
        assert_eq!(data.string(DESCRIPTION), "built in");
        assert!(data.bool(ENABLED));
    }
}
