//! websites monitored by end user monitoring.

use crate::common::NAME;
use instana_core::{FieldSchema, ResourceNameFormatter, Schema, StateMapExt, Value};
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::WebsiteMonitoringConfig;
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_website_monitoring_config";
const SCHEMA_VERSION: u32 = 1;

const APP_NAME: &str = "app_name";

pub struct WebsiteMonitoringConfigResource {
    metadata: ResourceMetadata,
}

impl WebsiteMonitoringConfigResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            NAME.fields("The name of the website")
                .into_iter()
                .chain([(
                    APP_NAME,
                    FieldSchema::string()
                        .computed()
                        .description("The name assigned by the backend for the website"),
                )]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for WebsiteMonitoringConfigResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for WebsiteMonitoringConfigResource {
    type Object = WebsiteMonitoringConfig;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<WebsiteMonitoringConfig> {
        api.website_monitoring_configs()
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
        config: &WebsiteMonitoringConfig,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &config.name, formatter)?;
        data.set(APP_NAME, Value::from(&config.app_name))?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<WebsiteMonitoringConfig, ProviderError> {
        Ok(WebsiteMonitoringConfig {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            app_name: data.string(APP_NAME),
        })
    }
}
