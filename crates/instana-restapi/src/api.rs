//! api façade exposing one facet per resource family.

use crate::client::{ClientConfig, RestClient};
use crate::error::RestError;
use crate::models::{
    AlertingChannel, ApplicationAlertConfig, ApplicationConfig, BuiltinEventSpecification,
    CustomDashboard, CustomEventSpecification, Group, SliConfig, SyntheticLocation,
    SyntheticTest, WebsiteAlertConfig, WebsiteMonitoringConfig,
};
use crate::resource::{
    DefaultRestResource, ReadOnlyResource, ReadOnlyRestResource, RestResource, UpsertMode,
};
use std::sync::Arc;

pub const ALERTING_CHANNELS_PATH: &str = "/api/events/settings/alertingChannels";
pub const APPLICATION_CONFIGS_PATH: &str = "/api/application-monitoring/settings/application";
pub const APPLICATION_ALERT_CONFIGS_PATH: &str = "/api/events/settings/application-alert-configs";
pub const GLOBAL_APPLICATION_ALERT_CONFIGS_PATH: &str =
    "/api/events/settings/global-alert-configs/applications";
pub const WEBSITE_ALERT_CONFIGS_PATH: &str = "/api/events/settings/website-alert-configs";
pub const CUSTOM_EVENT_SPECIFICATIONS_PATH: &str =
    "/api/events/settings/event-specifications/custom";
pub const BUILTIN_EVENT_SPECIFICATIONS_PATH: &str =
    "/api/events/settings/event-specifications/built-in";
pub const RBAC_GROUPS_PATH: &str = "/api/settings/rbac/groups";
pub const SLI_CONFIGS_PATH: &str = "/api/settings/v2/slis";
pub const SYNTHETIC_TESTS_PATH: &str = "/api/synthetics/settings/tests";
pub const SYNTHETIC_LOCATIONS_PATH: &str = "/api/synthetics/settings/locations";
pub const CUSTOM_DASHBOARDS_PATH: &str = "/api/custom-dashboard";
pub const WEBSITE_MONITORING_CONFIGS_PATH: &str = "/api/website-monitoring/config";

/// access to every rest facet of the platform.
pub trait InstanaApi: Send + Sync {
    fn alerting_channels(&self) -> &dyn RestResource<AlertingChannel>;
    fn application_configs(&self) -> &dyn RestResource<ApplicationConfig>;
    fn application_alert_configs(&self) -> &dyn RestResource<ApplicationAlertConfig>;
    fn global_application_alert_configs(&self) -> &dyn RestResource<ApplicationAlertConfig>;
    fn website_alert_configs(&self) -> &dyn RestResource<WebsiteAlertConfig>;
    fn custom_event_specifications(&self) -> &dyn RestResource<CustomEventSpecification>;
    fn builtin_event_specifications(&self) -> &dyn ReadOnlyRestResource<BuiltinEventSpecification>;
    fn rbac_groups(&self) -> &dyn RestResource<Group>;
    fn sli_configs(&self) -> &dyn RestResource<SliConfig>;
    fn synthetic_tests(&self) -> &dyn RestResource<SyntheticTest>;
    fn synthetic_locations(&self) -> &dyn ReadOnlyRestResource<SyntheticLocation>;
    fn custom_dashboards(&self) -> &dyn RestResource<CustomDashboard>;
    fn website_monitoring_configs(&self) -> &dyn RestResource<WebsiteMonitoringConfig>;
}

/// reqwest backed implementation of [`InstanaApi`].
pub struct InstanaClient {
    client: Arc<RestClient>,
    alerting_channels: DefaultRestResource<AlertingChannel>,
    application_configs: DefaultRestResource<ApplicationConfig>,
    application_alert_configs: DefaultRestResource<ApplicationAlertConfig>,
    global_application_alert_configs: DefaultRestResource<ApplicationAlertConfig>,
    website_alert_configs: DefaultRestResource<WebsiteAlertConfig>,
    custom_event_specifications: DefaultRestResource<CustomEventSpecification>,
    builtin_event_specifications: ReadOnlyResource<BuiltinEventSpecification>,
    rbac_groups: DefaultRestResource<Group>,
    sli_configs: DefaultRestResource<SliConfig>,
    synthetic_tests: DefaultRestResource<SyntheticTest>,
    synthetic_locations: ReadOnlyResource<SyntheticLocation>,
    custom_dashboards: DefaultRestResource<CustomDashboard>,
    website_monitoring_configs: DefaultRestResource<WebsiteMonitoringConfig>,
}

impl InstanaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RestError> {
        let client = Arc::new(RestClient::new(config)?);
        Ok(Self {
            alerting_channels: DefaultRestResource::new(
                client.clone(),
                ALERTING_CHANNELS_PATH,
                UpsertMode::PutGeneratedId,
            ),
            application_configs: DefaultRestResource::new(
                client.clone(),
                APPLICATION_CONFIGS_PATH,
                UpsertMode::PutGeneratedId,
            ),
            application_alert_configs: DefaultRestResource::new(
                client.clone(),
                APPLICATION_ALERT_CONFIGS_PATH,
                UpsertMode::PostCollectionPostId,
            ),
            global_application_alert_configs: DefaultRestResource::new(
                client.clone(),
                GLOBAL_APPLICATION_ALERT_CONFIGS_PATH,
                UpsertMode::PostCollectionPostId,
            ),
            website_alert_configs: DefaultRestResource::new(
                client.clone(),
                WEBSITE_ALERT_CONFIGS_PATH,
                UpsertMode::PostCollectionPostId,
            ),
            custom_event_specifications: DefaultRestResource::new(
                client.clone(),
                CUSTOM_EVENT_SPECIFICATIONS_PATH,
                UpsertMode::PutGeneratedId,
            ),
            builtin_event_specifications: ReadOnlyResource::new(
                client.clone(),
                BUILTIN_EVENT_SPECIFICATIONS_PATH,
            ),
            rbac_groups: DefaultRestResource::new(
                client.clone(),
                RBAC_GROUPS_PATH,
                UpsertMode::PutGeneratedId,
            ),
            sli_configs: DefaultRestResource::new(
                client.clone(),
                SLI_CONFIGS_PATH,
                UpsertMode::PostCollectionPutId,
            ),
            synthetic_tests: DefaultRestResource::new(
                client.clone(),
                SYNTHETIC_TESTS_PATH,
                UpsertMode::PostCollectionPutId,
            ),
            synthetic_locations: ReadOnlyResource::new(client.clone(), SYNTHETIC_LOCATIONS_PATH),
            custom_dashboards: DefaultRestResource::new(
                client.clone(),
                CUSTOM_DASHBOARDS_PATH,
                UpsertMode::PostCollectionPutId,
            ),
            website_monitoring_configs: DefaultRestResource::new(
                client.clone(),
                WEBSITE_MONITORING_CONFIGS_PATH,
                UpsertMode::PostCollectionPutId,
            ),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

impl InstanaApi for InstanaClient {
    fn alerting_channels(&self) -> &dyn RestResource<AlertingChannel> {
        &self.alerting_channels
    }

    fn application_configs(&self) -> &dyn RestResource<ApplicationConfig> {
        &self.application_configs
    }

    fn application_alert_configs(&self) -> &dyn RestResource<ApplicationAlertConfig> {
        &self.application_alert_configs
    }

    fn global_application_alert_configs(&self) -> &dyn RestResource<ApplicationAlertConfig> {
        &self.global_application_alert_configs
    }

    fn website_alert_configs(&self) -> &dyn RestResource<WebsiteAlertConfig> {
        &self.website_alert_configs
    }

    fn custom_event_specifications(&self) -> &dyn RestResource<CustomEventSpecification> {
        &self.custom_event_specifications
    }

    fn builtin_event_specifications(
        &self,
    ) -> &dyn ReadOnlyRestResource<BuiltinEventSpecification> {
        &self.builtin_event_specifications
    }

    fn rbac_groups(&self) -> &dyn RestResource<Group> {
        &self.rbac_groups
    }

    fn sli_configs(&self) -> &dyn RestResource<SliConfig> {
        &self.sli_configs
    }

    fn synthetic_tests(&self) -> &dyn RestResource<SyntheticTest> {
        &self.synthetic_tests
    }

    fn synthetic_locations(&self) -> &dyn ReadOnlyRestResource<SyntheticLocation> {
        &self.synthetic_locations
    }

    fn custom_dashboards(&self) -> &dyn RestResource<CustomDashboard> {
        &self.custom_dashboards
    }

    fn website_monitoring_configs(&self) -> &dyn RestResource<WebsiteMonitoringConfig> {
        &self.website_monitoring_configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertingChannelConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn facets_target_their_collections() {
        let server = MockServer::start();
        let locations = server.mock(|when, then| {
            when.method(GET).path(SYNTHETIC_LOCATIONS_PATH);
            then.status(200).json_body(json!([
                {"id": "loc1", "label": "Berlin", "displayLabel": "Berlin", "locationType": "Managed"}
            ]));
        });
        let channel = server.mock(|when, then| {
            when.method(GET).path(format!("{ALERTING_CHANNELS_PATH}/c1"));
            then.status(200).json_body(json!({
                "id": "c1", "name": "chan", "kind": "EMAIL", "emails": ["a@b.c"]
            }));
        });

        let api = InstanaClient::new(&ClientConfig {
            base_url: server.base_url(),
            api_token: "token".to_string(),
            skip_tls_verify: false,
        })
        .unwrap();

        let found = api.synthetic_locations().get_all().await.unwrap();
        assert_eq!(found[0].label, "Berlin");
        let fetched = api.alerting_channels().get_one("c1").await.unwrap();
        assert_eq!(fetched.name, "chan");

        locations.assert();
        channel.assert();
    }

    #[tokio::test]
    async fn alerting_channel_create_puts_to_generated_id() {
        let server = MockServer::start();
        let created = server.mock(|when, then| {
            when.method(PUT)
                .path_contains(format!("{ALERTING_CHANNELS_PATH}/"))
                .json_body_partial(r#"{"kind": "OFFICE_365", "name": "chan"}"#);
            then.status(200).json_body(json!({
                "id": "generated", "name": "chan", "kind": "OFFICE_365", "webhookUrl": "https://x"
            }));
        });

        let api = InstanaClient::new(&ClientConfig {
            base_url: server.base_url(),
            api_token: "token".to_string(),
            skip_tls_verify: false,
        })
        .unwrap();

        let channel = AlertingChannel {
            id: String::new(),
            name: "chan".to_string(),
            config: AlertingChannelConfig::Office365 {
                webhook_url: "https://x".to_string(),
            },
        };
        let written = api.alerting_channels().create(&channel).await.unwrap();
        created.assert();
        assert_eq!(written.id, "generated");
    }
}
