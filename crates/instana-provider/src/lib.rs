//! resource handles and data sources for the instana provider.

pub mod alerting_channel;
pub mod application_alert_config;
pub mod application_config;
pub mod builtin_event_specification;
mod common;
pub mod config;
pub mod custom_dashboard;
pub mod custom_event_specification;
pub mod rbac_group;
pub mod sli_config;
pub mod synthetic_location;
pub mod website_alert_config;
pub mod website_monitoring_config;

pub use alerting_channel::{
    AlertingChannelDataSource, AlertingChannelKindResource, AlertingChannelResource, ChannelKind,
};
pub use application_alert_config::ApplicationAlertConfigResource;
pub use application_config::ApplicationConfigResource;
pub use builtin_event_specification::BuiltinEventSpecificationDataSource;
pub use config::ProviderConfig;
pub use custom_dashboard::CustomDashboardResource;
pub use custom_event_specification::CustomEventSpecificationResource;
pub use rbac_group::RbacGroupResource;
pub use sli_config::SliConfigResource;
pub use synthetic_location::SyntheticLocationDataSource;
pub use synthetic_test::SyntheticTestResource;
pub use website_alert_config::WebsiteAlertConfigResource;
pub use website_monitoring_config::WebsiteMonitoringConfigResource;

use instana_engine::ProviderRegistry;

/// registry holding every resource and data source the provider offers.
pub fn provider_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry
        .register_resource(AlertingChannelResource::new())
        .register_resource(ApplicationConfigResource::new())
        .register_resource(ApplicationAlertConfigResource::new())
        .register_resource(ApplicationAlertConfigResource::global())
        .register_resource(WebsiteAlertConfigResource::new())
        .register_resource(CustomEventSpecificationResource::new())
        .register_resource(RbacGroupResource::new())
        .register_resource(SliConfigResource::new())
        .register_resource(SyntheticTestResource::new())
        .register_resource(CustomDashboardResource::new())
        .register_resource(WebsiteMonitoringConfigResource::new());
    for kind in ChannelKind::ALL {
        registry.register_resource(AlertingChannelKindResource::new(kind));
    }
    registry
        .register_data_source(AlertingChannelDataSource::new())
        .register_data_source(SyntheticLocationDataSource::new())
        .register_data_source(BuiltinEventSpecificationDataSource::new());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use instana_core::{StateMap, Value};
    use instana_engine::upgrade_state;

    #[test]
    fn registry_lists_every_resource_family() {
        let registry = provider_registry();
        let names: Vec<&str> = registry.resources().map(|resource| resource.name()).collect();
        assert_eq!(names.len(), 20);
        for name in [
            "instana_alerting_channel",
            "instana_alerting_channel_webhook",
            "instana_application_config",
            "instana_application_alert_config",
            "instana_global_application_alert_config",
            "instana_website_alert_config",
            "instana_custom_event_specification",
            "instana_rbac_group",
            "instana_sli_config",
            "instana_synthetic_test",
            "instana_custom_dashboard",
            "instana_website_monitoring_config",
        ] {
            assert!(registry.resource(name).is_some(), "{name} is not registered");
        }
        assert_eq!(
            registry
                .resource("instana_application_config")
                .map(|resource| resource.schema_version()),
            Some(2)
        );

        let sources: Vec<&str> = registry.data_sources().map(|source| source.name()).collect();
        assert_eq!(
            sources,
            vec![
                "instana_alerting_channel",
                "instana_builtin_event_spec",
                "instana_synthetic_location"
            ]
        );
    }

    #[test]
    fn every_schema_version_has_an_upgrader_chain() {
        let registry = provider_registry();
        for resource in registry.resources() {
            let upgraders = resource.state_upgraders();
            assert_eq!(
                upgraders.len() as u32,
                resource.schema_version(),
                "{} upgrader chain",
                resource.name()
            );
        }
    }

    #[test]
    fn legacy_full_names_upgrade_into_the_validated_name_field() {
        let registry = provider_registry();
        for resource in registry.resources() {
            let upgraders = resource.state_upgraders();
            if upgraders.is_empty() {
                continue;
            }
            let schema = resource.schema();
            let Some(key) = ["name", "label", "title"]
                .into_iter()
                .find(|key| schema.field(key).is_some())
            else {
                panic!("{} has no name field", resource.name());
            };

            let mut legacy = StateMap::new();
            legacy.insert(format!("full_{key}"), Value::from("legacy"));
            let upgraded = upgrade_state(&upgraders, 0, legacy).unwrap();

            assert_eq!(
                upgraded.get(key),
                Some(&Value::from("legacy")),
                "{} did not carry full_{key} into {key}",
                resource.name()
            );
            assert!(
                !upgraded.contains_key(&format!("full_{key}")),
                "{} kept full_{key}",
                resource.name()
            );
            let errors = schema.validate(&upgraded);
            assert!(
                errors.iter().all(|error| error.path != key),
                "{} rejects the upgraded {key}: {errors:?}",
                resource.name()
            );
        }
    }
}
