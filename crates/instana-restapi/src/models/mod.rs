//! json payloads of the instana rest api.

mod alerting_channel;
mod application_alert_config;
mod application_config;
mod common;
mod custom_dashboard;
mod event_specification;
mod rbac_group;
mod sli_config;
mod synthetic;
mod website_alert_config;

pub use alerting_channel::{AlertingChannel, AlertingChannelConfig};
pub use application_alert_config::{
    ApplicationAlertConfig, ApplicationAlertRule, IncludedApplication, IncludedEndpoint,
    IncludedService, LogsRule, MetricRule, StatusCodeRule,
};
pub use application_config::ApplicationConfig;
pub use common::{AccessRule, CustomPayloadField, DynamicValue, Threshold, TimeThreshold};
pub use custom_dashboard::{CustomDashboard, WebsiteMonitoringConfig};
pub use event_specification::{BuiltinEventSpecification, CustomEventRule, CustomEventSpecification};
pub use rbac_group::{Group, PermissionSet, ScopeBinding};
pub use sli_config::{MetricConfiguration, SliConfig, SliEntity};
pub use synthetic::{
    HttpActionConfig, HttpScriptConfig, SyntheticCommonConfig, SyntheticLocation, SyntheticTest,
    SyntheticTestConfig,
};
pub use website_alert_config::{
    WebsiteAlertConfig, WebsiteAlertRule, WebsiteMetricRule, WebsiteValueRule,
};
