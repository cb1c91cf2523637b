//! smart alerts on application perspectives, scoped per application or globally.

use crate::common::{
    aggregation_field, alert_channel_ids_field, boundary_scope_field,
    custom_payload_field_field, custom_payload_fields_from_state, custom_payload_fields_to_state,
    granularity_field, int32, severity_field, severity_from_state, severity_to_state,
    tag_filter_from_state, threshold_field, threshold_from_state, threshold_to_state,
    time_threshold_field, time_threshold_from_state, time_threshold_to_state, triggering_field,
    variants_field, variants_value, ALERT_CHANNEL_IDS, APPLICATION_TIME_THRESHOLDS,
    BOUNDARY_SCOPE, CUSTOM_PAYLOAD_FIELD, DESCRIPTION, GRANULARITY, NAME, SEVERITY, TAG_FILTER,
    THRESHOLD, TIME_THRESHOLD, TRIGGERING,
};
use instana_core::tagfilter::{tag_filter_field, tag_filter_from_api};
use instana_core::{
    Element, FieldSchema, ResourceNameFormatter, Schema, SetHash, StateMap, StateMapExt,
    Validator, Value,
};
use instana_engine::polymorphic::{required_block, select_variant, state_map};
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::{
    ApplicationAlertConfig, ApplicationAlertRule, IncludedApplication, IncludedEndpoint,
    IncludedService, LogsRule, MetricRule, StatusCodeRule,
};
use instana_restapi::{InstanaApi, RestResource};
use std::collections::BTreeMap;

pub const RESOURCE_NAME: &str = "instana_application_alert_config";
pub const GLOBAL_RESOURCE_NAME: &str = "instana_global_application_alert_config";
const SCHEMA_VERSION: u32 = 1;

const BOUNDARY_SCOPES: &[&str] = &["ALL", "INBOUND"];
const EVALUATION_TYPES: &[&str] = &["PER_AP", "PER_AP_SERVICE", "PER_AP_ENDPOINT"];
const LOG_LEVELS: &[&str] = &["WARN", "ERROR", "ANY"];
const LOG_OPERATORS: &[&str] = &[
    "EQUALS",
    "NOT_EQUAL",
    "CONTAINS",
    "NOT_CONTAIN",
    "STARTS_WITH",
    "ENDS_WITH",
    "NOT_STARTS_WITH",
    "NOT_ENDS_WITH",
    "IS_EMPTY",
    "NOT_EMPTY",
    "IS_BLANK",
    "NOT_BLANK",
];

const APPLICATION: &str = "application";
const SERVICE: &str = "service";
const ENDPOINT: &str = "endpoint";
const EVALUATION_TYPE: &str = "evaluation_type";
const INCLUDE_INTERNAL: &str = "include_internal";
const INCLUDE_SYNTHETIC: &str = "include_synthetic";

pub const RULE: &str = "rule";
const THROUGHPUT: &str = "throughput";
const SLOWNESS: &str = "slowness";
const ERROR_RATE: &str = "error_rate";
const ERRORS: &str = "errors";
const STATUS_CODE: &str = "status_code";
const LOGS: &str = "logs";
pub const RULE_VARIANTS: &[&str] = &[THROUGHPUT, SLOWNESS, ERROR_RATE, ERRORS, STATUS_CODE, LOGS];

fn rule_schema(variant: &str) -> Schema {
    let base = Schema::new([
        (
            "metric_name",
            FieldSchema::string()
                .required()
                .validate(Validator::NonEmpty),
        ),
        ("aggregation", aggregation_field()),
    ]);
    match variant {
        STATUS_CODE => base
            .with("status_code_start", FieldSchema::int().optional())
            .with("status_code_end", FieldSchema::int().optional()),
        LOGS => base
            .with(
                "level",
                FieldSchema::string()
                    .required()
                    .validate(Validator::OneOf(LOG_LEVELS)),
            )
            .with("message", FieldSchema::string().optional())
            .with(
                "operator",
                FieldSchema::string()
                    .required()
                    .validate(Validator::OneOf(LOG_OPERATORS)),
            ),
        _ => base,
    }
}

pub fn rule_field() -> FieldSchema {
    variants_field(
        RULE_VARIANTS
            .iter()
            .map(|variant| (*variant, rule_schema(variant)))
            .collect(),
    )
}

fn metric_rule(fields: &StateMap) -> MetricRule {
    MetricRule {
        metric_name: fields.string("metric_name"),
        aggregation: fields.opt_string("aggregation"),
    }
}

pub fn rule_from_state(state: &StateMap) -> Result<ApplicationAlertRule, ProviderError> {
    let container = required_block(state, RULE)?;
    let (variant, fields) = select_variant(container, RULE, RULE_VARIANTS)?;
    let rule = match variant {
        THROUGHPUT => ApplicationAlertRule::Throughput(metric_rule(fields)),
        SLOWNESS => ApplicationAlertRule::Slowness(metric_rule(fields)),
        ERROR_RATE => ApplicationAlertRule::ErrorRate(metric_rule(fields)),
        ERRORS => ApplicationAlertRule::Errors(metric_rule(fields)),
        STATUS_CODE => ApplicationAlertRule::StatusCode(StatusCodeRule {
            metric_name: fields.string("metric_name"),
            aggregation: fields.opt_string("aggregation"),
            status_code_start: fields
                .opt_i64("status_code_start")
                .map(|code| int32("status_code_start", code))
                .transpose()?,
            status_code_end: fields
                .opt_i64("status_code_end")
                .map(|code| int32("status_code_end", code))
                .transpose()?,
        }),
        _ => ApplicationAlertRule::Logs(LogsRule {
            metric_name: fields.string("metric_name"),
            aggregation: fields.opt_string("aggregation"),
            level: fields.string("level"),
            message: fields.opt_string("message"),
            operator: fields.string("operator"),
        }),
    };
    Ok(rule)
}

fn metric_rule_state(rule: &MetricRule) -> StateMap {
    state_map([
        ("metric_name", Value::from(&rule.metric_name)),
        ("aggregation", Value::from(rule.aggregation.clone())),
    ])
}

pub fn rule_to_state(rule: &ApplicationAlertRule) -> Result<Value, ProviderError> {
    let (variant, fields) = match rule {
        ApplicationAlertRule::Throughput(rule) => (THROUGHPUT, metric_rule_state(rule)),
        ApplicationAlertRule::Slowness(rule) => (SLOWNESS, metric_rule_state(rule)),
        ApplicationAlertRule::ErrorRate(rule) => (ERROR_RATE, metric_rule_state(rule)),
        ApplicationAlertRule::Errors(rule) => (ERRORS, metric_rule_state(rule)),
        ApplicationAlertRule::StatusCode(rule) => (
            STATUS_CODE,
            state_map([
                ("metric_name", Value::from(&rule.metric_name)),
                ("aggregation", Value::from(rule.aggregation.clone())),
                ("status_code_start", Value::from(rule.status_code_start)),
                ("status_code_end", Value::from(rule.status_code_end)),
            ]),
        ),
        ApplicationAlertRule::Logs(rule) => (
            LOGS,
            state_map([
                ("metric_name", Value::from(&rule.metric_name)),
                ("aggregation", Value::from(rule.aggregation.clone())),
                ("level", Value::from(&rule.level)),
                ("message", Value::from(rule.message.clone())),
                ("operator", Value::from(&rule.operator)),
            ]),
        ),
        ApplicationAlertRule::Unknown => {
            return Err(ProviderError::unknown_discriminator(RULE, "unknown"))
        }
    };
    Ok(variants_value(RULE_VARIANTS, variant, fields))
}

fn application_field() -> FieldSchema {
    let inclusive = || FieldSchema::bool().required();
    let endpoint = Schema::new([
        ("endpoint_id", FieldSchema::string().required()),
        ("inclusive", inclusive()),
    ]);
    let service = Schema::new([
        ("service_id", FieldSchema::string().required()),
        ("inclusive", inclusive()),
        (
            ENDPOINT,
            FieldSchema::set(Element::Resource(endpoint), SetHash::Key("endpoint_id"))
                .optional(),
        ),
    ]);
    let application = Schema::new([
        ("application_id", FieldSchema::string().required()),
        ("inclusive", inclusive()),
        (
            SERVICE,
            FieldSchema::set(Element::Resource(service), SetHash::Key("service_id")).optional(),
        ),
    ]);
    FieldSchema::set(Element::Resource(application), SetHash::Key("application_id"))
        .required()
        .min_items(1)
        .description("Applications, services and endpoints the alert applies to")
}

fn nested_maps<'a>(state: &'a StateMap, key: &str) -> impl Iterator<Item = &'a StateMap> {
    state.list(key).iter().filter_map(Value::as_map)
}

fn applications_from_state(state: &StateMap) -> BTreeMap<String, IncludedApplication> {
    nested_maps(state, APPLICATION)
        .map(|application| {
            let services = nested_maps(application, SERVICE)
                .map(|service| {
                    let endpoints = nested_maps(service, ENDPOINT)
                        .map(|endpoint| {
                            let endpoint_id = endpoint.string("endpoint_id");
                            let included = IncludedEndpoint {
                                endpoint_id: endpoint_id.clone(),
                                inclusive: endpoint.bool("inclusive"),
                            };
                            (endpoint_id, included)
                        })
                        .collect();
                    let service_id = service.string("service_id");
                    let included = IncludedService {
                        service_id: service_id.clone(),
                        inclusive: service.bool("inclusive"),
                        endpoints,
                    };
                    (service_id, included)
                })
                .collect();
            let application_id = application.string("application_id");
            let included = IncludedApplication {
                application_id: application_id.clone(),
                inclusive: application.bool("inclusive"),
                services,
            };
            (application_id, included)
        })
        .collect()
}

fn applications_to_state(applications: &BTreeMap<String, IncludedApplication>) -> Value {
    let items = applications
        .values()
        .map(|application| {
            let services = application
                .services
                .values()
                .map(|service| {
                    let endpoints = service
                        .endpoints
                        .values()
                        .map(|endpoint| {
                            Value::map([
                                ("endpoint_id", Value::from(&endpoint.endpoint_id)),
                                ("inclusive", Value::Bool(endpoint.inclusive)),
                            ])
                        })
                        .collect();
                    Value::map([
                        ("service_id", Value::from(&service.service_id)),
                        ("inclusive", Value::Bool(service.inclusive)),
                        (ENDPOINT, Value::Set(endpoints)),
                    ])
                })
                .collect();
            Value::map([
                ("application_id", Value::from(&application.application_id)),
                ("inclusive", Value::Bool(application.inclusive)),
                (SERVICE, Value::Set(services)),
            ])
        })
        .collect();
    Value::Set(items)
}

/// `instana_application_alert_config` and its global twin; only the name and
/// the rest facet differ.
pub struct ApplicationAlertConfigResource {
    metadata: ResourceMetadata,
    global: bool,
}

impl ApplicationAlertConfigResource {
    pub fn new() -> Self {
        Self::with_scope(RESOURCE_NAME, false)
    }

    pub fn global() -> Self {
        Self::with_scope(GLOBAL_RESOURCE_NAME, true)
    }

    fn with_scope(name: &'static str, global: bool) -> Self {
        let schema = Schema::new(
            NAME.fields("Name of the application alert configuration")
                .into_iter()
                .chain([
                    (
                        DESCRIPTION,
                        FieldSchema::string()
                            .required()
                            .description("The description text of the alert"),
                    ),
                    (BOUNDARY_SCOPE, boundary_scope_field(BOUNDARY_SCOPES)),
                    (APPLICATION, application_field()),
                    (SEVERITY, severity_field()),
                    (TRIGGERING, triggering_field()),
                    (TAG_FILTER, tag_filter_field(false)),
                    (ALERT_CHANNEL_IDS, alert_channel_ids_field()),
                    (GRANULARITY, granularity_field()),
                    (
                        EVALUATION_TYPE,
                        FieldSchema::string()
                            .optional()
                            .validate(Validator::OneOf(EVALUATION_TYPES)),
                    ),
                    (INCLUDE_INTERNAL, FieldSchema::bool().default(false)),
                    (INCLUDE_SYNTHETIC, FieldSchema::bool().default(false)),
                    (CUSTOM_PAYLOAD_FIELD, custom_payload_field_field()),
                    (RULE, rule_field()),
                    (THRESHOLD, threshold_field()),
                    (TIME_THRESHOLD, time_threshold_field(APPLICATION_TIME_THRESHOLDS)),
                ]),
        );
        Self {
            metadata: ResourceMetadata::new(name, schema, SCHEMA_VERSION),
            global,
        }
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

impl Default for ApplicationAlertConfigResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for ApplicationAlertConfigResource {
    type Object = ApplicationAlertConfig;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<ApplicationAlertConfig> {
        if self.global {
            api.global_application_alert_configs()
        } else {
            api.application_alert_configs()
        }
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
        config: &ApplicationAlertConfig,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &config.name, formatter)?;
        data.set_all([
            (DESCRIPTION, Value::from(&config.description)),
            (BOUNDARY_SCOPE, Value::from(&config.boundary_scope)),
            (APPLICATION, applications_to_state(&config.applications)),
            (SEVERITY, severity_to_state(SEVERITY, config.severity)?),
            (TRIGGERING, Value::Bool(config.triggering)),
            (
                TAG_FILTER,
                Value::from(tag_filter_from_api(&config.tag_filter_expression)),
            ),
            (
                ALERT_CHANNEL_IDS,
                Value::string_set(config.alert_channel_ids.iter().cloned()),
            ),
            (GRANULARITY, Value::Int(config.granularity)),
            (EVALUATION_TYPE, Value::from(config.evaluation_type.clone())),
            (INCLUDE_INTERNAL, Value::Bool(config.include_internal)),
            (INCLUDE_SYNTHETIC, Value::Bool(config.include_synthetic)),
            (
                CUSTOM_PAYLOAD_FIELD,
                custom_payload_fields_to_state(&config.custom_payload_fields)?,
            ),
            (RULE, rule_to_state(&config.rule)?),
            (THRESHOLD, threshold_to_state(&config.threshold)?),
            (
                TIME_THRESHOLD,
                time_threshold_to_state(&config.time_threshold, APPLICATION_TIME_THRESHOLDS)?,
            ),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<ApplicationAlertConfig, ProviderError> {
        let state = data.state();
        Ok(ApplicationAlertConfig {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            description: state.string(DESCRIPTION),
            boundary_scope: state.string(BOUNDARY_SCOPE),
            applications: applications_from_state(state),
            severity: severity_from_state(state, SEVERITY)?,
            triggering: state.bool(TRIGGERING),
            tag_filter_expression: tag_filter_from_state(state, TAG_FILTER)?,
            alert_channel_ids: state.strings(ALERT_CHANNEL_IDS),
            granularity: state.i64(GRANULARITY),
            evaluation_type: state.opt_string(EVALUATION_TYPE),
            include_internal: state.bool(INCLUDE_INTERNAL),
            include_synthetic: state.bool(INCLUDE_SYNTHETIC),
            custom_payload_fields: custom_payload_fields_from_state(state)?,
            rule: rule_from_state(state)?,
            threshold: threshold_from_state(state)?,
            time_threshold: time_threshold_from_state(state, APPLICATION_TIME_THRESHOLDS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instana_core::tagfilter::tag_filter_to_api;
    use instana_restapi::models::{CustomPayloadField, Threshold, TimeThreshold};
    use serde_json::json;

    fn formatter() -> ResourceNameFormatter {
        ResourceNameFormatter::new("", " (TF managed)")
    }

    fn config() -> ApplicationAlertConfig {
        let endpoint = IncludedEndpoint {
            endpoint_id: "e1".to_string(),
            inclusive: true,
        };
        let service = IncludedService {
            service_id: "s1".to_string(),
            inclusive: false,
            endpoints: BTreeMap::from([("e1".to_string(), endpoint)]),
        };
        let application = IncludedApplication {
            application_id: "a1".to_string(),
            inclusive: true,
            services: BTreeMap::from([("s1".to_string(), service)]),
        };
        ApplicationAlertConfig {
            id: "alert-1".to_string(),
            name: "slow checkout (TF managed)".to_string(),
            description: "checkout is slow".to_string(),
            boundary_scope: "INBOUND".to_string(),
            applications: BTreeMap::from([("a1".to_string(), application)]),
            severity: 10,
            triggering: true,
            tag_filter_expression: tag_filter_to_api("call.type@dest EQUALS 'HTTP'").unwrap(),
            alert_channel_ids: vec!["c1".to_string(), "c2".to_string()],
            granularity: 600_000,
            evaluation_type: Some("PER_AP".to_string()),
            include_internal: false,
            include_synthetic: true,
            custom_payload_fields: vec![CustomPayloadField::Static {
                key: "team".to_string(),
                value: "shop".to_string(),
            }],
            rule: ApplicationAlertRule::StatusCode(StatusCodeRule {
                metric_name: "calls".to_string(),
                aggregation: Some("SUM".to_string()),
                status_code_start: Some(500),
                status_code_end: Some(599),
            }),
            threshold: Threshold::Static {
                operator: ">=".to_string(),
                value: 5.0,
                last_updated: 0,
            },
            time_threshold: TimeThreshold::ViolationsInSequence {
                time_window: 600_000,
            },
        }
    }

    fn rule_state(variants: &[(&str, Value)]) -> Value {
        Value::block(variants.iter().cloned())
    }

    #[test]
    fn api_object_round_trips() {
        let handle = ApplicationAlertConfigResource::new();
        let config = config();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set_id(config.id.clone());
        handle
            .update_state(&mut data, &config, &formatter())
            .unwrap();

        assert_eq!(data.string("name"), "slow checkout");
        assert_eq!(data.string("severity"), "critical");
        assert!(handle.metadata().schema.validate(data.state()).is_empty());
        assert_eq!(
            handle
                .map_state_to_data_object(&data, &formatter())
                .unwrap(),
            config
        );
    }

    #[test]
    fn tag_filter_is_stored_normalized_without_spurious_diff() {
        let handle = ApplicationAlertConfigResource::new();
        let schema = &handle.metadata().schema;
        let mut data = ResourceData::new(schema);
        data.set("tag_filter", "call.type  EQUALS  'HTTP'").unwrap();
        assert_eq!(data.string("tag_filter"), "call.type@dest EQUALS 'HTTP'");

        let mut planned = data.state().clone();
        planned.insert(
            "tag_filter".to_string(),
            Value::from("call.type EQUALS 'HTTP'"),
        );
        assert!(schema.diff(data.state(), &planned).is_empty());

        planned.insert(
            "tag_filter".to_string(),
            Value::from("call.type EQUALS 'GRPC'"),
        );
        assert_eq!(schema.diff(data.state(), &planned), vec!["tag_filter"]);
    }

    #[test]
    fn rule_requires_exactly_one_variant() {
        let metric = Value::block([("metric_name", Value::from("latency"))]);
        let both = state_map([(
            RULE,
            rule_state(&[(SLOWNESS, metric.clone()), (THROUGHPUT, metric.clone())]),
        )]);
        let err = rule_from_state(&both).unwrap_err();
        assert!(matches!(err, ProviderError::Ambiguous { .. }));

        let neither = state_map([(
            RULE,
            rule_state(&[(SLOWNESS, Value::empty_list()), (THROUGHPUT, Value::empty_list())]),
        )]);
        assert!(matches!(
            rule_from_state(&neither),
            Err(ProviderError::Ambiguous { .. })
        ));

        let single = state_map([(RULE, rule_state(&[(SLOWNESS, metric)]))]);
        assert_eq!(
            rule_from_state(&single).unwrap(),
            ApplicationAlertRule::Slowness(MetricRule {
                metric_name: "latency".to_string(),
                aggregation: None,
            })
        );
    }

    #[test]
    fn logs_rule_round_trips() {
        let rule = ApplicationAlertRule::Logs(LogsRule {
            metric_name: "logs".to_string(),
            aggregation: None,
            level: "ERROR".to_string(),
            message: Some("timeout".to_string()),
            operator: "CONTAINS".to_string(),
        });
        let state = state_map([(RULE, rule_to_state(&rule).unwrap())]);
        assert_eq!(rule_from_state(&state).unwrap(), rule);
    }

    #[test]
    fn unknown_rule_type_fails_read() {
        let mut raw = serde_json::to_value(config()).unwrap();
        raw["rule"] = json!({"alertType": "saturation", "metricName": "x"});
        let config: ApplicationAlertConfig = serde_json::from_value(raw).unwrap();

        let handle = ApplicationAlertConfigResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        assert!(matches!(
            handle.update_state(&mut data, &config, &formatter()),
            Err(ProviderError::UnknownDiscriminator { .. })
        ));
    }

    #[test]
    fn invalid_severity_fails_mapping() {
        let handle = ApplicationAlertConfigResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        handle
            .update_state(&mut data, &config(), &formatter())
            .unwrap();
        data.set("severity", "fatal").unwrap();
        assert!(matches!(
            handle.map_state_to_data_object(&data, &formatter()),
            Err(ProviderError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn global_variant_differs_only_in_name() {
        let local = ApplicationAlertConfigResource::new();
        let global = ApplicationAlertConfigResource::global();
        assert_eq!(local.metadata().resource_name, RESOURCE_NAME);
        assert_eq!(global.metadata().resource_name, GLOBAL_RESOURCE_NAME);
        assert!(global.is_global());
        assert_eq!(
            local.metadata().schema.field_names(),
            global.metadata().schema.field_names()
        );
    }
}
