//! smart alerts on website monitoring beacons.

use crate::common::{
    aggregation_field, alert_channel_ids_field, custom_payload_field_field,
    custom_payload_fields_from_state, custom_payload_fields_to_state, granularity_field,
    severity_field, severity_from_state, severity_to_state, tag_filter_from_state,
    threshold_field, threshold_from_state, threshold_to_state, time_threshold_field,
    time_threshold_from_state, time_threshold_to_state, triggering_field, variants_field,
    variants_value, ALERT_CHANNEL_IDS, CUSTOM_PAYLOAD_FIELD, DESCRIPTION, GRANULARITY, NAME,
    SEVERITY, TAG_FILTER, THRESHOLD, TIME_THRESHOLD, TRIGGERING, WEBSITE_TIME_THRESHOLDS,
};
use instana_core::tagfilter::{tag_filter_field, tag_filter_from_api, Operator};
use instana_core::{
    FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Validator, Value,
};
use instana_engine::polymorphic::{required_block, select_variant, state_map};
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::{
    WebsiteAlertConfig, WebsiteAlertRule, WebsiteMetricRule, WebsiteValueRule,
};
use instana_restapi::{InstanaApi, RestResource};
use std::sync::OnceLock;

pub const RESOURCE_NAME: &str = "instana_website_alert_config";
const SCHEMA_VERSION: u32 = 1;

const WEBSITE_ID: &str = "website_id";

const RULE: &str = "rule";
const SLOWNESS: &str = "slowness";
const THROUGHPUT: &str = "throughput";
const SPECIFIC_JS_ERROR: &str = "specific_js_error";
const STATUS_CODE: &str = "status_code";
const RULE_VARIANTS: &[&str] = &[SLOWNESS, THROUGHPUT, SPECIFIC_JS_ERROR, STATUS_CODE];

/// tag filter operator names accepted by value rules.
fn value_operators() -> &'static [&'static str] {
    static OPERATORS: OnceLock<Vec<&'static str>> = OnceLock::new();
    OPERATORS.get_or_init(|| Operator::ALL.iter().map(|op| op.as_str()).collect())
}

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
        SPECIFIC_JS_ERROR | STATUS_CODE => base
            .with(
                "operator",
                FieldSchema::string()
                    .required()
                    .validate(Validator::Custom(validate_operator)),
            )
            .with("value", FieldSchema::string().optional()),
        _ => base,
    }
}

fn validate_operator(value: &Value, key: &str) -> Result<(), String> {
    match value.as_str() {
        Some(op) if value_operators().contains(&op) => Ok(()),
        Some(op) => Err(format!("{key}: unsupported operator {op}")),
        None => Ok(()),
    }
}

fn metric_rule(fields: &StateMap) -> WebsiteMetricRule {
    WebsiteMetricRule {
        metric_name: fields.string("metric_name"),
        aggregation: fields.opt_string("aggregation"),
    }
}

fn value_rule(fields: &StateMap) -> WebsiteValueRule {
    WebsiteValueRule {
        metric_name: fields.string("metric_name"),
        aggregation: fields.opt_string("aggregation"),
        operator: fields.string("operator"),
        value: fields.opt_string("value"),
    }
}

fn rule_from_state(state: &StateMap) -> Result<WebsiteAlertRule, ProviderError> {
    let container = required_block(state, RULE)?;
    let (variant, fields) = select_variant(container, RULE, RULE_VARIANTS)?;
    Ok(match variant {
        SLOWNESS => WebsiteAlertRule::Slowness(metric_rule(fields)),
        THROUGHPUT => WebsiteAlertRule::Throughput(metric_rule(fields)),
        SPECIFIC_JS_ERROR => WebsiteAlertRule::SpecificJsError(value_rule(fields)),
        _ => WebsiteAlertRule::StatusCode(value_rule(fields)),
    })
}

fn rule_to_state(rule: &WebsiteAlertRule) -> Result<Value, ProviderError> {
    let metric = |rule: &WebsiteMetricRule| {
        state_map([
            ("metric_name", Value::from(&rule.metric_name)),
            ("aggregation", Value::from(rule.aggregation.clone())),
        ])
    };
    let valued = |rule: &WebsiteValueRule| {
        state_map([
            ("metric_name", Value::from(&rule.metric_name)),
            ("aggregation", Value::from(rule.aggregation.clone())),
            ("operator", Value::from(&rule.operator)),
            ("value", Value::from(rule.value.clone())),
        ])
    };
    let (variant, fields) = match rule {
        WebsiteAlertRule::Slowness(rule) => (SLOWNESS, metric(rule)),
        WebsiteAlertRule::Throughput(rule) => (THROUGHPUT, metric(rule)),
        WebsiteAlertRule::SpecificJsError(rule) => (SPECIFIC_JS_ERROR, valued(rule)),
        WebsiteAlertRule::StatusCode(rule) => (STATUS_CODE, valued(rule)),
        WebsiteAlertRule::Unknown => {
            return Err(ProviderError::unknown_discriminator(RULE, "unknown"))
        }
    };
    Ok(variants_value(RULE_VARIANTS, variant, fields))
}

pub struct WebsiteAlertConfigResource {
    metadata: ResourceMetadata,
}

impl WebsiteAlertConfigResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            NAME.fields("Name of the website alert configuration")
                .into_iter()
                .chain([
                    (
                        DESCRIPTION,
                        FieldSchema::string()
                            .required()
                            .description("The description text of the alert"),
                    ),
                    (SEVERITY, severity_field()),
                    (TRIGGERING, triggering_field()),
                    (
                        WEBSITE_ID,
                        FieldSchema::string()
                            .required()
                            .validate(Validator::NonEmpty),
                    ),
                    (TAG_FILTER, tag_filter_field(false)),
                    (ALERT_CHANNEL_IDS, alert_channel_ids_field()),
                    (GRANULARITY, granularity_field()),
                    (CUSTOM_PAYLOAD_FIELD, custom_payload_field_field()),
                    (
                        RULE,
                        variants_field(
                            RULE_VARIANTS
                                .iter()
                                .map(|variant| (*variant, rule_schema(variant)))
                                .collect(),
                        ),
                    ),
                    (THRESHOLD, threshold_field()),
                    (TIME_THRESHOLD, time_threshold_field(WEBSITE_TIME_THRESHOLDS)),
                ]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for WebsiteAlertConfigResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for WebsiteAlertConfigResource {
    type Object = WebsiteAlertConfig;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<WebsiteAlertConfig> {
        api.website_alert_configs()
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
        config: &WebsiteAlertConfig,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &config.name, formatter)?;
        data.set_all([
            (DESCRIPTION, Value::from(&config.description)),
            (SEVERITY, severity_to_state(SEVERITY, config.severity)?),
            (TRIGGERING, Value::Bool(config.triggering)),
            (WEBSITE_ID, Value::from(&config.website_id)),
            (
                TAG_FILTER,
                Value::from(tag_filter_from_api(&config.tag_filter_expression)),
            ),
            (
                ALERT_CHANNEL_IDS,
                Value::string_set(config.alert_channel_ids.iter().cloned()),
            ),
            (GRANULARITY, Value::Int(config.granularity)),
            (
                CUSTOM_PAYLOAD_FIELD,
                custom_payload_fields_to_state(&config.custom_payload_fields)?,
            ),
            (RULE, rule_to_state(&config.rule)?),
            (THRESHOLD, threshold_to_state(&config.threshold)?),
            (
                TIME_THRESHOLD,
                time_threshold_to_state(&config.time_threshold, WEBSITE_TIME_THRESHOLDS)?,
            ),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<WebsiteAlertConfig, ProviderError> {
        let state = data.state();
        Ok(WebsiteAlertConfig {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            description: state.string(DESCRIPTION),
            severity: severity_from_state(state, SEVERITY)?,
            triggering: state.bool(TRIGGERING),
            website_id: state.string(WEBSITE_ID),
            tag_filter_expression: tag_filter_from_state(state, TAG_FILTER)?,
            alert_channel_ids: state.strings(ALERT_CHANNEL_IDS),
            granularity: state.i64(GRANULARITY),
            custom_payload_fields: custom_payload_fields_from_state(state)?,
            rule: rule_from_state(state)?,
            threshold: threshold_from_state(state)?,
            time_threshold: time_threshold_from_state(state, WEBSITE_TIME_THRESHOLDS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instana_core::tagfilter::TagFilterModel;
    use instana_restapi::models::{Threshold, TimeThreshold};

    fn formatter() -> ResourceNameFormatter {
        ResourceNameFormatter::new("", " (TF managed)")
    }

    fn config(rule: WebsiteAlertRule, time_threshold: TimeThreshold) -> WebsiteAlertConfig {
        WebsiteAlertConfig {
            id: "w-alert".to_string(),
            name: "js errors (TF managed)".to_string(),
            description: "too many js errors".to_string(),
            severity: 5,
            triggering: false,
            website_id: "site-1".to_string(),
            tag_filter_expression: TagFilterModel::empty(),
            alert_channel_ids: vec!["c1".to_string()],
            granularity: 300_000,
            custom_payload_fields: Vec::new(),
            rule,
            threshold: Threshold::Static {
                operator: ">".to_string(),
                value: 10.0,
                last_updated: 0,
            },
            time_threshold,
        }
    }

    #[test]
    fn value_rule_round_trips() {
        let handle = WebsiteAlertConfigResource::new();
        let config = config(
            WebsiteAlertRule::SpecificJsError(WebsiteValueRule {
                metric_name: "errors".to_string(),
                aggregation: Some("SUM".to_string()),
                operator: "CONTAINS".to_string(),
                value: Some("TypeError".to_string()),
            }),
            TimeThreshold::UserImpactOfViolationsInSequence {
                time_window: 600_000,
                users: Some(5),
                percentage: None,
                impact_measurement_method: "AGGREGATED".to_string(),
            },
        );
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set_id(config.id.clone());
        handle
            .update_state(&mut data, &config, &formatter())
            .unwrap();

        assert_eq!(data.string("tag_filter"), "");
        assert_eq!(data.string("severity"), "warning");
        assert!(handle.metadata().schema.validate(data.state()).is_empty());
        assert_eq!(
            handle
                .map_state_to_data_object(&data, &formatter())
                .unwrap(),
            config
        );
    }

    #[test]
    fn request_impact_is_not_a_website_threshold() {
        let handle = WebsiteAlertConfigResource::new();
        let config = config(
            WebsiteAlertRule::Slowness(WebsiteMetricRule {
                metric_name: "onLoadTime".to_string(),
                aggregation: Some("P90".to_string()),
            }),
            TimeThreshold::RequestImpact {
                time_window: 600_000,
                requests: 3,
            },
        );
        let mut data = ResourceData::new(&handle.metadata().schema);
        assert!(matches!(
            handle.update_state(&mut data, &config, &formatter()),
            Err(ProviderError::UnknownDiscriminator { .. })
        ));
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let handle = WebsiteAlertConfigResource::new();
        let mut data = ResourceData::new(&handle.metadata().schema);
        data.set(
            "rule",
            Value::block([(
                STATUS_CODE,
                Value::block([
                    ("metric_name", Value::from("httpStatus")),
                    ("operator", Value::from("LIKE")),
                    ("value", Value::from("500")),
                ]),
            )]),
        )
        .unwrap();
        let errors = handle.metadata().schema.validate(data.state());
        assert!(errors
            .iter()
            .any(|err| err.message.contains("unsupported operator LIKE")));
    }

    #[test]
    fn rule_selection_is_exclusive() {
        let metric = Value::block([("metric_name", Value::from("onLoadTime"))]);
        let state = state_map([(
            RULE,
            Value::block([(SLOWNESS, metric.clone()), (THROUGHPUT, metric)]),
        )]);
        assert!(matches!(
            rule_from_state(&state),
            Err(ProviderError::Ambiguous { .. })
        ));
    }
}
