//! custom event specifications and their rule lists.

use crate::common::{
    int32, severity_field, severity_from_state, severity_to_state, DESCRIPTION, NAME,
    SEVERITY, TRIGGERING,
};
use instana_core::{
    Element, FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Validator, Value,
};
use instana_engine::polymorphic::{required_block, state_map};
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::{CustomEventRule, CustomEventSpecification};
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_custom_event_specification";
const SCHEMA_VERSION: u32 = 1;

const ENTITY_TYPE: &str = "entity_type";
const QUERY: &str = "query";
const EXPIRATION_TIME: &str = "expiration_time";
const ENABLED: &str = "enabled";
const RULE_LOGICAL_OPERATOR: &str = "rule_logical_operator";
const RULES: &str = "rules";

const ENTITY_VERIFICATION: &str = "entity_verification";
const SYSTEM: &str = "system";
const THRESHOLD: &str = "threshold";
const RULE_KINDS: &[&str] = &[ENTITY_VERIFICATION, SYSTEM, THRESHOLD];

const LOGICAL_OPERATORS: &[&str] = &["AND", "OR"];
const MATCHING_OPERATORS: &[&str] = &["IS", "CONTAINS", "STARTS_WITH", "ENDS_WITH"];
const CONDITION_OPERATORS: &[&str] = &["=", "!=", "<=", "<", ">", ">="];
const WINDOW_AGGREGATIONS: &[&str] = &["sum", "avg", "min", "max"];

fn rules_field() -> FieldSchema {
    let entity_verification = Schema::new([
        (SEVERITY, severity_field()),
        ("matching_entity_type", FieldSchema::string().required()),
        (
            "matching_operator",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(MATCHING_OPERATORS)),
        ),
        ("matching_entity_label", FieldSchema::string().required()),
        ("offline_duration", FieldSchema::int().required()),
    ]);
    let system = Schema::new([
        (SEVERITY, severity_field()),
        ("system_rule_id", FieldSchema::string().required()),
    ]);
    let threshold = Schema::new([
        (SEVERITY, severity_field()),
        ("metric_name", FieldSchema::string().required()),
        ("rollup", FieldSchema::int().optional()),
        ("window", FieldSchema::int().optional()),
        (
            "aggregation",
            FieldSchema::string()
                .optional()
                .validate(Validator::OneOf(WINDOW_AGGREGATIONS)),
        ),
        (
            "condition_operator",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(CONDITION_OPERATORS)),
        ),
        ("condition_value", FieldSchema::float().optional()),
    ]);
    FieldSchema::block(Schema::new([
        (
            ENTITY_VERIFICATION,
            FieldSchema::block(entity_verification).optional(),
        ),
        (SYSTEM, FieldSchema::block(system).optional()),
        (
            THRESHOLD,
            FieldSchema::list(Element::Resource(threshold)).optional(),
        ),
    ]))
    .required()
    .min_items(1)
    .description("The rules of the event; only one kind of rule may be configured")
}

fn entries<'a>(rules: &'a StateMap, kind: &str) -> Vec<&'a StateMap> {
    rules.list(kind).iter().filter_map(Value::as_map).collect()
}

fn threshold_rule(rule: &StateMap) -> Result<CustomEventRule, ProviderError> {
    let rollup = rule.opt_i64("rollup").filter(|rollup| *rollup != 0);
    let window = rule.opt_i64("window").filter(|window| *window != 0);
    let aggregation = rule.opt_string("aggregation");
    match (rollup, &window, &aggregation) {
        (Some(_), None, None) | (None, Some(_), Some(_)) => {}
        _ => {
            return Err(ProviderError::invalid(
                "rules.threshold",
                "either rollup or window and aggregation must be configured",
            ))
        }
    }
    Ok(CustomEventRule::Threshold {
        severity: severity_from_state(rule, SEVERITY)?,
        metric_name: rule.string("metric_name"),
        rollup: rollup.map(|rollup| int32("rollup", rollup)).transpose()?,
        window,
        aggregation,
        condition_operator: rule.string("condition_operator"),
        condition_value: rule.opt_f64("condition_value"),
    })
}

/// rules of a single kind; mixing kinds is rejected.
fn rules_from_state(state: &StateMap) -> Result<Vec<CustomEventRule>, ProviderError> {
    let rules = required_block(state, RULES)?;
    let populated: Vec<&str> = RULE_KINDS
        .iter()
        .copied()
        .filter(|kind| !entries(rules, kind).is_empty())
        .collect();
    let kind = match populated.as_slice() {
        [kind] => *kind,
        _ => {
            return Err(ProviderError::ambiguous(
                RULES,
                format!("exactly one of [{}] must be configured", RULE_KINDS.join(", ")),
            ))
        }
    };

    entries(rules, kind)
        .into_iter()
        .map(|rule| match kind {
            ENTITY_VERIFICATION => Ok(CustomEventRule::EntityVerification {
                severity: severity_from_state(rule, SEVERITY)?,
                matching_entity_type: rule.string("matching_entity_type"),
                matching_operator: rule.string("matching_operator"),
                matching_entity_label: rule.string("matching_entity_label"),
                offline_duration: rule.i64("offline_duration"),
            }),
            SYSTEM => Ok(CustomEventRule::System {
                severity: severity_from_state(rule, SEVERITY)?,
                system_rule_id: rule.string("system_rule_id"),
            }),
            _ => threshold_rule(rule),
        })
        .collect()
}

fn rules_to_state(rules: &[CustomEventRule]) -> Result<Value, ProviderError> {
    let mut by_kind: Vec<(&'static str, Vec<Value>)> =
        RULE_KINDS.iter().map(|kind| (*kind, Vec::new())).collect();
    for rule in rules {
        let (kind, fields) = match rule {
            CustomEventRule::EntityVerification {
                severity,
                matching_entity_type,
                matching_operator,
                matching_entity_label,
                offline_duration,
            } => (
                ENTITY_VERIFICATION,
                state_map([
                    (SEVERITY, severity_to_state(SEVERITY, *severity)?),
                    ("matching_entity_type", Value::from(matching_entity_type)),
                    ("matching_operator", Value::from(matching_operator)),
                    ("matching_entity_label", Value::from(matching_entity_label)),
                    ("offline_duration", Value::Int(*offline_duration)),
                ]),
            ),
            CustomEventRule::System {
                severity,
                system_rule_id,
            } => (
                SYSTEM,
                state_map([
                    (SEVERITY, severity_to_state(SEVERITY, *severity)?),
                    ("system_rule_id", Value::from(system_rule_id)),
                ]),
            ),
            CustomEventRule::Threshold {
                severity,
                metric_name,
                rollup,
                window,
                aggregation,
                condition_operator,
                condition_value,
            } => (
                THRESHOLD,
                state_map([
                    (SEVERITY, severity_to_state(SEVERITY, *severity)?),
                    ("metric_name", Value::from(metric_name)),
                    ("rollup", Value::from(*rollup)),
                    ("window", Value::from(*window)),
                    ("aggregation", Value::from(aggregation.clone())),
                    ("condition_operator", Value::from(condition_operator)),
                    ("condition_value", Value::from(*condition_value)),
                ]),
            ),
            CustomEventRule::Unknown => {
                return Err(ProviderError::unknown_discriminator("rule", "unknown"))
            }
        };
        let fields: StateMap = fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        if let Some((_, items)) = by_kind.iter_mut().find(|(name, _)| *name == kind) {
            items.push(Value::Map(fields));
        }
    }
    Ok(Value::block(
        by_kind
            .into_iter()
            .map(|(kind, items)| (kind, Value::List(items))),
    ))
}

pub struct CustomEventSpecificationResource {
    metadata: ResourceMetadata,
}

impl CustomEventSpecificationResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            NAME.fields("The name of the custom event specification")
                .into_iter()
                .chain([
                    (ENTITY_TYPE, FieldSchema::string().required()),
                    (QUERY, FieldSchema::string().optional()),
                    (TRIGGERING, FieldSchema::bool().default(false)),
                    (DESCRIPTION, FieldSchema::string().optional()),
                    (EXPIRATION_TIME, FieldSchema::int().optional()),
                    (ENABLED, FieldSchema::bool().default(true)),
                    (
                        RULE_LOGICAL_OPERATOR,
                        FieldSchema::string()
                            .default("AND")
                            .validate(Validator::OneOf(LOGICAL_OPERATORS)),
                    ),
                    (RULES, rules_field()),
                ]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for CustomEventSpecificationResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for CustomEventSpecificationResource {
    type Object = CustomEventSpecification;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<CustomEventSpecification> {
        api.custom_event_specifications()
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
        spec: &CustomEventSpecification,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &spec.name, formatter)?;
        data.set_all([
            (ENTITY_TYPE, Value::from(&spec.entity_type)),
            (QUERY, Value::from(spec.query.clone())),
            (TRIGGERING, Value::Bool(spec.triggering)),
            (DESCRIPTION, Value::from(spec.description.clone())),
            (EXPIRATION_TIME, Value::from(spec.expiration_time)),
            (ENABLED, Value::Bool(spec.enabled)),
            (RULE_LOGICAL_OPERATOR, Value::from(&spec.rule_logical_operator)),
            (RULES, rules_to_state(&spec.rules)?),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<CustomEventSpecification, ProviderError> {
        let state = data.state();
        Ok(CustomEventSpecification {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            entity_type: state.string(ENTITY_TYPE),
            query: state.opt_string(QUERY),
            triggering: state.bool(TRIGGERING),
            description: state.opt_string(DESCRIPTION),
            expiration_time: state.opt_i64(EXPIRATION_TIME),
            enabled: state.opt_bool(ENABLED).unwrap_or(true),
            rule_logical_operator: state
                .opt_string(RULE_LOGICAL_OPERATOR)
                .unwrap_or_else(|| "AND".to_string()),
            rules: rules_from_state(state)?,
        })
    }
}
