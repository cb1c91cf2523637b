//! schemas and mappers shared by several resource families.

use instana_core::tagfilter::{tag_filter_to_api, TagFilterModel};
use instana_core::{
    Element, FieldSchema, ResourceNameFormatter, Schema, SetHash, StateMap, StateMapExt,
    Validator, Value,
};
use instana_engine::polymorphic::{required_block, select_variant, state_map, variant_state};
use instana_engine::{ProviderError, ResourceData, Severity};
use instana_restapi::models::{CustomPayloadField, DynamicValue, Threshold, TimeThreshold};

/// user owned short name and the computed api name bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameFields {
    pub short: &'static str,
    pub full: &'static str,
}

pub const NAME: NameFields = NameFields {
    short: "name",
    full: "full_name",
};

pub const LABEL: NameFields = NameFields {
    short: "label",
    full: "full_label",
};

pub const TITLE: NameFields = NameFields {
    short: "title",
    full: "full_title",
};

impl NameFields {
    /// schema entries for the pair.
    pub fn fields(self, description: &'static str) -> [(&'static str, FieldSchema); 2] {
        [
            (
                self.short,
                FieldSchema::string()
                    .required()
                    .validate(Validator::NonEmpty)
                    .description(description),
            ),
            (
                self.full,
                FieldSchema::string()
                    .computed()
                    .description("The name as sent to the api, including prefix and suffix"),
            ),
        ]
    }

    /// the api name, always derived from the short name.
    pub fn api_name(self, data: &ResourceData<'_>, formatter: &ResourceNameFormatter) -> String {
        formatter.format(&data.string(self.short))
    }

    pub fn set_computed(
        self,
        data: &mut ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        let full = self.api_name(data, formatter);
        data.set(self.full, full)?;
        Ok(())
    }

    /// write both fields from a name returned by the api.
    pub fn write_state(
        self,
        data: &mut ResourceData<'_>,
        api_name: &str,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        data.set(self.full, api_name)?;
        data.set(self.short, formatter.undo_format(api_name))?;
        Ok(())
    }
}

pub const SEVERITY: &str = "severity";
pub const TRIGGERING: &str = "triggering";
pub const DESCRIPTION: &str = "description";
pub const TAG_FILTER: &str = "tag_filter";
pub const ALERT_CHANNEL_IDS: &str = "alert_channel_ids";
pub const GRANULARITY: &str = "granularity";
pub const BOUNDARY_SCOPE: &str = "boundary_scope";

pub const GRANULARITIES: &[i64] = &[300_000, 600_000, 900_000, 1_200_000, 1_800_000];
pub const DEFAULT_GRANULARITY: i64 = 600_000;

pub const AGGREGATIONS: &[&str] = &[
    "SUM",
    "MEAN",
    "MAX",
    "MIN",
    "P25",
    "P50",
    "P75",
    "P90",
    "P95",
    "P98",
    "P99",
    "P99_9",
    "P99_99",
    "DISTRIBUTION",
    "DISTINCT_COUNT",
    "SUM_POSITIVE",
    "PER_SECOND",
    "INCREASE",
];

pub const THRESHOLD_OPERATORS: &[&str] = &[">", ">=", "<", "<=", "=="];
const SEASONALITIES: &[&str] = &["WEEKLY", "DAILY"];
const IMPACT_MEASUREMENT_METHODS: &[&str] = &["AGGREGATED", "PER_WINDOW"];

pub fn severity_field() -> FieldSchema {
    FieldSchema::string()
        .required()
        .validate(Validator::OneOf(Severity::TERMS))
        .description("The severity of the alert, warning or critical")
}

pub fn severity_from_state(state: &StateMap, field: &str) -> Result<i32, ProviderError> {
    Ok(Severity::from_term(field, &state.string(field))?.api_code())
}

pub fn severity_to_state(field: &str, code: i32) -> Result<Value, ProviderError> {
    Ok(Severity::from_api_code(field, code)?.term().into())
}

pub fn triggering_field() -> FieldSchema {
    FieldSchema::bool()
        .default(false)
        .description("Whether an incident is triggered as well")
}

pub fn granularity_field() -> FieldSchema {
    FieldSchema::int()
        .default(DEFAULT_GRANULARITY)
        .validate(Validator::IntOneOf(GRANULARITIES))
        .description("The evaluation granularity in milliseconds")
}

pub fn alert_channel_ids_field() -> FieldSchema {
    FieldSchema::string_set()
        .optional()
        .description("The ids of the alerting channels to notify")
}

pub fn aggregation_field() -> FieldSchema {
    FieldSchema::string()
        .optional()
        .validate(Validator::OneOf(AGGREGATIONS))
}

pub fn boundary_scope_field(allowed: &'static [&'static str]) -> FieldSchema {
    FieldSchema::string()
        .required()
        .validate(Validator::OneOf(allowed))
        .description("The boundary scope of the calls to evaluate")
}

/// api tree of the tag filter stored under `field`.
pub fn tag_filter_from_state(
    state: &StateMap,
    field: &str,
) -> Result<TagFilterModel, ProviderError> {
    tag_filter_to_api(&state.string(field)).map_err(|err| ProviderError::tag_filter(field, err))
}

pub fn int32(field: &str, value: i64) -> Result<i32, ProviderError> {
    i32::try_from(value)
        .map_err(|_| ProviderError::invalid(field, format!("{value} is out of range")))
}

/// single element block holding `fields`; null entries are dropped.
pub fn block_value(fields: StateMap) -> Value {
    Value::List(vec![Value::Map(compact(fields))])
}

/// block selecting `selected` among `variants`.
pub fn variants_value(variants: &[&'static str], selected: &str, fields: StateMap) -> Value {
    Value::List(vec![Value::Map(variant_state(
        variants,
        selected,
        compact(fields),
    ))])
}

/// required block with one optional sub-block per variant.
pub fn variants_field(variants: Vec<(&'static str, Schema)>) -> FieldSchema {
    let schema = Schema::new(
        variants
            .into_iter()
            .map(|(name, schema)| (name, FieldSchema::block(schema).optional())),
    );
    FieldSchema::block(schema).required().min_items(1)
}

fn compact(fields: StateMap) -> StateMap {
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect()
}

pub const THRESHOLD: &str = "threshold";
const STATIC: &str = "static";
const HISTORIC_BASELINE: &str = "historic_baseline";
pub const THRESHOLD_VARIANTS: &[&str] = &[STATIC, HISTORIC_BASELINE];

fn threshold_operator_field() -> FieldSchema {
    FieldSchema::string()
        .required()
        .validate(Validator::OneOf(THRESHOLD_OPERATORS))
}

pub fn threshold_field() -> FieldSchema {
    variants_field(vec![
        (
            STATIC,
            Schema::new([
                ("operator", threshold_operator_field()),
                ("value", FieldSchema::float().required()),
                ("last_updated", FieldSchema::int().optional().computed()),
            ]),
        ),
        (
            HISTORIC_BASELINE,
            Schema::new([
                ("operator", threshold_operator_field()),
                ("last_updated", FieldSchema::int().optional().computed()),
                (
                    "seasonality",
                    FieldSchema::string()
                        .required()
                        .validate(Validator::OneOf(SEASONALITIES)),
                ),
                (
                    "baseline",
                    FieldSchema::list(Element::List(Box::new(Element::Float)))
                        .optional()
                        .description("Time ordered rows of baseline values"),
                ),
                (
                    "deviation_factor",
                    FieldSchema::float()
                        .required()
                        .validate(Validator::FloatBetween(0.5, 16.0)),
                ),
            ]),
        ),
    ])
}

pub fn threshold_from_state(state: &StateMap) -> Result<Threshold, ProviderError> {
    let container = required_block(state, THRESHOLD)?;
    let (variant, fields) = select_variant(container, THRESHOLD, THRESHOLD_VARIANTS)?;
    let threshold = match variant {
        STATIC => Threshold::Static {
            operator: fields.string("operator"),
            value: fields.f64("value"),
            last_updated: fields.i64("last_updated"),
        },
        _ => Threshold::HistoricBaseline {
            operator: fields.string("operator"),
            last_updated: fields.i64("last_updated"),
            seasonality: fields.string("seasonality"),
            baseline: fields
                .list("baseline")
                .iter()
                .map(|row| {
                    row.as_list()
                        .unwrap_or_default()
                        .iter()
                        .filter_map(Value::as_f64)
                        .collect()
                })
                .collect(),
            deviation_factor: fields.f64("deviation_factor") as f32,
        },
    };
    Ok(threshold)
}

pub fn threshold_to_state(threshold: &Threshold) -> Result<Value, ProviderError> {
    match threshold {
        Threshold::Static {
            operator,
            value,
            last_updated,
        } => Ok(variants_value(
            THRESHOLD_VARIANTS,
            STATIC,
            state_map([
                ("operator", Value::from(operator)),
                ("value", Value::Float(*value)),
                ("last_updated", Value::Int(*last_updated)),
            ]),
        )),
        Threshold::HistoricBaseline {
            operator,
            last_updated,
            seasonality,
            baseline,
            deviation_factor,
        } => {
            let rows = baseline
                .iter()
                .map(|row| Value::List(row.iter().copied().map(Value::Float).collect()))
                .collect();
            Ok(variants_value(
                THRESHOLD_VARIANTS,
                HISTORIC_BASELINE,
                state_map([
                    ("operator", Value::from(operator)),
                    ("last_updated", Value::Int(*last_updated)),
                    ("seasonality", Value::from(seasonality)),
                    ("baseline", Value::List(rows)),
                    ("deviation_factor", Value::Float(f64::from(*deviation_factor))),
                ]),
            ))
        }
        Threshold::Unknown => Err(ProviderError::unknown_discriminator(THRESHOLD, "unknown")),
    }
}

pub const TIME_THRESHOLD: &str = "time_threshold";
pub const VIOLATIONS_IN_SEQUENCE: &str = "violations_in_sequence";
pub const VIOLATIONS_IN_PERIOD: &str = "violations_in_period";
pub const REQUEST_IMPACT: &str = "request_impact";
pub const USER_IMPACT_OF_VIOLATIONS_IN_SEQUENCE: &str = "user_impact_of_violations_in_sequence";

pub const APPLICATION_TIME_THRESHOLDS: &[&str] =
    &[VIOLATIONS_IN_SEQUENCE, VIOLATIONS_IN_PERIOD, REQUEST_IMPACT];
pub const WEBSITE_TIME_THRESHOLDS: &[&str] = &[
    VIOLATIONS_IN_SEQUENCE,
    VIOLATIONS_IN_PERIOD,
    USER_IMPACT_OF_VIOLATIONS_IN_SEQUENCE,
];

fn time_threshold_schema(variant: &str) -> Schema {
    let time_window = || {
        (
            "time_window",
            FieldSchema::int()
                .required()
                .description("The evaluation window in milliseconds"),
        )
    };
    match variant {
        VIOLATIONS_IN_PERIOD => Schema::new([
            time_window(),
            (
                "violations",
                FieldSchema::int()
                    .required()
                    .validate(Validator::IntBetween(1, 12)),
            ),
        ]),
        REQUEST_IMPACT => Schema::new([
            time_window(),
            ("requests", FieldSchema::int().required()),
        ]),
        USER_IMPACT_OF_VIOLATIONS_IN_SEQUENCE => Schema::new([
            time_window(),
            ("users", FieldSchema::int().optional()),
            (
                "percentage",
                FieldSchema::float()
                    .optional()
                    .validate(Validator::FloatBetween(0.0, 1.0)),
            ),
            (
                "impact_measurement_method",
                FieldSchema::string()
                    .required()
                    .validate(Validator::OneOf(IMPACT_MEASUREMENT_METHODS)),
            ),
        ]),
        _ => Schema::new([time_window()]),
    }
}

pub fn time_threshold_field(variants: &[&'static str]) -> FieldSchema {
    variants_field(
        variants
            .iter()
            .map(|variant| (*variant, time_threshold_schema(variant)))
            .collect(),
    )
}

pub fn time_threshold_from_state(
    state: &StateMap,
    variants: &[&'static str],
) -> Result<TimeThreshold, ProviderError> {
    let container = required_block(state, TIME_THRESHOLD)?;
    let (variant, fields) = select_variant(container, TIME_THRESHOLD, variants)?;
    let time_window = fields.i64("time_window");
    let threshold = match variant {
        VIOLATIONS_IN_PERIOD => TimeThreshold::ViolationsInPeriod {
            time_window,
            violations: int32("violations", fields.i64("violations"))?,
        },
        REQUEST_IMPACT => TimeThreshold::RequestImpact {
            time_window,
            requests: int32("requests", fields.i64("requests"))?,
        },
        USER_IMPACT_OF_VIOLATIONS_IN_SEQUENCE => TimeThreshold::UserImpactOfViolationsInSequence {
            time_window,
            users: fields
                .opt_i64("users")
                .map(|users| int32("users", users))
                .transpose()?,
            percentage: fields.opt_f64("percentage"),
            impact_measurement_method: fields.string("impact_measurement_method"),
        },
        _ => TimeThreshold::ViolationsInSequence { time_window },
    };
    Ok(threshold)
}

pub fn time_threshold_to_state(
    threshold: &TimeThreshold,
    variants: &[&'static str],
) -> Result<Value, ProviderError> {
    let (variant, fields) = match threshold {
        TimeThreshold::ViolationsInSequence { time_window } => (
            VIOLATIONS_IN_SEQUENCE,
            state_map([("time_window", Value::Int(*time_window))]),
        ),
        TimeThreshold::ViolationsInPeriod {
            time_window,
            violations,
        } => (
            VIOLATIONS_IN_PERIOD,
            state_map([
                ("time_window", Value::Int(*time_window)),
                ("violations", Value::from(*violations)),
            ]),
        ),
        TimeThreshold::RequestImpact {
            time_window,
            requests,
        } => (
            REQUEST_IMPACT,
            state_map([
                ("time_window", Value::Int(*time_window)),
                ("requests", Value::from(*requests)),
            ]),
        ),
        TimeThreshold::UserImpactOfViolationsInSequence {
            time_window,
            users,
            percentage,
            impact_measurement_method,
        } => (
            USER_IMPACT_OF_VIOLATIONS_IN_SEQUENCE,
            state_map([
                ("time_window", Value::Int(*time_window)),
                ("users", Value::from(*users)),
                ("percentage", Value::from(*percentage)),
                (
                    "impact_measurement_method",
                    Value::from(impact_measurement_method),
                ),
            ]),
        ),
        TimeThreshold::Unknown => {
            return Err(ProviderError::unknown_discriminator(
                TIME_THRESHOLD,
                "unknown",
            ))
        }
    };
    if !variants.contains(&variant) {
        return Err(ProviderError::unknown_discriminator(TIME_THRESHOLD, variant));
    }
    Ok(variants_value(variants, variant, fields))
}

pub const CUSTOM_PAYLOAD_FIELD: &str = "custom_payload_field";

pub fn custom_payload_field_field() -> FieldSchema {
    let dynamic_value = Schema::new([
        ("key", FieldSchema::string().optional()),
        ("tag_name", FieldSchema::string().required()),
    ]);
    let element = Schema::new([
        ("key", FieldSchema::string().required()),
        (
            "value",
            FieldSchema::string()
                .optional()
                .description("Static value of the field"),
        ),
        (
            "dynamic_value",
            FieldSchema::block(dynamic_value)
                .optional()
                .description("Value resolved from a tag at alert time"),
        ),
    ]);
    FieldSchema::set(Element::Resource(element), SetHash::Key("key")).optional()
}

pub fn custom_payload_fields_from_state(
    state: &StateMap,
) -> Result<Vec<CustomPayloadField>, ProviderError> {
    state
        .list(CUSTOM_PAYLOAD_FIELD)
        .iter()
        .filter_map(Value::as_map)
        .map(|fields| {
            let key = fields.string("key");
            let value = fields.value("value").and_then(Value::as_str);
            match (value, fields.block("dynamic_value")) {
                (Some(value), None) => Ok(CustomPayloadField::Static {
                    key,
                    value: value.to_string(),
                }),
                (None, Some(dynamic)) => Ok(CustomPayloadField::Dynamic {
                    key,
                    value: DynamicValue {
                        key: dynamic.opt_string("key"),
                        tag_name: dynamic.string("tag_name"),
                    },
                }),
                (None, None) => Err(ProviderError::ambiguous(
                    CUSTOM_PAYLOAD_FIELD,
                    format!("field {key} needs either value or dynamic_value"),
                )),
                (Some(_), Some(_)) => Err(ProviderError::ambiguous(
                    CUSTOM_PAYLOAD_FIELD,
                    format!("field {key} may set only one of value and dynamic_value"),
                )),
            }
        })
        .collect()
}

pub fn custom_payload_fields_to_state(
    fields: &[CustomPayloadField],
) -> Result<Value, ProviderError> {
    let items = fields
        .iter()
        .map(|field| match field {
            CustomPayloadField::Static { key, value } => Ok(Value::map([
                ("key", Value::from(key)),
                ("value", Value::from(value)),
            ])),
            CustomPayloadField::Dynamic { key, value } => Ok(Value::map([
                ("key", Value::from(key)),
                (
                    "dynamic_value",
                    block_value(state_map([
                        ("key", Value::from(value.key.clone())),
                        ("tag_name", Value::from(&value.tag_name)),
                    ])),
                ),
            ])),
            CustomPayloadField::Unknown => Err(ProviderError::unknown_discriminator(
                CUSTOM_PAYLOAD_FIELD,
                "unknown",
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Set(items))
}
