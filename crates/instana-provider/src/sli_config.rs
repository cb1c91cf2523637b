//! service level indicators. the api offers no update, every field forces replacement.

use crate::common::{tag_filter_from_state, variants_field, variants_value, NAME};
use instana_core::tagfilter::{tag_filter_field, tag_filter_from_api, TagFilterModel};
use instana_core::{
    FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Validator, Value,
};
use instana_engine::polymorphic::{required_block, select_variant, state_map};
use instana_engine::{
    full_name_to_name, ProviderError, ResourceData, ResourceHandle, ResourceMetadata,
    StateUpgrader,
};
use instana_restapi::models::{MetricConfiguration, SliConfig, SliEntity};
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_sli_config";
const SCHEMA_VERSION: u32 = 1;

const INITIAL_EVALUATION_TIMESTAMP: &str = "initial_evaluation_timestamp";
const METRIC_CONFIGURATION: &str = "metric_configuration";
const SLI_ENTITY: &str = "sli_entity";

const APPLICATION: &str = "application";
const AVAILABILITY: &str = "availability";
const WEBSITE_EVENT_BASED: &str = "website_event_based";
const WEBSITE_TIME_BASED: &str = "website_time_based";
const ENTITY_VARIANTS: &[&str] = &[
    APPLICATION,
    AVAILABILITY,
    WEBSITE_EVENT_BASED,
    WEBSITE_TIME_BASED,
];

const GOOD_EVENT_FILTER: &str = "good_event_filter_expression";
const BAD_EVENT_FILTER: &str = "bad_event_filter_expression";
const FILTER_EXPRESSION: &str = "filter_expression";

const METRIC_AGGREGATIONS: &[&str] = &[
    "SUM", "MEAN", "MAX", "MIN", "P25", "P50", "P75", "P90", "P95", "P98", "P99",
    "DISTINCT_COUNT",
];
const BOUNDARY_SCOPES: &[&str] = &["ALL", "INBOUND"];
const BEACON_TYPES: &[&str] = &[
    "pageLoad",
    "resourceLoad",
    "httpRequest",
    "error",
    "custom",
    "pageChange",
];

fn application_fields() -> Vec<(&'static str, FieldSchema)> {
    vec![
        ("application_id", FieldSchema::string().required()),
        ("service_id", FieldSchema::string().optional()),
        ("endpoint_id", FieldSchema::string().optional()),
        (
            "boundary_scope",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(BOUNDARY_SCOPES)),
        ),
    ]
}

fn website_fields() -> Vec<(&'static str, FieldSchema)> {
    vec![
        ("website_id", FieldSchema::string().required()),
        (
            "beacon_type",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(BEACON_TYPES)),
        ),
    ]
}

fn event_filters() -> [(&'static str, FieldSchema); 2] {
    [
        (GOOD_EVENT_FILTER, tag_filter_field(true)),
        (BAD_EVENT_FILTER, tag_filter_field(true)),
    ]
}

fn sli_entity_field() -> FieldSchema {
    let availability = application_fields()
        .into_iter()
        .chain(event_filters())
        .chain([
            ("include_internal", FieldSchema::bool().default(false)),
            ("include_synthetic", FieldSchema::bool().default(false)),
        ]);
    let website_event_based = website_fields().into_iter().chain(event_filters());
    let website_time_based = website_fields()
        .into_iter()
        .chain([(FILTER_EXPRESSION, tag_filter_field(false))]);
    variants_field(vec![
        (APPLICATION, Schema::new(application_fields())),
        (AVAILABILITY, Schema::new(availability)),
        (WEBSITE_EVENT_BASED, Schema::new(website_event_based)),
        (WEBSITE_TIME_BASED, Schema::new(website_time_based)),
    ])
    .force_new()
}

fn metric_configuration_field() -> FieldSchema {
    FieldSchema::block(Schema::new([
        ("metric_name", FieldSchema::string().required()),
        (
            "aggregation",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(METRIC_AGGREGATIONS)),
        ),
        (
            "threshold",
            FieldSchema::float()
                .required()
                .validate(Validator::FloatAtLeast(0.000_001)),
        ),
    ]))
    .optional()
    .force_new()
}

fn sli_entity_from_state(state: &StateMap) -> Result<SliEntity, ProviderError> {
    let container = required_block(state, SLI_ENTITY)?;
    let (variant, fields) = select_variant(container, SLI_ENTITY, ENTITY_VARIANTS)?;
    let entity = match variant {
        APPLICATION => SliEntity::Application {
            application_id: fields.string("application_id"),
            service_id: fields.opt_string("service_id"),
            endpoint_id: fields.opt_string("endpoint_id"),
            boundary_scope: fields.string("boundary_scope"),
        },
        AVAILABILITY => SliEntity::Availability {
            application_id: fields.string("application_id"),
            service_id: fields.opt_string("service_id"),
            endpoint_id: fields.opt_string("endpoint_id"),
            boundary_scope: fields.string("boundary_scope"),
            good_event_filter_expression: tag_filter_from_state(fields, GOOD_EVENT_FILTER)?,
            bad_event_filter_expression: tag_filter_from_state(fields, BAD_EVENT_FILTER)?,
            include_internal: fields.bool("include_internal"),
            include_synthetic: fields.bool("include_synthetic"),
        },
        WEBSITE_EVENT_BASED => SliEntity::WebsiteEventBased {
            website_id: fields.string("website_id"),
            beacon_type: fields.string("beacon_type"),
            good_event_filter_expression: tag_filter_from_state(fields, GOOD_EVENT_FILTER)?,
            bad_event_filter_expression: tag_filter_from_state(fields, BAD_EVENT_FILTER)?,
        },
        _ => {
            let filter = tag_filter_from_state(fields, FILTER_EXPRESSION)?;
            SliEntity::WebsiteTimeBased {
                website_id: fields.string("website_id"),
                beacon_type: fields.string("beacon_type"),
                filter_expression: (!filter.is_empty()).then_some(filter),
            }
        }
    };
    Ok(entity)
}

fn filter_text(model: &TagFilterModel) -> Value {
    Value::from(tag_filter_from_api(model))
}

fn sli_entity_to_state(entity: &SliEntity) -> Result<Value, ProviderError> {
    let (variant, fields) = match entity {
        SliEntity::Application {
            application_id,
            service_id,
            endpoint_id,
            boundary_scope,
        } => (
            APPLICATION,
            state_map([
                ("application_id", Value::from(application_id)),
                ("service_id", Value::from(service_id.clone())),
                ("endpoint_id", Value::from(endpoint_id.clone())),
                ("boundary_scope", Value::from(boundary_scope)),
            ]),
        ),
        SliEntity::Availability {
            application_id,
            service_id,
            endpoint_id,
            boundary_scope,
            good_event_filter_expression,
            bad_event_filter_expression,
            include_internal,
            include_synthetic,
        } => (
            AVAILABILITY,
            state_map([
                ("application_id", Value::from(application_id)),
                ("service_id", Value::from(service_id.clone())),
                ("endpoint_id", Value::from(endpoint_id.clone())),
                ("boundary_scope", Value::from(boundary_scope)),
                (GOOD_EVENT_FILTER, filter_text(good_event_filter_expression)),
                (BAD_EVENT_FILTER, filter_text(bad_event_filter_expression)),
                ("include_internal", Value::Bool(*include_internal)),
                ("include_synthetic", Value::Bool(*include_synthetic)),
            ]),
        ),
        SliEntity::WebsiteEventBased {
            website_id,
            beacon_type,
            good_event_filter_expression,
            bad_event_filter_expression,
        } => (
            WEBSITE_EVENT_BASED,
            state_map([
                ("website_id", Value::from(website_id)),
                ("beacon_type", Value::from(beacon_type)),
                (GOOD_EVENT_FILTER, filter_text(good_event_filter_expression)),
                (BAD_EVENT_FILTER, filter_text(bad_event_filter_expression)),
            ]),
        ),
        SliEntity::WebsiteTimeBased {
            website_id,
            beacon_type,
            filter_expression,
        } => (
            WEBSITE_TIME_BASED,
            state_map([
                ("website_id", Value::from(website_id)),
                ("beacon_type", Value::from(beacon_type)),
                (
                    FILTER_EXPRESSION,
                    Value::from(filter_expression.as_ref().map(tag_filter_from_api)),
                ),
            ]),
        ),
        SliEntity::Unknown => {
            return Err(ProviderError::unknown_discriminator(SLI_ENTITY, "unknown"))
        }
    };
    Ok(variants_value(ENTITY_VARIANTS, variant, fields))
}

fn metric_configuration_to_state(config: Option<&MetricConfiguration>) -> Value {
    match config {
        Some(config) => Value::block([
            ("metric_name", Value::from(&config.metric_name)),
            ("aggregation", Value::from(&config.aggregation)),
            ("threshold", Value::Float(config.threshold)),
        ]),
        None => Value::empty_list(),
    }
}

pub struct SliConfigResource {
    metadata: ResourceMetadata,
}

impl SliConfigResource {
    pub fn new() -> Self {
        let names = NAME
            .fields("The name of the SLI configuration")
            .map(|(key, field)| {
                if key == NAME.short {
                    (key, field.force_new())
                } else {
                    (key, field)
                }
            });
        let schema = Schema::new(names.into_iter().chain([
            (
                INITIAL_EVALUATION_TIMESTAMP,
                FieldSchema::int().optional().force_new(),
            ),
            (METRIC_CONFIGURATION, metric_configuration_field()),
            (SLI_ENTITY, sli_entity_field()),
        ]));
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for SliConfigResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for SliConfigResource {
    type Object = SliConfig;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(&'a self, api: &'a dyn InstanaApi) -> &'a dyn RestResource<SliConfig> {
        api.sli_configs()
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
        config: &SliConfig,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &config.sli_name, formatter)?;
        data.set_all([
            (
                INITIAL_EVALUATION_TIMESTAMP,
                Value::from(config.initial_evaluation_timestamp),
            ),
            (
                METRIC_CONFIGURATION,
                metric_configuration_to_state(config.metric_configuration.as_ref()),
            ),
            (SLI_ENTITY, sli_entity_to_state(&config.sli_entity)?),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<SliConfig, ProviderError> {
        let state = data.state();
        let metric_configuration = state.block(METRIC_CONFIGURATION).map(|block| MetricConfiguration {
            metric_name: block.string("metric_name"),
            aggregation: block.string("aggregation"),
            threshold: block.f64("threshold"),
        });
        Ok(SliConfig {
            id: data.id().to_string(),
            sli_name: NAME.api_name(data, formatter),
            initial_evaluation_timestamp: state.opt_i64(INITIAL_EVALUATION_TIMESTAMP),
            metric_configuration,
            sli_entity: sli_entity_from_state(state)?,
        })
    }
}
