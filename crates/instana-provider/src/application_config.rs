//! application perspectives scoped by a tag filter.

use crate::common::{tag_filter_from_state, LABEL, TAG_FILTER};
use instana_core::tagfilter::{tag_filter_field, tag_filter_from_api};
use instana_core::{
    Element, FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Validator, Value,
};
use instana_engine::{
    full_label_to_label, rename_legacy_field, ProviderError, ResourceData, ResourceHandle,
    ResourceMetadata, StateUpgrader,
};
use instana_restapi::models::{AccessRule, ApplicationConfig};
use instana_restapi::{InstanaApi, RestResource};

pub const RESOURCE_NAME: &str = "instana_application_config";
const SCHEMA_VERSION: u32 = 2;

const SCOPES: &[&str] = &[
    "INCLUDE_NO_DOWNSTREAM",
    "INCLUDE_IMMEDIATE_DOWNSTREAM_DATABASE_AND_MESSAGING",
    "INCLUDE_ALL_DOWNSTREAM",
];
const BOUNDARY_SCOPES: &[&str] = &["ALL", "INBOUND", "DEFAULT"];
pub const ACCESS_TYPES: &[&str] = &["READ", "READ_WRITE"];
pub const RELATION_TYPES: &[&str] = &["USER", "API_TOKEN", "ROLE", "TEAM", "GLOBAL"];

const SCOPE: &str = "scope";
const BOUNDARY_SCOPE: &str = "boundary_scope";
pub const ACCESS_RULE: &str = "access_rule";

/// list of access rule blocks, shared with dashboards.
pub fn access_rule_field() -> FieldSchema {
    FieldSchema::list(Element::Resource(Schema::new([
        (
            "access_type",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(ACCESS_TYPES)),
        ),
        (
            "relation_type",
            FieldSchema::string()
                .required()
                .validate(Validator::OneOf(RELATION_TYPES)),
        ),
        ("related_id", FieldSchema::string().optional()),
    ])))
    .optional()
}

pub fn access_rules_from_state(state: &StateMap) -> Vec<AccessRule> {
    state
        .list(ACCESS_RULE)
        .iter()
        .filter_map(Value::as_map)
        .map(|rule| AccessRule {
            access_type: rule.string("access_type"),
            relation_type: rule.string("relation_type"),
            related_id: rule.opt_string("related_id"),
        })
        .collect()
}

pub fn access_rules_to_state(rules: &[AccessRule]) -> Value {
    Value::List(
        rules
            .iter()
            .map(|rule| {
                let mut fields = StateMap::new();
                fields.insert("access_type".to_string(), Value::from(&rule.access_type));
                fields.insert("relation_type".to_string(), Value::from(&rule.relation_type));
                if let Some(related_id) = &rule.related_id {
                    fields.insert("related_id".to_string(), Value::from(related_id));
                }
                Value::Map(fields)
            })
            .collect(),
    )
}

/// schema version 1 stored the filter under `match_specification`.
fn match_specification_to_tag_filter(state: StateMap) -> Result<StateMap, String> {
    Ok(rename_legacy_field(state, "match_specification", TAG_FILTER))
}

pub struct ApplicationConfigResource {
    metadata: ResourceMetadata,
}

impl ApplicationConfigResource {
    pub fn new() -> Self {
        let schema = Schema::new(
            LABEL
                .fields("The label of the application perspective")
                .into_iter()
                .chain([
                    (
                        SCOPE,
                        FieldSchema::string()
                            .default("INCLUDE_NO_DOWNSTREAM")
                            .validate(Validator::OneOf(SCOPES)),
                    ),
                    (
                        BOUNDARY_SCOPE,
                        FieldSchema::string()
                            .default("DEFAULT")
                            .validate(Validator::OneOf(BOUNDARY_SCOPES)),
                    ),
                    (TAG_FILTER, tag_filter_field(true)),
                    (ACCESS_RULE, access_rule_field()),
                ]),
        );
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, schema, SCHEMA_VERSION),
        }
    }
}

impl Default for ApplicationConfigResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for ApplicationConfigResource {
    type Object = ApplicationConfig;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![
            StateUpgrader::new(0, full_label_to_label),
            StateUpgrader::new(1, match_specification_to_tag_filter),
        ]
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn RestResource<ApplicationConfig> {
        api.application_configs()
    }

    fn set_computed_fields(
        &self,
        data: &mut ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        LABEL.set_computed(data, formatter)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        config: &ApplicationConfig,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        LABEL.write_state(data, &config.label, formatter)?;
        let tag_filter = config
            .tag_filter_expression
            .as_ref()
            .map(tag_filter_from_api)
            .unwrap_or_default();
        let access_rules = if config.access_rules == [AccessRule::global_read_write()] {
            Vec::new()
        } else {
            config.access_rules.clone()
        };
        data.set_all([
            (SCOPE, Value::from(&config.scope)),
            (BOUNDARY_SCOPE, Value::from(&config.boundary_scope)),
            (TAG_FILTER, Value::from(tag_filter)),
            (ACCESS_RULE, access_rules_to_state(&access_rules)),
        ])?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<ApplicationConfig, ProviderError> {
        let mut access_rules = access_rules_from_state(data.state());
        if access_rules.is_empty() {
            access_rules.push(AccessRule::global_read_write());
        }
        Ok(ApplicationConfig {
            id: data.id().to_string(),
            label: LABEL.api_name(data, formatter),
            scope: data.string(SCOPE),
            boundary_scope: data.string(BOUNDARY_SCOPE),
            tag_filter_expression: Some(tag_filter_from_state(data.state(), TAG_FILTER)?),
            access_rules,
        })
    }
}
