//! alerting channels: one resource covering every kind, one resource per kind
//! and a lookup by name.

use crate::common::{block_value, NAME};
use instana_core::{
    FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Validator, Value,
};
use instana_engine::polymorphic::{select_variant, state_map};
use instana_engine::{
    full_name_to_name, DataSourceHandle, ProviderError, ResourceData, ResourceHandle,
    ResourceMetadata, StateUpgrader,
};
use instana_restapi::models::{AlertingChannel, AlertingChannelConfig};
use instana_restapi::{InstanaApi, ReadOnlyRestResource, RestResource};
use std::collections::BTreeMap;

pub const RESOURCE_NAME: &str = "instana_alerting_channel";
pub const DATA_SOURCE_NAME: &str = "instana_alerting_channel";
const FAMILY: &str = "alerting channel";
const SCHEMA_VERSION: u32 = 1;

const OPS_GENIE_REGIONS: &[&str] = &["EU", "US"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    GoogleChat,
    Office365,
    OpsGenie,
    PagerDuty,
    Slack,
    Splunk,
    VictorOps,
    Webhook,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 9] = [
        ChannelKind::Email,
        ChannelKind::GoogleChat,
        ChannelKind::Office365,
        ChannelKind::OpsGenie,
        ChannelKind::PagerDuty,
        ChannelKind::Slack,
        ChannelKind::Splunk,
        ChannelKind::VictorOps,
        ChannelKind::Webhook,
    ];

    /// state keys of every kind, in [`ChannelKind::ALL`] order.
    pub const KEYS: &'static [&'static str] = &[
        "email",
        "google_chat",
        "office_365",
        "ops_genie",
        "pager_duty",
        "slack",
        "splunk",
        "victor_ops",
        "webhook",
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::GoogleChat => "google_chat",
            ChannelKind::Office365 => "office_365",
            ChannelKind::OpsGenie => "ops_genie",
            ChannelKind::PagerDuty => "pager_duty",
            ChannelKind::Slack => "slack",
            ChannelKind::Splunk => "splunk",
            ChannelKind::VictorOps => "victor_ops",
            ChannelKind::Webhook => "webhook",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// name of the dedicated single kind resource.
    pub fn resource_name(self) -> &'static str {
        match self {
            ChannelKind::Email => "instana_alerting_channel_email",
            ChannelKind::GoogleChat => "instana_alerting_channel_google_chat",
            ChannelKind::Office365 => "instana_alerting_channel_office_365",
            ChannelKind::OpsGenie => "instana_alerting_channel_ops_genie",
            ChannelKind::PagerDuty => "instana_alerting_channel_pager_duty",
            ChannelKind::Slack => "instana_alerting_channel_slack",
            ChannelKind::Splunk => "instana_alerting_channel_splunk",
            ChannelKind::VictorOps => "instana_alerting_channel_victor_ops",
            ChannelKind::Webhook => "instana_alerting_channel_webhook",
        }
    }

    pub fn fields(self) -> Vec<(&'static str, FieldSchema)> {
        let url = || {
            FieldSchema::string()
                .required()
                .validate(Validator::NonEmpty)
        };
        let secret = || FieldSchema::string().required().sensitive();
        match self {
            ChannelKind::Email => vec![(
                "emails",
                FieldSchema::string_set()
                    .required()
                    .min_items(1)
                    .description("The list of emails of the email alerting channel"),
            )],
            ChannelKind::GoogleChat | ChannelKind::Office365 => vec![("webhook_url", url())],
            ChannelKind::OpsGenie => vec![
                ("api_key", secret()),
                (
                    "tags",
                    FieldSchema::string_list().required().min_items(1),
                ),
                (
                    "region",
                    FieldSchema::string()
                        .required()
                        .validate(Validator::OneOf(OPS_GENIE_REGIONS)),
                ),
            ],
            ChannelKind::PagerDuty => vec![("service_integration_key", secret())],
            ChannelKind::Slack => vec![
                ("webhook_url", url()),
                ("icon_url", FieldSchema::string().optional()),
                ("channel", FieldSchema::string().optional()),
            ],
            ChannelKind::Splunk => vec![("url", url()), ("token", secret())],
            ChannelKind::VictorOps => vec![
                ("api_key", secret()),
                ("routing_key", FieldSchema::string().required()),
            ],
            ChannelKind::Webhook => vec![
                (
                    "webhook_urls",
                    FieldSchema::string_list().required().min_items(1),
                ),
                (
                    "http_headers",
                    FieldSchema::string_map()
                        .optional()
                        .description("Headers sent with every webhook call"),
                ),
            ],
        }
    }

    /// api settings from the kind's state fields.
    pub fn config_from_state(self, fields: &StateMap) -> AlertingChannelConfig {
        match self {
            ChannelKind::Email => AlertingChannelConfig::Email {
                emails: fields.strings("emails"),
            },
            ChannelKind::GoogleChat => AlertingChannelConfig::GoogleChat {
                webhook_url: fields.string("webhook_url"),
            },
            ChannelKind::Office365 => AlertingChannelConfig::Office365 {
                webhook_url: fields.string("webhook_url"),
            },
            ChannelKind::OpsGenie => AlertingChannelConfig::OpsGenie {
                api_key: fields.string("api_key"),
                tags: fields.strings("tags").join(","),
                region: fields.string("region"),
            },
            ChannelKind::PagerDuty => AlertingChannelConfig::PagerDuty {
                service_integration_key: fields.string("service_integration_key"),
            },
            ChannelKind::Slack => AlertingChannelConfig::Slack {
                webhook_url: fields.string("webhook_url"),
                icon_url: fields.opt_string("icon_url"),
                channel: fields.opt_string("channel"),
            },
            ChannelKind::Splunk => AlertingChannelConfig::Splunk {
                url: fields.string("url"),
                token: fields.string("token"),
            },
            ChannelKind::VictorOps => AlertingChannelConfig::VictorOps {
                api_key: fields.string("api_key"),
                routing_key: fields.string("routing_key"),
            },
            ChannelKind::Webhook => AlertingChannelConfig::Webhook {
                webhook_urls: fields.strings("webhook_urls"),
                headers: headers_to_api(&fields.string_map("http_headers")),
            },
        }
    }
}

/// kind and state fields of an api config. the `kind` discriminator wins over
/// any field belonging to another kind.
pub fn config_to_state(
    config: &AlertingChannelConfig,
) -> Result<(ChannelKind, StateMap), ProviderError> {
    let (kind, fields) = match config {
        AlertingChannelConfig::Email { emails } => (
            ChannelKind::Email,
            state_map([("emails", Value::string_set(emails.iter().cloned()))]),
        ),
        AlertingChannelConfig::GoogleChat { webhook_url } => (
            ChannelKind::GoogleChat,
            state_map([("webhook_url", Value::from(webhook_url))]),
        ),
        AlertingChannelConfig::Office365 { webhook_url } => (
            ChannelKind::Office365,
            state_map([("webhook_url", Value::from(webhook_url))]),
        ),
        AlertingChannelConfig::OpsGenie {
            api_key,
            tags,
            region,
        } => (
            ChannelKind::OpsGenie,
            state_map([
                ("api_key", Value::from(api_key)),
                ("tags", Value::string_list(tags_from_api(tags))),
                ("region", Value::from(region)),
            ]),
        ),
        AlertingChannelConfig::PagerDuty {
            service_integration_key,
        } => (
            ChannelKind::PagerDuty,
            state_map([(
                "service_integration_key",
                Value::from(service_integration_key),
            )]),
        ),
        AlertingChannelConfig::Slack {
            webhook_url,
            icon_url,
            channel,
        } => (
            ChannelKind::Slack,
            state_map([
                ("webhook_url", Value::from(webhook_url)),
                ("icon_url", Value::from(icon_url.clone())),
                ("channel", Value::from(channel.clone())),
            ]),
        ),
        AlertingChannelConfig::Splunk { url, token } => (
            ChannelKind::Splunk,
            state_map([("url", Value::from(url)), ("token", Value::from(token))]),
        ),
        AlertingChannelConfig::VictorOps {
            api_key,
            routing_key,
        } => (
            ChannelKind::VictorOps,
            state_map([
                ("api_key", Value::from(api_key)),
                ("routing_key", Value::from(routing_key)),
            ]),
        ),
        AlertingChannelConfig::Webhook {
            webhook_urls,
            headers,
        } => (
            ChannelKind::Webhook,
            state_map([
                ("webhook_urls", Value::string_list(webhook_urls.iter().cloned())),
                ("http_headers", Value::string_map(headers_from_api(headers))),
            ]),
        ),
        AlertingChannelConfig::Unknown => {
            return Err(ProviderError::unknown_discriminator(FAMILY, "unknown"))
        }
    };
    let fields = fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    Ok((kind, fields))
}

/// headers as `"Key: Value"` strings.
pub fn headers_to_api(headers: &BTreeMap<String, String>) -> Vec<String> {
    headers
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect()
}

/// split on the first colon; a header without value maps to an empty string.
pub fn headers_from_api(headers: &[String]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|header| match header.split_once(':') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (header.trim().to_string(), String::new()),
        })
        .collect()
}

fn tags_from_api(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn kind_blocks(required_name: bool) -> Schema {
    let mut schema = if required_name {
        Schema::new(NAME.fields("Configures the name of the alerting channel"))
    } else {
        Schema::new([(
            NAME.short,
            FieldSchema::string().required().validate(Validator::NonEmpty),
        )])
    };
    for kind in ChannelKind::ALL {
        let block = FieldSchema::block(Schema::new(kind.fields()));
        let block = if required_name {
            block.optional()
        } else {
            block.computed()
        };
        schema = schema.with(kind.key(), block);
    }
    schema
}

fn write_kind_blocks(
    data: &mut ResourceData<'_>,
    config: &AlertingChannelConfig,
) -> Result<(), ProviderError> {
    let (selected, fields) = config_to_state(config)?;
    for kind in ChannelKind::ALL {
        let value = if kind == selected {
            block_value(fields.clone())
        } else {
            Value::empty_list()
        };
        data.set(kind.key(), value)?;
    }
    Ok(())
}

/// `instana_alerting_channel`: every kind behind one resource, one block per kind.
pub struct AlertingChannelResource {
    metadata: ResourceMetadata,
}

impl AlertingChannelResource {
    pub fn new() -> Self {
        Self {
            metadata: ResourceMetadata::new(RESOURCE_NAME, kind_blocks(true), SCHEMA_VERSION),
        }
    }
}

impl Default for AlertingChannelResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandle for AlertingChannelResource {
    type Object = AlertingChannel;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(&'a self, api: &'a dyn InstanaApi) -> &'a dyn RestResource<AlertingChannel> {
        api.alerting_channels()
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
        channel: &AlertingChannel,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        NAME.write_state(data, &channel.name, formatter)?;
        write_kind_blocks(data, &channel.config)
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<AlertingChannel, ProviderError> {
        let (key, fields) = select_variant(data.state(), FAMILY, ChannelKind::KEYS)?;
        let kind = ChannelKind::from_key(key)
            .ok_or_else(|| ProviderError::unknown_discriminator(FAMILY, key))?;
        Ok(AlertingChannel {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            config: kind.config_from_state(fields),
        })
    }
}

/// `instana_alerting_channel_<kind>`: a single kind with flat fields.
pub struct AlertingChannelKindResource {
    kind: ChannelKind,
    metadata: ResourceMetadata,
}

impl AlertingChannelKindResource {
    pub fn new(kind: ChannelKind) -> Self {
        let schema = Schema::new(
            NAME.fields("Configures the name of the alerting channel")
                .into_iter()
                .chain(kind.fields()),
        );
        Self {
            kind,
            metadata: ResourceMetadata::new(kind.resource_name(), schema, SCHEMA_VERSION),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }
}

impl ResourceHandle for AlertingChannelKindResource {
    type Object = AlertingChannel;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(&'a self, api: &'a dyn InstanaApi) -> &'a dyn RestResource<AlertingChannel> {
        api.alerting_channels()
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
        channel: &AlertingChannel,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        let (kind, fields) = config_to_state(&channel.config)?;
        if kind != self.kind {
            return Err(ProviderError::unknown_discriminator(
                FAMILY,
                channel.config.kind(),
            ));
        }
        NAME.write_state(data, &channel.name, formatter)?;
        for (key, _) in self.kind.fields() {
            match fields.get(key) {
                Some(value) => data.set(key, value.clone())?,
                None => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<AlertingChannel, ProviderError> {
        Ok(AlertingChannel {
            id: data.id().to_string(),
            name: NAME.api_name(data, formatter),
            config: self.kind.config_from_state(data.state()),
        })
    }
}

/// lookup of an existing channel by its api name.
pub struct AlertingChannelDataSource {
    metadata: ResourceMetadata,
}

impl AlertingChannelDataSource {
    pub fn new() -> Self {
        Self {
            metadata: ResourceMetadata::new(DATA_SOURCE_NAME, kind_blocks(false), 0),
        }
    }
}

impl Default for AlertingChannelDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceHandle for AlertingChannelDataSource {
    type Object = AlertingChannel;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn ReadOnlyRestResource<AlertingChannel> {
        api.alerting_channels()
    }

    fn matches(
        &self,
        data: &ResourceData<'_>,
        channel: &AlertingChannel,
        _formatter: &ResourceNameFormatter,
    ) -> bool {
        channel.name == data.string(NAME.short)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        channel: &AlertingChannel,
        _formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        write_kind_blocks(data, &channel.config)
    }
}
