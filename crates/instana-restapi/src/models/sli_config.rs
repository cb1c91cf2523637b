use crate::resource::InstanaDataObject;
use instana_core::tagfilter::TagFilterModel;
use serde::{Deserialize, Serialize};

/// service level indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub sli_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_evaluation_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_configuration: Option<MetricConfiguration>,
    pub sli_entity: SliEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfiguration {
    pub metric_name: String,
    #[serde(rename = "metricAggregation")]
    pub aggregation: String,
    pub threshold: f64,
}

/// measured entity, discriminated by `sliType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sliType")]
pub enum SliEntity {
    #[serde(rename = "application", rename_all = "camelCase")]
    Application {
        application_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint_id: Option<String>,
        boundary_scope: String,
    },
    #[serde(rename = "availability", rename_all = "camelCase")]
    Availability {
        application_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint_id: Option<String>,
        boundary_scope: String,
        good_event_filter_expression: TagFilterModel,
        bad_event_filter_expression: TagFilterModel,
        #[serde(default)]
        include_internal: bool,
        #[serde(default)]
        include_synthetic: bool,
    },
    #[serde(rename = "websiteEventBased", rename_all = "camelCase")]
    WebsiteEventBased {
        website_id: String,
        beacon_type: String,
        good_event_filter_expression: TagFilterModel,
        bad_event_filter_expression: TagFilterModel,
    },
    #[serde(rename = "websiteTimeBased", rename_all = "camelCase")]
    WebsiteTimeBased {
        website_id: String,
        beacon_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter_expression: Option<TagFilterModel>,
    },
    #[serde(other)]
    Unknown,
}

impl InstanaDataObject for SliConfig {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("id is missing".to_string());
        }
        if self.sli_name.is_empty() {
            return Err("sli name is missing".to_string());
        }
        Ok(())
    }
}
