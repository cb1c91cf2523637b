//! per resource kind contracts implemented by the provider.

use crate::data::ResourceData;
use crate::error::ProviderError;
use crate::upgrade::StateUpgrader;
use instana_core::{ResourceNameFormatter, Schema};
use instana_restapi::{InstanaApi, InstanaDataObject, ReadOnlyRestResource, RestResource};

/// stable identity of a resource or data source kind.
#[derive(Debug, Clone)]
pub struct ResourceMetadata {
    pub resource_name: &'static str,
    pub schema: Schema,
    pub schema_version: u32,
}

impl ResourceMetadata {
    pub fn new(resource_name: &'static str, schema: Schema, schema_version: u32) -> Self {
        Self {
            resource_name,
            schema,
            schema_version,
        }
    }
}

/// everything the crud driver needs to manage one resource kind.
pub trait ResourceHandle: Send + Sync {
    type Object: InstanaDataObject;

    fn metadata(&self) -> &ResourceMetadata;

    /// ordered upgraders, indexed by the version they migrate from.
    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        Vec::new()
    }

    /// the facet this resource is written through.
    fn rest_resource<'a>(&'a self, api: &'a dyn InstanaApi) -> &'a dyn RestResource<Self::Object>;

    /// fill fields derived from other fields, e.g. `full_name`.
    fn set_computed_fields(
        &self,
        _data: &mut ResourceData<'_>,
        _formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    /// populate the state tree from an api object.
    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        object: &Self::Object,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError>;

    /// build the api object from the state tree.
    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<Self::Object, ProviderError>;
}

/// read only lookup of an existing api object by attributes.
pub trait DataSourceHandle: Send + Sync {
    type Object: InstanaDataObject;

    fn metadata(&self) -> &ResourceMetadata;

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn ReadOnlyRestResource<Self::Object>;

    /// whether `object` satisfies the lookup attributes in `data`.
    fn matches(
        &self,
        data: &ResourceData<'_>,
        object: &Self::Object,
        formatter: &ResourceNameFormatter,
    ) -> bool;

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        object: &Self::Object,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError>;
}
