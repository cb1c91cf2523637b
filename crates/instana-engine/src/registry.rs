//! name keyed registry of resources and data sources.

use crate::data::ResourceData;
use crate::driver::{DataSourceDriver, ResourceDriver};
use crate::error::ProviderError;
use crate::handle::{DataSourceHandle, ResourceHandle};
use crate::meta::ProviderMeta;
use crate::upgrade::StateUpgrader;
use async_trait::async_trait;
use instana_core::Schema;
use std::collections::BTreeMap;

/// object safe view of a driver-bound resource.
#[async_trait]
pub trait Resource: Send + Sync {
    fn name(&self) -> &'static str;
    fn schema(&self) -> &Schema;
    fn schema_version(&self) -> u32;
    fn state_upgraders(&self) -> Vec<StateUpgrader>;

    async fn create(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError>;
    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData<'_>)
        -> Result<(), ProviderError>;
    async fn update(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError>;
    async fn delete(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError>;
    async fn import(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
        id: &str,
    ) -> Result<(), ProviderError>;
}

/// object safe view of a driver-bound data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn schema(&self) -> &Schema;

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData<'_>)
        -> Result<(), ProviderError>;
}

#[async_trait]
impl<H: ResourceHandle> Resource for ResourceDriver<H> {
    fn name(&self) -> &'static str {
        self.handle().metadata().resource_name
    }

    fn schema(&self) -> &Schema {
        &self.handle().metadata().schema
    }

    fn schema_version(&self) -> u32 {
        self.handle().metadata().schema_version
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        self.handle().state_upgraders()
    }

    async fn create(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        ResourceDriver::create(self, meta, data).await
    }

    async fn read(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        ResourceDriver::read(self, meta, data).await
    }

    async fn update(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        ResourceDriver::update(self, meta, data).await
    }

    async fn delete(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        ResourceDriver::delete(self, meta, data).await
    }

    async fn import(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
        id: &str,
    ) -> Result<(), ProviderError> {
        ResourceDriver::import(self, meta, data, id).await
    }
}

#[async_trait]
impl<H: DataSourceHandle> DataSource for DataSourceDriver<H> {
    fn name(&self) -> &'static str {
        self.handle().metadata().resource_name
    }

    fn schema(&self) -> &Schema {
        &self.handle().metadata().schema
    }

    async fn read(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        DataSourceDriver::read(self, meta, data).await
    }
}

/// every resource and data source the provider serves.
#[derive(Default)]
pub struct ProviderRegistry {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resource<H>(&mut self, handle: H) -> &mut Self
    where
        H: ResourceHandle + 'static,
    {
        let driver = ResourceDriver::new(handle);
        self.resources
            .insert(Resource::name(&driver), Box::new(driver));
        self
    }

    pub fn register_data_source<H>(&mut self, handle: H) -> &mut Self
    where
        H: DataSourceHandle + 'static,
    {
        let driver = DataSourceDriver::new(handle);
        self.data_sources
            .insert(DataSource::name(&driver), Box::new(driver));
        self
    }

    pub fn resource(&self, name: &str) -> Option<&dyn Resource> {
        self.resources.get(name).map(|resource| resource.as_ref())
    }

    pub fn data_source(&self, name: &str) -> Option<&dyn DataSource> {
        self.data_sources.get(name).map(|source| source.as_ref())
    }

    pub fn resources(&self) -> impl Iterator<Item = &dyn Resource> {
        self.resources.values().map(|resource| resource.as_ref())
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &dyn DataSource> {
        self.data_sources.values().map(|source| source.as_ref())
    }
}
