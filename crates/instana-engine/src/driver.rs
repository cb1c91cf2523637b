//! generic lifecycle callbacks over a resource handle.

use crate::data::ResourceData;
use crate::error::ProviderError;
use crate::handle::{DataSourceHandle, ResourceHandle};
use crate::meta::ProviderMeta;
use instana_restapi::{InstanaDataObject, RestError};
use tracing::{debug, warn};

/// crud driver bound to one resource handle.
pub struct ResourceDriver<H> {
    handle: H,
}

impl<H: ResourceHandle> ResourceDriver<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    fn name(&self) -> &'static str {
        self.handle.metadata().resource_name
    }

    /// create the remote object. on failure the state is cleared.
    pub async fn create(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        debug!(resource = self.name(), "create");
        let mut working = data.clone();
        working.apply_defaults();
        match self.write(meta, &mut working, true).await {
            Ok(()) => {
                *data = working;
                Ok(())
            }
            Err(err) => {
                data.clear();
                Err(err)
            }
        }
    }

    /// update the remote object. on failure the state is left untouched.
    pub async fn update(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        debug!(resource = self.name(), id = data.id(), "update");
        let mut working = data.clone();
        self.write(meta, &mut working, false).await?;
        *data = working;
        Ok(())
    }

    async fn write(
        &self,
        meta: &ProviderMeta,
        working: &mut ResourceData<'_>,
        create: bool,
    ) -> Result<(), ProviderError> {
        self.handle
            .set_computed_fields(working, &meta.formatter)?;
        let mut object = self
            .handle
            .map_state_to_data_object(working, &meta.formatter)?;
        let facet = self.handle.rest_resource(meta.api());

        let written = if create {
            facet.create(&object).await?
        } else {
            object.set_id(working.id().to_string());
            facet.update(&object).await?
        };

        working.set_id(written.id().to_string());
        self.handle
            .update_state(working, &written, &meta.formatter)
    }

    /// refresh the state from the remote object; a missing object clears the id.
    pub async fn read(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        let id = data.id().to_string();
        if id.is_empty() {
            return Err(ProviderError::invalid("id", "resource id is missing"));
        }
        debug!(resource = self.name(), id = %id, "read");

        let facet = self.handle.rest_resource(meta.api());
        match facet.get_one(&id).await {
            Ok(object) => {
                let mut working = data.clone();
                working.set_id(object.id().to_string());
                self.handle
                    .update_state(&mut working, &object, &meta.formatter)?;
                *data = working;
                Ok(())
            }
            Err(RestError::NotFound { .. }) => {
                warn!(
                    resource = self.name(),
                    id = %id,
                    "resource no longer exists, removing it from state"
                );
                data.set_id("");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// delete the remote object; an already missing object counts as deleted.
    pub async fn delete(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        let id = data.id().to_string();
        debug!(resource = self.name(), id = %id, "delete");
        if id.is_empty() {
            return Ok(());
        }
        let facet = self.handle.rest_resource(meta.api());
        match facet.delete_by_id(&id).await {
            Ok(()) => {}
            Err(RestError::NotFound { .. }) => {
                debug!(resource = self.name(), id = %id, "already deleted");
            }
            Err(err) => return Err(err.into()),
        }
        data.set_id("");
        Ok(())
    }

    /// attach an existing remote object to an empty state.
    pub async fn import(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
        external_id: &str,
    ) -> Result<(), ProviderError> {
        debug!(resource = self.name(), id = external_id, "import");
        data.clear();
        data.set_id(external_id);
        self.read(meta, data).await?;
        if data.id().is_empty() {
            return Err(ProviderError::NotFound {
                resource: self.name().to_string(),
                id: external_id.to_string(),
            });
        }
        Ok(())
    }
}

/// lookup driver bound to one data source handle.
pub struct DataSourceDriver<H> {
    handle: H,
}

impl<H: DataSourceHandle> DataSourceDriver<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// find the single object matching the lookup attributes and write it to state.
    pub async fn read(
        &self,
        meta: &ProviderMeta,
        data: &mut ResourceData<'_>,
    ) -> Result<(), ProviderError> {
        let name = self.handle.metadata().resource_name;
        debug!(data_source = name, "lookup");
        let objects = self.handle.rest_resource(meta.api()).get_all().await?;
        let mut matches = objects
            .iter()
            .filter(|object| self.handle.matches(data, object, &meta.formatter));

        let Some(found) = matches.next() else {
            return Err(ProviderError::NotFound {
                resource: name.to_string(),
                id: lookup_description(data),
            });
        };
        if matches.next().is_some() {
            return Err(ProviderError::ambiguous(
                name,
                format!("more than one object matches {}", lookup_description(data)),
            ));
        }

        let mut working = data.clone();
        working.set_id(found.id().to_string());
        self.handle
            .update_state(&mut working, found, &meta.formatter)?;
        *data = working;
        Ok(())
    }
}

fn lookup_description(data: &ResourceData<'_>) -> String {
    data.iter()
        .filter(|(_, value)| !value.is_empty_value())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
