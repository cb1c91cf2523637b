//! lookup of synthetic test locations by label and type.

use instana_core::{FieldSchema, ResourceNameFormatter, Schema, StateMapExt, Validator, Value};
use instana_engine::{DataSourceHandle, ProviderError, ResourceData, ResourceMetadata};
use instana_restapi::models::SyntheticLocation;
use instana_restapi::{InstanaApi, ReadOnlyRestResource};

pub const DATA_SOURCE_NAME: &str = "instana_synthetic_location";

const LABEL: &str = "label";
const LOCATION_TYPE: &str = "location_type";
const DISPLAY_LABEL: &str = "display_label";

const LOCATION_TYPES: &[&str] = &["Public", "Private"];

pub struct SyntheticLocationDataSource {
    metadata: ResourceMetadata,
}

impl SyntheticLocationDataSource {
    pub fn new() -> Self {
        let schema = Schema::new([
            (
                LABEL,
                FieldSchema::string()
                    .optional()
                    .description("Label of the location"),
            ),
            (
                LOCATION_TYPE,
                FieldSchema::string()
                    .optional()
                    .validate(Validator::OneOf(LOCATION_TYPES)),
            ),
            (DISPLAY_LABEL, FieldSchema::string().computed()),
        ]);
        Self {
            metadata: ResourceMetadata::new(DATA_SOURCE_NAME, schema, 0),
        }
    }
}

impl Default for SyntheticLocationDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceHandle for SyntheticLocationDataSource {
    type Object = SyntheticLocation;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn rest_resource<'a>(
        &'a self,
        api: &'a dyn InstanaApi,
    ) -> &'a dyn ReadOnlyRestResource<SyntheticLocation> {
        api.synthetic_locations()
    }

    /// unset attributes match every location.
    fn matches(
        &self,
        data: &ResourceData<'_>,
        location: &SyntheticLocation,
        _formatter: &ResourceNameFormatter,
    ) -> bool {
        let label = data.opt_string(LABEL);
        let location_type = data.opt_string(LOCATION_TYPE);
        label.map_or(true, |label| location.label == label)
            && location_type.map_or(true, |kind| location.location_type == kind)
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        location: &SyntheticLocation,
        _formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        data.set_all([
            (LABEL, Value::from(&location.label)),
            (LOCATION_TYPE, Value::from(&location.location_type)),
            (DISPLAY_LABEL, Value::from(&location.display_label)),
        ])?;
        Ok(())
    }
}
