//! crud engine: schema-bound state, resource handles, drivers and registry.

mod data;
mod driver;
mod error;
mod handle;
mod meta;
pub mod polymorphic;
mod registry;
mod upgrade;

#[cfg(test)]
mod tests;

pub use data::{ResourceData, ID_KEY};
pub use driver::{DataSourceDriver, ResourceDriver};
pub use error::ProviderError;
pub use handle::{DataSourceHandle, ResourceHandle, ResourceMetadata};
pub use meta::ProviderMeta;
pub use polymorphic::{select_variant, variant_state, Severity};
pub use registry::{DataSource, ProviderRegistry, Resource};
pub use upgrade::{
    full_label_to_label, full_name_to_name, full_title_to_title, rename_legacy_field,
    upgrade_state, StateUpgrader, UpgradeFn, VersionedState,
};
