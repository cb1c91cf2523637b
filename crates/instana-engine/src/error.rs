use instana_core::tagfilter::ParseError;
use instana_core::StateError;
use instana_restapi::RestError;
use thiserror::Error;

/// user visible failure of a lifecycle callback.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid configuration of {field}: {message}")]
    InvalidConfiguration { field: String, message: String },
    #[error("ambiguous {field}: {message}")]
    Ambiguous { field: String, message: String },
    #[error("unsupported {family} type {value}")]
    UnknownDiscriminator { family: &'static str, value: String },
    #[error("{field} is not a valid tag filter: {source}")]
    TagFilter {
        field: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Remote(#[from] RestError),
    #[error("{resource} with id {id} does not exist")]
    NotFound { resource: String, id: String },
    #[error("failed to migrate state from schema version {version}: {message}")]
    StateMigration { version: u32, message: String },
    #[error(transparent)]
    State(#[from] StateError),
}

impl ProviderError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn ambiguous(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Ambiguous {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_discriminator(family: &'static str, value: impl Into<String>) -> Self {
        ProviderError::UnknownDiscriminator {
            family,
            value: value.into(),
        }
    }

    pub fn tag_filter(field: impl Into<String>, source: ParseError) -> Self {
        ProviderError::TagFilter {
            field: field.into(),
            source,
        }
    }

    /// true when the remote side reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Remote(err) => err.is_not_found(),
            ProviderError::NotFound { .. } => true,
            _ => false,
        }
    }
}
