use instana_core::ResourceNameFormatter;
use instana_restapi::InstanaApi;
use std::sync::Arc;

/// immutable context handed to every lifecycle callback.
#[derive(Clone)]
pub struct ProviderMeta {
    pub api: Arc<dyn InstanaApi>,
    pub formatter: ResourceNameFormatter,
}

impl ProviderMeta {
    pub fn new(api: Arc<dyn InstanaApi>, formatter: ResourceNameFormatter) -> Self {
        Self { api, formatter }
    }

    pub fn api(&self) -> &dyn InstanaApi {
        self.api.as_ref()
    }
}

impl std::fmt::Debug for ProviderMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderMeta")
            .field("formatter", &self.formatter)
            .finish_non_exhaustive()
    }
}
