//! provider configuration and the context built from it.

use anyhow::{anyhow, Context, Result};
use instana_core::naming::DEFAULT_SUFFIX;
use instana_core::ResourceNameFormatter;
use instana_engine::ProviderMeta;
use instana_restapi::{ClientConfig, InstanaClient};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const API_TOKEN_ENV: &str = "INSTANA_API_TOKEN";
pub const ENDPOINT_ENV: &str = "INSTANA_ENDPOINT";

/// provider block as written by the user.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    /// dns name of the tenant unit, optionally with a scheme.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub default_name_prefix: String,
    #[serde(default = "default_name_suffix")]
    pub default_name_suffix: String,
    #[serde(default)]
    pub tls_skip_verify: bool,
}

fn default_name_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            endpoint: None,
            default_name_prefix: String::new(),
            default_name_suffix: default_name_suffix(),
            tls_skip_verify: false,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("default_name_prefix", &self.default_name_prefix)
            .field("default_name_suffix", &self.default_name_suffix)
            .field("tls_skip_verify", &self.tls_skip_verify)
            .finish()
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty()).cloned()
}

impl ProviderConfig {
    /// resolve token and endpoint, falling back to the environment.
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_with(|key| std::env::var(key).ok())
    }

    fn client_config_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
        let api_token = non_empty(self.api_token.as_ref())
            .or_else(|| non_empty(env(API_TOKEN_ENV).as_ref()))
            .ok_or_else(|| anyhow!("missing api_token (set it or {API_TOKEN_ENV})"))?;
        let endpoint = non_empty(self.endpoint.as_ref())
            .or_else(|| non_empty(env(ENDPOINT_ENV).as_ref()))
            .ok_or_else(|| anyhow!("missing endpoint (set it or {ENDPOINT_ENV})"))?;
        Ok(ClientConfig {
            base_url: base_url(&endpoint),
            api_token,
            skip_tls_verify: self.tls_skip_verify,
        })
    }

    pub fn formatter(&self) -> ResourceNameFormatter {
        ResourceNameFormatter::new(&self.default_name_prefix, &self.default_name_suffix)
    }

    /// build the context shared by every lifecycle callback.
    pub fn provider_meta(&self) -> Result<ProviderMeta> {
        let client_config = self.client_config()?;
        debug!(base_url = %client_config.base_url, "configuring instana client");
        let client = InstanaClient::new(&client_config).context("build instana client")?;
        Ok(ProviderMeta::new(Arc::new(client), self.formatter()))
    }
}

/// `https://` is assumed unless the endpoint names its scheme.
pub fn base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let config: ProviderConfig = serde_json::from_str(r#"{"api_token": "t"}"#).unwrap();
        assert_eq!(config.default_name_prefix, "");
        assert_eq!(config.default_name_suffix, " (TF managed)");
        assert!(!config.tls_skip_verify);
    }

    #[test]
    fn endpoint_gets_https_scheme() {
        assert_eq!(base_url("tenant.instana.io"), "https://tenant.instana.io");
        assert_eq!(base_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
    }

    #[test]
    fn environment_fills_missing_values() {
        let config = ProviderConfig {
            api_token: Some(String::new()),
            ..ProviderConfig::default()
        };
        let client = config
            .client_config_with(|key| match key {
                API_TOKEN_ENV => Some("from-env".to_string()),
                ENDPOINT_ENV => Some("tenant.instana.io".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(client.api_token, "from-env");
        assert_eq!(client.base_url, "https://tenant.instana.io");
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let config = ProviderConfig {
            api_token: Some("explicit".to_string()),
            endpoint: Some("http://localhost:1234".to_string()),
            tls_skip_verify: true,
            ..ProviderConfig::default()
        };
        let client = config
            .client_config_with(|_| Some("env".to_string()))
            .unwrap();
        assert_eq!(client.api_token, "explicit");
        assert_eq!(client.base_url, "http://localhost:1234");
        assert!(client.skip_tls_verify);
    }

    #[test]
    fn missing_token_is_an_error() {
        let config = ProviderConfig {
            endpoint: Some("tenant.instana.io".to_string()),
            ..ProviderConfig::default()
        };
        let err = config.client_config_with(no_env).unwrap_err();
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = ProviderConfig {
            api_token: Some("secret".to_string()),
            ..ProviderConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
