//! thin reqwest wrapper speaking json to the instana api.

use crate::error::RestError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// connection settings for the api.
#[derive(Clone)]
pub struct ClientConfig {
    /// base url including scheme, e.g. `https://tenant.instana.io`.
    pub base_url: String,
    pub api_token: String,
    pub skip_tls_verify: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("apiToken {}", config.api_token))
            .map_err(|err| RestError::Config(format!("invalid api token: {err}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let (url, body) = self.send(Method::GET, path, None::<&()>).await?;
        decode(&url, &body)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, RestError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let (url, response) = self.send(Method::POST, path, Some(body)).await?;
        decode(&url, &response)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, RestError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let (url, response) = self.send(Method::PUT, path, Some(body)).await?;
        decode(&url, &response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), RestError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(String, String), RestError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        debug!(method = %method, url = %url, "dispatching api request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|source| RestError::Decode {
                url: url.clone(),
                source,
            })?;
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(method = %method, url = %url, status = status.as_u16(), "api response");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RestError::NotFound { url });
        }
        if !status.is_success() {
            return Err(RestError::Status {
                url,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok((url, text))
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, RestError> {
    serde_json::from_str(body).map_err(|source| RestError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> RestClient {
        RestClient::new(&ClientConfig {
            base_url: server.base_url(),
            api_token: "secret".to_string(),
            skip_tls_verify: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_api_token_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/things")
                .header("authorization", "apiToken secret");
            then.status(200).json_body(json!([]));
        });

        let body: serde_json::Value = client(&server).get("/api/things").await.unwrap();
        mock.assert();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn maps_404_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/things/1");
            then.status(404);
        });

        let err = client(&server)
            .get::<serde_json::Value>("/api/things/1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn maps_other_failures_to_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/things");
            then.status(500).body("boom");
        });

        let err = client(&server)
            .post::<_, serde_json::Value>("/api/things", &json!({"a": 1}))
            .await
            .unwrap_err();
        match err {
            RestError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig {
            base_url: "https://example".to_string(),
            api_token: "secret".to_string(),
            skip_tls_verify: false,
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
