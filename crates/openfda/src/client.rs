use reqwest::{Client, StatusCode};
use rxscan_core::{DrugLabel, LabelError, LabelSource, OpenFdaConfig};
use std::time::Duration;

use crate::response::parse_label_response;

/// Client for the openFDA drug label endpoint.
#[derive(Clone, Debug)]
pub struct OpenFdaClient {
    client: Client,
    base_url: String,
}

impl OpenFdaClient {
    pub fn new(config: &OpenFdaConfig) -> Result<Self, LabelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rxscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LabelError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/drug/label.json?search={word}&limit=1`
    pub async fn search_label(&self, word: &str) -> Result<Option<DrugLabel>, LabelError> {
        let url = format!("{}/drug/label.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("search", word), ("limit", "1")])
            .send()
            .await
            .map_err(|e| LabelError::Http(e.to_string()))?;

        let status = response.status();
        // openFDA answers 404 when the search matches nothing.
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("openFDA has no label for '{word}'");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LabelError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LabelError::Http(e.to_string()))?;
        let label = parse_label_response(&body)?;
        tracing::debug!(found = label.is_some(), "openFDA label lookup for '{word}'");
        Ok(label)
    }
}

impl LabelSource for OpenFdaClient {
    async fn lookup(&self, word: &str) -> Result<Option<DrugLabel>, LabelError> {
        self.search_label(word).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenFdaClient {
        OpenFdaClient::new(&OpenFdaConfig {
            base_url: format!("{}/", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OpenFdaClient::new(&OpenFdaConfig {
            base_url: "https://api.fda.gov/".into(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://api.fda.gov");
    }

    #[tokio::test]
    async fn lookup_returns_first_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .and(query_param("search", "aspirin"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "purpose": ["Pain reliever"],
                    "stop_use": ["Stop use if ringing in the ears occurs"]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let label = client_for(&server).lookup("aspirin").await.unwrap().unwrap();
        assert_eq!(label.purpose.as_deref(), Some("Pain reliever"));
        assert_eq!(
            label.stop_use.as_deref(),
            Some("Stop use if ringing in the ears occurs")
        );
    }

    #[tokio::test]
    async fn not_found_is_no_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "NOT_FOUND", "message": "No matches found!"}
            })))
            .mount(&server)
            .await;

        assert!(client_for(&server).lookup("xyzzy").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).lookup("aspirin").await.unwrap_err();
        assert!(matches!(err, LabelError::Status(500)));
    }

    #[tokio::test]
    async fn word_is_url_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("search", "vitamin c&d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).lookup("vitamin c&d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let client = OpenFdaClient::new(&OpenFdaConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
        })
        .unwrap();
        assert!(matches!(
            client.lookup("aspirin").await,
            Err(LabelError::Http(_))
        ));
    }
}
