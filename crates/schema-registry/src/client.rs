//! HTTP client for Confluent-compatible schema registries.

use std::time::Duration;

use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{parse_error, RegistryError, Result};
use crate::registry::{RegisteredSchema, SchemaRegistry, SchemaType, SubjectVersion};

const REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Connection settings for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL, e.g. `https://registry.example.com`
    pub url: String,
    /// Basic-auth user
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetSchemaResponse {
    schema: String,
    #[serde(rename = "schemaType", default)]
    schema_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubjectVersionResponse {
    subject: String,
    version: u32,
    id: u32,
}

/// Blocking registry client.
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(REGISTRY_CONTENT_TYPE));

        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                let credentials = format!("{username}:{password}");
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                let mut auth_value = HeaderValue::from_str(&format!("Basic {encoded}"))
                    .map_err(|e| RegistryError::InvalidConfig(e.to_string()))?;
                auth_value.set_sensitive(true);
                headers.insert(AUTHORIZATION, auth_value);
            }
            (None, None) => {}
            _ => {
                return Err(RegistryError::InvalidConfig(
                    "Registry username and password must be given together".to_string(),
                ))
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {url}");

        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(parse_error(status, &body));
        }

        Ok(response.json()?)
    }
}

impl SchemaRegistry for RegistryClient {
    fn schema_by_id(&self, id: u32) -> Result<RegisteredSchema> {
        let response: GetSchemaResponse = self.get(&format!("/schemas/ids/{id}"))?;
        Ok(RegisteredSchema {
            schema: response.schema,
            schema_type: SchemaType::from_registry(response.schema_type.as_deref()),
        })
    }

    fn subject_versions(&self, subject: &str) -> Result<Vec<u32>> {
        self.get(&format!("/subjects/{subject}/versions"))
    }

    fn subject_version(&self, subject: &str, version: u32) -> Result<SubjectVersion> {
        let response: SubjectVersionResponse =
            self.get(&format!("/subjects/{subject}/versions/{version}"))?;
        Ok(SubjectVersion {
            subject: response.subject,
            version: response.version,
            id: response.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = RegistryClient::new(&RegistryConfig::new("http://localhost:8081/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[test]
    fn test_partial_credentials_are_rejected() {
        let mut config = RegistryConfig::new("http://localhost:8081");
        config.username = Some("user".to_string());
        let result = RegistryClient::new(&config);
        assert!(matches!(result, Err(RegistryError::InvalidConfig(_))));
    }

    #[test]
    fn test_full_credentials_are_accepted() {
        let mut config = RegistryConfig::new("http://localhost:8081");
        config.username = Some("user".to_string());
        config.password = Some("secret".to_string());
        assert!(RegistryClient::new(&config).is_ok());
    }

    #[test]
    fn test_subject_version_response_ignores_extra_fields() {
        let body = r#"{"subject":"t-value","version":2,"id":17,"schema":"\"int\""}"#;
        let parsed: SubjectVersionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.id, 17);
        assert_eq!(parsed.version, 2);
    }

    #[test]
    fn test_schema_response_without_type() {
        let parsed: GetSchemaResponse = serde_json::from_str(r#"{"schema":"\"int\""}"#).unwrap();
        assert_eq!(parsed.schema_type, None);
    }
}
