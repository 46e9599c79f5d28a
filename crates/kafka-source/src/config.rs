//! Connection settings.

use std::time::Duration;

use clap::Parser;
use rdkafka::config::ClientConfig;
use schema_registry::RegistryConfig;

use crate::error::{Error, Result};

/// Broker and registry endpoints and credentials.
///
/// Every field can be given as a flag or through its environment variable.
#[derive(Debug, Clone, Parser)]
pub struct ConnectionConfig {
    /// Kafka brokers (comma-separated or multiple --brokers)
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',', required = true)]
    pub brokers: Vec<String>,

    /// Client private key (PEM)
    #[arg(long, env = "KAFKA_PRIVATE_KEY", hide_env_values = true)]
    pub private_key_pem: Option<String>,

    /// Client certificate (PEM)
    #[arg(long, env = "KAFKA_CERTIFICATE", hide_env_values = true)]
    pub certificate_pem: Option<String>,

    /// CA bundle (PEM)
    #[arg(long, env = "KAFKA_CA", hide_env_values = true)]
    pub ca_pem: Option<String>,

    /// Schema registry base URL
    #[arg(long, env = "KAFKA_SCHEMA_REGISTRY")]
    pub schema_registry_url: String,

    /// Schema registry basic-auth user
    #[arg(long, env = "KAFKA_SCHEMA_REGISTRY_USER")]
    pub schema_registry_user: Option<String>,

    /// Schema registry basic-auth password
    #[arg(long, env = "KAFKA_SCHEMA_REGISTRY_PASSWORD", hide_env_values = true)]
    pub schema_registry_password: Option<String>,

    /// Consumer group id. Offsets are never committed to it.
    #[arg(long, env = "KAFKA_GROUP_ID", default_value = "NOT_USED")]
    pub group_id: String,

    /// Timeout for metadata, watermark, offset and registry requests
    #[arg(long, env = "KAFKA_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

/// PEM material for `security.protocol=SSL`.
struct SslPems<'a> {
    key: &'a str,
    certificate: &'a str,
    ca: &'a str,
}

impl ConnectionConfig {
    pub fn new(brokers: Vec<String>, schema_registry_url: impl Into<String>) -> Self {
        Self {
            brokers,
            private_key_pem: None,
            certificate_pem: None,
            ca_pem: None,
            schema_registry_url: schema_registry_url.into(),
            schema_registry_user: None,
            schema_registry_password: None,
            group_id: "NOT_USED".to_string(),
            request_timeout_secs: 10,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn ssl(&self) -> Result<Option<SslPems<'_>>> {
        match (
            self.private_key_pem.as_deref(),
            self.certificate_pem.as_deref(),
            self.ca_pem.as_deref(),
        ) {
            (Some(key), Some(certificate), Some(ca)) => Ok(Some(SslPems {
                key,
                certificate,
                ca,
            })),
            (None, None, None) => Ok(None),
            _ => Err(Error::InvalidConfig(
                "private key, certificate and CA must be given together".to_string(),
            )),
        }
    }

    /// Settings shared by the admin handle and every consumer.
    pub fn client_config(&self) -> Result<ClientConfig> {
        if self.brokers.is_empty() {
            return Err(Error::InvalidConfig("no brokers given".to_string()));
        }

        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.brokers.join(","));

        match self.ssl()? {
            Some(pems) => {
                config
                    .set("security.protocol", "SSL")
                    .set("ssl.key.pem", pems.key)
                    .set("ssl.certificate.pem", pems.certificate)
                    .set("ssl.ca.pem", pems.ca);
            }
            None => {
                config.set("security.protocol", "PLAINTEXT");
            }
        }

        Ok(config)
    }

    /// Read-only consumer settings: nothing is committed or stored.
    pub fn consumer_config(&self) -> Result<ClientConfig> {
        let mut config = self.client_config()?;
        config
            .set("group.id", &self.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("api.version.request", "true")
            .set("enable.partition.eof", "true");
        Ok(config)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            url: self.schema_registry_url.clone(),
            username: self.schema_registry_user.clone(),
            password: self.schema_registry_password.clone(),
            timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new(
            vec!["b1:9092".to_string(), "b2:9092".to_string()],
            "http://registry:8081",
        )
    }

    #[test]
    fn test_plaintext_without_pems() {
        let client = config().client_config().unwrap();
        assert_eq!(client.get("bootstrap.servers"), Some("b1:9092,b2:9092"));
        assert_eq!(client.get("security.protocol"), Some("PLAINTEXT"));
        assert_eq!(client.get("ssl.key.pem"), None);
    }

    #[test]
    fn test_ssl_with_all_pems() {
        let mut config = config();
        config.private_key_pem = Some("KEY".to_string());
        config.certificate_pem = Some("CERT".to_string());
        config.ca_pem = Some("CA".to_string());

        let client = config.client_config().unwrap();
        assert_eq!(client.get("security.protocol"), Some("SSL"));
        assert_eq!(client.get("ssl.key.pem"), Some("KEY"));
        assert_eq!(client.get("ssl.certificate.pem"), Some("CERT"));
        assert_eq!(client.get("ssl.ca.pem"), Some("CA"));
    }

    #[test]
    fn test_partial_pems_rejected() {
        let mut config = config();
        config.certificate_pem = Some("CERT".to_string());
        assert!(matches!(
            config.client_config(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_brokers_rejected() {
        let config = ConnectionConfig::new(vec![], "http://registry:8081");
        assert!(matches!(
            config.client_config(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_consumer_config_is_read_only() {
        let consumer = config().consumer_config().unwrap();
        assert_eq!(consumer.get("group.id"), Some("NOT_USED"));
        assert_eq!(consumer.get("enable.auto.commit"), Some("false"));
        assert_eq!(consumer.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(consumer.get("enable.partition.eof"), Some("true"));
        assert_eq!(consumer.get("auto.offset.reset"), Some("earliest"));
    }

    #[test]
    fn test_parse_from_flags() {
        let config = ConnectionConfig::parse_from([
            "test",
            "--brokers",
            "a:1,b:2",
            "--schema-registry-url",
            "http://r",
            "--schema-registry-user",
            "u",
            "--schema-registry-password",
            "p",
        ]);
        assert_eq!(config.brokers, vec!["a:1", "b:2"]);
        assert_eq!(config.group_id, "NOT_USED");
        assert_eq!(config.request_timeout_secs, 10);

        let registry = config.registry_config();
        assert_eq!(registry.url, "http://r");
        assert_eq!(registry.username.as_deref(), Some("u"));
        assert_eq!(registry.password.as_deref(), Some("p"));
    }
}
