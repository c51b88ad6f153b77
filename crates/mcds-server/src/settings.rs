//! Connection settings of a MaxCompute data source instance
//!
//! The host hands over the instance settings as a JSON document plus a map
//! of decrypted secure values. Secrets never end up in `Debug` output.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{0}: could not parse json")]
    InvalidJson(String),

    #[error("invalid endpoint. Either empty or not set")]
    InvalidEndpoint,

    #[error("invalid project name. Either empty or not set")]
    InvalidProjectName,

    #[error("access key id is either empty or not set")]
    InvalidAccessKeyId,

    #[error("access key secret is either empty or not set")]
    InvalidAccessKeySecret,
}

/// Raw instance settings as stored by the host
#[derive(Debug, Clone, Default)]
pub struct InstanceSettings {
    pub json_data: String,
    pub decrypted_secure_json_data: HashMap<String, String>,
}

impl InstanceSettings {
    pub fn new(json_data: impl Into<String>) -> Self {
        Self {
            json_data: json_data.into(),
            decrypted_secure_json_data: HashMap::new(),
        }
    }

    pub fn with_secure(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.decrypted_secure_json_data
            .insert(key.into(), value.into());
        self
    }
}

/// Every key may be absent or null
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonData {
    endpoint: Option<String>,
    project_name: Option<String>,
    access_key_id: Option<String>,
    tcp_connection_timeout: Option<f64>,
    http_timeout: Option<f64>,
    tunnel_endpoint: Option<String>,
    tunnel_quota_name: Option<String>,
    others: Option<serde_json::Value>,
}

/// Extra driver option entered as a key/value pair
#[derive(Debug, Deserialize)]
struct CustomOption {
    key: String,
    value: String,
}

#[derive(Clone, Default, PartialEq)]
pub struct MaxComputeSettings {
    pub endpoint: String,
    pub project_name: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub sts_token: String,
    pub tcp_connection_timeout: Option<Duration>,
    pub http_timeout: Option<Duration>,
    pub tunnel_endpoint: String,
    pub tunnel_quota_name: String,
    pub others: BTreeMap<String, String>,
}

impl fmt::Debug for MaxComputeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(secret: &str) -> &'static str {
            if secret.is_empty() {
                ""
            } else {
                "***"
            }
        }

        f.debug_struct("MaxComputeSettings")
            .field("endpoint", &self.endpoint)
            .field("project_name", &self.project_name)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &redact(&self.access_key_secret))
            .field("sts_token", &redact(&self.sts_token))
            .field("tcp_connection_timeout", &self.tcp_connection_timeout)
            .field("http_timeout", &self.http_timeout)
            .field("tunnel_endpoint", &self.tunnel_endpoint)
            .field("tunnel_quota_name", &self.tunnel_quota_name)
            .field("others", &self.others)
            .finish()
    }
}

fn seconds(value: f64) -> Duration {
    Duration::from_secs(value.max(0.0) as u64)
}

impl MaxComputeSettings {
    /// Parse without validating; see [`load_settings`].
    pub fn parse(instance: &InstanceSettings) -> Result<Self, SettingsError> {
        let json: JsonData = serde_json::from_str(&instance.json_data)
            .map_err(|e| SettingsError::InvalidJson(e.to_string()))?;

        // A malformed option list is dropped, not fatal
        let others = match json.others {
            Some(value) => match serde_json::from_value::<Vec<CustomOption>>(value) {
                Ok(options) => options.into_iter().map(|o| (o.key, o.value)).collect(),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring malformed custom options");
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };

        let secure = &instance.decrypted_secure_json_data;
        Ok(Self {
            endpoint: json.endpoint.unwrap_or_default(),
            project_name: json.project_name.unwrap_or_default(),
            access_key_id: json.access_key_id.unwrap_or_default(),
            access_key_secret: secure.get("accessKeySecret").cloned().unwrap_or_default(),
            sts_token: secure.get("stsToken").cloned().unwrap_or_default(),
            tcp_connection_timeout: json.tcp_connection_timeout.map(seconds),
            http_timeout: json.http_timeout.map(seconds),
            tunnel_endpoint: json.tunnel_endpoint.unwrap_or_default(),
            tunnel_quota_name: json.tunnel_quota_name.unwrap_or_default(),
            others,
        })
    }

    /// Checks the required fields in a fixed order, reporting the first gap.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.endpoint.is_empty() {
            return Err(SettingsError::InvalidEndpoint);
        }
        if self.project_name.is_empty() {
            return Err(SettingsError::InvalidProjectName);
        }
        if self.access_key_id.is_empty() {
            return Err(SettingsError::InvalidAccessKeyId);
        }
        if self.access_key_secret.is_empty() {
            return Err(SettingsError::InvalidAccessKeySecret);
        }
        Ok(())
    }
}

/// Parse and validate the settings of one data source instance.
pub fn load_settings(instance: &InstanceSettings) -> Result<MaxComputeSettings, SettingsError> {
    let settings = MaxComputeSettings::parse(instance)?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_all_fields() {
        let instance = InstanceSettings::new(
            r#"{ "accessKeyId": "ak", "endpoint": "endpoint", "projectName": "project", "tcpConnectionTimeout": 10, "httpTimeout": 2, "tunnelEndpoint" : "tunnelendpoint", "tunnelQuotaName": "tunnelquotaname", "others": [{"key":"aa", "value": "bb"}]}"#,
        )
        .with_secure("accessKeySecret", "sk")
        .with_secure("stsToken", "sts");

        let settings = load_settings(&instance).unwrap();
        assert_eq!(
            settings,
            MaxComputeSettings {
                endpoint: "endpoint".into(),
                project_name: "project".into(),
                access_key_id: "ak".into(),
                access_key_secret: "sk".into(),
                sts_token: "sts".into(),
                tcp_connection_timeout: Some(Duration::from_secs(10)),
                http_timeout: Some(Duration::from_secs(2)),
                tunnel_endpoint: "tunnelendpoint".into(),
                tunnel_quota_name: "tunnelquotaname".into(),
                others: BTreeMap::from([("aa".to_string(), "bb".to_string())]),
            }
        );
    }

    #[test]
    fn test_invalid_settings() {
        let cases = [
            (r#"{ "endpoint": "" }"#, SettingsError::InvalidEndpoint),
            (r#"{ "endpoint": "foo" }"#, SettingsError::InvalidProjectName),
            (
                r#"{ "endpoint": "foo", "projectName": "bar" }"#,
                SettingsError::InvalidAccessKeyId,
            ),
            (
                r#"{ "endpoint": "foo", "projectName": "bar", "accessKeyId": "baz"}"#,
                SettingsError::InvalidAccessKeySecret,
            ),
        ];

        for (i, (json, want)) in cases.into_iter().enumerate() {
            let instance = InstanceSettings::new(json).with_secure("accessKeySecret", "");
            let err = load_settings(&instance).unwrap_err();
            assert_eq!(err, want, "[{}/4] {}", i + 1, json);
        }
    }

    #[test]
    fn test_invalid_json() {
        let instance = InstanceSettings::new(r#"  "endpoint": "foo" }"#);
        let err = load_settings(&instance).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidJson(_)));
        assert!(err.to_string().ends_with("could not parse json"));

        // wrong value types are malformed too
        let instance = InstanceSettings::new(r#"{ "endpoint": 42 }"#);
        assert!(matches!(
            load_settings(&instance),
            Err(SettingsError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_malformed_others_are_ignored() {
        let instance = InstanceSettings::new(
            r#"{ "endpoint": "e", "projectName": "p", "accessKeyId": "ak", "others": {"key": "aa"} }"#,
        )
        .with_secure("accessKeySecret", "sk");

        let settings = load_settings(&instance).unwrap();
        assert!(settings.others.is_empty());
        assert_eq!(settings.tcp_connection_timeout, None);

        let instance = InstanceSettings::new(r#"{ "endpoint": null, "httpTimeout": null }"#);
        let settings = MaxComputeSettings::parse(&instance).unwrap();
        assert_eq!(settings.endpoint, "");
        assert_eq!(settings.validate(), Err(SettingsError::InvalidEndpoint));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = MaxComputeSettings {
            access_key_secret: "very-secret".into(),
            sts_token: "token".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("***"));
    }
}
