//! Configuration data types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// File transfer protocol spoken by the remote server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ftp,
    Sftp,
}

impl Protocol {
    /// Parses a protocol name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ftp" => Some(Self::Ftp),
            "sftp" => Some(Self::Sftp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => f.write_str("ftp"),
            Self::Sftp => f.write_str("sftp"),
        }
    }
}

/// FTP/SFTP server that receives the entry-point files (or everything).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteServerConfig {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Directory on the server that mirrors the build output root.
    pub remote_root: String,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for RemoteServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteServerConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("remote_root", &self.remote_root)
            .finish()
    }
}

impl RemoteServerConfig {
    /// `host:port` for connecting and logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// S3-compatible bucket that receives every build file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    pub region: String,
    /// Endpoint override for non-AWS providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl fmt::Debug for ObjectStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Complete publish configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    /// Upper bound on waiting for a session to become ready. `0` means default.
    pub connect_timeout_secs: u64,
    pub remote_server: RemoteServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_storage: Option<ObjectStorageConfig>,
}

impl PublishConfig {
    /// Checks that every field required to publish is present.
    ///
    /// The remote server needs host, port, user and password. Object
    /// storage, when present, needs both access key fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        let server = &self.remote_server;

        if server.host.trim().is_empty() {
            missing.push("remote_server.host");
        }
        if server.port == 0 {
            missing.push("remote_server.port");
        }
        if server.user.is_empty() {
            missing.push("remote_server.user");
        }
        if server.password.is_empty() {
            missing.push("remote_server.password");
        }

        if let Some(storage) = &self.object_storage {
            if storage.access_key_id.is_empty() {
                missing.push("object_storage.access_key_id");
            }
            if storage.access_key_secret.is_empty() {
                missing.push("object_storage.access_key_secret");
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(missing))
        }
    }

    /// Whether a bucket target takes part in this run.
    pub fn has_object_storage(&self) -> bool {
        self.object_storage.is_some()
    }

    pub fn connect_timeout(&self) -> Duration {
        if self.connect_timeout_secs > 0 {
            Duration::from_secs(self.connect_timeout_secs)
        } else {
            DEFAULT_CONNECT_TIMEOUT
        }
    }
}
