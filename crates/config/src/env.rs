//! Environment-derived configuration.
//!
//! The build tool surfaces publish settings as environment variables. This
//! module maps the fixed key set onto a [`PublishConfig`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::{ObjectStorageConfig, Protocol, PublishConfig, RemoteServerConfig};

/// Environment keys read by [`resolve`].
pub mod keys {
    pub const ENABLE: &str = "PUBLISH_ENABLE";
    pub const SERVER_PROTOCOL: &str = "PUBLISH_SERVER_PROTOCOL";
    pub const SERVER_HOST: &str = "PUBLISH_SERVER_HOST";
    pub const SERVER_PORT: &str = "PUBLISH_SERVER_PORT";
    pub const SERVER_ROOT: &str = "PUBLISH_SERVER_ROOT";
    pub const SERVER_USER: &str = "PUBLISH_SERVER_USER";
    pub const SERVER_PASSWORD: &str = "PUBLISH_SERVER_PASSWORD";
    pub const OSS_ACCESS_KEY_ID: &str = "PUBLISH_OSS_ACCESS_KEY_ID";
    pub const OSS_ACCESS_KEY_SECRET: &str = "PUBLISH_OSS_ACCESS_KEY_SECRET";
    pub const OSS_REGION: &str = "PUBLISH_OSS_REGION";
    pub const OSS_BUCKET: &str = "PUBLISH_OSS_BUCKET";
    pub const OSS_ENDPOINT: &str = "PUBLISH_OSS_ENDPOINT";
    pub const CONNECT_TIMEOUT: &str = "PUBLISH_CONNECT_TIMEOUT";
}

/// Read-only view of a string environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Produces the configuration for a run.
///
/// `explicit` is returned untouched when present. Otherwise the config is
/// read from `env`; missing keys become empty fields. Never fails.
pub fn resolve(explicit: Option<PublishConfig>, env: &impl EnvSource) -> PublishConfig {
    if let Some(config) = explicit {
        debug!("using explicit publish options");
        return config;
    }

    debug!("reading publish options from environment");
    from_env(env)
}

fn from_env(env: &impl EnvSource) -> PublishConfig {
    let read = |key: &str| env.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    let protocol = match env.get(keys::SERVER_PROTOCOL) {
        Some(raw) if !raw.trim().is_empty() => Protocol::parse(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "unknown server protocol, falling back to ftp");
            Protocol::Ftp
        }),
        _ => Protocol::default(),
    };

    let remote_server = RemoteServerConfig {
        protocol,
        host: read(keys::SERVER_HOST),
        port: read(keys::SERVER_PORT).parse().unwrap_or(0),
        user: read(keys::SERVER_USER),
        // Passwords may legitimately carry surrounding whitespace.
        password: env.get(keys::SERVER_PASSWORD).unwrap_or_default(),
        remote_root: read(keys::SERVER_ROOT),
    };

    let storage = ObjectStorageConfig {
        access_key_id: read(keys::OSS_ACCESS_KEY_ID),
        access_key_secret: read(keys::OSS_ACCESS_KEY_SECRET),
        bucket: read(keys::OSS_BUCKET),
        region: read(keys::OSS_REGION),
        endpoint: Some(read(keys::OSS_ENDPOINT)).filter(|e| !e.is_empty()),
    };
    let storage_present = !(storage.access_key_id.is_empty()
        && storage.access_key_secret.is_empty()
        && storage.bucket.is_empty()
        && storage.region.is_empty());

    PublishConfig {
        enabled: parse_flag(&read(keys::ENABLE)),
        remote_server,
        object_storage: storage_present.then_some(storage),
        connect_timeout_secs: read(keys::CONNECT_TIMEOUT).parse().unwrap_or(0),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
