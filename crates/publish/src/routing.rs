//! Routing policy: which files go to which target.
//!
//! With object storage configured, the bucket serves every file and the
//! file server only hosts the HTML entry points. Without it, the file
//! server receives everything. Storage routes always come first.

use sitepub_artifacts::{BuildArtifactSet, base_dir, join_remote, public_url};
use sitepub_config::{ObjectStorageConfig, PublishConfig, RemoteServerConfig};
use sitepub_transfer::TargetKind;

/// Where a route's files are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    ObjectStorage(ObjectStorageConfig),
    RemoteServer(RemoteServerConfig),
}

impl Destination {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::ObjectStorage(_) => TargetKind::ObjectStorage,
            Self::RemoteServer(server) => TargetKind::RemoteServer(server.protocol),
        }
    }
}

/// A set of files bound for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub destination: Destination,
    /// Relative paths, in enumeration order.
    pub files: Vec<String>,
    /// Remote directory every relative path is appended to.
    pub remote_dir: String,
    /// Public base of uploaded files, for object storage.
    pub public_base: Option<String>,
}

impl Route {
    pub fn kind(&self) -> TargetKind {
        self.destination.kind()
    }

    /// Object key or server path for a relative file.
    pub fn remote_path_for(&self, file: &str) -> String {
        join_remote(&self.remote_dir, file)
    }

    /// URL the file is served from once uploaded, if known.
    pub fn public_url_for(&self, file: &str) -> Option<String> {
        self.public_base.as_deref().map(|base| public_url(base, file))
    }
}

/// Decides the routes for one run. Pure: no I/O, no validation.
pub fn route(config: &PublishConfig, base_path: &str, artifacts: &BuildArtifactSet) -> Vec<Route> {
    let server = config.remote_server.clone();
    let remote_root = server.remote_root.clone();

    match &config.object_storage {
        Some(storage) => vec![
            Route {
                destination: Destination::ObjectStorage(storage.clone()),
                files: artifacts.all_files.clone(),
                remote_dir: base_dir(base_path),
                public_base: Some(base_path.to_string()),
            },
            Route {
                destination: Destination::RemoteServer(server),
                files: artifacts.html_files.clone(),
                remote_dir: remote_root,
                public_base: None,
            },
        ],
        None => vec![Route {
            destination: Destination::RemoteServer(server),
            files: artifacts.all_files.clone(),
            remote_dir: remote_root,
            public_base: None,
        }],
    }
}
