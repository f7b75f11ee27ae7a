//! Construction of transfer targets from route destinations.

use std::time::Duration;

use sitepub_transfer::{ObjectStorageTarget, RemoteServerTarget, TransferTarget};

use crate::routing::Destination;

/// Builds the target for a destination. Called once per route per run.
pub trait TargetFactory: Send + Sync {
    fn build(&self, destination: &Destination, connect_timeout: Duration)
    -> Box<dyn TransferTarget>;
}

/// Builds the real object-storage and FTP/SFTP targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTargetFactory;

impl TargetFactory for DefaultTargetFactory {
    fn build(
        &self,
        destination: &Destination,
        connect_timeout: Duration,
    ) -> Box<dyn TransferTarget> {
        match destination {
            Destination::ObjectStorage(storage) => Box::new(ObjectStorageTarget::new(storage.clone())),
            Destination::RemoteServer(server) => {
                Box::new(RemoteServerTarget::new(server.clone(), connect_timeout))
            }
        }
    }
}
