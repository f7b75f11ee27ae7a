//! S3-compatible object storage target.
//!
//! There is no session: `connect` only builds the client. Small files are
//! sent with a single put, larger ones are streamed as a multipart upload
//! so memory use stays bounded regardless of file size.

use std::path::Path;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload, WriteMultipart};
use sitepub_config::ObjectStorageConfig;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::target::{TargetKind, TransferFuture, TransferTarget};

/// Files up to this size are uploaded with one put: 8 MiB.
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 8 * 1024 * 1024;

/// Multipart part size: 5 MiB, the S3 minimum.
const PART_SIZE: usize = 5 * 1024 * 1024;

/// Local read buffer for streamed uploads (256 KB).
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Parts allowed in flight while streaming one file.
const MAX_PARTS_IN_FLIGHT: usize = 4;

/// Uploads build files to a bucket.
pub struct ObjectStorageTarget {
    config: Option<ObjectStorageConfig>,
    store: Option<Arc<dyn ObjectStore>>,
    multipart_threshold: u64,
}

impl ObjectStorageTarget {
    /// Target that builds its client from `config` on connect.
    pub fn new(config: ObjectStorageConfig) -> Self {
        Self {
            config: Some(config),
            store: None,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
        }
    }

    /// Target backed by an existing store (e.g. `InMemory` in tests).
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config: None,
            store: Some(store),
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
        }
    }

    /// Overrides the size above which files are streamed in parts.
    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold = bytes;
        self
    }

    fn build_store(config: &ObjectStorageConfig) -> Result<Arc<dyn ObjectStore>, TransferError> {
        let mut builder = AmazonS3Builder::new()
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.access_key_secret)
            .with_bucket_name(&config.bucket);

        if !config.region.is_empty() {
            builder = builder.with_region(&config.region);
        }

        if let Some((endpoint, virtual_hosted)) = storage_endpoint(config) {
            debug!(%endpoint, virtual_hosted, "using custom storage endpoint");
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(virtual_hosted);
        }

        Ok(Arc::new(builder.build()?))
    }
}

/// Endpoint to use instead of AWS, and whether requests are virtual-hosted.
///
/// An explicit endpoint is used as-is with path-style requests. Aliyun
/// regions (`oss-*`) without an endpoint map to the bucket's
/// virtual-hosted OSS domain.
pub fn storage_endpoint(config: &ObjectStorageConfig) -> Option<(String, bool)> {
    if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
        return Some((endpoint.trim_end_matches('/').to_string(), false));
    }

    if config.region.starts_with("oss-") {
        return Some((
            format!("https://{}.{}.aliyuncs.com", config.bucket, config.region),
            true,
        ));
    }

    None
}

impl TransferTarget for ObjectStorageTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::ObjectStorage
    }

    fn connect(&mut self) -> TransferFuture<'_, ()> {
        Box::pin(async move {
            if self.store.is_none() {
                let config = self
                    .config
                    .as_ref()
                    .ok_or_else(|| TransferError::Session("no storage configuration".into()))?;
                self.store = Some(Self::build_store(config)?);
                info!(bucket = %config.bucket, region = %config.region, "object storage client ready");
            }
            Ok(())
        })
    }

    fn upload_file<'a>(
        &'a mut self,
        remote_path: &'a str,
        local_path: &'a Path,
    ) -> TransferFuture<'a, ()> {
        Box::pin(async move {
            let store = self
                .store
                .as_ref()
                .ok_or(TransferError::NotReady(crate::SessionState::Disconnected))?;
            crate::validate_remote_path(remote_path)?;

            let location = ObjectPath::from(remote_path);
            let size = tokio::fs::metadata(local_path).await?.len();

            if size <= self.multipart_threshold {
                let data = tokio::fs::read(local_path).await?;
                store.put(&location, PutPayload::from(data)).await?;
            } else {
                put_streaming(store.as_ref(), &location, local_path).await?;
            }

            debug!(key = %location, size, "object stored");
            Ok(())
        })
    }

    fn close(&mut self) -> TransferFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

async fn put_streaming(
    store: &dyn ObjectStore,
    location: &ObjectPath,
    local_path: &Path,
) -> Result<(), TransferError> {
    let upload = store.put_multipart(location).await?;
    let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE);
    let mut file = tokio::fs::File::open(local_path).await?;

    if let Err(e) = copy_parts(&mut file, &mut writer).await {
        if let Err(abort_err) = writer.abort().await {
            warn!(key = %location, error = %abort_err, "failed to abort multipart upload");
        }
        return Err(e);
    }

    writer.finish().await?;
    Ok(())
}

async fn copy_parts(
    file: &mut tokio::fs::File,
    writer: &mut WriteMultipart,
) -> Result<(), TransferError> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.wait_for_capacity(MAX_PARTS_IN_FLIGHT).await?;
        writer.write(&buf[..n]);
    }
}
