//! Publish orchestrator.
//!
//! Drives one run: validate configuration, enumerate the build output,
//! connect every routed target, upload file by file, close everything,
//! and report a single outcome.

use std::time::Duration;

use sitepub_artifacts::{BuildArtifactSet, BuildContext, base_dir, base_origin, enumerate};
use sitepub_config::{EnvSource, PublishConfig, resolve};
use sitepub_transfer::TransferTarget;
use tracing::{debug, error, info, warn};

use crate::error::PublishError;
use crate::factory::{DefaultTargetFactory, TargetFactory};
use crate::reporter::{ProgressEvent, ProgressReporter};
use crate::routing::{Route, route};
use crate::types::{PublishOutcome, UploadFailure};

/// Publishes build output to the configured targets.
pub struct Publisher<R> {
    reporter: R,
    factory: Box<dyn TargetFactory>,
}

impl<R: ProgressReporter> Publisher<R> {
    /// Creates a publisher that builds the real transfer targets.
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            factory: Box::new(DefaultTargetFactory),
        }
    }

    /// Replaces the target factory.
    pub fn with_factory(mut self, factory: impl TargetFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Resolves the configuration (explicit options win over `env`) and
    /// publishes.
    pub async fn run(
        &self,
        explicit: Option<PublishConfig>,
        env: &impl EnvSource,
        ctx: BuildContext,
    ) -> Option<PublishOutcome> {
        self.publish(resolve(explicit, env), ctx).await
    }

    /// Publishes with an already resolved configuration.
    ///
    /// Returns `None` without emitting anything when publishing is
    /// disabled. Otherwise exactly one terminal event is emitted and the
    /// matching outcome returned.
    pub async fn publish(&self, config: PublishConfig, ctx: BuildContext) -> Option<PublishOutcome> {
        if !config.enabled {
            debug!("publishing disabled");
            return None;
        }

        self.reporter.report(ProgressEvent::CheckingConfig);
        let artifacts = match prepare(&config, &ctx) {
            Ok(artifacts) => artifacts,
            Err(e) => return Some(self.finish(e.into())),
        };

        info!(
            output_root = %artifacts.output_root.display(),
            storage_dir = %base_dir(&ctx.base_path),
            origin = base_origin(&ctx.base_path).as_deref().unwrap_or("-"),
            files = artifacts.all_files.len(),
            html = artifacts.html_files.len(),
            object_storage = config.has_object_storage(),
            "build output ready"
        );

        let routes = route(&config, &ctx.base_path, &artifacts);
        let mut sessions = match self.connect_all(routes, config.connect_timeout()).await {
            Ok(sessions) => sessions,
            Err(e) => return Some(self.finish(e.into())),
        };

        let mut uploaded = 0;
        let mut failures = Vec::new();
        for (route, target) in sessions.iter_mut() {
            self.upload_route(route, target.as_mut(), &artifacts, &mut uploaded, &mut failures)
                .await;
        }

        self.close_all(&mut sessions).await;

        let outcome = if failures.is_empty() {
            PublishOutcome::Success { uploaded }
        } else {
            PublishOutcome::PartialFailure(failures)
        };
        Some(self.finish(outcome))
    }

    /// Connects routes in order. On the first failure every target already
    /// connected is closed before the error is returned.
    async fn connect_all(
        &self,
        routes: Vec<Route>,
        connect_timeout: Duration,
    ) -> Result<Vec<(Route, Box<dyn TransferTarget>)>, PublishError> {
        let mut sessions: Vec<(Route, Box<dyn TransferTarget>)> = Vec::with_capacity(routes.len());

        for route in routes {
            let mut target = self.factory.build(&route.destination, connect_timeout);
            let kind = target.kind();
            self.reporter.report(ProgressEvent::Connecting(kind));

            match target.connect().await {
                Ok(()) => {
                    info!(target = %kind, files = route.files.len(), "target ready");
                    self.reporter.report(ProgressEvent::Ready(kind));
                    sessions.push((route, target));
                }
                Err(e) => {
                    error!(target = %kind, error = %e, "connect failed");
                    self.reporter
                        .report(ProgressEvent::Warning(format!("{kind}: {e}")));
                    self.close_all(&mut sessions).await;
                    return Err(PublishError::Connection {
                        target: kind,
                        source: e,
                    });
                }
            }
        }

        Ok(sessions)
    }

    async fn upload_route(
        &self,
        route: &Route,
        target: &mut dyn TransferTarget,
        artifacts: &BuildArtifactSet,
        uploaded: &mut usize,
        failures: &mut Vec<UploadFailure>,
    ) {
        let kind = target.kind();

        for file in &route.files {
            let remote_path = route.remote_path_for(file);
            let local_path = artifacts.local_path(file);

            match target.upload_file(&remote_path, &local_path).await {
                Ok(()) => {
                    *uploaded += 1;
                    debug!(target = %kind, %file, remote = %remote_path, "uploaded");
                    self.reporter.report(ProgressEvent::Uploaded {
                        file: file.clone(),
                        target: kind,
                        url: route.public_url_for(file),
                        remote_path,
                    });
                }
                Err(e) => {
                    warn!(target = %kind, %file, error = %e, "upload failed");
                    self.reporter.report(ProgressEvent::Warning(format!(
                        "failed to upload {file} to {kind}: {e}"
                    )));
                    failures.push(UploadFailure {
                        file: file.clone(),
                        target: kind,
                        cause: e.to_string(),
                    });
                }
            }
        }
    }

    /// Closes every target once. Close errors are reported, never fatal.
    async fn close_all(&self, sessions: &mut Vec<(Route, Box<dyn TransferTarget>)>) {
        for (_, mut target) in sessions.drain(..) {
            let kind = target.kind();
            if let Err(e) = target.close().await {
                warn!(target = %kind, error = %e, "close failed");
                self.reporter
                    .report(ProgressEvent::Warning(format!("closing {kind}: {e}")));
            }
        }
    }

    fn finish(&self, outcome: PublishOutcome) -> PublishOutcome {
        match &outcome {
            PublishOutcome::Success { uploaded } => {
                info!(uploaded, "publish completed");
                self.reporter.report(ProgressEvent::Succeeded);
            }
            PublishOutcome::PartialFailure(failures) => {
                for failure in failures {
                    error!(file = %failure.file, target = %failure.target, cause = %failure.cause, "not published");
                }
                self.reporter.report(ProgressEvent::Failed(outcome.to_string()));
            }
            other => {
                error!(reason = %other, "publish failed");
                self.reporter.report(ProgressEvent::Failed(other.to_string()));
            }
        }
        outcome
    }
}

/// Validates the configuration and scans the build output.
fn prepare(config: &PublishConfig, ctx: &BuildContext) -> Result<BuildArtifactSet, PublishError> {
    config.validate()?;
    let output_root = ctx.output_root()?;
    Ok(enumerate(&output_root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use object_store::ObjectStore;
    use object_store::memory::InMemory;
    use sitepub_config::{ObjectStorageConfig, Protocol, RemoteServerConfig};
    use sitepub_transfer::{
        ObjectStorageTarget, RemoteServerTarget, ServerSession, SessionOpener, TargetKind,
        TransferError, TransferFuture,
    };

    use crate::routing::Destination;

    const SERVER: TargetKind = TargetKind::RemoteServer(Protocol::Sftp);
    const STORAGE: TargetKind = TargetKind::ObjectStorage;

    // -- Recording reporter --

    #[derive(Clone, Default)]
    struct Events(Arc<Mutex<Vec<ProgressEvent>>>);

    impl Events {
        fn all(&self) -> Vec<ProgressEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for Events {
        fn report(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    // -- Mock targets --

    #[derive(Default)]
    struct Log {
        built: Vec<TargetKind>,
        connects: Vec<TargetKind>,
        uploads: Vec<(TargetKind, String)>,
        closes: Vec<TargetKind>,
    }

    struct MockTarget {
        kind: TargetKind,
        fail_connect: bool,
        fail_uploads: Vec<String>,
        log: Arc<Mutex<Log>>,
    }

    impl TransferTarget for MockTarget {
        fn kind(&self) -> TargetKind {
            self.kind
        }

        fn connect(&mut self) -> TransferFuture<'_, ()> {
            Box::pin(async move {
                self.log.lock().unwrap().connects.push(self.kind);
                if self.fail_connect {
                    Err(TransferError::Session("connection refused".into()))
                } else {
                    Ok(())
                }
            })
        }

        fn upload_file<'a>(
            &'a mut self,
            remote_path: &'a str,
            _local_path: &'a Path,
        ) -> TransferFuture<'a, ()> {
            Box::pin(async move {
                self.log
                    .lock()
                    .unwrap()
                    .uploads
                    .push((self.kind, remote_path.to_string()));
                if self.fail_uploads.iter().any(|f| f == remote_path) {
                    Err(TransferError::Session("transport reset".into()))
                } else {
                    Ok(())
                }
            })
        }

        fn close(&mut self) -> TransferFuture<'_, ()> {
            Box::pin(async move {
                self.log.lock().unwrap().closes.push(self.kind);
                Ok(())
            })
        }
    }

    #[derive(Default)]
    struct MockFactory {
        log: Arc<Mutex<Log>>,
        fail_connect: Vec<TargetKind>,
        fail_uploads: Vec<String>,
    }

    impl TargetFactory for MockFactory {
        fn build(&self, destination: &Destination, _timeout: Duration) -> Box<dyn TransferTarget> {
            let kind = destination.kind();
            self.log.lock().unwrap().built.push(kind);
            Box::new(MockTarget {
                kind,
                fail_connect: self.fail_connect.contains(&kind),
                fail_uploads: self.fail_uploads.clone(),
                log: self.log.clone(),
            })
        }
    }

    // -- Fixtures --

    fn server_config() -> RemoteServerConfig {
        RemoteServerConfig {
            protocol: Protocol::Sftp,
            host: "127.0.0.1".into(),
            port: 22,
            user: "deploy".into(),
            password: "pw".into(),
            remote_root: "/var/www/site".into(),
        }
    }

    fn config(with_storage: bool) -> PublishConfig {
        PublishConfig {
            enabled: true,
            remote_server: server_config(),
            object_storage: with_storage.then(|| ObjectStorageConfig {
                access_key_id: "id".into(),
                access_key_secret: "secret".into(),
                bucket: "assets".into(),
                region: "us-east-1".into(),
                endpoint: None,
            }),
            ..Default::default()
        }
    }

    fn build_output(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, file.as_bytes()).unwrap();
        }
        dir
    }

    fn context(dir: &tempfile::TempDir) -> BuildContext {
        BuildContext::new("https://cdn.example.com/app/", dir.path())
    }

    // -- Tests --

    #[tokio::test]
    async fn disabled_is_silent() {
        let dir = build_output(&["a.html"]);
        let events = Events::default();
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(events.clone()).with_factory(factory);

        let mut cfg = config(true);
        cfg.enabled = false;
        assert!(publisher.publish(cfg, context(&dir)).await.is_none());

        assert!(events.all().is_empty());
        assert!(log.lock().unwrap().built.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_contacts_nothing() {
        let dir = build_output(&["a.html"]);
        let events = Events::default();
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(events.clone()).with_factory(factory);

        let mut cfg = config(false);
        cfg.remote_server.password.clear();
        let outcome = publisher.publish(cfg, context(&dir)).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::ConfigInvalid(_)));
        assert!(log.lock().unwrap().built.is_empty());
        let events = events.all();
        assert_eq!(events[0], ProgressEvent::CheckingConfig);
        assert!(matches!(events[1], ProgressEvent::Failed(_)));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn missing_output_dir_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let events = Events::default();
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(events.clone()).with_factory(factory);

        let ctx = BuildContext::new("/", dir.path().join("dist"));
        let outcome = publisher.publish(config(true), ctx).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::EnumerationFailed(_)));
        assert!(log.lock().unwrap().built.is_empty());
    }

    #[tokio::test]
    async fn storage_then_server_with_html_only() {
        let dir = build_output(&["a.html", "b.js", "sub/c.html"]);
        let events = Events::default();
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(events.clone()).with_factory(factory);

        let outcome = publisher.publish(config(true), context(&dir)).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Success { uploaded: 5 });

        let log = log.lock().unwrap();
        assert_eq!(log.connects, vec![STORAGE, SERVER]);
        assert_eq!(
            log.uploads,
            vec![
                (STORAGE, "/app/a.html".to_string()),
                (STORAGE, "/app/b.js".to_string()),
                (STORAGE, "/app/sub/c.html".to_string()),
                (SERVER, "/var/www/site/a.html".to_string()),
                (SERVER, "/var/www/site/sub/c.html".to_string()),
            ]
        );
        assert_eq!(log.closes, vec![STORAGE, SERVER]);

        let events = events.all();
        assert_eq!(events.first(), Some(&ProgressEvent::CheckingConfig));
        assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
        assert!(events.contains(&ProgressEvent::Uploaded {
            file: "b.js".into(),
            target: STORAGE,
            remote_path: "/app/b.js".into(),
            url: Some("https://cdn.example.com/app/b.js".into()),
        }));
    }

    #[tokio::test]
    async fn without_storage_only_server_is_built() {
        let dir = build_output(&["a.html", "b.js"]);
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(Events::default()).with_factory(factory);

        let outcome = publisher.publish(config(false), context(&dir)).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Success { uploaded: 2 });

        let log = log.lock().unwrap();
        assert_eq!(log.built, vec![SERVER]);
        assert_eq!(log.uploads.len(), 2);
    }

    #[tokio::test]
    async fn failed_file_does_not_stop_the_run() {
        let dir = build_output(&["a.html", "b.js", "c.css", "d.html", "e.js"]);
        let events = Events::default();
        let factory = MockFactory {
            fail_uploads: vec!["/app/b.js".into()],
            ..Default::default()
        };
        let log = factory.log.clone();
        let publisher = Publisher::new(events.clone()).with_factory(factory);

        let outcome = publisher.publish(config(true), context(&dir)).await.unwrap();
        assert_eq!(
            outcome,
            PublishOutcome::PartialFailure(vec![UploadFailure {
                file: "b.js".into(),
                target: STORAGE,
                cause: "session error: transport reset".into(),
            }])
        );

        let log = log.lock().unwrap();
        let storage_uploads: Vec<&str> = log
            .uploads
            .iter()
            .filter(|(k, _)| *k == STORAGE)
            .map(|(_, p)| p.as_str())
            .collect();
        assert_eq!(
            storage_uploads,
            vec!["/app/a.html", "/app/b.js", "/app/c.css", "/app/d.html", "/app/e.js"]
        );
        assert_eq!(log.closes, vec![STORAGE, SERVER]);

        let events = events.all();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ProgressEvent::Warning(m) if m.contains("b.js")))
        );
        assert!(matches!(events.last(), Some(ProgressEvent::Failed(_))));
    }

    #[tokio::test]
    async fn server_connect_failure_closes_storage() {
        let dir = build_output(&["a.html"]);
        let factory = MockFactory {
            fail_connect: vec![SERVER],
            ..Default::default()
        };
        let log = factory.log.clone();
        let publisher = Publisher::new(Events::default()).with_factory(factory);

        let outcome = publisher.publish(config(true), context(&dir)).await.unwrap();
        assert_eq!(
            outcome,
            PublishOutcome::ConnectionFailed {
                target: SERVER,
                cause: "session error: connection refused".into(),
            }
        );

        let log = log.lock().unwrap();
        assert!(log.uploads.is_empty());
        assert_eq!(log.closes, vec![STORAGE]);
    }

    #[tokio::test]
    async fn run_prefers_explicit_options_over_env() {
        let dir = build_output(&["a.html"]);
        let factory = MockFactory::default();
        let log = factory.log.clone();
        let publisher = Publisher::new(Events::default()).with_factory(factory);

        let env: HashMap<String, String> =
            HashMap::from([("PUBLISH_ENABLE".to_string(), "false".to_string())]);
        let outcome = publisher
            .run(Some(config(false)), &env, context(&dir))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(log.lock().unwrap().built, vec![SERVER]);

        // Without explicit options the environment disables the run.
        assert!(publisher.run(None, &env, context(&dir)).await.is_none());
    }

    // -- Real targets over fakes --

    struct HangingOpener;

    impl SessionOpener for HangingOpener {
        fn open(
            &self,
            _server: &RemoteServerConfig,
            _timeout: Duration,
        ) -> Result<Box<dyn ServerSession>, TransferError> {
            std::thread::sleep(Duration::from_millis(300));
            Err(TransferError::Session("too late".into()))
        }
    }

    struct RecordingOpener {
        stored: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    }

    impl SessionOpener for RecordingOpener {
        fn open(
            &self,
            _server: &RemoteServerConfig,
            _timeout: Duration,
        ) -> Result<Box<dyn ServerSession>, TransferError> {
            Ok(Box::new(RecordingSession {
                stored: self.stored.clone(),
            }))
        }
    }

    struct RecordingSession {
        stored: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    }

    impl ServerSession for RecordingSession {
        fn make_dir(&mut self, _dir: &str) -> Result<(), TransferError> {
            Ok(())
        }

        fn put(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError> {
            let data = std::fs::read(local)?;
            let len = data.len() as u64;
            self.stored.lock().unwrap().push((remote.to_string(), data));
            Ok(len)
        }

        fn quit(&mut self) -> Result<(), TransferError> {
            Ok(())
        }
    }

    struct FakeBackends {
        store: Arc<InMemory>,
        opener: Arc<dyn SessionOpener>,
        connect_timeout: Duration,
    }

    impl TargetFactory for FakeBackends {
        fn build(&self, destination: &Destination, _timeout: Duration) -> Box<dyn TransferTarget> {
            match destination {
                Destination::ObjectStorage(_) => {
                    Box::new(ObjectStorageTarget::with_store(self.store.clone()))
                }
                Destination::RemoteServer(server) => Box::new(RemoteServerTarget::with_opener(
                    server.clone(),
                    self.connect_timeout,
                    self.opener.clone(),
                )),
            }
        }
    }

    #[tokio::test]
    async fn server_never_ready_fails_without_uploading() {
        let dir = build_output(&["a.html", "b.js"]);
        let store = Arc::new(InMemory::new());
        let events = Events::default();
        let publisher = Publisher::new(events.clone()).with_factory(FakeBackends {
            store: store.clone(),
            opener: Arc::new(HangingOpener),
            connect_timeout: Duration::from_millis(50),
        });

        let outcome = publisher.publish(config(true), context(&dir)).await.unwrap();
        match outcome {
            PublishOutcome::ConnectionFailed { target, cause } => {
                assert_eq!(target, SERVER);
                assert!(cause.contains("no ready signal"), "{cause}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Storage connected first but nothing was uploaded anywhere.
        assert!(store.list_with_delimiter(None).await.unwrap().objects.is_empty());
        let events = events.all();
        assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Uploaded { .. })));

        // The session error is surfaced before the terminal event.
        let n = events.len();
        assert!(n >= 2);
        assert!(
            matches!(&events[n - 2], ProgressEvent::Warning(m) if m.starts_with("sftp server:")),
            "{:?}",
            events[n - 2]
        );
        assert!(matches!(events[n - 1], ProgressEvent::Failed(_)));
    }

    #[tokio::test]
    async fn publishes_to_bucket_and_server() {
        let dir = build_output(&["index.html", "assets/app.js"]);
        let store = Arc::new(InMemory::new());
        let stored = Arc::new(Mutex::new(Vec::new()));
        let publisher = Publisher::new(Events::default()).with_factory(FakeBackends {
            store: store.clone(),
            opener: Arc::new(RecordingOpener {
                stored: stored.clone(),
            }),
            connect_timeout: Duration::from_secs(5),
        });

        let outcome = publisher.publish(config(true), context(&dir)).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Success { uploaded: 3 });

        let js = store
            .get(&object_store::path::Path::from("app/assets/app.js"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(js.as_ref(), b"assets/app.js");

        let stored = stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, "/var/www/site/index.html");
        assert_eq!(stored[0].1, b"index.html");
    }
}
