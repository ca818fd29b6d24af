//! The viewer session: listens on the host channel, runs load requests and
//! reports their outcome.

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    docbridge_config::{DocbridgeConfig, ViewerConfig},
    docbridge_media::{Acquirer, DocumentSource, FetchOptions},
    docbridge_processors::{Dispatcher, MountTarget, ProcessorRegistry},
    docbridge_protocol::{DecodeError, Decoded, EnvelopeCodec, NoiseFilter, ProtocolMessage},
    tokio::{
        runtime::Handle,
        sync::{mpsc, watch},
        task::JoinHandle,
    },
    tracing::{debug, info, trace, warn},
};

#[cfg(feature = "metrics")]
use docbridge_metrics::{counter, envelopes, histogram, labels, requests};

use crate::{
    channel::HostChannel,
    error::{Error, LoadFailure, Result},
    launch::LaunchParams,
    lifecycle::{Lifecycle, LoadState, RequestId, TransitionRejected},
    notify::{Notifier, Outbox},
};

// ── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    /// Announce `READY` to the host after `ready_settle`.
    pub embedded: bool,
    pub ready_settle: Duration,
    /// Upper bound on each of acquisition and processing.
    pub request_timeout: Option<Duration>,
    pub mount_target: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for ViewerSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            embedded: config.embedded,
            ready_settle: config.ready_settle(),
            request_timeout: config.request_timeout(),
            mount_target: config.mount_target.clone(),
        }
    }
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Channel noise, dropped.
    Noise,
    /// Malformed protocol message; the host was sent `WEB_ERROR`.
    Rejected(DecodeError),
    /// A valid envelope that only travels viewer → host.
    Ignored(&'static str),
    Accepted(RequestId),
}

// ── Builder ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ViewerBuilder {
    settings: ViewerSettings,
    codec: EnvelopeCodec,
    fetch: FetchOptions,
    acquirer: Option<Acquirer>,
    registry: Option<ProcessorRegistry>,
    channel: Option<Arc<dyn HostChannel>>,
    runtime: Option<Handle>,
}

impl ViewerBuilder {
    /// Builder seeded from the viewer, protocol and fetch sections of `config`.
    #[must_use]
    pub fn from_config(config: &DocbridgeConfig) -> Self {
        let mut fetch = FetchOptions {
            timeout: config.fetch.timeout(),
            ..FetchOptions::default()
        };
        if let Some(user_agent) = &config.fetch.user_agent {
            fetch.user_agent.clone_from(user_agent);
        }

        Self {
            settings: ViewerSettings::from(&config.viewer),
            codec: EnvelopeCodec::new(
                NoiseFilter::new(&config.protocol.noise_patterns),
                config.protocol.max_message_bytes,
            ),
            fetch,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn settings(mut self, settings: ViewerSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: EnvelopeCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Use an existing acquirer instead of building one from fetch options.
    #[must_use]
    pub fn acquirer(mut self, acquirer: Acquirer) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: ProcessorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: impl HostChannel + 'static) -> Self {
        self.channel = Some(Arc::new(channel));
        self
    }

    /// Runtime that load requests and the `READY` announcement run on.
    /// Defaults to the runtime `build` is called from.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Fails with [`Error::NoRuntime`] when called outside a Tokio runtime
    /// without an explicit [`runtime`](Self::runtime).
    pub fn build(self) -> Result<Viewer> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };
        let acquirer = match self.acquirer {
            Some(acquirer) => acquirer,
            None => Acquirer::new(&self.fetch)?,
        };
        let registry = self
            .registry
            .unwrap_or_else(ProcessorRegistry::with_defaults);
        let (state_tx, _) = watch::channel(LoadState::Idle);

        debug!(
            embedded = self.settings.embedded,
            host_attached = self.channel.is_some(),
            processors = ?registry.kinds(),
            "viewer ready to accept documents"
        );

        Ok(Viewer {
            inner: Arc::new(Inner {
                lifecycle: Mutex::new(Lifecycle::new()),
                state_tx,
                codec: self.codec,
                acquirer,
                dispatcher: Dispatcher::new(registry),
                outbox: Outbox::new(Notifier::new(self.channel)),
                runtime,
                mount: MountTarget::new(self.settings.mount_target.clone()),
                settings: self.settings,
                ready_sent: AtomicBool::new(false),
            }),
        })
    }
}

// ── Viewer ──────────────────────────────────────────────────────────────────

struct Inner {
    /// Never held across an await.
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<LoadState>,
    codec: EnvelopeCodec,
    acquirer: Acquirer,
    dispatcher: Dispatcher,
    outbox: Outbox,
    runtime: Handle,
    mount: MountTarget,
    settings: ViewerSettings,
    ready_sent: AtomicBool,
}

/// One viewer instance. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Viewer {
    inner: Arc<Inner>,
}

impl Viewer {
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::default()
    }

    #[must_use]
    pub fn settings(&self) -> &ViewerSettings {
        &self.inner.settings
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe state changes. Receivers cannot affect the session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.state_tx.subscribe()
    }

    #[must_use]
    pub fn latest_request(&self) -> Option<RequestId> {
        self.lock().latest()
    }

    /// In embedded mode, announce `READY` once the settle delay has passed.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if !self.inner.settings.embedded {
            debug!("not embedded, skipping READY announcement");
            return None;
        }
        let viewer = self.clone();
        let settle = self.inner.settings.ready_settle;
        Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(settle).await;
            viewer.announce_ready();
        }))
    }

    /// Send `READY` unless it has already been sent. Returns whether this
    /// call sent it.
    pub fn announce_ready(&self) -> bool {
        if self.inner.ready_sent.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("announcing READY to host");
        self.inner.outbox.push(ProtocolMessage::Ready);
        self.inner.outbox.flush();
        true
    }

    /// Process raw frames until the inbound channel closes.
    pub async fn run(&self, mut inbound: mpsc::Receiver<String>) {
        while let Some(raw) = inbound.recv().await {
            self.handle_inbound(&raw);
        }
        debug!("host channel closed");
    }

    /// Decode one raw frame from the host and act on it. Safe to call from
    /// any thread; accepted requests run on the viewer's runtime.
    pub fn handle_inbound(&self, raw: &str) -> Inbound {
        #[cfg(feature = "metrics")]
        counter!(envelopes::RECEIVED_TOTAL).increment(1);

        match self.inner.codec.decode(raw) {
            Ok(Decoded::Noise) => {
                trace!(bytes = raw.len(), "dropping channel noise");
                #[cfg(feature = "metrics")]
                counter!(envelopes::NOISE_TOTAL).increment(1);
                Inbound::Noise
            },
            Err(err) => {
                warn!(error = %err, "rejecting malformed protocol message");
                #[cfg(feature = "metrics")]
                counter!(envelopes::DECODE_ERRORS_TOTAL).increment(1);
                self.inner.outbox.push(ProtocolMessage::WebError {
                    message: err.to_string(),
                });
                self.inner.outbox.flush();
                Inbound::Rejected(err)
            },
            Ok(Decoded::Message(ProtocolMessage::LoadDocument {
                file_data,
                file_name,
            })) => Inbound::Accepted(self.load(DocumentSource::Channel {
                file_data,
                file_name,
            })),
            Ok(Decoded::Message(other)) => {
                debug!(message_type = other.type_name(), "ignoring outbound envelope from host");
                Inbound::Ignored(other.type_name())
            },
        }
    }

    /// Start a request for a URL launch.
    pub fn load_launch(&self, params: LaunchParams) -> RequestId {
        self.load(DocumentSource::Url {
            url: params.file_url,
            file_name: params.file_name,
        })
    }

    /// Start a request for a locally picked file.
    pub fn load_upload(&self, path: impl Into<PathBuf>, file_name: impl Into<String>) -> RequestId {
        self.load(DocumentSource::Upload {
            path: path.into(),
            file_name: file_name.into(),
        })
    }

    /// Accept a request, superseding any in flight, and run it in the
    /// background on the viewer's runtime.
    pub fn load(&self, source: DocumentSource) -> RequestId {
        let request = {
            let mut lifecycle = self.lock();
            let request = lifecycle.accept(source.file_name());
            self.publish(lifecycle.state());
            request
        };
        self.inner.outbox.flush();

        info!(
            %request,
            file_name = source.file_name(),
            source = source.kind().as_str(),
            "accepted load request"
        );
        #[cfg(feature = "metrics")]
        counter!(requests::ACCEPTED_TOTAL, labels::SOURCE => source.kind().as_str()).increment(1);

        let viewer = self.clone();
        self.inner
            .runtime
            .spawn(async move { viewer.run_request(request, source).await });
        request
    }

    /// Wait until `request` reaches `Ready`/`Error` or is superseded.
    pub async fn settled(&self, request: RequestId) -> LoadState {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| match state.request() {
                Some(current) if current == request => state.is_terminal(),
                Some(current) => current > request,
                None => false,
            })
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    // ── Pipeline ────────────────────────────────────────────────────────────

    async fn run_request(self, request: RequestId, source: DocumentSource) {
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let acquired = self
            .bounded("acquiring the document", self.inner.acquirer.acquire(source))
            .await;
        let payload = match acquired {
            Ok(Ok(payload)) => payload,
            Ok(Err(err)) => {
                let failure = LoadFailure::from(&err);
                self.transition(request, |lc| lc.on_acquisition_failed(request, failure));
                return;
            },
            Err(timed_out) => {
                self.transition(request, |lc| lc.on_timeout(request, timed_out));
                return;
            },
        };

        let payload = {
            let mut lifecycle = self.lock();
            match lifecycle.on_acquired(request, payload) {
                Ok(state) => {
                    self.publish(&state);
                    lifecycle.payload().cloned()
                },
                Err(rejected) => {
                    discard(&rejected);
                    None
                },
            }
        };
        self.inner.outbox.flush();
        let Some(payload) = payload else {
            return;
        };

        let processed = self
            .bounded(
                "processing the document",
                self.inner.dispatcher.process(&payload, &self.inner.mount),
            )
            .await;
        drop(payload);

        let applied = match processed {
            Ok(Ok(output)) => self.transition(request, |lc| lc.on_processed(request, output)),
            Ok(Err(err)) => {
                let failure = LoadFailure::from(&err);
                self.transition(request, |lc| lc.on_processing_failed(request, failure))
            },
            Err(timed_out) => self.transition(request, |lc| lc.on_timeout(request, timed_out)),
        };

        if applied {
            trace!(%request, "request settled");
            #[cfg(feature = "metrics")]
            histogram!(requests::DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        }
    }

    async fn bounded<T>(
        &self,
        phase: &'static str,
        step: impl Future<Output = T>,
    ) -> std::result::Result<T, LoadFailure> {
        match self.inner.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, step)
                .await
                .map_err(|_| LoadFailure::timed_out(phase, limit)),
            None => Ok(step.await),
        }
    }

    /// Apply a completion under the lock. Returns whether it was honored.
    fn transition<F>(&self, request: RequestId, apply: F) -> bool
    where
        F: FnOnce(&mut Lifecycle) -> std::result::Result<LoadState, TransitionRejected>,
    {
        let applied = {
            let mut lifecycle = self.lock();
            match apply(&mut lifecycle) {
                Ok(state) => {
                    self.publish(&state);
                    true
                },
                Err(rejected) => {
                    debug!(%request, "completion not applied");
                    discard(&rejected);
                    false
                },
            }
        };
        self.inner.outbox.flush();
        applied
    }

    /// Publish a state the lifecycle just entered and queue the host
    /// notification for terminal outcomes. Called with the lifecycle lock
    /// held so observers and the host see states in the order they were
    /// entered; callers flush the outbox after releasing the lock.
    fn publish(&self, state: &LoadState) {
        self.inner.state_tx.send_replace(state.clone());

        match state {
            LoadState::Ready {
                request, file_name, ..
            } => {
                info!(%request, file_name, "document loaded");
                #[cfg(feature = "metrics")]
                counter!(requests::READY_TOTAL).increment(1);
                self.inner.outbox.push(ProtocolMessage::Loaded {
                    file_name: file_name.clone(),
                });
            },
            LoadState::Error {
                request,
                file_name,
                failure,
            } => {
                warn!(%request, file_name, category = %failure.category, error = %failure, "document failed to load");
                #[cfg(feature = "metrics")]
                counter!(requests::FAILED_TOTAL, labels::REASON => failure.category.as_str())
                    .increment(1);
                self.inner.outbox.push(ProtocolMessage::WebError {
                    message: failure.message.clone(),
                });
            },
            other => debug!(state = %other, "load state changed"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn discard(rejected: &TransitionRejected) {
    debug!(reason = %rejected, "discarding completion");
    #[cfg(feature = "metrics")]
    if matches!(rejected, TransitionRejected::Stale { .. }) {
        counter!(requests::STALE_COMPLETIONS_TOTAL).increment(1);
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("settings", &self.inner.settings)
            .field("state", &self.state())
            .field("notifier", self.inner.outbox.notifier())
            .finish()
    }
}
