//! Request lifecycle: `Idle → Decoding → Processing → Ready | Error`.
//!
//! Every accepted request gets a fresh [`RequestId`] and supersedes whatever
//! was in flight. Completions carry the id they were started with; only
//! completions for the latest id in the expected phase are applied, so the
//! last accepted request always wins regardless of completion order.

use std::sync::Arc;

use {docbridge_media::DocumentPayload, docbridge_processors::ProcessedResult};

use crate::error::LoadFailure;

/// Sequence number assigned when a request is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    /// Document bytes are being acquired.
    Decoding {
        request: RequestId,
        file_name: String,
    },
    /// Bytes acquired, a processor is running.
    Processing {
        request: RequestId,
        file_name: String,
    },
    Ready {
        request: RequestId,
        file_name: String,
        output: Arc<ProcessedResult>,
    },
    Error {
        request: RequestId,
        file_name: String,
        failure: LoadFailure,
    },
}

impl LoadState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Decoding { .. } => "decoding",
            Self::Processing { .. } => "processing",
            Self::Ready { .. } => "ready",
            Self::Error { .. } => "error",
        }
    }

    #[must_use]
    pub fn request(&self) -> Option<RequestId> {
        match self {
            Self::Idle => None,
            Self::Decoding { request, .. }
            | Self::Processing { request, .. }
            | Self::Ready { request, .. }
            | Self::Error { request, .. } => Some(*request),
        }
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Decoding { file_name, .. }
            | Self::Processing { file_name, .. }
            | Self::Ready { file_name, .. }
            | Self::Error { file_name, .. } => Some(file_name),
        }
    }

    /// `Ready` or `Error`: nothing further happens until the next request.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Error { .. })
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Error {
                request,
                file_name,
                failure,
            } => write!(f, "error {request} ({file_name}): {failure}"),
            other => match (other.request(), other.file_name()) {
                (Some(request), Some(file_name)) => {
                    write!(f, "{} {request} ({file_name})", other.name())
                },
                _ => f.write_str(other.name()),
            },
        }
    }
}

// ── Rejections ──────────────────────────────────────────────────────────────

/// A completion that the machine refused to apply. Rejections have no
/// visible effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionRejected {
    /// A newer request has been accepted since this one started.
    #[error("request {request} was superseded{}", superseded_by(.latest))]
    Stale {
        request: RequestId,
        latest: Option<RequestId>,
    },

    /// The request is current but not in the phase this event belongs to.
    #[error("request {request} cannot apply '{event}' while {state}")]
    OutOfPhase {
        request: RequestId,
        event: &'static str,
        state: &'static str,
    },
}

fn superseded_by(latest: &Option<RequestId>) -> String {
    latest.map(|l| format!(" by {l}")).unwrap_or_default()
}

// ── Machine ─────────────────────────────────────────────────────────────────

/// The `(latest id, state, payload)` triple. Callers serialize access.
#[derive(Debug, Default)]
pub struct Lifecycle {
    issued: u64,
    latest: Option<RequestId>,
    state: LoadState,
    payload: Option<Arc<DocumentPayload>>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }

    /// Payload of the request currently in `Processing`.
    #[must_use]
    pub fn payload(&self) -> Option<&Arc<DocumentPayload>> {
        self.payload.as_ref()
    }

    /// Accept a new request from any state. Drops the superseded payload.
    pub fn accept(&mut self, file_name: impl Into<String>) -> RequestId {
        self.issued += 1;
        let request = RequestId(self.issued);
        self.latest = Some(request);
        self.payload = None;
        self.state = LoadState::Decoding {
            request,
            file_name: file_name.into(),
        };
        request
    }

    pub fn on_acquired(
        &mut self,
        request: RequestId,
        payload: DocumentPayload,
    ) -> Result<LoadState, TransitionRejected> {
        let file_name = self.expect_decoding(request, "acquired")?;
        self.payload = Some(Arc::new(payload));
        Ok(self.enter(LoadState::Processing { request, file_name }))
    }

    pub fn on_acquisition_failed(
        &mut self,
        request: RequestId,
        failure: LoadFailure,
    ) -> Result<LoadState, TransitionRejected> {
        let file_name = self.expect_decoding(request, "acquisition_failed")?;
        Ok(self.enter(LoadState::Error {
            request,
            file_name,
            failure,
        }))
    }

    pub fn on_processed(
        &mut self,
        request: RequestId,
        output: ProcessedResult,
    ) -> Result<LoadState, TransitionRejected> {
        let file_name = self.expect_processing(request, "processed")?;
        self.payload = None;
        Ok(self.enter(LoadState::Ready {
            request,
            file_name,
            output: Arc::new(output),
        }))
    }

    pub fn on_processing_failed(
        &mut self,
        request: RequestId,
        failure: LoadFailure,
    ) -> Result<LoadState, TransitionRejected> {
        let file_name = self.expect_processing(request, "processing_failed")?;
        self.payload = None;
        Ok(self.enter(LoadState::Error {
            request,
            file_name,
            failure,
        }))
    }

    /// Force an in-flight request into `Error`.
    pub fn on_timeout(
        &mut self,
        request: RequestId,
        failure: LoadFailure,
    ) -> Result<LoadState, TransitionRejected> {
        self.check_current(request)?;
        let file_name = match &self.state {
            LoadState::Decoding { file_name, .. } | LoadState::Processing { file_name, .. } => {
                file_name.clone()
            },
            other => return Err(out_of_phase(request, "timed_out", other)),
        };
        self.payload = None;
        Ok(self.enter(LoadState::Error {
            request,
            file_name,
            failure,
        }))
    }

    fn enter(&mut self, next: LoadState) -> LoadState {
        self.state = next;
        self.state.clone()
    }

    fn check_current(&self, request: RequestId) -> Result<(), TransitionRejected> {
        if self.latest == Some(request) {
            Ok(())
        } else {
            Err(TransitionRejected::Stale {
                request,
                latest: self.latest,
            })
        }
    }

    fn expect_decoding(
        &self,
        request: RequestId,
        event: &'static str,
    ) -> Result<String, TransitionRejected> {
        self.check_current(request)?;
        match &self.state {
            LoadState::Decoding { file_name, .. } => Ok(file_name.clone()),
            other => Err(out_of_phase(request, event, other)),
        }
    }

    fn expect_processing(
        &self,
        request: RequestId,
        event: &'static str,
    ) -> Result<String, TransitionRejected> {
        self.check_current(request)?;
        match &self.state {
            LoadState::Processing { file_name, .. } => Ok(file_name.clone()),
            other => Err(out_of_phase(request, event, other)),
        }
    }
}

fn out_of_phase(request: RequestId, event: &'static str, state: &LoadState) -> TransitionRejected {
    TransitionRejected::OutOfPhase {
        request,
        event,
        state: state.name(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::error::FailureCategory,
        docbridge_media::SourceKind,
        std::time::Duration,
    };

    fn payload(name: &str) -> DocumentPayload {
        DocumentPayload::new(b"PK\x03\x04".to_vec(), name, SourceKind::Channel).unwrap()
    }

    fn mounted() -> ProcessedResult {
        ProcessedResult::Mounted {
            target: "root".into(),
        }
    }

    #[test]
    fn happy_path_walks_every_phase() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), &LoadState::Idle);

        let id = lc.accept("a.docx");
        assert_eq!(lc.state().name(), "decoding");
        assert_eq!(lc.state().request(), Some(id));

        let state = lc.on_acquired(id, payload("a.docx")).unwrap();
        assert_eq!(state, LoadState::Processing {
            request: id,
            file_name: "a.docx".into()
        });
        assert!(lc.payload().is_some());

        let state = lc.on_processed(id, mounted()).unwrap();
        assert!(matches!(state, LoadState::Ready { ref file_name, .. } if file_name == "a.docx"));
        assert!(state.is_terminal());
        assert!(lc.payload().is_none());
    }

    #[test]
    fn ids_increase_monotonically() {
        let mut lc = Lifecycle::new();
        let first = lc.accept("a.docx");
        let second = lc.accept("b.docx");
        assert!(second > first);
        assert_eq!(lc.latest(), Some(second));
        assert_eq!(second.to_string(), format!("#{}", second.get()));
    }

    #[test]
    fn last_accepted_request_wins() {
        let mut lc = Lifecycle::new();
        let a = lc.accept("a.docx");
        lc.on_acquired(a, payload("a.docx")).unwrap();

        let b = lc.accept("b.docx");
        assert!(lc.payload().is_none(), "superseded payload is dropped");
        lc.on_acquired(b, payload("b.docx")).unwrap();
        lc.on_processed(b, mounted()).unwrap();

        let err = lc.on_processed(a, mounted()).unwrap_err();
        assert_eq!(err, TransitionRejected::Stale {
            request: a,
            latest: Some(b),
        });
        assert!(matches!(lc.state(), LoadState::Ready { file_name, .. } if file_name == "b.docx"));
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut lc = Lifecycle::new();
        let a = lc.accept("a.docx");
        let b = lc.accept("b.docx");
        let failure = LoadFailure::new(FailureCategory::Decode, "bad base64");
        assert!(matches!(
            lc.on_acquisition_failed(a, failure),
            Err(TransitionRejected::Stale { .. })
        ));
        assert_eq!(lc.state().request(), Some(b));
        assert_eq!(lc.state().name(), "decoding");
    }

    #[test]
    fn acquisition_failure_goes_straight_to_error() {
        let mut lc = Lifecycle::new();
        let id = lc.accept("a.docx");
        let state = lc
            .on_acquisition_failed(id, LoadFailure::new(FailureCategory::Network, "HTTP 404"))
            .unwrap();
        assert!(matches!(state, LoadState::Error { ref failure, .. } if failure.category == FailureCategory::Network));
    }

    #[test]
    fn wrong_phase_is_rejected() {
        let mut lc = Lifecycle::new();
        let id = lc.accept("a.docx");

        let err = lc.on_processed(id, mounted()).unwrap_err();
        assert_eq!(err, TransitionRejected::OutOfPhase {
            request: id,
            event: "processed",
            state: "decoding",
        });

        lc.on_acquired(id, payload("a.docx")).unwrap();
        assert!(matches!(
            lc.on_acquired(id, payload("a.docx")),
            Err(TransitionRejected::OutOfPhase { .. })
        ));
    }

    #[test]
    fn completion_before_any_request_is_stale() {
        let mut lc = Lifecycle::new();
        let mut other = Lifecycle::new();
        let foreign = other.accept("x.docx");
        assert_eq!(
            lc.on_processed(foreign, mounted()).unwrap_err(),
            TransitionRejected::Stale {
                request: foreign,
                latest: None,
            }
        );
        assert_eq!(lc.state(), &LoadState::Idle);
    }

    #[test]
    fn timeout_forces_error_and_rejects_late_completion() {
        let mut lc = Lifecycle::new();
        let id = lc.accept("slow.xlsx");
        lc.on_acquired(id, payload("slow.xlsx")).unwrap();

        let failure = LoadFailure::timed_out("processing the document", Duration::from_secs(1));
        let state = lc.on_timeout(id, failure).unwrap();
        assert!(matches!(state, LoadState::Error { ref failure, .. } if failure.category == FailureCategory::TimedOut));
        assert!(lc.payload().is_none());

        assert!(matches!(
            lc.on_processed(id, mounted()),
            Err(TransitionRejected::OutOfPhase { .. })
        ));
    }

    #[test]
    fn new_request_leaves_error() {
        let mut lc = Lifecycle::new();
        let a = lc.accept("a.csv");
        lc.on_acquired(a, payload("a.csv")).unwrap();
        lc.on_processing_failed(a, LoadFailure::new(FailureCategory::UnsupportedFormat, "csv"))
            .unwrap();

        let b = lc.accept("b.docx");
        assert_eq!(lc.state(), &LoadState::Decoding {
            request: b,
            file_name: "b.docx".into()
        });
    }

    #[test]
    fn display_is_compact() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state().to_string(), "idle");
        let id = lc.accept("a.docx");
        assert_eq!(lc.state().to_string(), format!("decoding {id} (a.docx)"));
        lc.on_acquisition_failed(id, LoadFailure::new(FailureCategory::Decode, "bad data"))
            .unwrap();
        assert_eq!(lc.state().to_string(), format!("error {id} (a.docx): bad data"));
    }
}
