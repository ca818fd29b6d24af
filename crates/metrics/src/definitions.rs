//! Metric name and label definitions.
//!
//! Every metric docbridge records is named here so the set of exported
//! series is documented in one place.

/// Host channel envelope metrics
pub mod envelopes {
    /// Total raw frames received from the host
    pub const RECEIVED_TOTAL: &str = "docbridge_envelopes_received_total";
    /// Frames dropped as channel noise
    pub const NOISE_TOTAL: &str = "docbridge_envelopes_noise_total";
    /// Frames rejected as malformed protocol messages
    pub const DECODE_ERRORS_TOTAL: &str = "docbridge_envelopes_decode_errors_total";
    /// Envelopes posted to the host, by message type
    pub const SENT_TOTAL: &str = "docbridge_envelopes_sent_total";
    /// Envelopes dropped because no host channel is attached
    pub const UNDELIVERED_TOTAL: &str = "docbridge_envelopes_undelivered_total";
}

/// Load request lifecycle metrics
pub mod requests {
    /// Load requests accepted into the lifecycle
    pub const ACCEPTED_TOTAL: &str = "docbridge_requests_accepted_total";
    /// Completions discarded by the sequence guard
    pub const STALE_COMPLETIONS_TOTAL: &str = "docbridge_requests_stale_completions_total";
    /// Requests that reached `Ready`
    pub const READY_TOTAL: &str = "docbridge_requests_ready_total";
    /// Requests that reached `Error`, by failure category
    pub const FAILED_TOTAL: &str = "docbridge_requests_failed_total";
    /// Time from acceptance to a terminal state, in seconds
    pub const DURATION_SECONDS: &str = "docbridge_request_duration_seconds";
}

/// Document acquisition metrics
pub mod acquisition {
    /// Bytes of document data acquired, by source
    pub const BYTES_TOTAL: &str = "docbridge_acquisition_bytes_total";
    /// Acquisition failures, by source
    pub const FAILURES_TOTAL: &str = "docbridge_acquisition_failures_total";
    /// Duration of URL fetches in seconds
    pub const FETCH_DURATION_SECONDS: &str = "docbridge_acquisition_fetch_duration_seconds";
}

/// Processor dispatch metrics
pub mod processors {
    /// Number of registered processors
    pub const REGISTERED: &str = "docbridge_processors_registered";
    /// Processor invocations, by kind
    pub const INVOCATIONS_TOTAL: &str = "docbridge_processor_invocations_total";
    /// Processor failures, by kind
    pub const ERRORS_TOTAL: &str = "docbridge_processor_errors_total";
    /// Documents rejected before dispatch for an unrecognised extension
    pub const UNSUPPORTED_TOTAL: &str = "docbridge_processor_unsupported_total";
    /// Processor call duration in seconds, by kind
    pub const DURATION_SECONDS: &str = "docbridge_processor_duration_seconds";
}

/// Common label keys
pub mod labels {
    pub const SOURCE: &str = "source";
    pub const KIND: &str = "kind";
    pub const REASON: &str = "reason";
    pub const MESSAGE_TYPE: &str = "message_type";
}

/// Histogram bucket boundaries
pub mod buckets {
    /// Document load durations: 10ms to 2 minutes
    pub const LOAD_DURATION: [f64; 11] = [
        0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0,
    ];
}
