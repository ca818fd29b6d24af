//! Embedded document viewer session.
//!
//! A [`Viewer`] listens for envelopes from its host, acquires the document
//! bytes, routes them to a processor and reports `LOADED` or `WEB_ERROR`
//! back. Overlapping requests are resolved by the [`Lifecycle`] sequence
//! guard: the most recently accepted request is the only one whose outcome
//! becomes visible.

pub mod channel;
pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod notify;
pub mod session;

pub use {
    channel::HostChannel,
    error::{Error, FailureCategory, LoadFailure, Result},
    launch::LaunchParams,
    lifecycle::{Lifecycle, LoadState, RequestId, TransitionRejected},
    notify::Notifier,
    session::{Inbound, Viewer, ViewerBuilder, ViewerSettings},
};
