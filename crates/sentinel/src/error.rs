//! Error taxonomy (C19).
//!
//! Grounded on `control::caclient::Error`'s enum idiom: a closed,
//! `thiserror`-derived set that the reconcile engine maps to the outcome
//! classes of §7 via a single exhaustive match, never string inspection.
//!
//! Each variant carries its own `backoff`: `kube::runtime::Controller`
//! only hands `error_policy` the `Err` value, not whatever `Action` the
//! `reconcile` function computed before returning it, so the requeue
//! duration has to travel inside the error itself.

use std::time::Duration;

use thiserror::Error;

use crate::session::SessionError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to build session: {source}")]
    SessionBuildFailed { source: SessionError, backoff: Duration },
    #[error("failed to list namespaces: {source}")]
    NamespaceListFailed { source: StoreError, backoff: Duration },
    #[error("failed to write status: {source}")]
    StatusUpdateFailed { source: StoreError, backoff: Duration },
    #[error("target has an unrecognized kind")]
    InvalidKind { backoff: Duration },
}

impl ReconcileError {
    pub fn backoff(&self) -> Duration {
        match self {
            ReconcileError::SessionBuildFailed { backoff, .. }
            | ReconcileError::NamespaceListFailed { backoff, .. }
            | ReconcileError::StatusUpdateFailed { backoff, .. }
            | ReconcileError::InvalidKind { backoff } => *backoff,
        }
    }
}
