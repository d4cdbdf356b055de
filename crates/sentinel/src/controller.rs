//! Controller wiring (C10 glue).
//!
//! Grounded on the `other_examples` openbao-pki-controller's
//! `Controller::new(...).run(reconcile, error_policy, context)` bootstrap:
//! two independent watch loops, one per CRD kind, sharing a single
//! `ObjectStore` and metrics handle through the reconciler `Context`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use kube::runtime::controller::Action;
use kube::runtime::Controller;
use kube::{Api, Client};
use tracing::{error, info};

use crate::defaults::log_level;
use crate::error::ReconcileError;
use crate::reconcile::{self, CertWatchInputs, KeystoreWatchInputs, Outcome};
use crate::store::ObjectStore;
use crate::telemetry::{reconcile_span, Metrics};
use crate::types::{CertWatch, KeystoreWatch};

pub struct Context {
    pub store: Arc<dyn ObjectStore>,
    pub api_endpoint: String,
    pub metrics: Arc<Metrics>,
}

async fn reconcile_cert(watch: Arc<CertWatch>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let namespace = watch.metadata.namespace.clone().unwrap_or_default();
    let name = watch.metadata.name.clone().unwrap_or_default();
    let prior = watch.status.clone().unwrap_or_default();
    let span = reconcile_span(&namespace, &name, log_level(watch.spec.log_level));
    let _enter = span.enter();

    let inputs = CertWatchInputs {
        namespace: &namespace,
        name: &name,
        target: &watch.spec.target,
        alert: &watch.spec.alert,
        scanning_interval: watch.spec.scanning_interval,
        prior_status: &prior,
        api_endpoint: &ctx.api_endpoint,
        metrics: ctx.metrics.as_ref(),
    };

    match reconcile::reconcile_cert_watch(ctx.store.as_ref(), inputs, Utc::now()).await {
        Outcome::Done { requeue_after } => Ok(Action::requeue(requeue_after)),
        Outcome::Error { error } => {
            ctx.metrics.reconcile_errors.fetch_add(1, Ordering::Relaxed);
            error!(namespace, name, "cert watch reconcile failed: {error}");
            Err(error)
        }
    }
}

fn error_policy_cert(_watch: Arc<CertWatch>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(err.backoff())
}

async fn reconcile_keystore(watch: Arc<KeystoreWatch>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let namespace = watch.metadata.namespace.clone().unwrap_or_default();
    let name = watch.metadata.name.clone().unwrap_or_default();
    let prior = watch.status.clone().unwrap_or_default();
    let span = reconcile_span(&namespace, &name, log_level(watch.spec.log_level));
    let _enter = span.enter();

    let inputs = KeystoreWatchInputs {
        namespace: &namespace,
        name: &name,
        target: &watch.spec.target.target,
        keystore_password: &watch.spec.target.keystore_password,
        alert: &watch.spec.alert,
        scanning_interval: watch.spec.scanning_interval,
        prior_status: &prior,
        api_endpoint: &ctx.api_endpoint,
        metrics: ctx.metrics.as_ref(),
    };

    match reconcile::reconcile_keystore_watch(ctx.store.as_ref(), inputs, Utc::now()).await {
        Outcome::Done { requeue_after } => Ok(Action::requeue(requeue_after)),
        Outcome::Error { error } => {
            ctx.metrics.reconcile_errors.fetch_add(1, Ordering::Relaxed);
            error!(namespace, name, "keystore watch reconcile failed: {error}");
            Err(error)
        }
    }
}

fn error_policy_keystore(_watch: Arc<KeystoreWatch>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(err.backoff())
}

/// Runs both watch loops until either exits. Each CRD kind gets its own
/// `Controller` instance; both share `ctx`. `concurrency` caps how many
/// reconciles of each kind run at once, independently of each other.
pub async fn run(client: Client, ctx: Arc<Context>, concurrency: usize) {
    let cert_api: Api<CertWatch> = Api::all(client.clone());
    let keystore_api: Api<KeystoreWatch> = Api::all(client.clone());

    let cert_ctx = ctx.clone();
    let cert_loop = Controller::new(cert_api, Default::default())
        .run(reconcile_cert, error_policy_cert, cert_ctx)
        .for_each_concurrent(concurrency, |res| async move {
            if let Err(e) = res {
                error!("cert watch controller stream error: {e}");
            }
        });

    let keystore_ctx = ctx.clone();
    let keystore_loop = Controller::new(keystore_api, Default::default())
        .run(reconcile_keystore, error_policy_keystore, keystore_ctx)
        .for_each_concurrent(concurrency, |res| async move {
            if let Err(e) = res {
                error!("keystore watch controller stream error: {e}");
            }
        });

    info!(concurrency, "controller started");
    tokio::join!(cert_loop, keystore_loop);
}
