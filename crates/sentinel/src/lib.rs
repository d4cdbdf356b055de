//! Certificate-expiry watch operator library.
//!
//! Module layout mirrors the teacher's split between pure data/transform
//! modules and the cluster-facing trait seam (`store`): everything that
//! needs cluster access goes through `store::ObjectStore`, which is what
//! lets `reconcile` be exercised with `store::fake::FakeObjectStore` in
//! tests instead of a live API server.

pub mod classify;
pub mod config;
pub mod controller;
pub mod decode;
pub mod dedup;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod keystore_password;
pub mod reconcile;
pub mod report;
pub mod scope;
pub mod session;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod threshold;
pub mod types;
