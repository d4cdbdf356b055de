//! `cert-sentinel`: the certificate-expiry watch operator binary.
//!
//! Grounded on the `agentgateway-app` CLI/bootstrap idiom: a `clap`-derived
//! flag set layered over environment variables, resolved once, then handed
//! immutably to the admin server and the controller loops.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use kube::Client;
use sentinel::config::{Config, LogFormat};
use sentinel::controller::{self, Context};
use sentinel::store::kube_store::KubeObjectStore;
use sentinel::telemetry::{self, Metrics};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cert-sentinel", about = "Watches cluster secrets/configmaps for expiring certificates")]
struct Args {
    #[arg(long, env = "SENTINEL_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    #[arg(long, env = "SENTINEL_METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: SocketAddr,

    #[arg(long, env = "SENTINEL_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            concurrency: args.concurrency,
            default_error_backoff_secs: sentinel::reconcile::DEFAULT_ERROR_BACKOFF.as_secs(),
            metrics_addr: args.metrics_addr,
            log_format: args.log_format,
            kubeconfig: args.kubeconfig,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config: Config = args.into();

    telemetry::init_tracing(config.log_format);

    let kube_config = match &config.kubeconfig {
        Some(path) => {
            let yaml = kube::config::Kubeconfig::read_from(path)?;
            kube::Config::from_custom_kubeconfig(yaml, &Default::default()).await?
        }
        None => kube::Config::infer().await?,
    };
    let api_endpoint = kube_config.cluster_url.to_string();
    let client = Client::try_from(kube_config)?;

    let metrics = Arc::new(Metrics::default());
    let admin_addr = config.metrics_addr;
    let admin_metrics = metrics.clone();
    let admin_config = config.clone();
    tokio::spawn(async move {
        if let Err(e) = telemetry::serve_admin(admin_addr, admin_metrics, admin_config).await {
            tracing::error!("admin server failed: {e}");
        }
    });

    let store = Arc::new(KubeObjectStore::new(client.clone()));
    let ctx = Arc::new(Context {
        store,
        api_endpoint,
        metrics,
    });

    info!(concurrency = config.concurrency, addr = %admin_addr, "starting cert-sentinel");
    controller::run(client, ctx, config.concurrency).await;
    Ok(())
}
