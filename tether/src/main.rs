#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use secrecy::ExposeSecret;
use tether_auth::PkceFlow;
use tether_config::{ClientConfig, Config};
use tether_rest::{JSON_CONTENT_TYPE, RequestTemplate, RestClient};
use tether_retry::RetryPolicy;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    let telemetry = config.telemetry.clone().unwrap_or_default();
    let _telemetry_guard = tether_telemetry::init(&telemetry, config.environment, args.log_filter.as_deref())?;

    let span = tracing::info_span!(
        "tether",
        service = %telemetry.service_name,
        environment = %config.environment,
    );

    // Ctrl-C aborts any pending backoff
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        cancel_clone.cancel();
    });

    run(args, config, cancel).instrument(span).await
}

async fn run(args: Args, config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let policy = RetryPolicy::new(config.retry.max_retries, config.retry.base_delay());
    let client_config = config.client.as_ref().context("configuration has no [client] section")?;

    tracing::info!(
        config_path = %args.config.display(),
        base_url = %client_config.base_url,
        max_retries = policy.max_retries,
        "starting tether"
    );

    match args.command {
        Command::Token => {
            let pkce = client_config
                .auth
                .pkce
                .clone()
                .context("configuration has no [client.auth.pkce] section")?;

            let token = PkceFlow::new(pkce)?.authenticate(policy, &cancel).await?;
            println!("{}", token.expose_secret());
        }
        Command::Request {
            endpoint,
            args,
            method,
            body,
        } => {
            let mut template = RequestTemplate::new(method, endpoint).args(args);
            if let Some(body) = body {
                let body: serde_json::Value = serde_json::from_str(&body).context("request body is not valid JSON")?;
                template = template.json(&body)?;
            }

            let client = connect(client_config, policy, &cancel).await?;
            let response: serde_json::Value = client.request_with_retry(&template, policy, &cancel).await?;

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Download { endpoint, args, dest } => {
            let template = RequestTemplate::get(endpoint).args(args);

            let client = connect(client_config, policy, &cancel).await?;
            let files = client.download_with_retry(&template, &dest, policy, &cancel).await?;

            tracing::info!(count = files.len(), dest = %dest.display(), "download complete");
            for file in files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}

async fn connect(config: &ClientConfig, policy: RetryPolicy, cancel: &CancellationToken) -> anyhow::Result<RestClient> {
    Ok(RestClient::connect(config, JSON_CONTENT_TYPE, policy, cancel).await?)
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received, cancelling retries");
}
