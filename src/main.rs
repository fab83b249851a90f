use form_relay::{config, mailer::SmtpMailer, service::RelayService, upload::StagingDir};

use tracing_subscriber::EnvFilter;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let cfg = config::load_config().expect("failed to locate or load config file");
    tracing::info!("Successfully loaded form relay config");

    // Staging directory for resume uploads
    let staging = StagingDir::create(&cfg.upload_dir).await.unwrap_or_else(|e| {
        tracing::error!(
            "Failed to create upload directory {}: {e}",
            cfg.upload_dir.display()
        );
        panic!("failed to create upload directory: {e}");
    });

    // Mail transport, shared by every request
    let mailer = SmtpMailer::new(&cfg).unwrap_or_else(|e| {
        tracing::error!("Failed to set up SMTP transport: {e}");
        panic!("failed to set up SMTP transport: {e}");
    });
    tracing::info!(
        "SMTP transport configured for {}:{} (implicit TLS: {})",
        cfg.email_host,
        cfg.email_port,
        cfg.email_secure
    );

    // Setup service
    let service = RelayService::new(
        Arc::new(mailer),
        staging,
        cfg.admin_email.clone(),
        cfg.brand_name.clone(),
    );

    let router = form_relay::router(Arc::new(service), cfg.max_upload_bytes);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Failed to read bound address");

    tracing::info!("Form relay starting, listening on {}", addr);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
