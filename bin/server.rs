// Event Registration - Web Server
// Serves the registration form over HTTP with Axum

use anyhow::{Context, Result};
use etkinlik_kayit::web::{router, AppState};
use etkinlik_kayit::{logging, Config, Registrar, VERSION};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stdout()?;

    println!("🌐 Event Kayıt v{VERSION} - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load(&Config::default_path())?;
    let store = config.open_store()?;
    println!("✓ Store: {}", config.store_description());

    let registrar = Registrar::new(store, config.confirmation_field.clone());
    info!(store = registrar.store_name(), "registrations will be written to {}", config.store_description());
    let app = router(AppState::new(registrar, config.session_idle()));

    let address = config.listen_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {address}"))?;

    println!("\n🚀 Server running on http://{address}");
    println!("   Form:   http://{address}/");
    println!("   Health: http://{address}/api/health");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
