//! blockpilot TUI entry point.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting blockpilot TUI...");

    let mut app = blockpilot_tui::App::new()?;

    match app.run().await {
        Ok(_) => {
            tracing::info!("TUI exited gracefully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("TUI error: {}", e);
            Err(e)
        }
    }
}
