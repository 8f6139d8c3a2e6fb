use trainer::config::Config;
use trainer::server;
use trainer::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let shared = AppState::open(&cfg)?.into_shared();

    tokio::select! {
        res = server::listener::run(&cfg, shared.clone()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shared.lock().await.persist()?;
        }
    }

    Ok(())
}
