// Social Graph bootstrap - opens the store, applies the schema and optionally seeds it

use social_graph::{app_state::AppState, config::Config, data_seeder::seed_sample_data};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting with {:?} store", config.store.backend);

    let app_state = AppState::new(config.clone()).await?;

    if config.seed_sample_data {
        let summary = seed_sample_data(&app_state).await?;
        info!(
            "Seeded {} users, {} friendships, {} posts, {} likes",
            summary.users, summary.friendships, summary.posts, summary.likes
        );
    }

    info!("Graph store ready");
    Ok(())
}
