use contest_results::{
    config::{get_config, init_config},
    database::{pool::create_pool, postgres::PgStore},
    BackfillOptions, BackfillService,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_format.as_deref() == Some("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight records");
                cancel.cancel();
            }
        });
    }

    let service = BackfillService::new(Arc::new(PgStore::new(pool)), BackfillOptions::from(config));
    let summary = service.run(cancel).await?;

    info!(processed = summary.processed(), "Backfill complete");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
