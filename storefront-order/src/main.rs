use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_order::{OrderService, OrderServiceImpl};
use storefront_store::{app_config::Config, DbClient, PgOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_order=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;

    let db = DbClient::new(&config.database)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;

    let repo = Arc::new(PgOrderRepository::new(db.pool.clone()));
    let service = OrderService::new(repo, config.business_rules.missing_price);

    let addr: SocketAddr = config
        .orders
        .listen
        .parse()
        .with_context(|| format!("invalid orders.listen address '{}'", config.orders.listen))?;
    tracing::info!(
        "Order service listening on {} (missing prices: {:?})",
        addr,
        service.policy()
    );

    tonic::transport::Server::builder()
        .add_service(OrderServiceImpl::new(Arc::new(service)).into_server())
        .serve(addr)
        .await?;

    Ok(())
}
