use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_api::{
    app,
    gateway::{GrpcOrderGateway, LocalOrderGateway, OrderGateway},
    AppState, AuthConfig,
};
use storefront_catalog::ReviewService;
use storefront_order::OrderService;
use storefront_store::{app_config::Config, DbClient, PgOrderRepository, PgReviewRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting Storefront API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;

    let reviews = ReviewService::new(Arc::new(PgReviewRepository::new(db.pool.clone())));

    let orders: Arc<dyn OrderGateway> = match &config.orders.endpoint {
        Some(endpoint) => {
            tracing::info!("Pricing orders via order service at {}", endpoint);
            Arc::new(
                GrpcOrderGateway::connect_lazy(endpoint)
                    .with_context(|| format!("invalid orders.endpoint '{}'", endpoint))?,
            )
        }
        None => {
            tracing::info!("Pricing orders in-process");
            let service = OrderService::new(
                Arc::new(PgOrderRepository::new(db.pool.clone())),
                config.business_rules.missing_price,
            );
            Arc::new(LocalOrderGateway::new(Arc::new(service)))
        }
    };

    let app_state = AppState {
        reviews: Arc::new(reviews),
        orders,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
