use serde::Deserialize;
use std::env;
use storefront_core::MissingPricePolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub orders: OrdersConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BusinessRules {
    /// What to do with an order line whose product has no price
    #[serde(default)]
    pub missing_price: MissingPricePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    /// Address the order gRPC server binds to
    pub listen: String,
    /// Remote order service used by the HTTP API. Orders are priced
    /// in-process when unset.
    pub endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `STOREFRONT_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("STOREFRONT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const BASE: &str = r#"
        [server]
        port = 3000

        [database]
        url = "postgres://localhost/storefront"

        [auth]
        jwt_secret = "secret"

        [orders]
        listen = "0.0.0.0:50051"
    "#;

    #[test]
    fn test_defaults() {
        let config = parse(BASE);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.orders.endpoint, None);
        assert_eq!(config.business_rules.missing_price, MissingPricePolicy::Reject);
    }

    #[test]
    fn test_missing_price_policy_override() {
        let config = parse(&format!(
            "{}\n[business_rules]\nmissing_price = \"price_at_zero\"\n",
            BASE
        ));
        assert_eq!(config.business_rules.missing_price, MissingPricePolicy::PriceAtZero);
    }
}
