//! Application configuration management.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Procurement policy settings.
    #[serde(default)]
    pub procurement: ProcurementConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
///
/// Tokens are issued by an external identity provider; this service only
/// verifies them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared secret used to verify token signatures.
    pub secret: String,
    /// Allowed clock skew in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 {
    30
}

/// Ship-to address stamped onto purchase orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipToConfig {
    /// Recipient name used when the requester has none on file.
    pub name: String,
    /// Company or department.
    pub company: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip: String,
}

impl Default for ShipToConfig {
    fn default() -> Self {
        Self {
            name: "Procurement Team".to_string(),
            company: "Company".to_string(),
            street: "123 Main Street".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip: "94105".to_string(),
        }
    }
}

/// Procurement policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcurementConfig {
    /// Approval due-date window.
    #[serde(default = "default_approval_sla_hours")]
    pub approval_sla_hours: i64,
    /// Number of vendors solicited per RFQ batch.
    #[serde(default = "default_rfq_batch_size")]
    pub rfq_batch_size: u64,
    /// Delay before the simulated vendor counter-offer becomes due.
    #[serde(default = "default_counter_offer_delay_secs")]
    pub counter_offer_delay_secs: i64,
    /// Validity window of a quote.
    #[serde(default = "default_quote_validity_days")]
    pub quote_validity_days: i64,
    /// Delivery lead time written into generated contracts.
    #[serde(default = "default_contract_delivery_days")]
    pub contract_delivery_days: i64,
    /// Payment terms for generated contracts and purchase orders.
    #[serde(default = "default_payment_terms")]
    pub default_payment_terms: String,
    /// Warranty written into generated contracts.
    #[serde(default = "default_warranty")]
    pub default_warranty: String,
    /// Invoice variance (percent) above which the match is a mismatch.
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance_percent: Decimal,
    /// Attempts made to allocate a document number before giving up.
    #[serde(default = "default_max_number_attempts")]
    pub max_number_attempts: u32,
    /// Ship-to snapshot used on purchase orders.
    #[serde(default)]
    pub ship_to: ShipToConfig,
}

fn default_approval_sla_hours() -> i64 {
    48
}

fn default_rfq_batch_size() -> u64 {
    4
}

fn default_counter_offer_delay_secs() -> i64 {
    3
}

fn default_quote_validity_days() -> i64 {
    14
}

fn default_contract_delivery_days() -> i64 {
    14
}

fn default_payment_terms() -> String {
    "Net 30".to_string()
}

fn default_warranty() -> String {
    "5 years".to_string()
}

fn default_match_tolerance() -> Decimal {
    Decimal::from(5)
}

fn default_max_number_attempts() -> u32 {
    5
}

impl Default for ProcurementConfig {
    fn default() -> Self {
        Self {
            approval_sla_hours: default_approval_sla_hours(),
            rfq_batch_size: default_rfq_batch_size(),
            counter_offer_delay_secs: default_counter_offer_delay_secs(),
            quote_validity_days: default_quote_validity_days(),
            contract_delivery_days: default_contract_delivery_days(),
            default_payment_terms: default_payment_terms(),
            default_warranty: default_warranty(),
            match_tolerance_percent: default_match_tolerance(),
            max_number_attempts: default_max_number_attempts(),
            ship_to: ShipToConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PROCURA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_procurement_defaults() {
        let cfg = ProcurementConfig::default();
        assert_eq!(cfg.approval_sla_hours, 48);
        assert_eq!(cfg.rfq_batch_size, 4);
        assert_eq!(cfg.quote_validity_days, 14);
        assert_eq!(cfg.default_payment_terms, "Net 30");
        assert_eq!(cfg.match_tolerance_percent, dec!(5));
        assert_eq!(cfg.ship_to.zip, "94105");
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("PROCURA__SERVER__PORT", Some("9090")),
                ("PROCURA__DATABASE__URL", Some("sqlite::memory:")),
                ("PROCURA__JWT__SECRET", Some("secret")),
                ("RUN_MODE", Some("unit-test-missing")),
            ],
            || {
                let cfg = AppConfig::load().unwrap();
                assert_eq!(cfg.server.port, 9090);
                assert_eq!(cfg.server.host, "0.0.0.0");
                assert_eq!(cfg.database.url, "sqlite::memory:");
                assert_eq!(cfg.database.max_connections, 10);
                assert_eq!(cfg.jwt.leeway_secs, 30);
                assert_eq!(cfg.procurement.approval_sla_hours, 48);
            },
        );
    }
}
