use crate::matcher::{coerce_integer, VariantGroupEntry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub popup: PopupConfig,
    #[serde(default)]
    pub quick_order: QuickOrderConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

/// One `skuList` row as the host supplies it. Values stay untyped until
/// `PopupConfig::entries` coerces them, so a malformed row can be skipped
/// instead of rejecting the whole block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuEntry {
    #[serde(rename = "skuID", default)]
    pub sku_id: Value,
    #[serde(rename = "collectionID", default)]
    pub collection_id: Value,
}

/// Promotional popup block props. Field names follow the host schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupConfig {
    #[serde(rename = "skuList", default)]
    pub sku_list: Vec<SkuEntry>,
    #[serde(rename = "textPopUp", default)]
    pub text_pop_up: String,
    /// Seconds before the popup appears.
    #[serde(rename = "timePopUp", default = "PopupConfig::default_time")]
    pub time_pop_up: f64,
    #[serde(rename = "activePopUp", default)]
    pub active_pop_up: bool,
}

impl PopupConfig {
    fn default_time() -> f64 { 2.0 }

    /// Coerced (variant, group) pairs in configured order. Rows whose ids are
    /// not integers are dropped.
    pub fn entries(&self) -> Vec<VariantGroupEntry> {
        self.sku_list
            .iter()
            .filter_map(|row| {
                match (coerce_integer(&row.sku_id), coerce_integer(&row.collection_id)) {
                    (Some(variant_id), Some(group_id)) => Some(VariantGroupEntry { variant_id, group_id }),
                    _ => {
                        warn!(sku = %row.sku_id, collection = %row.collection_id, "skipping malformed skuList entry");
                        None
                    }
                }
            })
            .collect()
    }

    /// Delay before showing the popup. Negative or NaN values clamp to zero;
    /// values too large for a `Duration` saturate to `Duration::MAX`.
    pub fn delay(&self) -> Duration {
        if self.time_pop_up.is_nan() || self.time_pop_up <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.time_pop_up).unwrap_or(Duration::MAX)
    }

    pub fn message(&self) -> &str {
        &self.text_pop_up
    }

    pub fn enabled(&self) -> bool {
        self.active_pop_up
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            sku_list: Vec::new(),
            text_pop_up: String::new(),
            time_pop_up: 2.0,
            active_pop_up: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickOrderConfig {
    #[serde(default = "QuickOrderConfig::default_sales_channel")]
    pub sales_channel: String,
    #[serde(default = "QuickOrderConfig::default_seller")]
    pub seller: String,
    #[serde(default = "QuickOrderConfig::default_checkout_path")]
    pub checkout_path: String,
    #[serde(default)]
    pub labels: OrderLabels,
}

impl QuickOrderConfig {
    fn default_sales_channel() -> String { "1".into() }
    fn default_seller() -> String { "1".into() }
    fn default_checkout_path() -> String { "/checkout".into() }
}

impl Default for QuickOrderConfig {
    fn default() -> Self {
        Self {
            sales_channel: "1".into(),
            seller: "1".into(),
            checkout_path: "/checkout".into(),
            labels: OrderLabels::default(),
        }
    }
}

/// User-facing texts of the quick order form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderLabels {
    pub title: String,
    pub description: String,
    pub placeholder: String,
    pub submit: String,
    pub loading: String,
    pub no_code: String,
    pub not_found: String,
    pub cart_failed: String,
}

impl Default for OrderLabels {
    fn default() -> Self {
        Self {
            title: "Order in one click".into(),
            description: "Enter the product code and check out right away.".into(),
            placeholder: "Enter the code".into(),
            submit: "submit".into(),
            loading: "loading".into(),
            no_code: "no code entered".into(),
            not_found: "code not found".into(),
            cart_failed: "could not add the product to the cart".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "BackendConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    fn default_endpoint() -> String { "http://127.0.0.1:8080/graphql".into() }
    fn default_timeout() -> u64 { 30 }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("storewidgets")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }
}
