use core_config::{ConfigError, FromEnv, env_parse_or};
use strum::{Display, EnumString};

/// Where a variant SKU must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkuScope {
    /// Across the whole catalog
    #[default]
    Global,
    /// Within one product
    PerProduct,
}

/// Catalog behaviour knobs
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub sku_scope: SkuScope,
}

impl FromEnv for CatalogConfig {
    /// Reads `CATALOG_SKU_SCOPE` (`global` or `per_product`, default `global`)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            sku_scope: env_parse_or("CATALOG_SKU_SCOPE", SkuScope::default())?,
        })
    }
}
