//! Global config handle.
//!
//! Uses `arc-swap` so the HTTP worker threads read the config lock-free.

use crate::config::LifeConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<LifeConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(LifeConfig::default()));

#[inline]
pub fn cfg() -> Arc<LifeConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: LifeConfig) -> Arc<LifeConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cfg_defaults_before_init() {
        // Untouched by any other test, so it still holds the default
        assert_eq!(CONFIG.load().transport.max_attempts, 3);
    }
}
