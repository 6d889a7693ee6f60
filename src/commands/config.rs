use crate::commands::overlay::OverlayState;
use crate::config::OverlayConfig;
use crate::errors::{BridgeError, OverlayError};
use std::sync::{Arc, RwLock};
use tauri::{command, State};

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<OverlayConfig>> = Arc::new(RwLock::new(OverlayConfig::load_or_default()));
}

/// Snapshot of the active configuration
pub fn current_config() -> OverlayConfig {
    GLOBAL_CONFIG
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Validate and install `new_config` as the active configuration
pub fn store_config(new_config: OverlayConfig) -> Result<OverlayConfig, OverlayError> {
    new_config.validate().map_err(OverlayError::Config)?;
    let mut config = GLOBAL_CONFIG
        .write()
        .map_err(|e| OverlayError::Config(format!("Failed to write config: {}", e)))?;
    *config = new_config.clone();
    Ok(new_config)
}

async fn persist_and_apply(
    state: &OverlayState,
    config: OverlayConfig,
) -> Result<OverlayConfig, BridgeError> {
    let config = store_config(config)?;
    config.save_to_file(OverlayConfig::default_path())?;
    state.dispatcher.apply_config(config.clone()).await?;
    Ok(config)
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<OverlayConfig, BridgeError> {
    Ok(current_config())
}

/// Update configuration
#[command]
pub async fn update_config(
    state: State<'_, OverlayState>,
    new_config: OverlayConfig,
) -> Result<(), BridgeError> {
    persist_and_apply(&state, new_config).await?;
    Ok(())
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config(state: State<'_, OverlayState>) -> Result<OverlayConfig, BridgeError> {
    persist_and_apply(&state, OverlayConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_config() {
        let config = get_config().await.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_rejects_invalid_config() {
        let mut bad = OverlayConfig::default();
        bad.camera.zoom_steps = 1;
        let err = store_config(bad).unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));
        assert!(current_config().camera.zoom_steps >= 2);
    }
}
