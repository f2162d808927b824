use std::path::Path;

use serde::Deserialize;

use crate::error::{LabelError, Result};

pub const DEFAULT_FADE_DURATION: f64 = 800.0;
pub const DEFAULT_DEDUP_MARGIN: f64 = 48.0;
pub const DEFAULT_LABEL_PADDING: f64 = 1.0;
pub const DEFAULT_ICON_TEXT_GAP: f64 = 2.0;

/// Tunables for the placement orchestrator
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Length of a full fade transition, in the caller's time units
    pub fade_duration: f64,
    /// Snap every transition to its end state
    pub disable_fading: bool,
    /// When false the occupancy tracker never reports a collision
    pub collision_enabled: bool,
    pub dedup_enabled: bool,
    /// Screen distance within which equal texts count as duplicates
    pub dedup_margin: f64,
    /// Inflation applied to every collision box
    pub label_padding: f64,
    /// Horizontal gap between a POI icon and its text
    pub icon_text_gap: f64,
    /// Skip occlusion and keep previous decisions while the camera moves
    pub skip_occlusion_while_moving: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            fade_duration: DEFAULT_FADE_DURATION,
            disable_fading: false,
            collision_enabled: true,
            dedup_enabled: true,
            dedup_margin: DEFAULT_DEDUP_MARGIN,
            label_padding: DEFAULT_LABEL_PADDING,
            icon_text_gap: DEFAULT_ICON_TEXT_GAP,
            skip_occlusion_while_moving: false,
        }
    }
}

impl PlacementConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `MAP_LABELS_*` environment overrides on top of this config
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(duration) = env_f64("MAP_LABELS_FADE_DURATION") {
            self.fade_duration = duration;
        }
        if let Some(disable) = env_flag("MAP_LABELS_DISABLE_FADING") {
            self.disable_fading = disable;
        }
        if let Some(margin) = env_f64("MAP_LABELS_DEDUP_MARGIN") {
            self.dedup_margin = margin;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        check_non_negative("fade_duration", self.fade_duration)?;
        check_non_negative("dedup_margin", self.dedup_margin)?;
        check_non_negative("label_padding", self.label_padding)?;
        check_non_negative("icon_text_gap", self.icon_text_gap)?;
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LabelError::InvalidConfig {
            field,
            reason: format!("must be a finite non-negative number, got {value}"),
        });
    }
    Ok(())
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        let normalized = value.trim().to_ascii_lowercase();
        matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
    })
}
