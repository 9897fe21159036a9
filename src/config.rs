use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::LayoutMode;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub scheduler: SchedulerConfig,
    pub camera: CameraConfig,
    pub layout: LayoutConfig,
}

/// Cadence of the three scheduling tiers (active, throttled, stopped).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Quiet time after the last activity before the loop may stop entirely.
    pub deep_idle_after_ms: f64,
    /// Period of the throttled re-check timer.
    pub idle_poll_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deep_idle_after_ms: 3_000.0,
            idle_poll_ms: 250.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub initial_zoom: f32,
    pub edge_padding: f32,
    pub pan_threshold_px: f32,
    pub wheel_sensitivity: f32,
    pub max_wheel_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom_min: 0.05,
            zoom_max: 6.0,
            initial_zoom: 1.0,
            edge_padding: 48.0,
            pan_threshold_px: 4.0,
            wheel_sensitivity: 0.0018,
            max_wheel_step: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub relayout_debounce_ms: f64,
    pub force_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Force,
            relayout_debounce_ms: 120.0,
            force_iterations: 220,
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Every comparison below is false for NaN, so non-finite values
        // are turned away first.
        let camera = &self.camera;
        let numbers = [
            ("scheduler.deep_idle_after_ms", self.scheduler.deep_idle_after_ms),
            ("scheduler.idle_poll_ms", self.scheduler.idle_poll_ms),
            ("camera.zoom_min", f64::from(camera.zoom_min)),
            ("camera.zoom_max", f64::from(camera.zoom_max)),
            ("camera.initial_zoom", f64::from(camera.initial_zoom)),
            ("camera.edge_padding", f64::from(camera.edge_padding)),
            ("camera.pan_threshold_px", f64::from(camera.pan_threshold_px)),
            ("camera.wheel_sensitivity", f64::from(camera.wheel_sensitivity)),
            ("camera.max_wheel_step", f64::from(camera.max_wheel_step)),
            ("layout.relayout_debounce_ms", self.layout.relayout_debounce_ms),
        ];
        if let Some(&(field, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::NotFinite { field });
        }

        let scheduler = &self.scheduler;
        if scheduler.idle_poll_ms <= 0.0 {
            return Err(ConfigError::non_positive(
                "scheduler.idle_poll_ms",
                scheduler.idle_poll_ms,
            ));
        }
        if scheduler.deep_idle_after_ms < 0.0 {
            return Err(ConfigError::negative(
                "scheduler.deep_idle_after_ms",
                scheduler.deep_idle_after_ms,
            ));
        }

        if camera.zoom_min <= 0.0 || camera.zoom_max <= 0.0 {
            return Err(ConfigError::NonPositiveZoom {
                min: camera.zoom_min,
                max: camera.zoom_max,
            });
        }
        if camera.zoom_min > camera.zoom_max {
            return Err(ConfigError::InvertedZoom {
                min: camera.zoom_min,
                max: camera.zoom_max,
            });
        }
        if !(camera.zoom_min..=camera.zoom_max).contains(&camera.initial_zoom) {
            return Err(ConfigError::InitialZoomOutOfBounds(camera.initial_zoom));
        }
        if camera.edge_padding < 0.0 {
            return Err(ConfigError::negative(
                "camera.edge_padding",
                camera.edge_padding,
            ));
        }
        if camera.pan_threshold_px < 0.0 {
            return Err(ConfigError::negative(
                "camera.pan_threshold_px",
                camera.pan_threshold_px,
            ));
        }
        if camera.max_wheel_step < 1.0 {
            return Err(ConfigError::BelowOne {
                field: "camera.max_wheel_step",
                value: camera.max_wheel_step,
            });
        }

        if self.layout.relayout_debounce_ms < 0.0 {
            return Err(ConfigError::negative(
                "layout.relayout_debounce_ms",
                self.layout.relayout_debounce_ms,
            ));
        }

        Ok(())
    }
}

pub fn parse_config(raw: &str) -> Result<ViewConfig> {
    let config: ViewConfig = serde_json::from_str(raw).context("invalid view config JSON")?;
    config.validate().context("view config rejected")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<ViewConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to load config from {}", path.display()))
}
