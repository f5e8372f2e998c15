// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{DEFAULT_FRAME_COUNT, DEFAULT_QUEUE_DEPTH};
use crate::engine::PipelineOptions;
use crate::stages::ColorChannel;

/// Main configuration structure for a frame pipeline run.
///
/// This struct captures everything a driver needs to build and execute an
/// extract-and-warp pipeline: the scheduling mode, the frame shape, and the
/// pipelined-session tuning. It is typically loaded from a YAML file.
///
/// # Example
/// ```yaml
/// mode: pipelined
/// frame:
///   width: 640
///   height: 480
/// channel: green
/// rotation_degrees: 45.0
/// frames: 100
/// pipeline:
///   queue_depth: 4
///   dequeue_timeout_ms: 1000
/// ```
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    pub mode: SchedulingMode,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub channel: ChannelChoice,
    #[serde(default)]
    pub rotation_degrees: f32,
    #[serde(default = "default_frames")]
    pub frames: usize,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_frames() -> usize {
    DEFAULT_FRAME_COUNT
}

/// How the graph is scheduled.
///
/// # Variants
/// * `SingleShot` - One blocking execution per frame, no overlap
/// * `Pipelined` - Queue-mediated continuous execution with refill overlap
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    SingleShot,
    Pipelined,
}

/// Shape of the frames fed into the pipeline.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Which RGB plane the extract stage keeps.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelChoice {
    Red,
    #[default]
    Green,
    Blue,
}

impl From<ChannelChoice> for ColorChannel {
    fn from(choice: ChannelChoice) -> Self {
        match choice {
            ChannelChoice::Red => ColorChannel::Red,
            ChannelChoice::Green => ColorChannel::Green,
            ChannelChoice::Blue => ColorChannel::Blue,
        }
    }
}

/// Pipelined-session tuning. All fields optional with built-in defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PipelineConfig {
    pub queue_depth: Option<usize>,
    pub dequeue_timeout_ms: Option<u64>,
}

impl PipelineConfig {
    /// Get the queue depth, using the built-in default if not configured.
    pub fn get_queue_depth(&self) -> usize {
        self.queue_depth.unwrap_or(DEFAULT_QUEUE_DEPTH)
    }

    /// Convert into executor options.
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            queue_depth: self.get_queue_depth(),
            dequeue_timeout: self.dequeue_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let cfg: EngineConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a config from a YAML file
///
/// This function loads the configuration and checks every bound (frame
/// shape, queue depth, frame count), reporting all violations at once.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let cfg = load_config(path)?;

    if let Err(issues) = crate::config::validate_engine_config(&cfg) {
        let messages: Vec<String> = issues.iter().map(|e| e.to_string()).collect();
        let combined = format!("Configuration validation failed:\n{}", messages.join("\n"));
        return Err(combined.into());
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
mode: pipelined
frame:
  width: 320
  height: 240
channel: blue
pipeline:
  queue_depth: 4
"#;

        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.mode, SchedulingMode::Pipelined);
        assert_eq!(cfg.frame.width, 320);
        assert_eq!(cfg.channel, ChannelChoice::Blue);
        assert_eq!(cfg.pipeline.get_queue_depth(), 4);
        assert_eq!(cfg.frames, DEFAULT_FRAME_COUNT);
    }

    #[test]
    fn defaults_fill_every_optional_section() {
        let cfg: EngineConfig = serde_yaml::from_str("mode: single_shot").unwrap();
        assert_eq!(cfg.mode, SchedulingMode::SingleShot);
        assert_eq!(cfg.frame.width, 640);
        assert_eq!(cfg.frame.height, 480);
        assert_eq!(cfg.channel, ChannelChoice::Green);
        assert_eq!(cfg.rotation_degrees, 0.0);
        assert_eq!(cfg.pipeline.get_queue_depth(), DEFAULT_QUEUE_DEPTH);
        assert!(cfg.pipeline.dequeue_timeout_ms.is_none());
    }

    #[test]
    fn pipeline_config_converts_to_options() {
        let cfg = PipelineConfig {
            queue_depth: Some(8),
            dequeue_timeout_ms: Some(250),
        };
        let options = cfg.options();
        assert_eq!(options.queue_depth, 8);
        assert_eq!(options.dequeue_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn load_and_validate_valid_config() {
        let yaml = r#"
mode: pipelined
frame:
  width: 64
  height: 64
frames: 10
"#;
        let temp_dir = tempfile::tempdir().unwrap();
        let temp_file = temp_dir.path().join("pipeline.yaml");
        std::fs::write(&temp_file, yaml).unwrap();

        let result = load_and_validate_config(&temp_file);
        assert!(result.is_ok());
    }

    #[test]
    fn load_and_validate_rejects_bad_bounds() {
        let yaml = r#"
mode: pipelined
frame:
  width: 0
  height: 64
frames: 0
pipeline:
  queue_depth: 1000
"#;
        let temp_dir = tempfile::tempdir().unwrap();
        let temp_file = temp_dir.path().join("bad.yaml");
        std::fs::write(&temp_file, yaml).unwrap();

        let err = load_and_validate_config(&temp_file).unwrap_err().to_string();
        // All three violations are reported together.
        assert!(err.contains("width"));
        assert!(err.contains("queue depth"));
        assert!(err.contains("frame count"));
    }
}
