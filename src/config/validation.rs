// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounds checking for loaded configurations.
//!
//! Validation accumulates every violation rather than stopping at the first,
//! so a misconfigured file is fixable in one edit instead of a back-and-forth.

use thiserror::Error;

use crate::config::consts::{MAX_IMAGE_DIM, MAX_QUEUE_DEPTH};
use crate::config::loader::EngineConfig;

/// One bound violation in an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("frame width must be between 1 and {MAX_IMAGE_DIM}, got {0}")]
    BadWidth(u32),
    #[error("frame height must be between 1 and {MAX_IMAGE_DIM}, got {0}")]
    BadHeight(u32),
    #[error("queue depth must be between 1 and {MAX_QUEUE_DEPTH}, got {0}")]
    BadQueueDepth(usize),
    #[error("frame count must be at least 1, got {0}")]
    BadFrameCount(usize),
}

/// Checks every bound in the configuration, reporting all violations.
pub fn validate_engine_config(cfg: &EngineConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if cfg.frame.width == 0 || cfg.frame.width > MAX_IMAGE_DIM {
        issues.push(ConfigIssue::BadWidth(cfg.frame.width));
    }
    if cfg.frame.height == 0 || cfg.frame.height > MAX_IMAGE_DIM {
        issues.push(ConfigIssue::BadHeight(cfg.frame.height));
    }
    let depth = cfg.pipeline.get_queue_depth();
    if depth == 0 || depth > MAX_QUEUE_DEPTH {
        issues.push(ConfigIssue::BadQueueDepth(depth));
    }
    if cfg.frames == 0 {
        issues.push(ConfigIssue::BadFrameCount(cfg.frames));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{FrameConfig, PipelineConfig, SchedulingMode};

    fn base() -> EngineConfig {
        EngineConfig {
            mode: SchedulingMode::Pipelined,
            frame: FrameConfig { width: 64, height: 64 },
            channel: Default::default(),
            rotation_degrees: 0.0,
            frames: 4,
            pipeline: PipelineConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_engine_config(&base()).is_ok());
    }

    #[test]
    fn all_violations_are_collected() {
        let mut cfg = base();
        cfg.frame.width = 0;
        cfg.frame.height = MAX_IMAGE_DIM + 1;
        cfg.frames = 0;
        cfg.pipeline.queue_depth = Some(MAX_QUEUE_DEPTH + 1);

        let issues = validate_engine_config(&cfg).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ConfigIssue::BadWidth(0)));
        assert!(issues.contains(&ConfigIssue::BadFrameCount(0)));
    }
}
