// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, ChannelChoice, EngineConfig, FrameConfig,
    PipelineConfig, SchedulingMode,
};
pub use validation::{validate_engine_config, ConfigIssue};
