// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph verification events.

use std::fmt::{Display, Formatter};
use tracing::Span;

use crate::observability::messages::StructuredLog;

/// Graph verification succeeded and the graph is frozen.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphVerified {
    pub stage_count: usize,
    pub param_count: usize,
}

impl Display for GraphVerified {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph verified: {} stages, {} promoted parameters",
            self.stage_count, self.param_count
        )
    }
}

impl StructuredLog for GraphVerified {
    fn log(&self) {
        tracing::info!(
            stage_count = self.stage_count,
            param_count = self.param_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "verification",
            span_name = name,
            stage_count = self.stage_count,
            param_count = self.param_count,
        )
    }
}

/// Graph verification found structural problems.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed {
    pub issue_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph validation failed with {} issue(s)", self.issue_count)
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(issue_count = self.issue_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("verification", span_name = name, issue_count = self.issue_count)
    }
}
