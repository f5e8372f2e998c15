// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in stage transforms.
//!
//! These cover the common ends of a pipeline (copy, fill, channel extract,
//! affine warp) and double as reference implementations of the [`Stage`]
//! contract. Every transform here is pure over its bound buffers; the one
//! exception is [`AffineWarp`], which carries an internally guarded matrix so
//! callers can steer it between dispatches.
//!
//! [`Stage`]: crate::traits::Stage

pub mod affine_warp;
pub mod basic;
pub mod channel_extract;
pub mod stub;

pub use affine_warp::AffineWarp;
pub use basic::{ConstantFill, IdentityCopy, MeanBlend};
pub use channel_extract::{ChannelExtract, ColorChannel};
pub use stub::FailOnValue;
