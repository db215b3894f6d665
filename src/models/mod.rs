// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod message;
pub mod user;

pub use message::MessageRecord;
pub use user::{UserProfile, UserRecord};
