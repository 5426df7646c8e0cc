// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Textwerk — Core types, configuration and error definitions shared across all crates.

pub mod cancel;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use cancel::CancelToken;
pub use config::{EngineKind, ExtractConfig};
pub use error::TextwerkError;
pub use types::*;
