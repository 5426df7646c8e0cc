// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — preprocessing of raster units before recognition.

pub mod preprocess;

pub use preprocess::Preprocessor;
