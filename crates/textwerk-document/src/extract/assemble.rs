// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler.

use std::fmt::Write;

use textwerk_core::TextUnit;

/// Concatenate unit bodies in ordinal order.
///
/// Labelled units are prefixed with `\n\n--- <Kind> <N> ---\n\n`; unlabelled
/// units contribute their body alone. The banner layout is part of the
/// output contract and must not change.
pub fn assemble(units: &[TextUnit]) -> String {
    let mut ordered: Vec<&TextUnit> = units.iter().collect();
    ordered.sort_by_key(|unit| unit.ordinal);

    let capacity = ordered.iter().map(|unit| unit.body.len() + 24).sum();
    let mut text = String::with_capacity(capacity);
    for unit in ordered {
        if let Some(kind) = unit.kind {
            // Writing into a String cannot fail.
            let _ = write!(text, "\n\n--- {} {} ---\n\n", kind.label(), unit.ordinal);
        }
        text.push_str(&unit.body);
    }
    text
}
