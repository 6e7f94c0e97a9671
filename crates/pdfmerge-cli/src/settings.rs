// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings file persistence (pretty JSON).

use std::path::Path;

use anyhow::Context;
use pdfmerge_core::MergeSettings;
use tracing::{debug, info};

/// Read settings from `path`; a missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<MergeSettings> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(MergeSettings::default());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read settings file {}", path.display()))?;
    let settings = serde_json::from_str(&data)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

pub fn save(path: &Path, settings: &MergeSettings) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)
        .with_context(|| format!("cannot write settings file {}", path.display()))?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}
