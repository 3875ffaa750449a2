// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Return the gateway data directory (`$XDG_DATA_HOME/spoolwerk` or
/// `~/.local/share/spoolwerk`), creating it if needed.
pub fn data_dir() -> PathBuf {
    ensure_dir(data_dir_from(|key| std::env::var(key).ok()))
}

/// Create `dir` if missing.  Failure is logged; the path is returned either
/// way and later file access reports the real error.
fn ensure_dir(dir: PathBuf) -> PathBuf {
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), error = %e, "could not create data directory");
    }
    dir
}

fn data_dir_from<F: Fn(&str) -> Option<String>>(lookup: F) -> PathBuf {
    let base = if let Some(xdg) = lookup("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        PathBuf::from(xdg)
    } else if let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) {
        PathBuf::from(home).join(".local").join("share")
    } else {
        // Last resort
        PathBuf::from("/tmp")
    };
    base.join("spoolwerk")
}

/// The config file to load when none is given explicitly: `config.json` in
/// `dir`, if it exists.
pub fn default_config_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    path.is_file().then_some(path)
}
