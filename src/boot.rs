use log::{error, info, warn};
use std::fs;
use std::path::Path;

use crate::config::{Config, CONFIG_FILE};

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing database directories and warns about anything that
/// will push the resolver down to a fallback binding. Returns the number
/// of warnings.
pub fn run(config: &Config) -> u32 {
    info!("Boot check starting...");

    let mut warnings = 0u32;

    // ── 1. Config file ─────────────────────────────────
    if !Path::new(CONFIG_FILE).exists() {
        warn!("  {} not found, using default config", CONFIG_FILE);
        warnings += 1;
    }

    // ── 2. Database directories ────────────────────────
    for db_path in config.sqlite_paths() {
        let Some(dir) = Path::new(db_path).parent().filter(|d| !d.as_os_str().is_empty()) else {
            continue;
        };
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    warnings += 1;
                    continue;
                }
            }
        }
        let test_file = dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                warn!("  Database directory {} not writable: {}", dir.display(), e);
                warnings += 1;
            }
        }
    }

    // ── 3. Admin API ───────────────────────────────────
    if config.admin.api_token.as_deref().map_or(true, str::is_empty) {
        warn!("  No admin API token configured; admin routes will refuse every request");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
    warnings
}
