//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `parcel_core` linkage.
//! - Optionally open a tracker database and report its schema state.
//!
//! Usage: `parcel_cli [DB_PATH]`. Logging is enabled when
//! `PARCEL_TRACKER_LOG_DIR` is set; `PARCEL_TRACKER_LOG_LEVEL` overrides the
//! build default.

use log::info;
use parcel_core::db::open_db;
use parcel_core::db::schema::user_version;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "PARCEL_TRACKER_LOG_DIR";
const LOG_LEVEL_ENV: &str = "PARCEL_TRACKER_LOG_LEVEL";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level = std::env::var(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| parcel_core::default_log_level().to_string());
        if let Err(err) = parcel_core::init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("parcel_core ping={}", parcel_core::ping());
    println!("parcel_core version={}", parcel_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match open_db(&db_path).and_then(|conn| user_version(&conn)) {
        Ok(version) => {
            info!("event=cli_probe module=cli status=ok schema_version={version}");
            println!("parcel_core db={db_path} schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            ExitCode::FAILURE
        }
    }
}
