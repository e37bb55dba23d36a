//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `signup_core` linkage and print the environment-resolved setup.
//! - Open the configured desk once and report what was loaded.
//!
//! Usage: `signup_cli [absolute_log_dir]`. Logging starts only when a log
//! directory is given, at `SIGNUP_LOG_LEVEL` or the build default.

use signup_core::config::{resolve_db_path, ENV_LOG_LEVEL};
use signup_core::db::open_db;
use signup_core::{default_log_level, init_logging, DeskConfig, SignupDesk, SqliteKvStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("signup_core ping={}", signup_core::ping());
    println!("signup_core version={}", signup_core::core_version());

    if let Some(log_dir) = std::env::args().nth(1) {
        let level =
            std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db_path = resolve_db_path();
    println!("signup_core db_path={}", db_path.display());

    let config = DeskConfig::from_env();
    println!(
        "signup_core gate_configured={}",
        config.gate.reference_secret().is_some()
    );

    let store = match open_db(&db_path)
        .map_err(|err| err.to_string())
        .and_then(|conn| SqliteKvStore::try_new(conn).map_err(|err| err.to_string()))
    {
        Ok(store) => store,
        Err(err) => {
            eprintln!("desk open failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let desk = SignupDesk::open(store, config);
    let report = desk.startup_report();
    println!(
        "signup_core accounts={} notifications={} reset={:?}",
        report.accounts_loaded, report.notifications_loaded, report.reset_collections
    );
    ExitCode::SUCCESS
}
