//! Logging setup for the terminal front-end

use log::LevelFilter;

/// Initialize the logger for terminal use.
///
/// `default_level` applies unless RUST_LOG says otherwise. Lines start with a
/// carriage return so they stay readable while the terminal is in raw mode.
pub fn init_logger(default_level: LevelFilter) -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "\r[{} {:5} {}] {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .try_init()?;
    Ok(())
}

/// Map a `-v` count to a level filter, starting from warnings
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
