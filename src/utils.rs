use anyhow::Result;
use ethers::{types::U256, utils::format_units};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

use crate::constants::{NATIVE_DECIMALS, PROJECT_NAME};

/// Coloured, timestamped logs. `level` applies to this crate, dependencies log
/// warnings only.
pub fn setup_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig {
        trace: Color::Cyan,
        debug: Color::Magenta,
        info: Color::Green,
        warn: Color::Yellow,
        error: Color::BrightRed,
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stdout())
        .level(LevelFilter::Warn)
        .level_for(PROJECT_NAME, level)
        .level_for("airdrop", level)
        .apply()?;

    Ok(())
}

/// Base units to a human decimal string, falling back to the raw integer.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    format_units(amount, u32::from(decimals)).unwrap_or_else(|_| amount.to_string())
}

pub fn format_native(amount: U256) -> String {
    format_amount(amount, NATIVE_DECIMALS)
}
