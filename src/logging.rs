use std::str::FromStr;

use log::LevelFilter;

/// Parse a `--log-level` value; accepts the `log` level names in any case.
pub fn parse_level(value: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(value.trim()).map_err(|_| {
        format!("invalid log level '{value}'. Supported: off, error, warn, info, debug, trace")
    })
}

/// Route `log` records to stderr. Can only be called once per process.
pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert!(parse_level("loud").is_err());
    }
}
