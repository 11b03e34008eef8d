use std::error::Error;

use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Maps the number of `-v` flags to the crate log level.
fn level(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbosity: usize) -> Result<(), Box<dyn Error>> {
    let level = level(verbosity);

    // Only our own records pass, hyper and tokio stay silent.
    SimpleLogger::new()
        .with_level(LevelFilter::Off)
        .with_module_level("stampede", level)
        .with_utc_timestamps()
        .init()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LevelFilter::Info, level(0));
        assert_eq!(LevelFilter::Debug, level(1));
        assert_eq!(LevelFilter::Trace, level(2));
        assert_eq!(LevelFilter::Trace, level(7));
    }
}
