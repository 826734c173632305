//! Logger setup for binaries and tests embedding stratagem

use log::LevelFilter;

/// Install an env_logger honouring `RUST_LOG`, `info` otherwise.
/// Safe to call more than once; later calls are no-ops.
pub fn init()
{   init_with_default(LevelFilter::Info)
}

/// Same as [`init`] with a caller chosen fallback level
pub fn init_with_default(level: LevelFilter)
{   let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG")
    {   builder.parse_filters(&filters);
    }
    let _ = builder.format_timestamp_millis().try_init();
}
