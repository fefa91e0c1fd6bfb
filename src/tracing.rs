use time::format_description;
use tracing_subscriber::{fmt, EnvFilter, FmtSubscriber};

pub const TRACE_ENV_VAR: &str = "TRACE";

// Sets up tracing. Goes to stderr, filtered by the TRACE env var.
// Levels are: trace, debug, info, warn, error
//
// All targets, info level:                   info
// Classification and cost basis at debug:    vmw_tax::lots=debug
// Global at warn, reference data at trace:   warn,vmw_tax::refdata=trace
//
// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn setup_tracing() {
    let time_format =
        format_description::parse("[hour]:[minute]:[second].[subsecond digits:5]")
            .expect("Time format description is invalid");

    let time_offset = crate::util::date::local_utc_offset()
        .unwrap_or(time::UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(time_offset, time_format);

    // Off by default, unless TRACE is set.
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_env(TRACE_ENV_VAR))
        .with_timer(timer)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Adds a directive to the TRACE env var (eg. for --verbose).
/// Must be called before setup_tracing.
pub fn enable_trace_env(directive: &str) {
    if let Ok(existing_env) = std::env::var(TRACE_ENV_VAR) {
        std::env::set_var(TRACE_ENV_VAR, existing_env + "," + directive);
    } else {
        std::env::set_var(TRACE_ENV_VAR, directive);
    }
}
