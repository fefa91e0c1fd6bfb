pub fn env_var_non_empty(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => !v.is_empty(),
        Err(_) => false,
    }
}

/// Flushes both standard streams and exits with a failure status.
/// Used by binaries after errors have already been reported.
pub fn exit_with_failure() -> ! {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    std::process::exit(1);
}
