/// Concurrency used when `max_concurrency` is unset and the CPU count cannot be detected
pub const DEFAULT_MAX_CONCURRENCY_FALLBACK: usize = 4;
/// Log filter used by the binary when `RUST_LOG` is unset
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";
