use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Human-readable output is suppressed when `BLOGDB_QUIET` is set
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("BLOGDB_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
