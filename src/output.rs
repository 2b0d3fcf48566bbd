use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `EXPORTGRAPH_QUIET=1` keeps machine-readable output free of banners
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("EXPORTGRAPH_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
