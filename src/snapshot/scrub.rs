//! Table option scrubbing
//!
//! Scripted table DDL carries a long tail of storage options (fill factor,
//! locking, sort-in-tempdb, ...) whose emitted value is always the server
//! default and carries no signal for a snapshot. Leaving them in would make
//! snapshots fail on unrelated server or version differences, so they are
//! removed by plain substring rewriting after the Tables section is built.

use once_cell::sync::Lazy;

/// Index/table option settings that the engine scripts at their defaults.
const DEFAULT_OPTION_SETTINGS: [&str; 9] = [
    "PAD_INDEX = OFF",
    "STATISTICS_NORECOMPUTE = OFF",
    "SORT_IN_TEMPDB = OFF",
    "DROP_EXISTING = OFF",
    "ONLINE = OFF",
    "ALLOW_ROW_LOCKS = ON",
    "IGNORE_DUP_KEY = OFF",
    "ALLOW_PAGE_LOCKS = ON",
    "OPTIMIZE_FOR_SEQUENTIAL_KEY = OFF",
];

/// (noisy substring, replacement) pairs, built once for the process.
///
/// Each default setting contributes three variants: leading a list,
/// the sole item of a list, and a non-leading item.
static SCRUB_RULES: Lazy<Vec<(String, &'static str)>> = Lazy::new(|| {
    let mut rules = Vec::with_capacity(DEFAULT_OPTION_SETTINGS.len() * 3);
    for setting in DEFAULT_OPTION_SETTINGS {
        rules.push((format!("({setting}, "), "("));
        rules.push((format!("({setting})"), "()"));
        rules.push((format!(", {setting}"), ""));
    }
    rules
});

/// Rewrite the buffer, removing every default option setting.
///
/// Applied once, right after the Tables section is appended. The final
/// rewrite collapses the residual empty options clause a fully-scrubbed
/// `WITH (...)` list leaves behind; it is a table-only fixup and
/// deliberately not generalized to other kinds.
pub fn scrub_table_settings(buffer: &mut String) {
    for (noisy, replacement) in SCRUB_RULES.iter() {
        if buffer.contains(noisy.as_str()) {
            *buffer = buffer.replace(noisy.as_str(), replacement);
        }
    }

    if buffer.contains(")WITH () ") {
        *buffer = buffer.replace(")WITH () ", ") ");
    }
}
