//! Name normalization
//!
//! Live names are frequently decorated by administrators (`📢┃announcements`,
//! `━ INFORMATION ━`, `War Log`). Matching compares normalized forms: letters
//! and digits lowercased, every run of anything else collapsed to a single
//! `-`, leading and trailing separators dropped.

/// Normalize a display name for matching
///
/// # Example
///
/// ```
/// use clanforge_graph::normalize_name;
///
/// assert_eq!(normalize_name("📢┃Announcements"), "announcements");
/// assert_eq!(normalize_name("War Log"), "war-log");
/// assert_eq!(normalize_name("━ INFORMATION ━"), "information");
/// ```
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            let lowered: String = ch.to_lowercase().filter(|c| c.is_alphanumeric()).collect();
            if lowered.is_empty() {
                continue;
            }
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push_str(&lowered);
        } else if ch == '\'' || ch == '\u{2019}' {
            // apostrophes join words ("leader's" -> "leaders")
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Whether `live` names the same thing as `desired` or one of its aliases
#[must_use]
pub fn names_match(live: &str, desired: &str, aliases: &[String]) -> bool {
    let live = normalize_name(live);
    if live.is_empty() {
        return false;
    }
    live == normalize_name(desired) || aliases.iter().any(|a| normalize_name(a) == live)
}
