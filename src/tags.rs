//! Tag filtering for bulk sync.
//!
//! Decides whether a note takes part in a bulk sync, given its resolved tag
//! set and the configured include / exclude lists. Comparison is on
//! normalized tags (see [`normalize_tag`]); callers normalize before asking.

/// Normalize a tag for comparison: trim, strip one leading `#`, lowercase.
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    tag.strip_prefix('#').unwrap_or(tag).to_lowercase()
}

/// Normalize a configured tag list, dropping entries that end up empty.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether a note with `note_tags` should be synced.
///
/// Evaluated in order:
/// 1. no tags while an include filter exists → excluded
/// 2. any tag in `exclude` → excluded (exclusion beats inclusion)
/// 3. no include filter → included
/// 4. otherwise included iff any tag is in `include`
#[must_use]
pub fn should_sync<N, I, E>(note_tags: &[N], include: &[I], exclude: &[E]) -> bool
where
    N: AsRef<str>,
    I: AsRef<str>,
    E: AsRef<str>,
{
    if note_tags.is_empty() && !include.is_empty() {
        return false;
    }

    if note_tags
        .iter()
        .any(|tag| exclude.iter().any(|e| e.as_ref() == tag.as_ref()))
    {
        return false;
    }

    if include.is_empty() {
        return true;
    }

    note_tags
        .iter()
        .any(|tag| include.iter().any(|i| i.as_ref() == tag.as_ref()))
}
