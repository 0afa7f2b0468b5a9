//! Markdown vault access.
//!
//! Read-only view of notes on disk, plus the single write this tool ever
//! performs: recording a generated identity in a note's frontmatter.
//!
//! - [`Note`] - raw text, parsed frontmatter, inline tags
//! - [`scan_vault`] / [`load_vault`] - discover `.md` files under a root
//! - [`write_identity`] - add the identity property to a note on disk

pub mod frontmatter;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::tags::normalize_tag;

pub use frontmatter::{insert_property, parse_frontmatter, split_frontmatter, Frontmatter};

/// Inline `#tag` occurrences: preceded by start or whitespace.
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_/\-]+)").expect("inline tag pattern is valid")
});

/// A markdown note loaded from disk (or built in memory).
#[derive(Debug, Clone)]
pub struct Note {
    /// Location of the note.
    pub path: PathBuf,
    /// Display name (file stem).
    pub name: String,
    /// Raw file content, frontmatter included.
    pub content: String,
    /// Parsed frontmatter.
    pub frontmatter: Frontmatter,
    /// Inline `#tags` found in the body, as written (without `#`).
    pub inline_tags: Vec<String>,
}

impl Note {
    /// Load a note from disk.
    ///
    /// # Errors
    ///
    /// Returns `NoteNotFound` if the file does not exist, or an IO / YAML
    /// error if it cannot be read or its frontmatter is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NoteNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_content(path, content)
    }

    /// Build a note from in-memory content.
    ///
    /// # Errors
    ///
    /// Returns an error if the frontmatter is malformed YAML.
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let content = content.into();
        let frontmatter = parse_frontmatter(&content)?;
        let inline_tags = extract_inline_tags(split_frontmatter(&content).1);
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            path,
            name,
            content,
            frontmatter,
            inline_tags,
        })
    }

    /// The note's identity value under `property`, if it has a usable one.
    ///
    /// Strings are used verbatim (blank counts as missing); numbers and
    /// booleans are stringified. Null, lists and maps count as missing.
    #[must_use]
    pub fn identity(&self, property: &str) -> Option<String> {
        match self.frontmatter.get(property)? {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Tags declared in frontmatter (`tags` or `tag`), original casing kept.
    ///
    /// Accepts a list or a comma / whitespace separated string. A leading
    /// `#` is dropped since Anki tags do not carry it.
    #[must_use]
    pub fn frontmatter_tags(&self) -> Vec<String> {
        let Some(value) = self.frontmatter.get("tags").or_else(|| self.frontmatter.get("tag"))
        else {
            return Vec::new();
        };

        let raw: Vec<String> = match value {
            JsonValue::String(s) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(str::to_string)
                .collect(),
            JsonValue::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        raw.iter()
            .map(|t| t.trim())
            .map(|t| t.strip_prefix('#').unwrap_or(t))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolved tag set: inline and frontmatter tags, normalized, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.inline_tags
            .iter()
            .cloned()
            .chain(self.frontmatter_tags())
            .map(|t| normalize_tag(&t))
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Find inline tags in a note body, skipping fenced code blocks.
///
/// Purely numeric tokens (`#123`) are not tags.
#[must_use]
pub fn extract_inline_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in INLINE_TAG.captures_iter(line) {
            let tag = cap[1].trim_end_matches('/');
            if !tag.is_empty() && !tag.chars().all(|c| c.is_ascii_digit()) && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}

/// List markdown files under `root`, sorted, skipping hidden entries.
///
/// Symlinks are not followed, and symlinked files are not listed, so every
/// note appears exactly once. Subdirectories that cannot be read are logged
/// and skipped.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or cannot be read.
pub fn scan_vault(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Vault path is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::Io(e.into())),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable vault entry");
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("md")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Result of loading every note in a vault.
#[derive(Debug, Default)]
pub struct VaultScan {
    /// Notes that loaded cleanly.
    pub notes: Vec<Note>,
    /// Files that could not be read or parsed, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Load every note under `root`.
///
/// A file that fails to load is recorded in [`VaultScan::unreadable`]
/// instead of aborting the scan.
///
/// # Errors
///
/// Returns an error only if the vault directory itself cannot be listed.
pub fn load_vault(root: &Path) -> Result<VaultScan> {
    let mut scan = VaultScan::default();
    for path in scan_vault(root)? {
        match Note::load(&path) {
            Ok(note) => scan.notes.push(note),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable note");
                scan.unreadable.push((path, e.to_string()));
            }
        }
    }
    debug!(count = scan.notes.len(), root = %root.display(), "Loaded vault");
    Ok(scan)
}

/// Write `value` under `property` into the note's frontmatter on disk.
///
/// Returns the reloaded note.
///
/// # Errors
///
/// Returns an error if the note already has an identity under `property`,
/// or if the file cannot be rewritten.
pub fn write_identity(note: &Note, property: &str, value: &str) -> Result<Note> {
    if note.frontmatter.contains_key(property) {
        return Err(Error::InvalidArgument(format!(
            "Note '{}' already has a '{property}' property",
            note.name
        )));
    }
    let updated = insert_property(&note.content, property, value)?;
    fs::write(&note.path, &updated)?;
    Note::from_content(note.path.clone(), updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn note(content: &str) -> Note {
        Note::from_content("vault/Paper X.md", content).unwrap()
    }

    #[test]
    fn test_name_from_file_stem() {
        assert_eq!(note("").name, "Paper X");
    }

    #[test]
    fn test_identity_variants() {
        let n = note("---\nguid: abc\nyear: 2021\nblank: '  '\nlist: [a]\nempty:\n---\n");
        assert_eq!(n.identity("guid"), Some("abc".to_string()));
        assert_eq!(n.identity("year"), Some("2021".to_string()));
        assert_eq!(n.identity("blank"), None);
        assert_eq!(n.identity("list"), None);
        assert_eq!(n.identity("empty"), None);
        assert_eq!(n.identity("missing"), None);
    }

    #[test]
    fn test_frontmatter_tags_keep_original_form() {
        let n = note("---\ntags: [Paper, '#ML/Deep']\n---\n");
        assert_eq!(n.frontmatter_tags(), vec!["Paper", "ML/Deep"]);

        let n = note("---\ntags: reading, Queue todo\n---\n");
        assert_eq!(n.frontmatter_tags(), vec!["reading", "Queue", "todo"]);
    }

    #[test]
    fn test_inline_tags_skip_headings_and_code() {
        let body = "# Title\n## Sub\nSome #Idea and #idea/sub.\n```\n#notatag\n```\nIssue #42 #2021a\n";
        assert_eq!(extract_inline_tags(body), vec!["Idea", "idea/sub", "2021a"]);
    }

    #[test]
    fn test_resolved_tags_are_normalized_union() {
        let n = note("---\ntags: [Paper]\n---\nBody #paper #Review\n");
        assert_eq!(n.tags(), vec!["paper", "review"]);
    }

    #[test]
    fn test_frontmatter_is_not_scanned_for_inline_tags() {
        let n = note("---\ntitle: 'C# #language'\n---\nbody\n");
        assert!(n.inline_tags.is_empty());
    }

    #[test]
    fn test_scan_vault_skips_hidden_and_non_markdown() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("papers")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("b.md"), "b").unwrap();
        fs::write(root.join("papers/a.md"), "a").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "x").unwrap();
        fs::write(root.join("image.png"), "x").unwrap();

        let files = scan_vault(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.md", "papers/a.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_vault_lists_each_note_once_despite_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("papers")).unwrap();
        fs::write(root.join("papers/a.md"), "a").unwrap();
        symlink(root.join("papers"), root.join("alias")).unwrap();
        symlink(root, root.join("papers/loop")).unwrap();
        symlink(root.join("papers/a.md"), root.join("link.md")).unwrap();

        let files = scan_vault(root).unwrap();
        assert_eq!(files, vec![root.join("papers/a.md")]);
    }

    #[test]
    fn test_scan_vault_accepts_hidden_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".vault");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();

        assert_eq!(scan_vault(&root).unwrap(), vec![root.join("a.md")]);
    }

    #[test]
    fn test_load_vault_records_unreadable_notes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.md"), "---\nguid: 1\n---\n").unwrap();
        fs::write(dir.path().join("bad.md"), "---\nguid: [oops\n---\n").unwrap();

        let scan = load_vault(dir.path()).unwrap();
        assert_eq!(scan.notes.len(), 1);
        assert_eq!(scan.unreadable.len(), 1);
        assert!(scan.unreadable[0].0.ends_with("bad.md"));
    }

    #[test]
    fn test_load_missing_note() {
        let err = Note::load(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { .. }));
    }

    #[test]
    fn test_write_identity_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("n.md");
        fs::write(&path, "---\ntitle: T\n---\nBody\n").unwrap();

        let loaded = Note::load(&path).unwrap();
        let updated = write_identity(&loaded, "anki-guid", "id-1").unwrap();
        assert_eq!(updated.identity("anki-guid"), Some("id-1".to_string()));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "---\ntitle: T\nanki-guid: id-1\n---\nBody\n"
        );

        assert!(write_identity(&updated, "anki-guid", "id-2").is_err());
    }
}
