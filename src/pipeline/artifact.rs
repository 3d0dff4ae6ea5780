//! Per-row card images written next to the PDF.
//!
//! File names derive from the `Name` cell. Names are free text, so they are
//! reduced to a safe stem first, and a run never overwrites its own output:
//! the second "Asha Verma" becomes `Asha Verma-2.png`.

use crate::error::RowError;
use image::RgbImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Longest stem kept, in characters.
pub const MAX_STEM_CHARS: usize = 100;
/// Stem used when nothing usable is left after sanitising.
pub const FALLBACK_STEM: &str = "card";

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ._-]").unwrap());

/// Reduce a free-text name to something safe as a file stem on every platform.
///
/// Characters outside `[A-Za-z0-9 ._-]` become `_`, leading dots and spaces
/// are dropped, trailing spaces too, and the result is capped at
/// [`MAX_STEM_CHARS`].
pub fn sanitize_file_stem(name: &str) -> String {
    let replaced = RE_UNSAFE.replace_all(name, "_");
    let trimmed = replaced.trim_start_matches(['.', ' ']);
    let capped: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let capped = capped.trim_end_matches(' ');
    if capped.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        capped.to_string()
    }
}

/// Hands out unique image paths inside one directory for the length of a run.
#[derive(Debug)]
pub struct CardImageWriter {
    dir: PathBuf,
    /// Last suffix handed out per lowercased stem.
    seen: HashMap<String, usize>,
    /// Lowercased file names already issued.
    issued: HashSet<String>,
}

impl CardImageWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            seen: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Next free `<dir>/<stem>.png` for `name`.
    pub fn next_path(&mut self, name: &str) -> PathBuf {
        let stem = sanitize_file_stem(name);
        let key = stem.to_ascii_lowercase();
        let count = self.seen.entry(key).or_insert(0);
        loop {
            *count += 1;
            let file = if *count == 1 {
                format!("{stem}.png")
            } else {
                format!("{stem}-{count}.png")
            };
            if self.issued.insert(file.to_ascii_lowercase()) {
                return self.dir.join(file);
            }
        }
    }

    /// Save `card` as PNG under a unique name derived from `name`.
    pub fn write(&mut self, row: usize, name: &str, card: &RgbImage) -> Result<PathBuf, RowError> {
        let path = self.next_path(name);
        card.save(&path).map_err(|e| RowError::ImageWriteFailed {
            row,
            path: path.clone(),
            detail: e.to_string(),
        })?;
        debug!("Wrote card image {}", path.display());
        Ok(path)
    }
}
