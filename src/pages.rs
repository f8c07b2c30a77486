//! Interior page discovery
//!
//! Pages are PNG files named `fbnp_<N>.png`. They are ordered by their
//! number, so `fbnp_2.png` comes before `fbnp_10.png`.

use image::{DynamicImage, ImageError};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BuildError, Result};

/// File name prefix of interior pages
pub const PAGE_PREFIX: &str = "fbnp_";

/// File name suffix of interior pages
pub const PAGE_SUFFIX: &str = ".png";

/// One scanned interior page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteriorPage {
    pub path: PathBuf,
    /// Number parsed from the file name
    pub number: u64,
}

impl InteriorPage {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Page number if `name` matches `fbnp_<digits>.png`
pub fn page_number(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(PAGE_PREFIX)?.strip_suffix(PAGE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Natural ordering: digit runs compare numerically, everything else bytewise
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let run_a = trim_zeros(&a[start_a..i]);
            let run_b = trim_zeros(&b[start_b..j]);
            let ord = run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_zeros(run: &[u8]) -> &[u8] {
    let first = run.iter().position(|&d| d != b'0').unwrap_or(run.len());
    &run[first..]
}

/// Sort file names naturally
pub fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}

/// Find interior pages in `dir`, ordered by page number
///
/// Fails with a configuration error when none are found.
pub fn scan_pages(dir: &Path) -> Result<Vec<InteriorPage>> {
    if !dir.is_dir() {
        return Err(BuildError::config(format!(
            "page directory not found: {}",
            dir.display()
        )));
    }

    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(number) = page_number(&name) {
            pages.push(InteriorPage { path, number });
        }
    }

    if pages.is_empty() {
        return Err(BuildError::config(format!(
            "no {}*{} found in {}",
            PAGE_PREFIX,
            PAGE_SUFFIX,
            dir.display()
        )));
    }

    pages.sort_by(|a, b| {
        a.number
            .cmp(&b.number)
            .then_with(|| natural_cmp(&a.file_name(), &b.file_name()))
    });
    debug!(count = pages.len(), dir = %dir.display(), "scanned interior pages");
    Ok(pages)
}

/// Decode a page image; undecodable content is a [`BuildError::Decode`]
pub fn load_page_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => BuildError::Io(io),
        other => BuildError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
