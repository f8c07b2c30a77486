//! Font resolution
//!
//! Fonts are found through an ordered chain of [`FontProvider`]s. The first
//! provider that yields a parseable font wins; a chain that runs dry is a
//! [`BuildError::Resource`]. New fallback tiers are added by pushing another
//! provider, without touching the composers.

use ab_glyph::FontVec;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BuildError, Result};

/// A source of one font
pub trait FontProvider {
    /// Human-readable origin, used in logs and errors
    fn describe(&self) -> String;

    /// Load the font, or `None` if this tier is unavailable
    fn load(&self) -> Option<FontVec>;
}

/// Font read from a TTF/OTF file on disk
#[derive(Debug, Clone)]
pub struct FileFont {
    path: PathBuf,
}

impl FileFont {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FontProvider for FileFont {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Option<FontVec> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "font candidate unavailable");
                return None;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "font candidate unparseable");
                None
            }
        }
    }
}

/// Font held in memory
#[derive(Debug, Clone)]
pub struct BytesFont {
    name: String,
    bytes: Vec<u8>,
}

impl BytesFont {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl FontProvider for BytesFont {
    fn describe(&self) -> String {
        format!("<memory:{}>", self.name)
    }

    fn load(&self) -> Option<FontVec> {
        FontVec::try_from_vec(self.bytes.clone()).ok()
    }
}

/// A resolved font and where it came from
pub struct LoadedFont {
    pub font: FontVec,
    pub source: String,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Ordered fallback list of font providers
#[derive(Default)]
pub struct FontChain {
    providers: Vec<Box<dyn FontProvider>>,
}

impl FontChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of file candidates, tried in order
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut chain = Self::new();
        for path in paths {
            chain.push(FileFont::new(path.as_ref()));
        }
        chain
    }

    /// Append a fallback tier
    pub fn push(&mut self, provider: impl FontProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    /// Append every tier of another chain after this one
    #[must_use]
    pub fn then(mut self, other: FontChain) -> Self {
        self.providers.extend(other.providers);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Candidate descriptions in order
    pub fn candidates(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.describe()).collect()
    }

    /// First font any tier can provide
    pub fn resolve(&self, role: &str) -> Result<LoadedFont> {
        for provider in &self.providers {
            if let Some(font) = provider.load() {
                let source = provider.describe();
                debug!(role, %source, "resolved font");
                return Ok(LoadedFont { font, source });
            }
        }
        Err(BuildError::Resource(format!(
            "no {} font found (tried: {}). Add a TTF under ./fonts or install DejaVuSans.",
            role,
            self.candidates().join(", ")
        )))
    }
}
