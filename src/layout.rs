// this_file: src/layout.rs

//! Conventional locations inside the project tree.

use camino::{Utf8Path, Utf8PathBuf};
use glyphrules_extract::ExtractOptions;
use glyphrules_ttf::MirrorFetcher;

/// Paths derived from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: Utf8PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Vendored Nerd Fonts checkout; also the default origin font mirror.
    pub fn nerd_fonts_dir(&self) -> Utf8PathBuf {
        self.root.join("vendor").join("nerd-fonts")
    }

    pub fn patcher_source(&self) -> Utf8PathBuf {
        self.nerd_fonts_dir().join("font-patcher.py")
    }

    pub fn output(&self) -> Utf8PathBuf {
        self.root.join("src").join("font").join("nerd_font_attributes.zig")
    }

    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.root.join(".cache").join("glyphrules")
    }

    pub fn crosswalk_cache(&self) -> Utf8PathBuf {
        self.cache_dir().join("crosswalk.json")
    }

    pub fn font_cache(&self) -> Utf8PathBuf {
        self.cache_dir().join("fonts")
    }
}

/// Per-run settings on top of the layout.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Destination font the constraints are compiled for
    pub font: Utf8PathBuf,
    /// Overrides [`ProjectLayout::output`]
    pub output: Option<Utf8PathBuf>,
    /// Overrides [`ProjectLayout::nerd_fonts_dir`] as the origin font mirror
    pub mirror: Option<Utf8PathBuf>,
    /// Overrides [`glyphrules_ttf::DEFAULT_TEMPLATE`] for locating origin fonts in the mirror
    pub mirror_template: Option<String>,
    /// Read and write the crosswalk and origin font caches
    pub use_cache: bool,
    pub extract: ExtractOptions,
}

impl CodegenOptions {
    pub fn new(font: impl Into<Utf8PathBuf>) -> Self {
        Self {
            font: font.into(),
            output: None,
            mirror: None,
            mirror_template: None,
            use_cache: true,
            extract: ExtractOptions::default(),
        }
    }

    pub fn output_path(&self, layout: &ProjectLayout) -> Utf8PathBuf {
        self.output.clone().unwrap_or_else(|| layout.output())
    }

    pub fn mirror_root(&self, layout: &ProjectLayout) -> Utf8PathBuf {
        self.mirror.clone().unwrap_or_else(|| layout.nerd_fonts_dir())
    }

    pub fn fetcher(&self, layout: &ProjectLayout) -> MirrorFetcher {
        let fetcher = MirrorFetcher::new(self.mirror_root(layout));
        match &self.mirror_template {
            Some(template) => fetcher.with_template(template.as_str()),
            None => fetcher,
        }
    }
}
