// this_file: backends/glyphrules-ttf/src/fetch.rs

//! Origin font retrieval: a version-scoped local cache in front of a fetcher.

use crate::face::LoadedFont;
use crate::loader::{validate_font_size, FontLoader};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use glyphrules_core::utils::write_atomic;
use glyphrules_core::{Error, FontAccess, FontFetcher, OriginFonts, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Location of origin fonts inside a Nerd Fonts checkout.
pub const DEFAULT_TEMPLATE: &str = "src/glyphs/{filename}";

/// Reject origin filenames that could escape the directory they are joined to.
pub fn sanitize_filename(filename: &str) -> Option<&Utf8Path> {
    let path = Utf8Path::new(filename);
    let escapes = filename.is_empty()
        || filename.contains('~')
        || path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, Utf8Component::Normal(_)));
    (!escapes).then_some(path)
}

fn checked_filename<'a>(version: &str, filename: &'a str) -> Result<&'a Utf8Path> {
    sanitize_filename(filename).ok_or_else(|| {
        Error::fetch(
            filename,
            version,
            "origin font filename must be a plain relative path",
        )
    })
}

/// Reads origin fonts from a local mirror of the patcher repository.
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    root: Utf8PathBuf,
    template: String,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Location template with `{version}` and `{filename}` placeholders.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn location(&self, version: &str, filename: &str) -> Result<Utf8PathBuf> {
        let filename = checked_filename(version, filename)?;
        let relative = self
            .template
            .replace("{version}", version)
            .replace("{filename}", filename.as_str());
        Ok(self.root.join(relative))
    }
}

impl FontFetcher for MirrorFetcher {
    fn fetch(&self, version: &str, filename: &str) -> Result<Vec<u8>> {
        let location = self.location(version, filename)?;
        let meta = std::fs::metadata(location.as_std_path())
            .map_err(|e| Error::fetch(filename, version, format!("{location}: {e}")))?;
        validate_font_size(&location, meta.len())?;
        let bytes = std::fs::read(location.as_std_path())
            .map_err(|e| Error::fetch(filename, version, format!("{location}: {e}")))?;
        debug!(target: "glyphrules::fetch", "read {} bytes from {location}", bytes.len());
        Ok(bytes)
    }
}

/// [`OriginFonts`] backed by `<cache>/v<version>/<filename>` and a fetcher.
///
/// A missing cache entry triggers exactly one fetch; the bytes are stored
/// in the cache before being parsed. Results are memoized for the run.
pub struct CachedOriginFonts<F> {
    cache_dir: Option<Utf8PathBuf>,
    fetcher: F,
    loader: FontLoader,
    resolved: HashMap<String, Option<Arc<LoadedFont>>>,
    fetches: usize,
}

impl<F: FontFetcher> CachedOriginFonts<F> {
    pub fn new(cache_dir: impl Into<Utf8PathBuf>, fetcher: F) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
            fetcher,
            loader: FontLoader::default(),
            resolved: HashMap::new(),
            fetches: 0,
        }
    }

    /// Fetch on every run without touching a cache directory.
    pub fn uncached(fetcher: F) -> Self {
        Self {
            cache_dir: None,
            fetcher,
            loader: FontLoader::default(),
            resolved: HashMap::new(),
            fetches: 0,
        }
    }

    /// Number of fetcher calls made so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    fn fetch(&mut self, version: &str, filename: &str) -> Result<Vec<u8>> {
        self.fetches += 1;
        info!(target: "glyphrules::fetch", "fetching {filename} for version {version}");
        self.fetcher.fetch(version, filename)
    }

    fn load(&mut self, version: &str, filename: &Utf8Path) -> Result<LoadOutcome> {
        let Some(cache_dir) = self.cache_dir.clone() else {
            let bytes = self.fetch(version, filename.as_str())?;
            return Ok(LoadOutcome::parsed(LoadedFont::from_bytes(filename, bytes)));
        };

        let cached = cache_dir.join(format!("v{version}")).join(filename);
        if !cached.is_file() {
            let bytes = self.fetch(version, filename.as_str())?;
            write_atomic(cached.as_std_path(), &bytes)?;
        } else {
            debug!(target: "glyphrules::fetch", "cache hit {cached}");
        }
        Ok(LoadOutcome::parsed(self.loader.load(&cached)))
    }
}

enum LoadOutcome {
    Font(Arc<LoadedFont>),
    NotAnOutlineFont(String),
    Failed(Error),
}

impl LoadOutcome {
    fn parsed<T: Into<Arc<LoadedFont>>>(result: Result<T>) -> Self {
        match result {
            Ok(font) => Self::Font(font.into()),
            Err(Error::InvalidFont { reason, .. }) => Self::NotAnOutlineFont(reason),
            Err(other) => Self::Failed(other),
        }
    }
}

impl<F: FontFetcher> OriginFonts for CachedOriginFonts<F> {
    fn origin_font(
        &mut self,
        version: &str,
        filename: &str,
    ) -> Result<Option<Arc<dyn FontAccess>>> {
        let key = format!("v{version}/{filename}");
        if let Some(resolved) = self.resolved.get(&key) {
            return Ok(resolved.clone().map(|f| f as Arc<dyn FontAccess>));
        }

        let relative = checked_filename(version, filename)?.to_path_buf();
        let font = match self.load(version, &relative)? {
            LoadOutcome::Font(font) => Some(font),
            LoadOutcome::NotAnOutlineFont(reason) => {
                warn!(
                    target: "glyphrules::fetch",
                    "{filename} (version {version}) is not a usable outline font: {reason}"
                );
                None
            }
            LoadOutcome::Failed(err) => return Err(err),
        };
        self.resolved.insert(key, font.clone());
        Ok(font.map(|f| f as Arc<dyn FontAccess>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingFetcher {
        bytes: Option<Vec<u8>>,
        calls: Cell<usize>,
    }

    impl FontFetcher for CountingFetcher {
        fn fetch(&self, version: &str, filename: &str) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            self.bytes
                .clone()
                .ok_or_else(|| Error::fetch(filename, version, "offline"))
        }
    }

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn sanitize_rejects_escaping_paths() {
        assert!(sanitize_filename("octicons/octicons.otf").is_some());
        for bad in ["", "../etc/passwd", "/abs.otf", "~/x.otf", "a/../../b.otf", "./x.otf"] {
            assert!(sanitize_filename(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn mirror_fetcher_expands_template() {
        let (_guard, root) = utf8_tempdir();
        let fetcher = MirrorFetcher::new(&root).with_template("v{version}/glyphs/{filename}");
        let location = fetcher.location("3.4.0", "weather/weathericons.ttf").unwrap();
        assert_eq!(location, root.join("v3.4.0/glyphs/weather/weathericons.ttf"));

        std::fs::create_dir_all(location.parent().unwrap()).unwrap();
        std::fs::write(&location, b"bytes").unwrap();
        assert_eq!(fetcher.fetch("3.4.0", "weather/weathericons.ttf").unwrap(), b"bytes");
        assert!(matches!(
            fetcher.fetch("3.4.0", "missing.ttf"),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn cache_miss_fetches_once_and_stores_bytes() {
        let (_guard, cache) = utf8_tempdir();
        let fetcher = CountingFetcher {
            bytes: Some(b"not an outline font".to_vec()),
            calls: Cell::new(0),
        };
        let mut origins = CachedOriginFonts::new(&cache, fetcher);

        // unparseable bytes mean "no origin map", not a failure
        assert!(origins.origin_font("3.4.0", "a/b.otf").unwrap().is_none());
        assert!(origins.origin_font("3.4.0", "a/b.otf").unwrap().is_none());
        assert_eq!(origins.fetches(), 1);
        assert!(cache.join("v3.4.0/a/b.otf").is_file());

        // a fresh run finds the cached file and does not fetch
        let fetcher = CountingFetcher {
            bytes: None,
            calls: Cell::new(0),
        };
        let mut again = CachedOriginFonts::new(&cache, fetcher);
        assert!(again.origin_font("3.4.0", "a/b.otf").unwrap().is_none());
        assert_eq!(again.fetches(), 0);
    }

    #[test]
    fn fetch_failure_is_an_error() {
        let fetcher = CountingFetcher {
            bytes: None,
            calls: Cell::new(0),
        };
        let mut origins = CachedOriginFonts::uncached(fetcher);
        assert!(matches!(
            origins.origin_font("3.4.0", "x.otf"),
            Err(Error::Fetch { .. })
        ));
    }
}
