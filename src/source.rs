//! Fetching original image bytes.
//!
//! A descriptor's `source_url` is resolved by an [`ImageSource`]. The gallery
//! fetches each original once for processing and once more for every download
//! (downloads always go back to the source, never to the cache).
//!
//! | URL form | Resolution |
//! |---|---|
//! | `http://…`, `https://…` | anonymous GET (no cookies, no credentials) |
//! | `file:///abs/path` | read from disk |
//! | anything else | path relative to the source root |

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Anything that can turn a source URL into bytes.
///
/// Implementations must be shareable across the processing pool.
pub trait ImageSource: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Reads `file://` URLs and plain paths from disk.
///
/// Relative paths are joined onto `root`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL or path to the file it names.
    pub fn resolve(&self, url: &str) -> PathBuf {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ImageSource for FileSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(url);
        std::fs::read(&path).map_err(|source| SourceError::Io { path, source })
    }
}

/// Fetches `http(s)://` URLs with a blocking client.
///
/// The client has no cookie store and sends no credentials.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("adaptive-gallery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Http {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let http_err = |e: reqwest::Error| SourceError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;
        let bytes = response.bytes().map_err(http_err)?;
        Ok(bytes.to_vec())
    }
}

/// Dispatches on the URL scheme: HTTP(S) to [`HttpSource`], the rest to
/// [`FileSource`].
#[derive(Debug, Clone)]
pub struct DefaultSource {
    files: FileSource,
    http: HttpSource,
}

impl DefaultSource {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            files: FileSource::new(root),
            http: HttpSource::new(timeout)?,
        })
    }
}

/// Scheme of a URL, lowercased, if it has one that is not a Windows drive letter.
pub fn url_scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once("://")?;
    let valid = scheme.len() > 1
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

impl ImageSource for DefaultSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        match url_scheme(url).as_deref() {
            Some("http") | Some("https") => self.http.fetch(url),
            Some("file") | None => self.files.fetch(url),
            Some(other) => Err(SourceError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source that counts fetches per URL.
    #[derive(Default)]
    pub struct MockSource {
        pub files: HashMap<String, Vec<u8>>,
        pub fetches: Mutex<Vec<String>>,
    }

    impl MockSource {
        pub fn with_files(files: &[(&str, &[u8])]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(url, bytes)| (url.to_string(), bytes.to_vec()))
                    .collect(),
                fetches: Mutex::new(Vec::new()),
            }
        }

        pub fn fetch_count(&self, url: &str) -> usize {
            self.fetches.lock().unwrap().iter().filter(|u| *u == url).count()
        }

        pub fn total_fetches(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }
    }

    impl ImageSource for MockSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
            self.fetches.lock().unwrap().push(url.to_string());
            self.files.get(url).cloned().ok_or_else(|| SourceError::Io {
                path: PathBuf::from(url),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such mock file"),
            })
        }
    }

    #[test]
    fn file_source_resolves_relative_against_root() {
        let source = FileSource::new("/srv/catalog");
        assert_eq!(
            source.resolve("products/oak.jpg"),
            PathBuf::from("/srv/catalog/products/oak.jpg")
        );
    }

    #[test]
    fn file_source_keeps_absolute_and_file_urls() {
        let source = FileSource::new("/srv/catalog");
        assert_eq!(source.resolve("/tmp/a.jpg"), PathBuf::from("/tmp/a.jpg"));
        assert_eq!(
            source.resolve("file:///tmp/b.jpg"),
            PathBuf::from("/tmp/b.jpg")
        );
    }

    #[test]
    fn file_source_reads_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.bin"), b"hello").unwrap();
        let source = FileSource::new(tmp.path());
        assert_eq!(source.fetch("a.bin").unwrap(), b"hello");
    }

    #[test]
    fn file_source_missing_file_errors_with_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = FileSource::new(tmp.path());
        let err = source.fetch("missing.jpg").unwrap_err();
        assert!(err.to_string().contains("missing.jpg"));
    }

    #[test]
    fn scheme_detection() {
        assert_eq!(url_scheme("https://cdn.example/a.jpg").as_deref(), Some("https"));
        assert_eq!(url_scheme("HTTP://cdn.example/a.jpg").as_deref(), Some("http"));
        assert_eq!(url_scheme("file:///a.jpg").as_deref(), Some("file"));
        assert_eq!(url_scheme("products/a.jpg"), None);
        assert_eq!(url_scheme("C://photos/a.jpg"), None);
    }

    #[test]
    fn default_source_rejects_unknown_scheme() {
        let source = DefaultSource::new(".", Duration::from_secs(1)).unwrap();
        let err = source.fetch("ftp://example.com/a.jpg").unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn default_source_reads_local_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("x.jpg"), b"abc").unwrap();
        let source = DefaultSource::new(tmp.path(), Duration::from_secs(1)).unwrap();
        assert_eq!(source.fetch("x.jpg").unwrap(), b"abc");
    }
}
