//! Request builder: per-request options over process-wide defaults.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cleanup::ArtifactCleaner;
use crate::config::RdmConfig;
use crate::delivery::EventDelivery;
use crate::types::Priority;

use super::DownloadRequest;

const DEFAULT_FILE_NAME: &str = "download.bin";

/// Builds a [`DownloadRequest`]. Created through
/// [`DownloadManager::download`] so the process-wide defaults and the
/// delivery/cleanup collaborators are already wired in.
///
/// [`DownloadManager::download`]: crate::manager::DownloadManager::download
pub struct DownloadRequestBuilder {
    url: String,
    dir_path: PathBuf,
    file_name: Option<String>,
    priority: Priority,
    tag: Option<String>,
    headers: HashMap<String, String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    user_agent: Option<String>,
    defaults: RdmConfig,
    delivery: Arc<dyn EventDelivery>,
    cleaner: Arc<dyn ArtifactCleaner>,
}

impl DownloadRequestBuilder {
    pub(crate) fn new(
        url: String,
        dir_path: PathBuf,
        defaults: RdmConfig,
        delivery: Arc<dyn EventDelivery>,
        cleaner: Arc<dyn ArtifactCleaner>,
    ) -> Self {
        Self {
            url,
            dir_path,
            file_name: None,
            priority: Priority::default(),
            tag: None,
            headers: HashMap::new(),
            connect_timeout: None,
            read_timeout: None,
            user_agent: None,
            defaults,
            delivery,
            cleaner,
        }
    }

    /// Destination file name. When unset, derived from the URL's last
    /// path segment, falling back to `download.bin`.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Free-form label for the caller's own bookkeeping.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds a custom request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Resolves unset options against the process-wide defaults and
    /// produces the request. The identity is derived lazily from the
    /// (url, dir, file name) fixed here.
    pub fn build(self) -> Arc<DownloadRequest> {
        let file_name = self
            .file_name
            .unwrap_or_else(|| derive_file_name(&self.url));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(self.defaults.connect_timeout_secs));
        let read_timeout = self
            .read_timeout
            .unwrap_or(Duration::from_secs(self.defaults.read_timeout_secs));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| self.defaults.user_agent.clone());

        DownloadRequest::new(
            self.url,
            self.dir_path,
            file_name,
            self.priority,
            self.tag,
            self.headers,
            connect_timeout,
            read_timeout,
            user_agent,
            self.delivery,
            self.cleaner,
        )
    }
}

/// Last non-empty path segment of the URL, or `download.bin`.
fn derive_file_name(url: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return DEFAULT_FILE_NAME.to_string(),
    };
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::TempFileCleaner;
    use crate::delivery::InlineDelivery;

    fn builder(url: &str) -> DownloadRequestBuilder {
        DownloadRequestBuilder::new(
            url.to_string(),
            PathBuf::from("/tmp/rdm-test"),
            RdmConfig::default(),
            Arc::new(InlineDelivery),
            Arc::new(TempFileCleaner),
        )
    }

    #[test]
    fn derive_file_name_from_url_path() {
        assert_eq!(derive_file_name("https://example.com/archive.zip"), "archive.zip");
        assert_eq!(
            derive_file_name("https://cdn.example.com/path/to/image-12.iso"),
            "image-12.iso"
        );
    }

    #[test]
    fn derive_file_name_falls_back() {
        assert_eq!(derive_file_name("https://example.com/"), "download.bin");
        assert_eq!(derive_file_name("not a url"), "download.bin");
    }

    #[test]
    fn unset_options_fall_back_to_config_defaults() {
        let request = builder("https://example.com/a.bin").build();
        assert_eq!(request.connect_timeout(), Duration::from_secs(20));
        assert_eq!(request.read_timeout(), Duration::from_secs(20));
        assert_eq!(request.user_agent(), "rdm/0.1");
        assert_eq!(request.file_name(), "a.bin");
    }

    #[test]
    fn explicit_options_win_over_defaults() {
        let request = builder("https://example.com/a.bin")
            .file_name("saved.bin")
            .read_timeout(Duration::from_secs(90))
            .user_agent("probe/1.0")
            .header("Authorization", "Bearer t")
            .build();
        assert_eq!(request.file_name(), "saved.bin");
        assert_eq!(request.read_timeout(), Duration::from_secs(90));
        assert_eq!(request.user_agent(), "probe/1.0");
        assert_eq!(
            request.headers().get("Authorization").map(String::as_str),
            Some("Bearer t")
        );
    }

    #[test]
    fn identity_is_memoized_and_deterministic() {
        let a = builder("https://example.com/a.bin").build();
        let b = builder("https://example.com/a.bin").build();
        assert_eq!(a.id(), a.id());
        assert_eq!(a.id(), b.id());
        let c = builder("https://example.com/a.bin").file_name("other.bin").build();
        assert_ne!(a.id(), c.id());
    }
}
