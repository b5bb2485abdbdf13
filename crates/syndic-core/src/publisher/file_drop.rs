//! Git-backed platforms: the post is a file written into a repository
//! directory that another process commits and deploys.
//!
//! Files are written atomically, so a crashed run never leaves a
//! half-written article for the deploy to pick up. An existing file is never
//! replaced.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use syndic_state::Platform;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Envelope, PublishError, PublishReceipt, Publisher};

pub struct FileDropPublisher {
    platform: Platform,
    dir: PathBuf,
    /// Public URL prefix for the written file, when one is known.
    public_base: Option<String>,
}

impl FileDropPublisher {
    /// Zenn articles directory.
    pub fn zenn(articles_dir: impl AsRef<Path>) -> Self {
        Self {
            platform: Platform::Zenn,
            dir: articles_dir.as_ref().to_path_buf(),
            public_base: None,
        }
    }

    /// Blog posts directory; URLs resolve under `<site>/blog/`.
    pub fn blog(blog_dir: impl AsRef<Path>, site_url: Option<&str>) -> Self {
        Self {
            platform: Platform::Blog,
            dir: blog_dir.as_ref().to_path_buf(),
            public_base: site_url.map(|s| format!("{}/blog", s.trim_end_matches('/'))),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn url_for(&self, name: &str, path: &Path) -> String {
        match &self.public_base {
            Some(base) => {
                let stem = Path::new(name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(name);
                format!("{base}/{stem}/")
            }
            None => path.display().to_string(),
        }
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), PublishError> {
    let io_err = |source: std::io::Error| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .ok_or_else(|| io_err(std::io::ErrorKind::InvalidInput.into()))?;
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.persist_noclobber(path).map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists => PublishError::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => io_err(e.error),
    })?;
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}

#[async_trait]
impl Publisher for FileDropPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::File { name, contents } = envelope else {
            return Err(PublishError::unsupported(self.platform, envelope));
        };
        if !is_plain_file_name(name) {
            return Err(PublishError::unsupported(self.platform, envelope));
        }

        let path = self.dir.join(name);
        write_atomic(&path, contents)?;
        debug!(platform = %self.platform, path = %path.display(), "wrote article file");
        Ok(PublishReceipt {
            external_id: name.clone(),
            url: self.url_for(name, &path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_and_reports_its_path() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = FileDropPublisher::zenn(tmp.path().join("articles"));
        let receipt = publisher
            .publish(&Envelope::File {
                name: "20261018-alpha.md".into(),
                contents: "---\ntitle: x\n---\nbody\n".into(),
            })
            .await
            .unwrap();
        let written = std::fs::read_to_string(tmp.path().join("articles/20261018-alpha.md")).unwrap();
        assert!(written.ends_with("body\n"));
        assert_eq!(receipt.external_id, "20261018-alpha.md");
        assert!(receipt.url.ends_with("20261018-alpha.md"));
    }

    #[tokio::test]
    async fn blog_url_uses_site() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = FileDropPublisher::blog(tmp.path(), Some("https://example.dev/"));
        let receipt = publisher
            .publish(&Envelope::File {
                name: "alpha-20261018.mdx".into(),
                contents: "x\n".into(),
            })
            .await
            .unwrap();
        assert_eq!(receipt.url, "https://example.dev/blog/alpha-20261018/");
    }

    #[tokio::test]
    async fn later_blog_post_keeps_the_earlier_one() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = FileDropPublisher::blog(tmp.path(), Some("https://site.test"));
        let mut receipts = Vec::new();
        for day in [4, 18] {
            let date = chrono::NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
            let envelope = Envelope::File {
                name: crate::publisher::blog_file_name("alpha", date),
                contents: format!("post {day}\n"),
            };
            receipts.push(publisher.publish(&envelope).await.unwrap());
        }
        assert_ne!(receipts[0].external_id, receipts[1].external_id);
        assert_ne!(receipts[0].url, receipts[1].url);
        let files = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn existing_file_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("alpha-20261018.mdx"), "original\n").unwrap();
        let publisher = FileDropPublisher::blog(tmp.path(), None);
        let err = publisher
            .publish(&Envelope::File {
                name: "alpha-20261018.mdx".into(),
                contents: "replacement\n".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "already_exists");
        let kept = std::fs::read_to_string(tmp.path().join("alpha-20261018.mdx")).unwrap();
        assert_eq!(kept, "original\n");
    }

    #[tokio::test]
    async fn path_traversal_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = FileDropPublisher::zenn(tmp.path());
        let err = publisher
            .publish(&Envelope::File {
                name: "../escape.md".into(),
                contents: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");
    }

    #[tokio::test]
    async fn wrong_shape_is_refused() {
        let publisher = FileDropPublisher::zenn("unused");
        let err = publisher
            .publish(&Envelope::Text { text: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::UnsupportedEnvelope { .. }));
    }
}
