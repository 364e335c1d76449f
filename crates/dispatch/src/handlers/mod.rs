//! Per-role message handling.
//!
//! Each role is a handler implementing [`RoleHandler`]. Handlers return
//! errors instead of replying with them; the orchestrator decides what the
//! user sees.

mod image_processing;
mod object_detection;
mod plain;
mod quote;

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use {async_trait::async_trait, pixbot_common::InboundMessage, pixbot_config::PixbotConfig};

pub use {
    image_processing::{ImageProcessingHandler, PROCESSING_NOTICE},
    object_detection::ObjectDetectionHandler,
    plain::{HELP_TEXT, PlainHandler},
    quote::{QUOTE_OPT_OUT, QuoteHandler},
};

use crate::{
    error::{Error, Result},
    ports::{ImageStorage, ResultLookup, Transport, WorkQueue},
    role::Role,
};

/// Shared message-handling capability of every role.
#[async_trait]
pub trait RoleHandler: Send + Sync {
    fn role(&self) -> Role;

    async fn handle(&self, msg: &InboundMessage) -> Result<()>;
}

/// Deployment settings the handlers read.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Downloaded photos land under this directory, at their transport path.
    pub work_dir: PathBuf,
    pub bucket: String,
    pub prefix: String,
    pub identify_queue: String,
}

impl Settings {
    /// Storage key for an uploaded file name: `{prefix}/{name}`.
    pub fn key_for(&self, name: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        }
    }
}

impl From<&PixbotConfig> for Settings {
    fn from(config: &PixbotConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            bucket: config.storage.bucket.clone(),
            prefix: config.storage.prefix.clone(),
            identify_queue: config.queues.identify.clone(),
        }
    }
}

/// Collaborators shared by every handler.
pub struct Services {
    pub transport: Arc<dyn Transport>,
    pub storage: Arc<dyn ImageStorage>,
    pub queue: Arc<dyn WorkQueue>,
    pub lookup: Arc<dyn ResultLookup>,
    pub settings: Settings,
}

/// Run CPU-bound work (decode, transform, encode) off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::message(format!("image task failed: {e}")))?
}

/// Place a transport or storage path under `work_dir`, keeping only its
/// normal components.
pub(crate) fn local_path(work_dir: &Path, remote: &str) -> PathBuf {
    let relative: PathBuf = Path::new(remote)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    work_dir.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_stays_under_work_dir() {
        let root = Path::new("/srv/work");
        assert_eq!(
            local_path(root, "photos/file_3.jpg"),
            PathBuf::from("/srv/work/photos/file_3.jpg")
        );
        assert_eq!(
            local_path(root, "/etc/../passwd"),
            PathBuf::from("/srv/work/etc/passwd")
        );
    }

    #[test]
    fn key_for_joins_prefix() {
        let mut settings = Settings {
            work_dir: PathBuf::from("w"),
            bucket: "b".into(),
            prefix: "photos/".into(),
            identify_queue: "q".into(),
        };
        assert_eq!(settings.key_for("a.jpg"), "photos/a.jpg");
        settings.prefix.clear();
        assert_eq!(settings.key_for("a.jpg"), "a.jpg");
    }
}
