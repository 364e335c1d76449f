//! Collaborators that need no cloud account: directory-backed storage and
//! result records, and an in-process work queue.

use std::{
    collections::{HashMap, VecDeque},
    path::{Component, Path, PathBuf},
    time::Duration,
};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    tokio::{sync::Notify, time::Instant},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Context, Error, Result},
    ports::{ImageStorage, QueueMessage, ResultLookup, WorkQueue},
    prediction::PredictionRecord,
};

/// Reject keys that would escape their root directory.
fn safe_relative(key: &str) -> Option<PathBuf> {
    let path = Path::new(key);
    let ok = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    ok.then(|| path.to_path_buf())
}

async fn copy_file(from: &Path, to: &Path) -> std::io::Result<u64> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(from, to).await
}

// ── Storage ─────────────────────────────────────────────────────────────────

/// Object storage where each bucket is a directory under `root`.
#[derive(Debug, Clone)]
pub struct FsImageStorage {
    root: PathBuf,
}

impl FsImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let bucket = safe_relative(bucket)?;
        let key = safe_relative(key)?;
        Some(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ImageStorage for FsImageStorage {
    async fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<String> {
        let Some(target) = self.object_path(bucket, key) else {
            return Err(Error::storage(format!(
                "Upload to {bucket}/{key} failed. The key is not a relative path."
            )));
        };
        if let Err(e) = copy_file(local_path, &target).await {
            warn!(bucket, key, path = %local_path.display(), error = %e, "upload failed");
            return Err(Error::storage(format!(
                "Upload to {bucket}/{key} failed. {e}"
            )));
        }
        let detail = format!("Upload to {bucket}/{key} succeeded.");
        info!("{detail}");
        Ok(detail)
    }

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<String> {
        let Some(source) = self.object_path(bucket, key) else {
            return Err(Error::storage(format!(
                "Download from {bucket}/{key} failed. The key is not a relative path."
            )));
        };
        if let Err(e) = copy_file(&source, local_path).await {
            warn!(bucket, key, path = %local_path.display(), error = %e, "download failed");
            return Err(Error::storage(format!(
                "Download from {bucket}/{key} failed. {e}"
            )));
        }
        let detail = format!(
            "Download from {bucket}/{key} to {} succeeded.",
            local_path.display()
        );
        info!("{detail}");
        Ok(detail)
    }
}

// ── Work queue ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct NamedQueue {
    ready: VecDeque<(String, String)>,
    in_flight: HashMap<String, String>,
}

/// Named FIFO queues with receipt handles.
///
/// A received message stays in flight until acknowledged.
#[derive(Debug, Default)]
pub struct MemoryWorkQueue {
    queues: DashMap<String, NamedQueue>,
    notify: Notify,
}

impl MemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_receive(&self, queue: &str) -> Option<QueueMessage> {
        let mut q = self.queues.get_mut(queue)?;
        let (id, body) = q.ready.pop_front()?;
        let receipt = format!("{id}:{}", uuid::Uuid::new_v4());
        q.in_flight.insert(receipt.clone(), body.clone());
        Some(QueueMessage { body, receipt })
    }

    /// Messages waiting to be received.
    pub fn pending(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, |q| q.ready.len())
    }

    /// Messages received but not yet acknowledged.
    pub fn in_flight(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, |q| q.in_flight.len())
    }

    /// Snapshot of waiting message bodies, oldest first.
    pub fn peek_all(&self, queue: &str) -> Vec<String> {
        self.queues
            .get(queue)
            .map(|q| q.ready.iter().map(|(_, body)| body.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WorkQueue for MemoryWorkQueue {
    async fn enqueue(&self, queue: &str, payload: &str) -> Result<String> {
        if queue.is_empty() {
            return Err(Error::queue(
                "Sending message to the queue failed. No queue name configured.",
            ));
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.queues
            .entry(queue.to_string())
            .or_default()
            .ready
            .push_back((id.clone(), payload.to_string()));
        self.notify.notify_waiters();
        debug!(queue, message_id = %id, "message enqueued");
        Ok(format!("Message sent successfully. Message ID: {id}"))
    }

    async fn receive(&self, queue: &str, wait: Duration) -> Result<Option<QueueMessage>> {
        let deadline = Instant::now() + wait;
        loop {
            // Register before checking so an enqueue in between is not missed.
            let notified = self.notify.notified();
            if let Some(message) = self.try_receive(queue) {
                return Ok(Some(message));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, queue: &str, receipt: &str) -> Result<()> {
        let removed = self
            .queues
            .get_mut(queue)
            .and_then(|mut q| q.in_flight.remove(receipt));
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::queue(format!(
                "Deleting message from {queue} failed. Unknown receipt handle."
            ))),
        }
    }
}

// ── Result lookup ───────────────────────────────────────────────────────────

fn not_found(prediction_id: &str) -> Error {
    Error::lookup(format!("No item found with prediction_id: {prediction_id}"))
}

/// Prediction records stored as `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirResultLookup {
    dir: PathBuf,
}

impl JsonDirResultLookup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultLookup for JsonDirResultLookup {
    async fn get_by_id(&self, prediction_id: &str) -> Result<PredictionRecord> {
        let Some(name) = safe_relative(&format!("{prediction_id}.json"))
            .filter(|p| p.components().count() == 1)
        else {
            return Err(not_found(prediction_id));
        };
        let path = self.dir.join(name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(prediction_id, "no prediction record");
                return Err(not_found(prediction_id));
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "reading prediction record failed");
                return Err(Error::lookup(format!(
                    "Reading prediction {prediction_id} failed. {e}"
                )));
            },
        };
        let record = serde_json::from_str(&raw)
            .with_context(|| format!("parsing prediction record {}", path.display()))?;
        debug!(prediction_id, "retrieved prediction record");
        Ok(record)
    }
}

/// In-memory prediction records.
#[derive(Debug, Default)]
pub struct MemoryResultLookup {
    records: DashMap<String, PredictionRecord>,
}

impl MemoryResultLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, prediction_id: impl Into<String>, record: PredictionRecord) {
        self.records.insert(prediction_id.into(), record);
    }
}

#[async_trait]
impl ResultLookup for MemoryResultLookup {
    async fn get_by_id(&self, prediction_id: &str) -> Result<PredictionRecord> {
        self.records
            .get(prediction_id)
            .map(|r| r.clone())
            .ok_or_else(|| not_found(prediction_id))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::sync::Arc};

    #[tokio::test]
    async fn storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsImageStorage::new(dir.path().join("buckets"));
        let src = dir.path().join("photos/file_1.jpg");
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, b"jpeg bytes").unwrap();

        let detail = storage.upload("pics", "photos/file_1.jpg", &src).await.unwrap();
        assert_eq!(detail, "Upload to pics/photos/file_1.jpg succeeded.");

        let dst = dir.path().join("out/nested/file_1.jpg");
        storage.download("pics", "photos/file_1.jpg", &dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn storage_failures_carry_detail() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsImageStorage::new(dir.path());
        let err = storage
            .download("pics", "missing.jpg", &dir.path().join("x.jpg"))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::Storage { detail } if detail.starts_with("Download from pics/missing.jpg failed."))
        );

        let err = storage
            .upload("pics", "../escape.jpg", &dir.path().join("x.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[tokio::test]
    async fn queue_is_fifo_and_needs_ack() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue("q", "one").await.unwrap();
        queue.enqueue("q", "two").await.unwrap();
        assert_eq!(queue.peek_all("q"), vec!["one", "two"]);

        let first = queue.receive("q", Duration::ZERO).await.unwrap().unwrap();
        assert_eq!(first.body, "one");
        assert_eq!(queue.in_flight("q"), 1);
        queue.ack("q", &first.receipt).await.unwrap();
        assert_eq!(queue.in_flight("q"), 0);
        assert!(queue.ack("q", &first.receipt).await.is_err());

        let second = queue.receive("q", Duration::ZERO).await.unwrap().unwrap();
        assert_eq!(second.body, "two");
        assert_eq!(queue.pending("q"), 0);
    }

    #[tokio::test]
    async fn receive_times_out_on_empty_queue() {
        let queue = MemoryWorkQueue::new();
        let got = queue.receive("q", Duration::from_millis(20)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn receive_wakes_on_enqueue() {
        let queue = Arc::new(MemoryWorkQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.receive("q", Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;
        queue.enqueue("q", "late").await.unwrap();
        let got = waiter.await.unwrap().unwrap().unwrap();
        assert_eq!(got.body, "late");
    }

    #[tokio::test]
    async fn json_dir_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("p-1.json"),
            r#"{"originalImgPath": "photos/a.jpg", "labels": [{"class": "dog"}]}"#,
        )
        .unwrap();
        let lookup = JsonDirResultLookup::new(dir.path());

        let record = lookup.get_by_id("p-1").await.unwrap();
        assert_eq!(record.original_img_path, "photos/a.jpg");

        let err = lookup.get_by_id("p-2").await.unwrap_err();
        assert_eq!(err.to_string(), "No item found with prediction_id: p-2");
        assert!(lookup.get_by_id("../p-1").await.is_err());
    }

    #[tokio::test]
    async fn memory_lookup() {
        let lookup = MemoryResultLookup::new();
        assert!(lookup.get_by_id("x").await.is_err());
        lookup.insert("x", PredictionRecord {
            prediction_id: Some("x".into()),
            original_img_path: "a.jpg".into(),
            predicted_img_path: None,
            labels: Vec::new(),
        });
        assert_eq!(lookup.get_by_id("x").await.unwrap().original_img_path, "a.jpg");
    }
}
