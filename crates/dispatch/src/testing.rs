//! Test doubles: a recording transport and a harness wiring it to local
//! collaborators rooted in a temporary directory.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    pixbot_common::ChatId,
    pixbot_media::{Matrix, codec},
};

use crate::{
    error::{Error, Result},
    handlers::{Services, Settings},
    local::{FsImageStorage, MemoryResultLookup, MemoryWorkQueue},
    ports::{RemoteFile, TextMessage, Transport},
};

pub const BUCKET: &str = "test-bucket";
pub const IDENTIFY_QUEUE: &str = "identify";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        message: TextMessage,
    },
    Image {
        chat_id: ChatId,
        path: PathBuf,
        caption: Option<String>,
    },
}

/// Serves registered files and records everything sent.
#[derive(Default)]
pub struct RecordingTransport {
    files: Mutex<HashMap<String, (String, Vec<u8>)>>,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn add_file(&self, file_id: &str, file_path: &str, data: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), (file_path.to_string(), data));
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { message, .. } => Some(message.text),
                Sent::Image { .. } => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<(PathBuf, Option<String>)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Image { path, caption, .. } => Some((path, caption)),
                Sent::Text { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, message: TextMessage) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text { chat_id, message });
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, path: &Path, caption: Option<&str>) -> Result<()> {
        if !path.is_file() {
            return Err(Error::message(format!("{} is not a file", path.display())));
        }
        self.sent.lock().unwrap().push(Sent::Image {
            chat_id,
            path: path.to_path_buf(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        let files = self.files.lock().unwrap();
        let (file_path, _) = files
            .get(file_id)
            .ok_or_else(|| Error::message(format!("unknown file {file_id}")))?;
        Ok(RemoteFile {
            file_id: file_id.to_string(),
            file_path: file_path.clone(),
        })
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .values()
            .find(|(path, _)| path == file_path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::message(format!("unknown path {file_path}")))
    }
}

pub struct TestHarness {
    pub dir: tempfile::TempDir,
    pub transport: Arc<RecordingTransport>,
    pub storage: Arc<FsImageStorage>,
    pub queue: Arc<MemoryWorkQueue>,
    pub lookup: Arc<MemoryResultLookup>,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            storage: Arc::new(FsImageStorage::new(dir.path().join("buckets"))),
            dir,
            transport: Arc::new(RecordingTransport::default()),
            queue: Arc::new(MemoryWorkQueue::new()),
            lookup: Arc::new(MemoryResultLookup::new()),
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    pub fn services(&self) -> Arc<Services> {
        Arc::new(Services {
            transport: self.transport.clone(),
            storage: self.storage.clone(),
            queue: self.queue.clone(),
            lookup: self.lookup.clone(),
            settings: Settings {
                work_dir: self.work_dir(),
                bucket: BUCKET.into(),
                prefix: "photos".into(),
                identify_queue: IDENTIFY_QUEUE.into(),
            },
        })
    }

    /// Register a grayscale PNG under `file_id` at `photos/{file_id}.png`.
    pub fn add_photo(&self, file_id: &str, rows: &[&[i32]]) {
        let png = codec::encode_png(&Matrix::from_rows(rows).unwrap()).unwrap();
        self.transport
            .add_file(file_id, &format!("photos/{file_id}.png"), png);
    }

    /// Decode an image the transport sent.
    pub fn read_sent(path: &Path) -> Vec<Vec<i32>> {
        let data = std::fs::read(path).unwrap();
        codec::decode_grayscale(&data).unwrap().to_rows()
    }
}
