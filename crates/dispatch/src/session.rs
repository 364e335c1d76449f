//! Media-group buffering for multi-image commands.
//!
//! A group collects images until two have arrived, then is removed from the
//! buffer and its first two images are concatenated. Removal happens under
//! the same map entry guard as the append, so two images racing into one
//! group cannot both observe a count of one.

use {
    dashmap::{DashMap, mapref::entry::Entry},
    pixbot_media::Image,
    tracing::debug,
};

use crate::{command::ConcatSpec, error::Result};

/// Images needed before a group executes.
pub const GROUP_THRESHOLD: usize = 2;

#[derive(Debug, Default)]
struct Session {
    images: Vec<Image>,
    pending: Option<ConcatSpec>,
}

impl Session {
    /// First writer wins.
    fn set_pending(&mut self, spec: ConcatSpec) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(spec);
        true
    }

    fn is_ready(&self) -> bool {
        self.images.len() >= GROUP_THRESHOLD
    }

    fn into_ready(self, group_id: &str) -> Option<ReadyGroup> {
        let dropped = self.images.len().saturating_sub(GROUP_THRESHOLD);
        let mut images = self.images.into_iter();
        let first = images.next()?;
        let second = images.next()?;
        if dropped > 0 {
            debug!(group_id, dropped, "discarding images beyond the first two");
        }
        Some(ReadyGroup {
            group_id: group_id.to_string(),
            first,
            second,
            spec: self.pending.unwrap_or_default(),
        })
    }
}

/// Result of feeding an image into a group.
#[derive(Debug)]
pub enum Ingest {
    /// The group is still waiting for more images.
    Pending { count: usize },
    /// The group reached the threshold and was removed from the buffer.
    Ready(ReadyGroup),
}

/// A group taken out of the buffer, ready to concatenate.
#[derive(Debug)]
pub struct ReadyGroup {
    pub group_id: String,
    pub first: Image,
    pub second: Image,
    pub spec: ConcatSpec,
}

impl ReadyGroup {
    /// Concatenate `second` onto `first` with the group's parameters.
    pub fn execute(self) -> Result<Image> {
        let layout = self.spec.layout()?;
        let mut joined = self.first;
        joined.concat(&self.second, layout)?;
        Ok(joined)
    }
}

/// Groups keyed by media-group id.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    groups: DashMap<String, Session>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image, creating the group if absent. Returns the group size.
    pub fn add_image(&self, group_id: &str, image: Image) -> usize {
        let mut session = self.groups.entry(group_id.to_string()).or_default();
        session.images.push(image);
        session.images.len()
    }

    /// Record concat parameters for a group. Returns `false` if the group
    /// already had parameters.
    pub fn set_pending_command(&self, group_id: &str, spec: ConcatSpec) -> bool {
        self.groups
            .entry(group_id.to_string())
            .or_default()
            .set_pending(spec)
    }

    /// Run the group's concat if it holds enough images.
    ///
    /// The group is removed whenever it is ready, whether or not the concat
    /// succeeds. Returns `Ok(None)` when the group is not ready yet.
    pub fn try_execute(&self, group_id: &str) -> Result<Option<Image>> {
        let Some((_, session)) = self.groups.remove_if(group_id, |_, s| s.is_ready()) else {
            return Ok(None);
        };
        session
            .into_ready(group_id)
            .map(ReadyGroup::execute)
            .transpose()
    }

    /// Append an image and, if that completes the group, take it out of the
    /// buffer in the same step.
    pub fn ingest(&self, group_id: &str, image: Image, spec: Option<ConcatSpec>) -> Ingest {
        match self.groups.entry(group_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                session.images.push(image);
                if let Some(spec) = spec {
                    session.set_pending(spec);
                }
                if !session.is_ready() {
                    return Ingest::Pending {
                        count: session.images.len(),
                    };
                }
                let session = entry.remove();
                match session.into_ready(group_id) {
                    Some(ready) => Ingest::Ready(ready),
                    None => Ingest::Pending { count: 0 },
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(Session {
                    images: vec![image],
                    pending: spec,
                });
                Ingest::Pending { count: 1 }
            },
        }
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Number of images buffered for a group.
    pub fn group_len(&self, group_id: &str) -> usize {
        self.groups.get(group_id).map_or(0, |s| s.images.len())
    }

    /// Number of open groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
