//! Per-chat role selection.
//!
//! Every chat owns one [`RoleState`]. Each inbound message picks a target
//! role; when it differs from the chat's current one, the old state (and any
//! media groups it was buffering) is dropped and a fresh state takes over.

use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    pixbot_common::{ChatId, InboundMessage},
    tracing::debug,
};

use crate::{
    error::Result,
    handlers::{
        ImageProcessingHandler, ObjectDetectionHandler, PlainHandler, QuoteHandler, RoleHandler,
        Services,
    },
    prediction::is_prediction_caption,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Plain,
    Quote,
    ImageProcessing,
    ObjectDetection,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Quote => "quote",
            Self::ImageProcessing => "image_processing",
            Self::ObjectDetection => "object_detection",
        }
    }

    /// The role a message asks for, in priority order: replies quote, photos
    /// go to object detection when captioned `predict`/`prediction_result`
    /// and to image processing otherwise, everything else is plain.
    pub fn for_message(msg: &InboundMessage) -> Self {
        if msg.is_reply() {
            Self::Quote
        } else if msg.has_photo() {
            if is_prediction_caption(&msg.normalized_caption()) {
                Self::ObjectDetection
            } else {
                Self::ImageProcessing
            }
        } else {
            Self::Plain
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat's active role together with the state it owns.
#[derive(Clone)]
pub enum RoleState {
    Plain(PlainHandler),
    Quote(QuoteHandler),
    ImageProcessing(ImageProcessingHandler),
    ObjectDetection(ObjectDetectionHandler),
}

impl RoleState {
    pub fn new(role: Role, services: Arc<Services>) -> Self {
        match role {
            Role::Plain => Self::Plain(PlainHandler::new(services)),
            Role::Quote => Self::Quote(QuoteHandler::new(services)),
            Role::ImageProcessing => Self::ImageProcessing(ImageProcessingHandler::new(services)),
            Role::ObjectDetection => Self::ObjectDetection(ObjectDetectionHandler::new(services)),
        }
    }

    fn handler(&self) -> &dyn RoleHandler {
        match self {
            Self::Plain(h) => h,
            Self::Quote(h) => h,
            Self::ImageProcessing(h) => h,
            Self::ObjectDetection(h) => h,
        }
    }
}

#[async_trait]
impl RoleHandler for RoleState {
    fn role(&self) -> Role {
        self.handler().role()
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        self.handler().handle(msg).await
    }
}

/// Chat id to role state.
pub struct RoleDispatcher {
    services: Arc<Services>,
    states: DashMap<ChatId, RoleState>,
}

impl RoleDispatcher {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            states: DashMap::new(),
        }
    }

    /// Resolve the role for `msg`, switching the chat's state if needed, and
    /// return a handle to the resulting state.
    pub fn dispatch(&self, msg: &InboundMessage) -> RoleState {
        self.activate(msg.chat_id(), Role::for_message(msg))
    }

    /// Make `role` the chat's active role, keeping the current state if it
    /// already is.
    pub fn activate(&self, chat_id: ChatId, role: Role) -> RoleState {
        let mut state = self
            .states
            .entry(chat_id)
            .or_insert_with(|| RoleState::new(Role::default(), Arc::clone(&self.services)));
        if state.role() != role {
            debug!(%chat_id, from = %state.role(), to = %role, "switching role");
            *state = RoleState::new(role, Arc::clone(&self.services));
        }
        state.clone()
    }

    /// The chat's active role; chats never seen are plain.
    pub fn current(&self, chat_id: ChatId) -> Role {
        self.states
            .get(&chat_id)
            .map_or(Role::default(), |s| s.role())
    }

    /// Number of chats with state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
