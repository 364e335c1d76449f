//! Composes role dispatch, handling and error surfacing per message.

use std::sync::Arc;

use {
    pixbot_common::{ChatId, InboundMessage},
    tracing::{debug, error, info, warn},
};

use crate::{
    error::Error,
    handlers::{RoleHandler, Services},
    ports::TextMessage,
    prediction::ResultEnvelope,
    role::{Role, RoleDispatcher, RoleState},
};

/// Entry point for both inbound sources. Failures are reported to the chat
/// and never propagate to the worker loops.
pub struct Orchestrator {
    dispatcher: RoleDispatcher,
    services: Arc<Services>,
}

impl Orchestrator {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            dispatcher: RoleDispatcher::new(Arc::clone(&services)),
            services,
        }
    }

    pub fn dispatcher(&self) -> &RoleDispatcher {
        &self.dispatcher
    }

    /// Handle one message from the live inbound stream.
    pub async fn handle_message(&self, msg: InboundMessage) {
        let chat_id = msg.chat_id();
        let state = self.dispatcher.dispatch(&msg);
        let role = state.role();
        debug!(%chat_id, message_id = msg.message_id, %role, "handling message");

        if let Err(e) = state.handle(&msg).await {
            self.report(chat_id, role, e).await;
        }
    }

    /// Handle one prediction result from the result stream.
    pub async fn handle_result(&self, envelope: ResultEnvelope) {
        let result = envelope.message;
        let chat_id = result.chat_id();
        let RoleState::ObjectDetection(handler) =
            self.dispatcher.activate(chat_id, Role::ObjectDetection)
        else {
            error!(%chat_id, "object detection role did not activate");
            return;
        };
        if let Err(e) = handler.handle_result(&result).await {
            self.report(chat_id, Role::ObjectDetection, e).await;
        }
    }

    async fn report(&self, chat_id: ChatId, role: Role, err: Error) {
        let kind = err.kind();
        if kind.is_user_error() {
            info!(%chat_id, %role, ?kind, error = %err, "rejected message");
        } else {
            warn!(%chat_id, %role, ?kind, error = %err, "message handling failed");
        }
        let reply = TextMessage::plain(err.user_message());
        if let Err(e) = self.services.transport.send_text(chat_id, reply).await {
            error!(%chat_id, error = %e, "failed to report error to chat");
        }
    }
}
