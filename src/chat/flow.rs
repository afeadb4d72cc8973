use crate::api::client::MessagingBackend;
use crate::api::models::{Conversation, Message, SendRequest};
use crate::chat::state::SendOutcome;

/// Fetch the user's chats. Failures are logged and reported as `None` so the
/// caller keeps what it already shows.
pub async fn load_conversations<B: MessagingBackend>(backend: &B, user_id: i64) -> Option<Vec<Conversation>> {
    match backend.list_chats(user_id).await {
        Ok(chats) => Some(chats),
        Err(e) => {
            log::error!("Failed to load chats: {e}");
            None
        }
    }
}

pub async fn load_messages<B: MessagingBackend>(backend: &B, chat_id: i64) -> Option<Vec<Message>> {
    match backend.list_messages(chat_id).await {
        Ok(messages) => Some(messages),
        Err(e) => {
            log::error!("Failed to load messages for chat {chat_id}: {e}");
            None
        }
    }
}

/// Post a message, then re-fetch the conversation's messages and the chat
/// list so the previews pick up the new last message.
pub async fn send_and_refresh<B: MessagingBackend>(backend: &B, request: SendRequest) -> SendOutcome {
    let response = match backend.send_message(&request).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("Failed to send message: {e}");
            return SendOutcome::default();
        }
    };
    if !response.success {
        log::warn!("Endpoint rejected message for chat {:?}", request.chat_id);
        return SendOutcome {
            response: Some(response),
            ..SendOutcome::default()
        };
    }

    let chat_id = response.chat_id.or(request.chat_id);
    let messages = match chat_id {
        Some(id) => load_messages(backend, id).await,
        None => None,
    };
    let conversations = load_conversations(backend, request.sender_id).await;
    SendOutcome {
        response: Some(response),
        chat_id,
        messages,
        conversations,
    }
}
