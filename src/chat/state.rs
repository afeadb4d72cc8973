use crate::api::models::{Conversation, Message, SendRequest, SendResponse};

/// The conversation shown in the message pane. `chat_id` stays `None` for a
/// conversation started from a profile card until the first send creates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChat {
    pub chat_id: Option<i64>,
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub counterpart_image: Option<String>,
}

impl ActiveChat {
    pub fn from_conversation(conv: &Conversation) -> Option<Self> {
        if !conv.is_displayable() {
            return None;
        }
        Some(Self {
            chat_id: Some(conv.chat_id),
            counterpart_id: conv.other_user_id?,
            counterpart_name: conv.other_user_name.clone()?,
            counterpart_image: conv.other_user_image.clone(),
        })
    }
}

/// Everything a send round-trip produced. The refetches are only attempted
/// when the server reported success.
#[derive(Debug, Clone, Default)]
pub struct SendOutcome {
    pub response: Option<SendResponse>,
    pub chat_id: Option<i64>,
    pub messages: Option<Vec<Message>>,
    pub conversations: Option<Vec<Conversation>>,
}

impl SendOutcome {
    pub fn succeeded(&self) -> bool {
        self.response.as_ref().is_some_and(|r| r.success)
    }
}

#[derive(Debug, Clone)]
pub struct ChatState {
    current_user_id: i64,
    conversations: Vec<Conversation>,
    selected: Option<ActiveChat>,
    messages: Vec<Message>,
    draft: String,
    /// The send awaiting its reply; doubles as the loading flag.
    in_flight: Option<SendRequest>,
}

impl ChatState {
    pub fn new(current_user_id: i64) -> Self {
        Self {
            current_user_id,
            conversations: Vec::new(),
            selected: None,
            messages: Vec::new(),
            draft: String::new(),
            in_flight: None,
        }
    }

    pub fn current_user_id(&self) -> i64 {
        self.current_user_id
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected(&self) -> Option<&ActiveChat> {
        self.selected.as_ref()
    }

    pub fn selected_chat_id(&self) -> Option<i64> {
        self.selected.as_ref().and_then(|s| s.chat_id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_own(&self, message: &Message) -> bool {
        message.sender_id == self.current_user_id
    }

    /// Replace the chat list with a fresh fetch. The selection keeps its
    /// identity but picks up the refreshed counterpart details.
    pub fn apply_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations
            .into_iter()
            .filter(Conversation::is_displayable)
            .collect();

        let Some(selected) = self.selected.as_mut() else { return };
        let Some(chat_id) = selected.chat_id else { return };
        if let Some(fresh) = self
            .conversations
            .iter()
            .find(|c| c.chat_id == chat_id)
            .and_then(ActiveChat::from_conversation)
        {
            *selected = fresh;
        }
    }

    /// Select a conversation from the list. Returns the chat id whose
    /// messages should be fetched next.
    pub fn select(&mut self, conv: &Conversation) -> Option<i64> {
        let next = ActiveChat::from_conversation(conv)?;
        if self.selected_chat_id() != next.chat_id {
            self.messages.clear();
        }
        self.selected = Some(next);
        Some(conv.chat_id)
    }

    /// Open a conversation with a user by id. Reuses an existing chat with
    /// that counterpart, otherwise opens an empty draft that the first send
    /// will create.
    pub fn start_conversation(
        &mut self,
        counterpart_id: i64,
        name: &str,
        image: Option<String>,
    ) -> Option<i64> {
        if !self.can_message(counterpart_id) {
            log::warn!("Refusing to open a conversation with yourself");
            return None;
        }
        if let Some(existing) = self
            .conversations
            .iter()
            .find(|c| c.other_user_id == Some(counterpart_id))
            .cloned()
        {
            return self.select(&existing);
        }
        self.messages.clear();
        self.selected = Some(ActiveChat {
            chat_id: None,
            counterpart_id,
            counterpart_name: name.to_string(),
            counterpart_image: image,
        });
        None
    }

    /// Apply a message fetch. Results for a chat other than the selected one
    /// are dropped so a slow earlier fetch cannot overwrite the current pane.
    pub fn apply_messages(&mut self, chat_id: i64, messages: Vec<Message>) -> bool {
        if self.selected_chat_id() != Some(chat_id) {
            log::debug!("Discarding messages for chat {chat_id}: no longer selected");
            return false;
        }
        self.messages = messages;
        true
    }

    /// A user can be messaged unless it is the session's own user.
    pub fn can_message(&self, user_id: i64) -> bool {
        user_id != self.current_user_id
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn can_send(&self) -> bool {
        !self.is_loading() && self.selected.is_some() && !self.draft.trim().is_empty()
    }

    /// Start a send. Returns the request to issue, or `None` when nothing
    /// should be sent: blank draft, no conversation open, or a send in flight.
    pub fn begin_send(&mut self) -> Option<SendRequest> {
        if !self.can_send() {
            return None;
        }
        let selected = self.selected.as_ref()?;
        let request = SendRequest {
            chat_id: selected.chat_id,
            sender_id: self.current_user_id,
            counterpart_id: selected.counterpart_id,
            content: self.draft.clone(),
        };
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Apply the reply to the in-flight send. A chat id created by the
    /// server is only adopted by the draft it was sent from; the user may have
    /// opened another conversation in the meantime.
    pub fn finish_send(&mut self, outcome: SendOutcome) {
        let Some(request) = self.in_flight.take() else {
            log::debug!("Ignoring send reply with no send in flight");
            return;
        };
        if !outcome.succeeded() {
            return;
        }
        self.draft.clear();

        if let (Some(selected), Some(chat_id)) = (self.selected.as_mut(), outcome.chat_id) {
            if selected.chat_id.is_none() && selected.counterpart_id == request.counterpart_id {
                selected.chat_id = Some(chat_id);
            }
        }
        if let (Some(chat_id), Some(messages)) = (outcome.chat_id, outcome.messages) {
            self.apply_messages(chat_id, messages);
        }
        if let Some(conversations) = outcome.conversations {
            self.apply_conversations(conversations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(chat_id: i64, other: i64, name: &str) -> Conversation {
        Conversation {
            chat_id,
            other_user_id: Some(other),
            other_user_name: Some(name.to_string()),
            other_user_image: None,
            last_message: None,
            last_message_time: None,
        }
    }

    fn msg(id: i64, sender_id: i64, content: &str) -> Message {
        Message {
            id,
            sender_id,
            sender_name: None,
            content: content.to_string(),
            created_at: "2024-05-01 18:30:00".to_string(),
        }
    }

    fn success(chat_id: i64) -> SendResponse {
        SendResponse {
            success: true,
            chat_id: Some(chat_id),
            message_id: Some(1),
            created_at: None,
        }
    }

    #[test]
    fn whitespace_drafts_never_produce_a_request() {
        let mut state = ChatState::new(1);
        state.apply_conversations(vec![conv(5, 2, "Anna")]);
        state.select(&conv(5, 2, "Anna"));
        for text in ["", " ", "\t", "\n  \r\n", "\u{3000}"] {
            state.set_draft(text);
            assert!(!state.can_send());
            assert!(state.begin_send().is_none());
            assert!(!state.is_loading());
        }
    }

    #[test]
    fn no_request_without_selection() {
        let mut state = ChatState::new(1);
        state.set_draft("Hi");
        assert!(state.begin_send().is_none());
    }

    #[test]
    fn loading_blocks_a_second_send() {
        let mut state = ChatState::new(1);
        state.select(&conv(5, 2, "Anna"));
        state.set_draft("Hi");
        let req = state.begin_send().unwrap();
        assert_eq!(req.chat_id, Some(5));
        assert_eq!(req.sender_id, 1);
        assert_eq!(req.counterpart_id, 2);
        assert_eq!(req.content, "Hi");
        assert!(state.is_loading());
        assert!(state.begin_send().is_none());
    }

    #[test]
    fn successful_send_clears_draft_and_applies_refetch() {
        let mut state = ChatState::new(1);
        state.apply_conversations(vec![conv(5, 2, "Anna")]);
        state.select(&conv(5, 2, "Anna"));
        state.set_draft("Hi");
        state.begin_send().unwrap();

        let mut refreshed = conv(5, 2, "Anna");
        refreshed.last_message = Some("Hi".into());
        state.finish_send(SendOutcome {
            response: Some(success(5)),
            chat_id: Some(5),
            messages: Some(vec![msg(1, 1, "Hi")]),
            conversations: Some(vec![refreshed]),
        });

        assert_eq!(state.draft(), "");
        assert!(!state.is_loading());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.conversations()[0].last_message.as_deref(), Some("Hi"));
    }

    #[test]
    fn failed_send_keeps_state() {
        let mut state = ChatState::new(1);
        state.select(&conv(5, 2, "Anna"));
        state.apply_messages(5, vec![msg(1, 2, "hey")]);
        state.set_draft("Hi");
        state.begin_send().unwrap();
        state.finish_send(SendOutcome::default());

        assert_eq!(state.draft(), "Hi");
        assert!(!state.is_loading());
        assert_eq!(state.messages(), &[msg(1, 2, "hey")]);

        state.begin_send().unwrap();
        state.finish_send(SendOutcome {
            response: Some(SendResponse::default()),
            ..SendOutcome::default()
        });
        assert_eq!(state.draft(), "Hi");
    }

    #[test]
    fn ownership_is_sender_id_only() {
        let state = ChatState::new(7);
        let mut mine = msg(1, 7, "a");
        mine.sender_name = Some("Someone else".into());
        assert!(state.is_own(&mine));
        assert!(!state.is_own(&msg(2, 8, "b")));
    }

    #[test]
    fn switching_chats_never_mixes_messages() {
        let mut state = ChatState::new(1);
        let a = conv(1, 2, "Anna");
        let b = conv(2, 3, "Dmitry");

        assert_eq!(state.select(&a), Some(1));
        assert!(state.apply_messages(1, vec![msg(1, 2, "from a")]));
        assert_eq!(state.select(&b), Some(2));
        assert!(state.messages().is_empty());

        assert!(state.apply_messages(2, vec![msg(5, 3, "from b")]));
        // A slow response for A lands after B's.
        assert!(!state.apply_messages(1, vec![msg(1, 2, "from a")]));
        assert_eq!(state.messages(), &[msg(5, 3, "from b")]);
    }

    #[test]
    fn undisplayable_conversations_are_dropped() {
        let mut state = ChatState::new(1);
        let mut nameless = conv(3, 4, "x");
        nameless.other_user_name = None;
        state.apply_conversations(vec![conv(1, 2, "Anna"), nameless.clone()]);
        assert_eq!(state.conversations().len(), 1);
        assert_eq!(state.select(&nameless), None);
        assert!(state.selected().is_none());
    }

    #[test]
    fn selection_picks_up_refreshed_details() {
        let mut state = ChatState::new(1);
        state.select(&conv(1, 2, "Anna"));
        let mut renamed = conv(1, 2, "Anna K.");
        renamed.other_user_image = Some("https://cdn.example/a.jpg".into());
        state.apply_conversations(vec![renamed]);
        let selected = state.selected().unwrap();
        assert_eq!(selected.counterpart_name, "Anna K.");
        assert_eq!(selected.chat_id, Some(1));
    }

    #[test]
    fn draft_conversation_adopts_server_chat_id() {
        let mut state = ChatState::new(1);
        assert_eq!(state.start_conversation(3, "Ekaterina", None), None);
        assert_eq!(state.selected_chat_id(), None);

        state.set_draft("Hello");
        let req = state.begin_send().unwrap();
        assert_eq!(req.chat_id, None);
        assert_eq!(req.counterpart_id, 3);

        state.finish_send(SendOutcome {
            response: Some(success(9)),
            chat_id: Some(9),
            messages: Some(vec![msg(1, 1, "Hello")]),
            conversations: Some(vec![conv(9, 3, "Ekaterina")]),
        });
        assert_eq!(state.selected_chat_id(), Some(9));
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn created_chat_id_stays_with_its_own_draft() {
        let mut state = ChatState::new(1);
        state.start_conversation(3, "Ekaterina", None);
        state.set_draft("Hello");
        state.begin_send().unwrap();

        // Another draft is opened while the first send is still pending.
        state.start_conversation(4, "Ivan", None);
        state.finish_send(SendOutcome {
            response: Some(success(9)),
            chat_id: Some(9),
            messages: Some(vec![msg(1, 1, "Hello")]),
            conversations: Some(vec![conv(9, 3, "Ekaterina")]),
        });

        let selected = state.selected().unwrap();
        assert_eq!(selected.counterpart_id, 4);
        assert_eq!(selected.chat_id, None);
        assert!(state.messages().is_empty());

        state.set_draft("Hi Ivan");
        let next = state.begin_send().unwrap();
        assert_eq!(next.chat_id, None);
        assert_eq!(next.counterpart_id, 4);

        // Going back to user 3 finds the chat the first send created.
        state.finish_send(SendOutcome::default());
        assert_eq!(state.start_conversation(3, "Ekaterina", None), Some(9));
    }

    #[test]
    fn reply_without_pending_send_is_ignored() {
        let mut state = ChatState::new(1);
        state.start_conversation(3, "Ekaterina", None);
        state.set_draft("Hello");
        state.finish_send(SendOutcome {
            response: Some(success(9)),
            chat_id: Some(9),
            ..SendOutcome::default()
        });
        assert_eq!(state.selected_chat_id(), None);
        assert_eq!(state.draft(), "Hello");
    }

    #[test]
    fn cannot_open_a_conversation_with_yourself() {
        let mut state = ChatState::new(1);
        assert!(!state.can_message(1));
        assert!(state.can_message(2));
        assert_eq!(state.start_conversation(1, "Anna", None), None);
        assert!(state.selected().is_none());

        state.start_conversation(2, "Dmitry", None);
        state.start_conversation(1, "Anna", None);
        assert_eq!(state.selected().unwrap().counterpart_id, 2);
    }

    #[test]
    fn starting_a_known_conversation_selects_it() {
        let mut state = ChatState::new(1);
        state.apply_conversations(vec![conv(4, 2, "Anna")]);
        assert_eq!(state.start_conversation(2, "Anna", None), Some(4));
        assert_eq!(state.selected_chat_id(), Some(4));
    }
}
