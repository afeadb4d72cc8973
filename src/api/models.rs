use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A two-party chat as returned by `?action=list`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub chat_id: i64,
    pub other_user_id: Option<i64>,
    pub other_user_name: Option<String>,
    pub other_user_image: Option<String>,
    pub last_message: Option<String>,
    pub last_message_time: Option<String>,
}

impl Conversation {
    /// Only chats with a known counterpart can be listed or opened.
    pub fn is_displayable(&self) -> bool {
        self.other_user_id.is_some()
            && self
                .other_user_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of a `send` POST. `chat_id` is `None` when the conversation does
/// not exist yet; the endpoint then creates it for the two users.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub chat_id: Option<i64>,
    pub sender_id: i64,
    pub counterpart_id: i64,
    pub content: String,
}

impl SendRequest {
    pub fn body(&self) -> Value {
        let mut body = serde_json::json!({
            "action": "send",
            "user1Id": self.sender_id.to_string(),
            "user2Id": self.counterpart_id.to_string(),
            "senderId": self.sender_id.to_string(),
            "content": self.content,
        });
        if let Some(chat_id) = self.chat_id {
            body["chatId"] = Value::from(chat_id);
        }
        body
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    pub chat_id: Option<i64>,
    pub message_id: Option<i64>,
    pub created_at: Option<String>,
}

/// Pull `key` out of a response object as a list. A missing, `null` or
/// non-array field is an empty list and entries that fail to decode are
/// skipped.
pub fn list_field<T: DeserializeOwned>(json: &Value, key: &str) -> Vec<T> {
    let Some(items) = json.get(key).and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::debug!("Skipping malformed {key} entry: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_chats_is_an_empty_list() {
        let chats: Vec<Conversation> = list_field(&json!({ "chats": null }), "chats");
        assert!(chats.is_empty());
        let chats: Vec<Conversation> = list_field(&json!({}), "chats");
        assert!(chats.is_empty());
        let chats: Vec<Conversation> = list_field(&json!({ "chats": "nope" }), "chats");
        assert!(chats.is_empty());
    }

    #[test]
    fn parses_chat_list_and_skips_broken_rows() {
        let body = json!({
            "chats": [
                {
                    "chatId": 5,
                    "otherUserId": 2,
                    "otherUserName": "Anna",
                    "otherUserImage": "https://cdn.example/anna.jpg",
                    "lastMessage": "See you",
                    "lastMessageTime": "2024-05-01 18:30:00.123456"
                },
                { "chatId": 6, "otherUserId": 3, "otherUserName": "Dmitry", "lastMessage": null, "lastMessageTime": null },
                { "otherUserName": "no id" }
            ]
        });
        let chats: Vec<Conversation> = list_field(&body, "chats");
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].chat_id, 5);
        assert_eq!(chats[0].last_message.as_deref(), Some("See you"));
        assert_eq!(chats[1].last_message, None);
    }

    #[test]
    fn displayable_needs_counterpart_id_and_name() {
        let mut conv = Conversation {
            chat_id: 1,
            other_user_id: Some(2),
            other_user_name: Some("Anna".into()),
            other_user_image: None,
            last_message: None,
            last_message_time: None,
        };
        assert!(conv.is_displayable());
        conv.other_user_name = Some("  ".into());
        assert!(!conv.is_displayable());
        conv.other_user_name = Some("Anna".into());
        conv.other_user_id = None;
        assert!(!conv.is_displayable());
    }

    #[test]
    fn parses_messages() {
        let body = json!({
            "messages": [
                { "id": 10, "senderId": 1, "senderName": "Me", "content": "Hi", "createdAt": "2024-05-01 18:30:00" },
                { "id": 11, "senderId": 2, "senderName": "Anna", "content": "Hello", "createdAt": "2024-05-01 18:31:00" }
            ]
        });
        let messages: Vec<Message> = list_field(&body, "messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender_id, 2);
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn null_content_keeps_the_message() {
        let body = json!({
            "messages": [
                { "id": 12, "senderId": 2, "content": null, "createdAt": null },
                { "id": 13, "senderId": 1, "content": "Still here", "createdAt": "2024-05-01 18:32:00" }
            ]
        });
        let messages: Vec<Message> = list_field(&body, "messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 12);
        assert_eq!(messages[0].content, "");
        assert_eq!(messages[0].created_at, "");
    }

    #[test]
    fn send_body_uses_string_user_ids() {
        let req = SendRequest {
            chat_id: Some(5),
            sender_id: 1,
            counterpart_id: 2,
            content: "Hi".into(),
        };
        assert_eq!(
            req.body(),
            json!({
                "action": "send",
                "chatId": 5,
                "user1Id": "1",
                "user2Id": "2",
                "senderId": "1",
                "content": "Hi"
            })
        );
    }

    #[test]
    fn send_body_omits_chat_id_for_new_conversations() {
        let req = SendRequest {
            chat_id: None,
            sender_id: 1,
            counterpart_id: 3,
            content: "Hello there".into(),
        };
        assert!(req.body().get("chatId").is_none());
    }

    #[test]
    fn send_response_defaults_to_failure() {
        let resp: SendResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!resp.success);
        let resp: SendResponse = serde_json::from_value(json!({ "success": null })).unwrap();
        assert!(!resp.success);
        let resp: SendResponse =
            serde_json::from_value(json!({ "success": true, "chatId": 5, "messageId": 99 })).unwrap();
        assert!(resp.success);
        assert_eq!(resp.chat_id, Some(5));
    }
}
