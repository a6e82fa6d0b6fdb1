use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Order, Ticket, TicketStatus, Todo, TodoStatus};

/// Broadcast-hub envelope. Internally tagged so payload fields sit next to
/// `type` on the wire: `{"type": "new_order", "order": {...}}`.
///
/// `init` names only the collections the hub owns; absent arrays decode as
/// empty, which matches the screens' `payload.orders || []` handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Init {
        #[serde(default)]
        orders: Vec<Order>,
        #[serde(default)]
        tickets: Vec<Ticket>,
    },
    NewOrder {
        order: Order,
    },
    NewTicket {
        ticket: Ticket,
    },
    UpdateStatus {
        ticket: Ticket,
    },
    NewTodo {
        todos: Vec<Todo>,
    },
    UpdateTodo {
        todos: Vec<Todo>,
    },
}

/// Chat frames carry no `type` tag; the room relays bare sender/text
/// objects in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderRequest {
    pub table_no: String,
    pub items: Vec<Order>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub machine: String,
    pub detail: String,
    pub reporter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    pub assignee: String,
    pub duration_days: u32,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoStatusRequest {
    pub status: TodoStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub duration_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketId;

    #[test]
    fn init_frame_with_absent_collections_decodes_empty() {
        let event: ServerEvent = serde_json::from_str(r#"{"type":"init"}"#).expect("decode");
        match event {
            ServerEvent::Init { orders, tickets } => {
                assert!(orders.is_empty());
                assert!(tickets.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn update_status_frame_carries_the_full_ticket() {
        let json = r#"{
            "type": "update_status",
            "ticket": {
                "id": 4,
                "machine": "CNC-02",
                "detail": "สายพานหลุด",
                "reporter": "สมชาย",
                "status": "กำลังซ่อม",
                "createdAt": "2024-05-01T08:30:00Z"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).expect("decode");
        match event {
            ServerEvent::UpdateStatus { ticket } => {
                assert_eq!(ticket.id, TicketId(4));
                assert_eq!(ticket.status, TicketStatus::Repairing);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_envelope_type_is_rejected() {
        let err = serde_json::from_str::<ServerEvent>(r#"{"type":"reboot"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn chat_frames_are_untagged_sender_text_objects() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"sender":"กบ","text":"สวัสดี"}"#).expect("decode");
        assert_eq!(msg.sender, "กบ");

        // An envelope frame must not pass for a chat message.
        assert!(serde_json::from_str::<ChatMessage>(
            r#"{"type":"init","sender":"x","text":"y"}"#
        )
        .is_err());
    }

    #[test]
    fn bulk_order_request_uses_table_no_field() {
        let request = BulkOrderRequest {
            table_no: "12".to_string(),
            items: Vec::new(),
        };
        let value = serde_json::to_value(&request).expect("encode");
        assert_eq!(value["tableNo"], "12");
        assert!(value["items"].as_array().expect("items").is_empty());
    }
}
