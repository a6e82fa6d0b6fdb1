use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(FoodId);
id_newtype!(OrderId);
id_newtype!(TicketId);
id_newtype!(TodoId);

/// A menu entry. Static display data, no lifecycle beyond render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub price: f64,
}

/// One line of an order. Pending (unconfirmed) orders carry a
/// client-generated millisecond-timestamp id; confirmed orders carry the
/// server id the backend assigned on bulk submission.
///
/// The wire field `FoodId` keeps its historical capitalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "FoodId")]
    pub food_id: FoodId,
    pub name: String,
    pub price: f64,
    pub table_no: String,
    pub qty: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

/// Repair workflow stages, serialized as the backend's Thai labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "รับเรื่องแล้ว")]
    Received,
    #[serde(rename = "รอซ่อม")]
    WaitingRepair,
    #[serde(rename = "กำลังซ่อม")]
    Repairing,
    #[serde(rename = "ซ่อมเสร็จแล้ว")]
    Repaired,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Received,
        TicketStatus::WaitingRepair,
        TicketStatus::Repairing,
        TicketStatus::Repaired,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Received => "รับเรื่องแล้ว",
            TicketStatus::WaitingRepair => "รอซ่อม",
            TicketStatus::Repairing => "กำลังซ่อม",
            TicketStatus::Repaired => "ซ่อมเสร็จแล้ว",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub machine: String,
    pub detail: String,
    pub reporter: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [TodoStatus::ToDo, TodoStatus::InProgress, TodoStatus::Done];

    pub fn label(self) -> &'static str {
        match self {
            TodoStatus::ToDo => "To Do",
            TodoStatus::InProgress => "In Progress",
            TodoStatus::Done => "Done",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub assignee: String,
    pub status: TodoStatus,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}
