use serde::{Serialize, Serializer};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub client: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub priority: String,
    pub notes: String,
    pub quantity: i64,
    pub status: String,
    #[serde(serialize_with = "flag")]
    pub is_deleted: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRecord {
    /// Deleted tasks, by flag or by status, never appear in active views.
    pub fn is_active(&self) -> bool {
        self.is_deleted == 0 && self.status != "deleted"
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskProgressRecord {
    pub id: String,
    pub task_id: String,
    pub progress_text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub quantity: i64,
    pub completion_date: Option<String>,
    pub payment_status: String,
    pub notes: String,
    #[serde(serialize_with = "flag")]
    pub archived: i64,
    pub task_id: Option<String>,
}

impl ProjectRecord {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentRecord {
    pub id: String,
    pub project_id: Option<String>,
    pub amount: f64,
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccountRecord {
    pub id: String,
    pub website_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub notes: String,
    pub tag: String,
    pub account: String,
    pub row: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebsiteRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub created_at: String,
}

/// Row shape shared by the client and category lookup lists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferenceRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SettingsRecord {
    pub theme: String,
    #[serde(serialize_with = "flag")]
    pub autostart: i64,
    #[serde(serialize_with = "flag")]
    pub minimize_to_tray: i64,
    pub username: String,
    #[serde(rename = "userAvatar")]
    pub user_avatar: String,
    pub window_width: i64,
    pub window_height: i64,
    pub min_width: i64,
    pub min_height: i64,
}

/// Payment joined with the project it settles, as exported to spreadsheets.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentExportRow {
    pub id: String,
    pub project_name: Option<String>,
    pub project_type: Option<String>,
    pub quantity: Option<i64>,
    pub amount: f64,
    pub date: String,
    pub notes: String,
}

fn flag<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_bool(*value != 0)
}
