//! Bookkeeping rules shared by the task, project and export paths.

use crate::db::models::TaskRecord;

/// Project type used when a completed task carries no category.
pub const COMPLETED_TASK_TYPE: &str = "已完成任务";

/// Fields of the project that records a completed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTaskProject {
    pub name: String,
    pub project_type: String,
    pub quantity: i64,
    pub notes: String,
    pub task_id: String,
}

pub fn project_for_completed_task(task: &TaskRecord) -> CompletedTaskProject {
    let project_type = task
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(COMPLETED_TASK_TYPE)
        .to_string();

    CompletedTaskProject {
        name: project_name_for_task(&task.title, task.client.as_deref()),
        project_type,
        quantity: task.quantity.max(1),
        notes: task.notes.clone(),
        task_id: task.id.clone(),
    }
}

/// `[Client] Title` when a client is known, else the bare title.
pub fn project_name_for_task(title: &str, client: Option<&str>) -> String {
    match client.map(str::trim).filter(|client| !client.is_empty()) {
        Some(client) => format!("[{client}] {title}"),
        None => title.to_string(),
    }
}

/// Splits a `[Client] Title` project name into its client tag and description.
pub fn split_client_tag(name: &str) -> (Option<&str>, &str) {
    let Some(rest) = name.strip_prefix('[') else {
        return (None, name);
    };

    match rest.split_once(']') {
        Some((client, description)) => (Some(client.trim()), description.trim()),
        None => (None, name),
    }
}
