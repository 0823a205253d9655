use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use sqlx::query_builder::QueryBuilder;
use sqlx::{Any, AnyPool};
use tracing::info;
use uuid::Uuid;

use crate::db::models::{
    AccountRecord, PaymentExportRow, PaymentRecord, ProjectRecord, ReferenceRecord,
    SettingsRecord, TaskProgressRecord, TaskRecord, WebsiteRecord,
};
use crate::error::{AppError, AppResult};
use crate::ledger;

const THEMES: [&str; 2] = ["light", "dark"];

#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub include_deleted: bool,
}

#[derive(Debug, Clone)]
pub struct NewTaskInput {
    pub title: String,
    pub client: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub priority: String,
    pub notes: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub client: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<String>,
}

/// Result of a task update, including the project recorded when the task was completed.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub task: TaskRecord,
    pub converted_project: Option<ProjectRecord>,
}

#[derive(Debug, Clone)]
pub struct NewProjectInput {
    pub name: String,
    pub project_type: Option<String>,
    pub quantity: Option<i64>,
    pub completion_date: Option<String>,
    pub payment_status: Option<String>,
    pub notes: String,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub project_type: Option<String>,
    pub quantity: Option<i64>,
    pub completion_date: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentInput {
    pub project_id: Option<String>,
    pub amount: f64,
    pub date: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAccountInput {
    pub website_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub notes: String,
    pub tag: String,
    pub account: String,
    pub row: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    pub website_name: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
    pub tag: Option<String>,
    pub account: Option<String>,
    pub row: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateWebsiteInput {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub theme: Option<String>,
    pub autostart: Option<bool>,
    pub minimize_to_tray: Option<bool>,
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub window_width: Option<i64>,
    pub window_height: Option<i64>,
    pub min_width: Option<i64>,
    pub min_height: Option<i64>,
}

/// Name-keyed lookup lists backing auto-complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    Clients,
    Categories,
}

impl ReferenceList {
    fn table(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Categories => "categories",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Clients => "client",
            Self::Categories => "category",
        }
    }
}

// Tasks

pub async fn list_tasks(pool: &AnyPool, filters: TaskFilters) -> AppResult<Vec<TaskRecord>> {
    if let Some(status) = filters.status.as_deref() {
        validate_status(status)?;
    }

    if let Some(priority) = filters.priority.as_deref() {
        validate_priority(priority)?;
    }

    let mut query = QueryBuilder::<Any>::new(
        r#"
        SELECT
            id,
            title,
            client,
            category,
            deadline,
            priority,
            notes,
            quantity,
            status,
            is_deleted,
            created_at,
            updated_at
        FROM tasks
        WHERE 1 = 1
        "#,
    );

    if !filters.include_deleted {
        query.push(" AND is_deleted = 0 AND status <> 'deleted'");
    }

    if let Some(status) = filters.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }

    if let Some(priority) = filters.priority {
        query.push(" AND priority = ");
        query.push_bind(priority);
    }

    query.push(
        r#"
        ORDER BY
            CASE WHEN deadline IS NULL THEN 1 ELSE 0 END,
            deadline ASC,
            created_at ASC
        "#,
    );

    let tasks = query.build_query_as::<TaskRecord>().fetch_all(pool).await?;
    Ok(tasks)
}

pub async fn create_task(pool: &AnyPool, input: NewTaskInput) -> AppResult<TaskRecord> {
    let title = required_text(&input.title, "task title")?;
    validate_priority(&input.priority)?;
    validate_quantity(input.quantity)?;
    let deadline = normalize_optional_date(input.deadline)?;

    let now = now_timestamp();
    let task_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks (
            id,
            title,
            client,
            category,
            deadline,
            priority,
            notes,
            quantity,
            status,
            is_deleted,
            created_at,
            updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0, ?, ?)
        "#,
    )
    .bind(&task_id)
    .bind(&title)
    .bind(normalize_optional_text(input.client))
    .bind(normalize_optional_text(input.category))
    .bind(deadline)
    .bind(&input.priority)
    .bind(input.notes)
    .bind(input.quantity)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_task_record_by_id(pool, &task_id).await
}

pub async fn get_task(pool: &AnyPool, task_id: &str) -> AppResult<TaskRecord> {
    get_task_record_by_id(pool, task_id).await
}

pub async fn update_task(
    pool: &AnyPool,
    task_id: &str,
    input: UpdateTaskInput,
) -> AppResult<TaskUpdate> {
    let task = get_task_record_by_id(pool, task_id).await?;

    let title = match input.title {
        Some(value) => required_text(&value, "task title")?,
        None => task.title,
    };

    let client = match input.client {
        Some(value) => normalize_optional_text(Some(value)),
        None => task.client,
    };

    let category = match input.category {
        Some(value) => normalize_optional_text(Some(value)),
        None => task.category,
    };

    let deadline = match input.deadline {
        Some(value) => normalize_optional_date(Some(value))?,
        None => task.deadline,
    };

    let priority = match input.priority {
        Some(value) => {
            validate_priority(&value)?;
            value
        }
        None => task.priority,
    };

    let quantity = match input.quantity {
        Some(value) => {
            validate_quantity(value)?;
            value
        }
        None => task.quantity,
    };

    let status_given = input.status.is_some();
    let status = match input.status {
        Some(value) => {
            validate_status(&value)?;
            value
        }
        None => task.status,
    };

    // An explicit status other than `deleted` restores a soft-deleted task.
    let is_deleted = if !status_given {
        task.is_deleted
    } else if status == "deleted" {
        1
    } else {
        0
    };
    let notes = input.notes.unwrap_or(task.notes);
    let now = now_timestamp();

    let updated = TaskRecord {
        id: task.id,
        title,
        client,
        category,
        deadline,
        priority,
        notes,
        quantity,
        status,
        is_deleted,
        created_at: task.created_at,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE tasks
        SET
            title = ?,
            client = ?,
            category = ?,
            deadline = ?,
            priority = ?,
            notes = ?,
            quantity = ?,
            status = ?,
            is_deleted = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&updated.title)
    .bind(&updated.client)
    .bind(&updated.category)
    .bind(&updated.deadline)
    .bind(&updated.priority)
    .bind(&updated.notes)
    .bind(updated.quantity)
    .bind(&updated.status)
    .bind(updated.is_deleted)
    .bind(&updated.updated_at)
    .bind(&updated.id)
    .execute(&mut *tx)
    .await?;

    let converted_project = if updated.status == "completed" && updated.is_active() {
        convert_task_in_tx(&mut tx, &updated).await?
    } else {
        None
    };

    tx.commit().await?;

    if let Some(project) = &converted_project {
        info!(task_id = %updated.id, project_id = %project.id, "completed task recorded as project");
    }

    Ok(TaskUpdate {
        task: updated,
        converted_project,
    })
}

/// Soft delete: the row stays for history but leaves every active view.
pub async fn delete_task(pool: &AnyPool, task_id: &str) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE tasks SET is_deleted = 1, status = 'deleted', updated_at = ? WHERE id = ?",
    )
    .bind(now_timestamp())
    .bind(task_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("task '{task_id}' not found")));
    }

    Ok(())
}

/// Records a project for every completed task that does not have one yet.
pub async fn convert_completed_tasks(pool: &AnyPool) -> AppResult<Vec<ProjectRecord>> {
    let completed = sqlx::query_as::<Any, TaskRecord>(
        r#"
        SELECT
            id,
            title,
            client,
            category,
            deadline,
            priority,
            notes,
            quantity,
            status,
            is_deleted,
            created_at,
            updated_at
        FROM tasks
        WHERE status = 'completed' AND is_deleted = 0
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut tx = pool.begin().await?;
    let mut created = Vec::new();
    for task in &completed {
        if let Some(project) = convert_task_in_tx(&mut tx, task).await? {
            created.push(project);
        }
    }
    tx.commit().await?;

    if !created.is_empty() {
        info!(count = created.len(), "completed tasks recorded as projects");
    }

    Ok(created)
}

pub async fn add_task_progress(
    pool: &AnyPool,
    task_id: &str,
    progress_text: &str,
) -> AppResult<TaskProgressRecord> {
    let task = get_task_record_by_id(pool, task_id).await?;
    let text = required_text(progress_text, "progress text")?;

    let progress = TaskProgressRecord {
        id: Uuid::new_v4().to_string(),
        task_id: task.id,
        progress_text: text,
        created_at: now_timestamp(),
    };

    sqlx::query(
        r#"
        INSERT INTO task_progress (id, task_id, progress_text, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&progress.id)
    .bind(&progress.task_id)
    .bind(&progress.progress_text)
    .bind(&progress.created_at)
    .execute(pool)
    .await?;

    Ok(progress)
}

pub async fn list_task_progress(
    pool: &AnyPool,
    task_id: &str,
) -> AppResult<Vec<TaskProgressRecord>> {
    let task = get_task_record_by_id(pool, task_id).await?;

    let progress = sqlx::query_as::<Any, TaskProgressRecord>(
        r#"
        SELECT id, task_id, progress_text, created_at
        FROM task_progress
        WHERE task_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(&task.id)
    .fetch_all(pool)
    .await?;

    Ok(progress)
}

// Projects

pub async fn list_projects(pool: &AnyPool, archived: bool) -> AppResult<Vec<ProjectRecord>> {
    let projects = sqlx::query_as::<Any, ProjectRecord>(
        r#"
        SELECT
            id,
            name,
            type,
            quantity,
            completion_date,
            payment_status,
            notes,
            archived,
            task_id
        FROM projects
        WHERE archived = ?
        ORDER BY completion_date DESC
        "#,
    )
    .bind(i64::from(archived))
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn list_all_projects(pool: &AnyPool) -> AppResult<Vec<ProjectRecord>> {
    let projects = sqlx::query_as::<Any, ProjectRecord>(
        r#"
        SELECT
            id,
            name,
            type,
            quantity,
            completion_date,
            payment_status,
            notes,
            archived,
            task_id
        FROM projects
        ORDER BY completion_date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn get_project(pool: &AnyPool, project_id: &str) -> AppResult<ProjectRecord> {
    get_project_record_by_id(pool, project_id).await
}

pub async fn create_project(pool: &AnyPool, input: NewProjectInput) -> AppResult<ProjectRecord> {
    let name = required_text(&input.name, "project name")?;
    let quantity = input.quantity.unwrap_or(1);
    validate_quantity(quantity)?;
    let payment_status = input.payment_status.unwrap_or_else(|| "unpaid".to_string());
    validate_payment_status(&payment_status)?;
    let completion_date = normalize_optional_date(input.completion_date)?;

    let task_id = normalize_optional_text(input.task_id);
    if let Some(task_id) = task_id.as_deref() {
        get_task_record_by_id(pool, task_id).await?;
        if project_id_for_task(pool, task_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "task '{task_id}' is already recorded as a project"
            )));
        }
    }

    let project = ProjectRecord {
        id: Uuid::new_v4().to_string(),
        name,
        project_type: normalize_optional_text(input.project_type),
        quantity,
        completion_date,
        payment_status,
        notes: input.notes,
        archived: 0,
        task_id,
    };

    let mut tx = pool.begin().await?;
    if !insert_project(&mut tx, &project).await? {
        return Err(AppError::Conflict(format!(
            "task '{}' is already recorded as a project",
            project.task_id.as_deref().unwrap_or_default()
        )));
    }
    tx.commit().await?;

    Ok(project)
}

pub async fn update_project(
    pool: &AnyPool,
    project_id: &str,
    input: UpdateProjectInput,
) -> AppResult<ProjectRecord> {
    let project = get_project_record_by_id(pool, project_id).await?;

    let name = match input.name {
        Some(value) => required_text(&value, "project name")?,
        None => project.name,
    };

    let project_type = match input.project_type {
        Some(value) => normalize_optional_text(Some(value)),
        None => project.project_type,
    };

    let quantity = match input.quantity {
        Some(value) => {
            validate_quantity(value)?;
            value
        }
        None => project.quantity,
    };

    let completion_date = match input.completion_date {
        Some(value) => normalize_optional_date(Some(value))?,
        None => project.completion_date,
    };

    let payment_status = match input.payment_status {
        Some(value) => {
            validate_payment_status(&value)?;
            value
        }
        None => project.payment_status,
    };

    let notes = input.notes.unwrap_or(project.notes);
    let archived = input.archived.map(i64::from).unwrap_or(project.archived);

    sqlx::query(
        r#"
        UPDATE projects
        SET
            name = ?,
            type = ?,
            quantity = ?,
            completion_date = ?,
            payment_status = ?,
            notes = ?,
            archived = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(&project_type)
    .bind(quantity)
    .bind(&completion_date)
    .bind(&payment_status)
    .bind(&notes)
    .bind(archived)
    .bind(&project.id)
    .execute(pool)
    .await?;

    Ok(ProjectRecord {
        id: project.id,
        name,
        project_type,
        quantity,
        completion_date,
        payment_status,
        notes,
        archived,
        task_id: project.task_id,
    })
}

/// Settled projects keep their payments; those must be deleted first.
pub async fn delete_project(pool: &AnyPool, project_id: &str) -> AppResult<()> {
    let project = get_project_record_by_id(pool, project_id).await?;

    if project.is_paid() {
        let payment_ids = sqlx::query_scalar::<Any, String>(
            "SELECT id FROM payments WHERE project_id = ? ORDER BY date ASC",
        )
        .bind(&project.id)
        .fetch_all(pool)
        .await?;

        if !payment_ids.is_empty() {
            return Err(AppError::Conflict(format!(
                "project is settled, delete its payments first: {}",
                payment_ids.join(", ")
            )));
        }
    }

    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(&project.id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "project '{project_id}' not found"
        )));
    }

    Ok(())
}

// Payments

pub async fn list_payments(
    pool: &AnyPool,
    project_id: Option<&str>,
) -> AppResult<Vec<PaymentRecord>> {
    let mut query = QueryBuilder::<Any>::new(
        r#"
        SELECT id, project_id, amount, date, notes
        FROM payments
        "#,
    );

    if let Some(project_id) = project_id {
        query.push(" WHERE project_id = ");
        query.push_bind(project_id.to_string());
    }

    query.push(" ORDER BY date DESC");

    let payments = query
        .build_query_as::<PaymentRecord>()
        .fetch_all(pool)
        .await?;
    Ok(payments)
}

pub async fn get_payment(pool: &AnyPool, payment_id: &str) -> AppResult<PaymentRecord> {
    let payment = sqlx::query_as::<Any, PaymentRecord>(
        r#"
        SELECT id, project_id, amount, date, notes
        FROM payments
        WHERE id = ?
        "#,
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("payment '{payment_id}' not found")))?;

    Ok(payment)
}

/// Records a payment and marks the linked project as paid.
pub async fn create_payment(pool: &AnyPool, input: NewPaymentInput) -> AppResult<PaymentRecord> {
    validate_amount(input.amount)?;
    let date = match normalize_optional_date(input.date)? {
        Some(date) => date,
        None => today_date(),
    };
    let project_id = normalize_optional_text(input.project_id);

    let payment = PaymentRecord {
        id: Uuid::new_v4().to_string(),
        project_id,
        amount: input.amount,
        date,
        notes: input.notes,
    };

    let mut tx = pool.begin().await?;

    if let Some(project_id) = payment.project_id.as_deref() {
        let exists = sqlx::query_scalar::<Any, String>("SELECT id FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!(
                "project '{project_id}' not found"
            )));
        }

        let existing_payment =
            sqlx::query_scalar::<Any, String>("SELECT id FROM payments WHERE project_id = ?")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing_payment.is_some() {
            return Err(AppError::Conflict(format!(
                "project '{project_id}' is already settled"
            )));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO payments (id, project_id, amount, date, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.project_id)
    .bind(payment.amount)
    .bind(&payment.date)
    .bind(&payment.notes)
    .execute(&mut *tx)
    .await?;

    if let Some(project_id) = payment.project_id.as_deref() {
        sqlx::query("UPDATE projects SET payment_status = 'paid' WHERE id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(payment_id = %payment.id, project_id = ?payment.project_id, amount = payment.amount, "payment recorded");
    Ok(payment)
}

pub async fn update_payment(
    pool: &AnyPool,
    payment_id: &str,
    input: UpdatePaymentInput,
) -> AppResult<PaymentRecord> {
    let payment = get_payment(pool, payment_id).await?;

    let amount = match input.amount {
        Some(value) => {
            validate_amount(value)?;
            value
        }
        None => payment.amount,
    };

    let date = match input.date {
        Some(value) => normalize_date(&value)?,
        None => payment.date,
    };

    let notes = input.notes.unwrap_or(payment.notes);

    sqlx::query("UPDATE payments SET amount = ?, date = ?, notes = ? WHERE id = ?")
        .bind(amount)
        .bind(&date)
        .bind(&notes)
        .bind(&payment.id)
        .execute(pool)
        .await?;

    Ok(PaymentRecord {
        id: payment.id,
        project_id: payment.project_id,
        amount,
        date,
        notes,
    })
}

/// Deletes a payment; the project reverts to unpaid once no payment remains.
pub async fn delete_payment(pool: &AnyPool, payment_id: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let project_id = sqlx::query_scalar::<Any, Option<String>>(
        "SELECT project_id FROM payments WHERE id = ?",
    )
    .bind(payment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("payment '{payment_id}' not found")))?;

    sqlx::query("DELETE FROM payments WHERE id = ?")
        .bind(payment_id)
        .execute(&mut *tx)
        .await?;

    if let Some(project_id) = project_id.as_deref() {
        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&mut *tx)
                .await?;

        if remaining == 0 {
            sqlx::query("UPDATE projects SET payment_status = 'unpaid' WHERE id = ?")
                .bind(project_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_payment_export_rows(pool: &AnyPool) -> AppResult<Vec<PaymentExportRow>> {
    let rows = sqlx::query_as::<Any, PaymentExportRow>(
        r#"
        SELECT
            p.id,
            pr.name AS project_name,
            pr.type AS project_type,
            pr.quantity,
            p.amount,
            p.date,
            p.notes
        FROM payments p
        LEFT JOIN projects pr ON pr.id = p.project_id
        ORDER BY p.date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// Accounts

pub async fn list_accounts(pool: &AnyPool, tag: Option<&str>) -> AppResult<Vec<AccountRecord>> {
    let mut query = QueryBuilder::<Any>::new(
        r#"
        SELECT
            id,
            website_name,
            url,
            username,
            password,
            notes,
            tag,
            account,
            "row",
            created_at
        FROM accounts
        "#,
    );

    if let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) {
        query.push(" WHERE tag = ");
        query.push_bind(tag.to_string());
    }

    query.push(" ORDER BY website_name ASC");

    let accounts = query
        .build_query_as::<AccountRecord>()
        .fetch_all(pool)
        .await?;
    Ok(accounts)
}

pub async fn create_account(pool: &AnyPool, input: NewAccountInput) -> AppResult<AccountRecord> {
    let account = AccountRecord {
        id: Uuid::new_v4().to_string(),
        website_name: required_text(&input.website_name, "website name")?,
        url: input.url,
        username: input.username,
        password: input.password,
        notes: input.notes,
        tag: input.tag,
        account: input.account,
        row: input.row,
        created_at: now_timestamp(),
    };

    sqlx::query(
        r#"
        INSERT INTO accounts (
            id,
            website_name,
            url,
            username,
            password,
            notes,
            tag,
            account,
            "row",
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.id)
    .bind(&account.website_name)
    .bind(&account.url)
    .bind(&account.username)
    .bind(&account.password)
    .bind(&account.notes)
    .bind(&account.tag)
    .bind(&account.account)
    .bind(&account.row)
    .bind(&account.created_at)
    .execute(pool)
    .await?;

    Ok(account)
}

pub async fn update_account(
    pool: &AnyPool,
    account_id: &str,
    input: UpdateAccountInput,
) -> AppResult<AccountRecord> {
    let existing = get_account_record_by_id(pool, account_id).await?;

    let website_name = match input.website_name {
        Some(value) => required_text(&value, "website name")?,
        None => existing.website_name,
    };

    let account = AccountRecord {
        id: existing.id,
        website_name,
        url: input.url.unwrap_or(existing.url),
        username: input.username.unwrap_or(existing.username),
        password: input.password.unwrap_or(existing.password),
        notes: input.notes.unwrap_or(existing.notes),
        tag: input.tag.unwrap_or(existing.tag),
        account: input.account.unwrap_or(existing.account),
        row: input.row.unwrap_or(existing.row),
        created_at: existing.created_at,
    };

    sqlx::query(
        r#"
        UPDATE accounts
        SET
            website_name = ?,
            url = ?,
            username = ?,
            password = ?,
            notes = ?,
            tag = ?,
            account = ?,
            "row" = ?
        WHERE id = ?
        "#,
    )
    .bind(&account.website_name)
    .bind(&account.url)
    .bind(&account.username)
    .bind(&account.password)
    .bind(&account.notes)
    .bind(&account.tag)
    .bind(&account.account)
    .bind(&account.row)
    .bind(&account.id)
    .execute(pool)
    .await?;

    Ok(account)
}

pub async fn delete_account(pool: &AnyPool, account_id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(account_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "account '{account_id}' not found"
        )));
    }

    Ok(())
}

// Websites

pub async fn list_websites(pool: &AnyPool) -> AppResult<Vec<WebsiteRecord>> {
    let websites = sqlx::query_as::<Any, WebsiteRecord>(
        r#"
        SELECT id, name, url, description, created_at
        FROM websites
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(websites)
}

pub async fn create_website(
    pool: &AnyPool,
    name: &str,
    url: String,
    description: String,
) -> AppResult<WebsiteRecord> {
    let website = WebsiteRecord {
        id: Uuid::new_v4().to_string(),
        name: required_text(name, "website name")?,
        url,
        description,
        created_at: now_timestamp(),
    };

    sqlx::query(
        r#"
        INSERT INTO websites (id, name, url, description, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&website.id)
    .bind(&website.name)
    .bind(&website.url)
    .bind(&website.description)
    .bind(&website.created_at)
    .execute(pool)
    .await
    .map_err(|error| duplicate_name(error, "website", &website.name))?;

    Ok(website)
}

pub async fn update_website(
    pool: &AnyPool,
    website_id: &str,
    input: UpdateWebsiteInput,
) -> AppResult<WebsiteRecord> {
    let existing = sqlx::query_as::<Any, WebsiteRecord>(
        r#"
        SELECT id, name, url, description, created_at
        FROM websites
        WHERE id = ?
        "#,
    )
    .bind(website_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("website '{website_id}' not found")))?;

    let name = match input.name {
        Some(value) => required_text(&value, "website name")?,
        None => existing.name,
    };

    let website = WebsiteRecord {
        id: existing.id,
        name,
        url: input.url.unwrap_or(existing.url),
        description: input.description.unwrap_or(existing.description),
        created_at: existing.created_at,
    };

    sqlx::query("UPDATE websites SET name = ?, url = ?, description = ? WHERE id = ?")
        .bind(&website.name)
        .bind(&website.url)
        .bind(&website.description)
        .bind(&website.id)
        .execute(pool)
        .await
        .map_err(|error| duplicate_name(error, "website", &website.name))?;

    Ok(website)
}

/// Websites still referenced by an account cannot be deleted.
pub async fn delete_website(pool: &AnyPool, website_id: &str) -> AppResult<()> {
    let name = sqlx::query_scalar::<Any, String>("SELECT name FROM websites WHERE id = ?")
        .bind(website_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("website '{website_id}' not found")))?;

    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE website_name = ?")
        .bind(&name)
        .fetch_one(pool)
        .await?;

    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "website '{name}' is used by {in_use} account(s)"
        )));
    }

    sqlx::query("DELETE FROM websites WHERE id = ?")
        .bind(website_id)
        .execute(pool)
        .await?;

    Ok(())
}

// Clients and categories

pub async fn list_references(
    pool: &AnyPool,
    list: ReferenceList,
) -> AppResult<Vec<ReferenceRecord>> {
    let sql = format!(
        "SELECT id, name, created_at FROM {} ORDER BY name ASC",
        list.table()
    );

    let records = sqlx::query_as::<Any, ReferenceRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(records)
}

pub async fn create_reference(
    pool: &AnyPool,
    list: ReferenceList,
    name: &str,
) -> AppResult<ReferenceRecord> {
    let record = ReferenceRecord {
        id: Uuid::new_v4().to_string(),
        name: required_text(name, &format!("{} name", list.label()))?,
        created_at: now_timestamp(),
    };

    let sql = format!(
        "INSERT INTO {} (id, name, created_at) VALUES (?, ?, ?)",
        list.table()
    );

    sqlx::query(&sql)
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.created_at)
        .execute(pool)
        .await
        .map_err(|error| duplicate_name(error, list.label(), &record.name))?;

    Ok(record)
}

pub async fn delete_reference(pool: &AnyPool, list: ReferenceList, id: &str) -> AppResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?", list.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} '{id}' not found",
            list.label()
        )));
    }

    Ok(())
}

// Settings

pub async fn get_settings(pool: &AnyPool) -> AppResult<SettingsRecord> {
    sqlx::query("INSERT INTO settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
        .execute(pool)
        .await?;

    let settings = sqlx::query_as::<Any, SettingsRecord>(
        r#"
        SELECT
            theme,
            autostart,
            minimize_to_tray,
            username,
            user_avatar,
            window_width,
            window_height,
            min_width,
            min_height
        FROM settings
        WHERE id = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(settings)
}

pub async fn update_settings(
    pool: &AnyPool,
    input: UpdateSettingsInput,
) -> AppResult<SettingsRecord> {
    let current = get_settings(pool).await?;

    let theme = match input.theme {
        Some(value) => {
            let theme = value.trim().to_ascii_lowercase();
            if !THEMES.contains(&theme.as_str()) {
                return Err(AppError::BadRequest(format!("invalid theme '{value}'")));
            }
            theme
        }
        None => current.theme,
    };

    let window_width = positive_dimension(input.window_width, current.window_width, "window_width")?;
    let window_height =
        positive_dimension(input.window_height, current.window_height, "window_height")?;
    let min_width = positive_dimension(input.min_width, current.min_width, "min_width")?;
    let min_height = positive_dimension(input.min_height, current.min_height, "min_height")?;

    let settings = SettingsRecord {
        theme,
        autostart: input.autostart.map(i64::from).unwrap_or(current.autostart),
        minimize_to_tray: input
            .minimize_to_tray
            .map(i64::from)
            .unwrap_or(current.minimize_to_tray),
        username: input
            .username
            .map(|value| value.trim().to_string())
            .unwrap_or(current.username),
        user_avatar: input.user_avatar.unwrap_or(current.user_avatar),
        window_width,
        window_height,
        min_width,
        min_height,
    };

    sqlx::query(
        r#"
        UPDATE settings
        SET
            theme = ?,
            autostart = ?,
            minimize_to_tray = ?,
            username = ?,
            user_avatar = ?,
            window_width = ?,
            window_height = ?,
            min_width = ?,
            min_height = ?
        WHERE id = 1
        "#,
    )
    .bind(&settings.theme)
    .bind(settings.autostart)
    .bind(settings.minimize_to_tray)
    .bind(&settings.username)
    .bind(&settings.user_avatar)
    .bind(settings.window_width)
    .bind(settings.window_height)
    .bind(settings.min_width)
    .bind(settings.min_height)
    .execute(pool)
    .await?;

    Ok(settings)
}

// Helpers

async fn convert_task_in_tx(
    tx: &mut sqlx::Transaction<'_, Any>,
    task: &TaskRecord,
) -> AppResult<Option<ProjectRecord>> {
    let existing = sqlx::query_scalar::<Any, String>("SELECT id FROM projects WHERE task_id = ?")
        .bind(&task.id)
        .fetch_optional(&mut **tx)
        .await?;

    if existing.is_some() {
        return Ok(None);
    }

    let draft = ledger::project_for_completed_task(task);
    let project = ProjectRecord {
        id: Uuid::new_v4().to_string(),
        name: draft.name,
        project_type: Some(draft.project_type),
        quantity: draft.quantity,
        completion_date: Some(today_date()),
        payment_status: "unpaid".to_string(),
        notes: draft.notes,
        archived: 0,
        task_id: Some(draft.task_id),
    };

    // A concurrent completion may have recorded the task since the check above.
    if !insert_project(tx, &project).await? {
        return Ok(None);
    }
    Ok(Some(project))
}

/// Returns `false` when another project already references the same task.
async fn insert_project(
    tx: &mut sqlx::Transaction<'_, Any>,
    project: &ProjectRecord,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO projects (
            id,
            name,
            type,
            quantity,
            completion_date,
            payment_status,
            notes,
            archived,
            task_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (task_id) WHERE task_id IS NOT NULL DO NOTHING
        "#,
    )
    .bind(&project.id)
    .bind(&project.name)
    .bind(&project.project_type)
    .bind(project.quantity)
    .bind(&project.completion_date)
    .bind(&project.payment_status)
    .bind(&project.notes)
    .bind(project.archived)
    .bind(&project.task_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn project_id_for_task(pool: &AnyPool, task_id: &str) -> AppResult<Option<String>> {
    let project_id = sqlx::query_scalar::<Any, String>("SELECT id FROM projects WHERE task_id = ?")
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
    Ok(project_id)
}

async fn get_task_record_by_id(pool: &AnyPool, task_id: &str) -> AppResult<TaskRecord> {
    let task = sqlx::query_as::<Any, TaskRecord>(
        r#"
        SELECT
            id,
            title,
            client,
            category,
            deadline,
            priority,
            notes,
            quantity,
            status,
            is_deleted,
            created_at,
            updated_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("task '{task_id}' not found")))?;

    Ok(task)
}

async fn get_project_record_by_id(pool: &AnyPool, project_id: &str) -> AppResult<ProjectRecord> {
    let project = sqlx::query_as::<Any, ProjectRecord>(
        r#"
        SELECT
            id,
            name,
            type,
            quantity,
            completion_date,
            payment_status,
            notes,
            archived,
            task_id
        FROM projects
        WHERE id = ?
        "#,
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' not found")))?;

    Ok(project)
}

async fn get_account_record_by_id(pool: &AnyPool, account_id: &str) -> AppResult<AccountRecord> {
    let account = sqlx::query_as::<Any, AccountRecord>(
        r#"
        SELECT
            id,
            website_name,
            url,
            username,
            password,
            notes,
            tag,
            account,
            "row",
            created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("account '{account_id}' not found")))?;

    Ok(account)
}

fn duplicate_name(error: sqlx::Error, label: &str, name: &str) -> AppError {
    match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict(format!("{label} '{name}' already exists")),
        other => other,
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn today_date() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn required_text(value: &str, label: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{label} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn normalize_date(value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| AppError::BadRequest(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

fn normalize_optional_date(value: Option<String>) -> AppResult<Option<String>> {
    match normalize_optional_text(value) {
        Some(date) => normalize_date(&date).map(Some),
        None => Ok(None),
    }
}

fn positive_dimension(value: Option<i64>, current: i64, key: &str) -> AppResult<i64> {
    match value {
        Some(value) if value <= 0 => Err(AppError::BadRequest(format!(
            "{key} must be greater than 0"
        ))),
        Some(value) => Ok(value),
        None => Ok(current),
    }
}

fn validate_status(value: &str) -> AppResult<()> {
    match value {
        "pending" | "in-progress" | "completed" | "deleted" => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "invalid task status '{value}'"
        ))),
    }
}

fn validate_priority(value: &str) -> AppResult<()> {
    match value {
        "low" | "medium" | "high" => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "invalid task priority '{value}'"
        ))),
    }
}

fn validate_payment_status(value: &str) -> AppResult<()> {
    match value {
        "paid" | "unpaid" => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "invalid payment status '{value}'"
        ))),
    }
}

fn validate_quantity(value: i64) -> AppResult<()> {
    if value < 1 {
        return Err(AppError::BadRequest(
            "quantity must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_amount(value: f64) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(
            "amount must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
