use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::require_any_field;
use crate::db::models::PaymentRecord;
use crate::db::queries;
use crate::db::queries::{NewPaymentInput, UpdatePaymentInput};
use crate::error::{AppError, AppResult};
use crate::report::{payment_stats, PaymentPeriod, PaymentStats};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/stats", get(get_payment_stats))
        .route(
            "/payments/{payment_id}",
            get(get_payment)
                .patch(update_payment)
                .delete(delete_payment),
        )
}

#[derive(Debug, Deserialize)]
struct PaymentListQuery {
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentStatsQuery {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentRequest {
    project_id: Option<String>,
    amount: f64,
    date: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatePaymentRequest {
    amount: Option<f64>,
    date: Option<String>,
    notes: Option<String>,
}

async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<Vec<PaymentRecord>>> {
    let payments = queries::list_payments(&state.db, query.project_id.as_deref()).await?;
    Ok(Json(payments))
}

async fn get_payment_stats(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatsQuery>,
) -> AppResult<Json<PaymentStats>> {
    let token = query.period.unwrap_or_else(|| "all".to_string());
    let period = PaymentPeriod::parse(&token).ok_or_else(|| {
        AppError::BadRequest(format!(
            "invalid payment period '{token}', expected 'all' or a four-digit year"
        ))
    })?;

    let payments = queries::list_payments(&state.db, None).await?;
    Ok(Json(payment_stats(payments, period)))
}

async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentRecord>)> {
    let payment = queries::create_payment(
        &state.db,
        NewPaymentInput {
            project_id: payload.project_id,
            amount: payload.amount,
            date: payload.date,
            notes: payload.notes.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> AppResult<Json<PaymentRecord>> {
    let payment = queries::get_payment(&state.db, &payment_id).await?;
    Ok(Json(payment))
}

async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> AppResult<Json<PaymentRecord>> {
    require_any_field(&[
        payload.amount.is_some(),
        payload.date.is_some(),
        payload.notes.is_some(),
    ])?;

    let payment = queries::update_payment(
        &state.db,
        &payment_id,
        UpdatePaymentInput {
            amount: payload.amount,
            date: payload.date,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(Json(payment))
}

async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> AppResult<StatusCode> {
    queries::delete_payment(&state.db, &payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::test_app;

    #[tokio::test]
    async fn settling_and_unsettling_a_project() {
        let app = test_app("api-payments").await;

        let project = app
            .server
            .post("/api/v1/projects")
            .json(&json!({ "name": "Landing page", "completion_date": "2025-03-01" }))
            .await
            .json::<Value>();
        let project_id = project["id"].as_str().expect("project id").to_string();

        let payment = app
            .server
            .post("/api/v1/payments")
            .json(&json!({ "project_id": project_id, "amount": 800.0, "date": "2025-03-05" }))
            .await;
        payment.assert_status(StatusCode::CREATED);
        let payment_id = payment.json::<Value>()["id"]
            .as_str()
            .expect("payment id")
            .to_string();

        let settled = app
            .server
            .get(&format!("/api/v1/projects/{project_id}"))
            .await
            .json::<Value>();
        assert_eq!(settled["payment_status"], "paid");

        app.server
            .post("/api/v1/payments")
            .json(&json!({ "project_id": project_id, "amount": 1.0 }))
            .await
            .assert_status(StatusCode::CONFLICT);

        app.server
            .delete(&format!("/api/v1/projects/{project_id}"))
            .await
            .assert_status(StatusCode::CONFLICT);

        app.server
            .delete(&format!("/api/v1/payments/{payment_id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let reverted = app
            .server
            .get(&format!("/api/v1/projects/{project_id}"))
            .await
            .json::<Value>();
        assert_eq!(reverted["payment_status"], "unpaid");
    }

    #[tokio::test]
    async fn stats_group_by_period() {
        let app = test_app("api-payment-stats").await;

        for (amount, date) in [(100.0, "2025-03-02"), (50.0, "2025-07-09"), (25.0, "2026-01-01")] {
            app.server
                .post("/api/v1/payments")
                .json(&json!({ "amount": amount, "date": date }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let all = app.server.get("/api/v1/payments/stats").await.json::<Value>();
        assert_eq!(all["period"], "all");
        assert_eq!(all["payment_count"], 3);
        assert_eq!(all["total_amount"], 175.0);
        assert_eq!(all["series"][0]["label"], "2025年");
        assert_eq!(all["years"], json!([2026, 2025]));

        let year = app
            .server
            .get("/api/v1/payments/stats?period=2025")
            .await
            .json::<Value>();
        assert_eq!(year["payment_count"], 2);
        assert_eq!(year["series"][1]["label"], "2025年7月");

        app.server
            .get("/api/v1/payments/stats?period=recent")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
