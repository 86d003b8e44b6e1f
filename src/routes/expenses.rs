use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};
use serde::Deserialize;

use crate::images::ImageUpload;
use crate::ledger::NewExpense;
use crate::model::parse_amount;
use crate::routes::bad_field;
use crate::store::PAGE_LIMIT;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

pub async fn create_expense(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut description = String::new();
    let mut amount: Option<f64> = None;
    let mut category: Option<String> = None;
    let mut image: Option<ImageUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("malformed expense form: {e}");
                return (StatusCode::BAD_REQUEST, "Malformed form data").into_response();
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "description" => match field.text().await {
                Ok(value) => description = value,
                Err(e) => return bad_field("description", e),
            },
            "amount" => match field.text().await {
                Ok(value) => match parse_amount(&value) {
                    Some(parsed) => amount = Some(parsed),
                    None => return (StatusCode::BAD_REQUEST, "Invalid amount").into_response(),
                },
                Err(e) => return bad_field("amount", e),
            },
            "category" => match field.text().await {
                Ok(value) => category = Some(value).filter(|v| !v.trim().is_empty()),
                Err(e) => return bad_field("category", e),
            },
            "image" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => {
                        image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                    Ok(_) => {}
                    Err(e) => return bad_field("image", e),
                }
            }
            _ => {}
        }
    }

    let Some(amount) = amount else {
        return (StatusCode::BAD_REQUEST, "Invalid amount").into_response();
    };

    let new = NewExpense {
        description,
        amount,
        category,
        image,
    };
    match state.ledger.record_expense(new).await {
        Ok(expense) => (
            StatusCode::CREATED,
            AxumJson(serde_json::json!({ "status": "created", "expense": expense })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Expense write failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage Error").into_response()
        }
    }
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(PAGE_LIMIT).min(PAGE_LIMIT);
    let expenses = state.store.expenses().recent(limit).await;
    AxumJson(serde_json::json!({ "expenses": expenses }))
}
