use axum::{
    extract::{Json, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};
use serde::Deserialize;

use crate::images::ImageUpload;
use crate::ledger::NewDonation;
use crate::model::parse_amount;
use crate::routes::bad_field;
use crate::store::PAGE_LIMIT;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct ImportCsvRequest {
    pub csv: String,
}

pub async fn create_donation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut donor_name = String::new();
    let mut amount: Option<f64> = None;
    let mut notes: Option<String> = None;
    let mut image: Option<ImageUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("malformed donation form: {e}");
                return (StatusCode::BAD_REQUEST, "Malformed form data").into_response();
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "donor_name" => match field.text().await {
                Ok(value) => donor_name = value,
                Err(e) => return bad_field("donor_name", e),
            },
            "amount" => match field.text().await {
                Ok(value) => match parse_amount(&value) {
                    Some(parsed) => amount = Some(parsed),
                    None => return (StatusCode::BAD_REQUEST, "Invalid amount").into_response(),
                },
                Err(e) => return bad_field("amount", e),
            },
            "notes" => match field.text().await {
                Ok(value) => notes = Some(value).filter(|v| !v.trim().is_empty()),
                Err(e) => return bad_field("notes", e),
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

    let new = NewDonation {
        donor_name,
        amount,
        notes,
        image,
    };
    match state.ledger.record_donation(new).await {
        Ok(donation) => (
            StatusCode::CREATED,
            AxumJson(serde_json::json!({ "status": "created", "donation": donation })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Donation write failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage Error").into_response()
        }
    }
}

pub async fn list_donations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(PAGE_LIMIT).min(PAGE_LIMIT);
    let donations = state.store.donations().recent(limit).await;
    AxumJson(serde_json::json!({ "donations": donations }))
}

pub async fn import_donations(
    State(state): State<AppState>,
    Json(req): Json<ImportCsvRequest>,
) -> impl IntoResponse {
    let outcome = state.ledger.import_donations_csv(&req.csv).await;
    (StatusCode::OK, AxumJson(serde_json::json!(outcome))).into_response()
}
