use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::AppState;

#[derive(Deserialize)]
pub struct ExportParams {
    pub collection: String,
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> impl IntoResponse {
    let (body, disposition) = match params.collection.as_str() {
        "donations" => {
            let list = state.store.donations().recent(usize::MAX).await;
            let mut w = String::new();
            w.push_str("id,date,donor_name,amount,notes,image_url\n");
            for d in list {
                let amount = format!("{:.2}", d.amount);
                let notes = d.notes.clone().unwrap_or_default();
                let image_url = d.image_url.clone().unwrap_or_default();
                w.push_str(&format!(
                    "{},{},{},{},{},{}\n",
                    csv_escape(&d.id),
                    csv_escape(&d.date.to_rfc3339()),
                    csv_escape(&d.donor_name),
                    csv_escape(&amount),
                    csv_escape(&notes),
                    csv_escape(&image_url),
                ));
            }
            (
                w,
                HeaderValue::from_static("attachment; filename=donations.csv"),
            )
        }
        "expenses" => {
            let list = state.store.expenses().recent(usize::MAX).await;
            let mut w = String::new();
            w.push_str("id,date,description,category,amount,image_url\n");
            for e in list {
                let amount = format!("{:.2}", e.amount);
                let category = e.category.clone().unwrap_or_default();
                let image_url = e.image_url.clone().unwrap_or_default();
                w.push_str(&format!(
                    "{},{},{},{},{},{}\n",
                    csv_escape(&e.id),
                    csv_escape(&e.date.to_rfc3339()),
                    csv_escape(&e.description),
                    csv_escape(&category),
                    csv_escape(&amount),
                    csv_escape(&image_url),
                ));
            }
            (
                w,
                HeaderValue::from_static("attachment; filename=expenses.csv"),
            )
        }
        _ => return (StatusCode::BAD_REQUEST, "Unknown collection").into_response(),
    };

    let mut resp = Response::new(body.into());
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escape_quotes_fields_with_separators() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
