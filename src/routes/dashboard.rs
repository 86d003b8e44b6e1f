use axum::{
    extract::State,
    response::{IntoResponse, Json as AxumJson},
};

use crate::render;
use crate::AppState;

/// Current totals, net balance and recent-activity feed, pre-formatted for
/// display.
pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.dashboard.borrow().clone();
    AxumJson(render::dashboard_page(&summary))
}
