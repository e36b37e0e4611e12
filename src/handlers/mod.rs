pub mod inventory;
pub mod metrics;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let items = state.inventory.read().await.len();
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "inventory-tracker", "items": items })),
    )
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::{build_router, metrics::DEFAULT_CAPACITY};

    #[tokio::test]
    async fn health_reports_item_count() {
        let state = AppState::new(DEFAULT_CAPACITY);
        state
            .inventory
            .write()
            .await
            .add(crate::models::NewItem {
                name: "rice".to_string(),
                category: "grain".to_string(),
                quantity: 4,
                unit: "bags".to_string(),
                expiry_date: None,
            })
            .unwrap();

        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["items"], 1);
    }
}
