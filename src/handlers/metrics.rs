use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{error::AppResult, AppState};

const BUSIEST_ITEMS: usize = 10;

// ── GET /inventory/metrics ───────────────────────────────────────────────────

pub async fn get_metrics(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let metrics = state.metrics.read().await;

    let busiest: Vec<_> = metrics
        .busiest_items(BUSIEST_ITEMS)
        .into_iter()
        .map(|(name, requests)| serde_json::json!({ "name": name, "requests": requests }))
        .collect();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "retained": metrics.len(),
            "capacity": metrics.capacity(),
            "total_recorded": metrics.total_recorded(),
            "evicted": metrics.evicted(),
            "operations": metrics.summary(),
            "busiest_items": busiest,
        })),
    ))
}

// ── GET /inventory/metrics/csv ───────────────────────────────────────────────

pub async fn export_csv(State(state): State<AppState>) -> AppResult<Response> {
    let csv = state.metrics.read().await.to_csv()?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory_requests.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

// ── DELETE /inventory/metrics ────────────────────────────────────────────────

pub async fn reset_metrics(State(state): State<AppState>) -> StatusCode {
    let mut metrics = state.metrics.write().await;
    let dropped = metrics.len();
    metrics.clear();
    tracing::info!(dropped, "Cleared metrics");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::{build_router, metrics::DEFAULT_CAPACITY, AppState};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn metrics_summarize_recorded_requests() {
        let state = AppState::new(DEFAULT_CAPACITY);
        let app = build_router(state.clone());

        app.clone()
            .oneshot(get("/inventory?name=nothing"))
            .await
            .unwrap();

        let response = app.oneshot(get("/inventory/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["retained"], 1);
        assert_eq!(json["evicted"], 0);
        assert_eq!(json["operations"][0]["operation"], "get");
        assert_eq!(json["operations"][0]["failures"], 1);
        assert_eq!(json["operations"][0]["outcomes"]["no_matches"], 1);
        assert_eq!(json["busiest_items"][0]["name"], "nothing");
    }

    #[tokio::test]
    async fn csv_export_is_an_attachment() {
        let app = build_router(AppState::new(DEFAULT_CAPACITY));
        let response = app.oneshot(get("/inventory/metrics/csv")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("at,operation,outcome,item"));
    }

    #[tokio::test]
    async fn reset_clears_entries() {
        let state = AppState::new(DEFAULT_CAPACITY);
        let app = build_router(state.clone());
        app.clone().oneshot(get("/inventory?name=x")).await.unwrap();

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/inventory/metrics")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.metrics.read().await.len(), 0);
    }
}
