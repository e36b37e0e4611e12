use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    metrics::RequestRecord,
    models::{Adjustment, ItemRef, NewItem, SearchParams},
    store::{Adjusted, Lookup},
    AppState,
};

/// What a successful operation reports back to `observe`.
struct Handled {
    outcome: &'static str,
    item: String,
    /// Store size read under the same lock that performed the operation
    items_after: usize,
    response: Response,
}

/// Runs one inventory operation, times it and logs the outcome.
async fn observe<F>(state: &AppState, operation: &'static str, op: F) -> AppResult<Response>
where
    F: Future<Output = AppResult<Handled>>,
{
    let start = Instant::now();
    let result = op.await;
    let elapsed_us = start.elapsed().as_nanos() as f64 / 1_000.0;

    let (record, result) = match result {
        Ok(done) => (
            RequestRecord {
                at: Utc::now(),
                operation,
                outcome: done.outcome,
                item: Some(done.item),
                elapsed_us,
                items_after: Some(done.items_after),
                success: true,
            },
            Ok(done.response),
        ),
        Err(err) => {
            warn!(
                operation,
                kind = err.kind(),
                subject = err.subject(),
                error = %err,
                "Request rejected"
            );
            (
                RequestRecord {
                    at: Utc::now(),
                    operation,
                    outcome: err.kind(),
                    item: err.subject().map(str::to_string),
                    elapsed_us,
                    items_after: None,
                    success: false,
                },
                Err(err),
            )
        }
    };

    state.metrics.write().await.record(record);
    result
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> AppResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))
}

// ── POST /inventory ───────────────────────────────────────────────────────────

pub async fn add_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    observe(&state, "add", async {
        let item = NewItem::from_json(&json_body(body)?)?;
        let name = item.name.clone();

        let ((record, created), items_after) = {
            let mut inventory = state.inventory.write().await;
            (inventory.add(item)?, inventory.len())
        };

        info!(name = %name, quantity = record.quantity, created, "Added item");

        let (outcome, status, message) = if created {
            ("created", StatusCode::CREATED, "Item added")
        } else {
            ("updated", StatusCode::OK, "Item quantity updated")
        };
        let response = (
            status,
            Json(json!({ "message": message, "inventory": record })),
        )
            .into_response();
        Ok(Handled {
            outcome,
            item: name,
            items_after,
            response,
        })
    })
    .await
}

// ── GET /inventory?name= ──────────────────────────────────────────────────────

pub async fn get_item(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Response> {
    observe(&state, "get", async {
        let Query(pairs) =
            params.map_err(|rejection| AppError::MalformedQuery(rejection.body_text()))?;
        let query = SearchParams::from_pairs(pairs).query()?;

        let (lookup, items_after) = {
            let inventory = state.inventory.read().await;
            (inventory.get(&query)?, inventory.len())
        };

        let outcome = match &lookup {
            Lookup::Exact(_) => "exact",
            Lookup::Partial(found) => {
                info!(query = %query, matches = found.len(), "Partial name match");
                "partial"
            }
        };
        Ok(Handled {
            outcome,
            item: query,
            items_after,
            response: (StatusCode::OK, Json(lookup)).into_response(),
        })
    })
    .await
}

// ── PUT /inventory ────────────────────────────────────────────────────────────

pub async fn adjust_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    observe(&state, "adjust", async {
        let Adjustment { name, delta } = Adjustment::from_json(&json_body(body)?)?;

        let (adjusted, items_after) = {
            let mut inventory = state.inventory.write().await;
            (inventory.adjust(&name, delta)?, inventory.len())
        };

        let (outcome, response) = match adjusted {
            Adjusted::Updated(record) => {
                info!(name = %name, delta, quantity = record.quantity, "Adjusted item");
                let response = (
                    StatusCode::OK,
                    Json(json!({ "message": "Item updated", "inventory": record })),
                )
                    .into_response();
                ("updated", response)
            }
            Adjusted::Deleted => {
                info!(name = %name, delta, "Quantity reached zero, item removed");
                ("deleted", StatusCode::NO_CONTENT.into_response())
            }
        };
        Ok(Handled {
            outcome,
            item: name,
            items_after,
            response,
        })
    })
    .await
}

// ── DELETE /inventory ─────────────────────────────────────────────────────────

pub async fn delete_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    observe(&state, "delete", async {
        let ItemRef { name } = ItemRef::from_json(&json_body(body)?)?;

        let (removed, items_after) = {
            let mut inventory = state.inventory.write().await;
            (inventory.delete(&name)?, inventory.len())
        };

        info!(name = %name, quantity = removed.quantity, "Deleted item");
        Ok(Handled {
            outcome: "deleted",
            item: name,
            items_after,
            response: StatusCode::NO_CONTENT.into_response(),
        })
    })
    .await
}
