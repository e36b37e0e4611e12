use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// One inventory entry. The item name is the store key and is not repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub category: String,
    pub quantity: u64,
    pub unit: String,
    /// Free-form date text, stored as given
    pub expiry_date: Option<String>,
}

// ── Request payloads ─────────────────────────────────────────────────────────
//
// Bodies arrive as raw JSON so that a missing field, a wrongly-typed field
// and a bad quantity can be told apart instead of collapsing into one serde
// error.

/// Validated body of `POST /inventory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: u64,
    pub unit: String,
    pub expiry_date: Option<String>,
}

impl NewItem {
    const REQUIRED: [&'static str; 4] = ["name", "category", "quantity", "unit"];

    pub fn from_json(body: &Value) -> AppResult<Self> {
        let fields = &as_object(body);

        let missing: Vec<&str> = Self::REQUIRED
            .iter()
            .copied()
            .filter(|f| is_absent(fields, f))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MissingField(missing.join(", ")));
        }

        let name = string_field(fields, "name")?;
        let category = string_field(fields, "category")?;
        let unit = string_field(fields, "unit")?;

        let quantity = fields
            .get("quantity")
            .and_then(Value::as_u64)
            .ok_or_else(|| AppError::InvalidQuantity("a non-negative integer".to_string()))?;

        let expiry_date = match fields.get("expiry_date") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(AppError::InvalidType("expiry_date".to_string())),
        };

        Ok(Self {
            name,
            category,
            quantity,
            unit,
            expiry_date,
        })
    }

    pub fn into_record(self) -> (String, ItemRecord) {
        (
            self.name,
            ItemRecord {
                category: self.category,
                quantity: self.quantity,
                unit: self.unit,
                expiry_date: self.expiry_date,
            },
        )
    }
}

/// Validated body of `PUT /inventory`. `delta` may be negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub name: String,
    pub delta: i64,
}

impl Adjustment {
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let fields = &as_object(body);

        let missing: Vec<&str> = ["name", "quantity"]
            .into_iter()
            .filter(|f| is_absent(fields, f))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MissingField(missing.join(", ")));
        }

        let name = string_field(fields, "name")?;
        let delta = fields
            .get("quantity")
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::InvalidQuantity("an integer".to_string()))?;

        Ok(Self { name, delta })
    }
}

/// Validated body of `DELETE /inventory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub name: String,
}

impl ItemRef {
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let fields = &as_object(body);
        if is_absent(fields, "name") {
            return Err(AppError::MissingField("name".to_string()));
        }
        Ok(Self {
            name: string_field(fields, "name")?,
        })
    }
}

// ── Query parameters ──────────────────────────────────────────────────────────

/// Query of `GET /inventory`. Only the first `name` counts when the
/// parameter is repeated; other parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub name: Option<String>,
}

impl SearchParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            name: pairs
                .into_iter()
                .find(|(key, _)| key == "name")
                .map(|(_, value)| value),
        }
    }

    /// The search text, or `MissingParameter` when absent or empty.
    pub fn query(self) -> AppResult<String> {
        self.name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::MissingParameter("name".to_string()))
    }
}

// ── Field helpers ─────────────────────────────────────────────────────────────

/// Non-object bodies are treated as carrying no fields at all.
fn as_object(body: &Value) -> Map<String, Value> {
    body.as_object().cloned().unwrap_or_default()
}

/// `null` counts as present (and then fails the type check); an empty
/// `name` counts as absent.
fn is_absent(fields: &Map<String, Value>, field: &str) -> bool {
    match fields.get(field) {
        None => true,
        Some(Value::String(s)) if field == "name" => s.is_empty(),
        Some(_) => false,
    }
}

fn string_field(fields: &Map<String, Value>, field: &str) -> AppResult<String> {
    match fields.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(AppError::InvalidType(field.to_string())),
    }
}
