//! In-memory backend used by the facade tests
//!
//! Evaluates the same typed requests as the HTTP client against HashMap
//! tables: filter matching, `created_at` ordering, row limits, and
//! foreign-key embed resolution, so facade semantics are exercised
//! without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use super::{Backend, BackendResult, Embed, Operation, Request};

pub(crate) struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    // Each insert gets a strictly later created_at so ordering is decidable.
    ticks: AtomicI64,
}

impl MemoryBackend {
    pub(crate) fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            ticks: AtomicI64::new(0),
        }
    }

    fn next_timestamp(&self) -> String {
        let tick = self.ticks.fetch_add(1, AtomicOrdering::SeqCst);
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (base + Duration::seconds(tick)).to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn project(&self, tables: &HashMap<String, Vec<Value>>, row: &Value, embeds: &[Embed]) -> Value {
        let mut projected = row.clone();
        for embed in embeds {
            let related = self
                .resolve_embed(tables, row, embed)
                .map(|r| self.project(tables, &r, &embed.nested))
                .unwrap_or(Value::Null);
            projected[embed.relation.as_str()] = related;
        }
        projected
    }

    /// Resolve one embedded relation the way the remote API does: through
    /// `<singular>_id` when the row carries it, through the shared `id`
    /// otherwise (role-extension tables).
    fn resolve_embed(
        &self,
        tables: &HashMap<String, Vec<Value>>,
        row: &Value,
        embed: &Embed,
    ) -> Option<Value> {
        let fk_column = format!("{}_id", embed.relation.trim_end_matches('s'));
        let key = match row.get(&fk_column) {
            Some(Value::String(id)) => id.clone(),
            _ => row.get("id")?.as_str()?.to_string(),
        };
        tables
            .get(&embed.relation)?
            .iter()
            .find(|candidate| candidate.get("id").and_then(Value::as_str) == Some(key.as_str()))
            .cloned()
    }
}

fn sort_key(row: &Value, column: &str) -> Option<DateTime<Utc>> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn execute(&self, request: Request) -> BackendResult<Vec<Value>> {
        let mut tables = self.tables.lock().unwrap();

        match request.op {
            Operation::Insert { values } => {
                let mut row = values;
                if row.get("id").map_or(true, Value::is_null) {
                    row["id"] = Value::String(uuid::Uuid::new_v4().to_string());
                }
                let now = self.next_timestamp();
                for column in ["created_at", "updated_at"] {
                    if row.get(column).is_none() {
                        row[column] = Value::String(now.clone());
                    }
                }
                if request.table == "enrollments" && row.get("enrolled_at").is_none() {
                    row["enrolled_at"] = Value::String(now.clone());
                }
                tables
                    .entry(request.table.clone())
                    .or_default()
                    .push(row.clone());
                Ok(vec![self.project(&tables, &row, &request.embeds)])
            }

            Operation::Select => {
                let mut rows: Vec<Value> = tables
                    .get(&request.table)
                    .map(|rows| {
                        rows.iter()
                            .filter(|row| request.filters.iter().all(|f| f.matches(row)))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();

                if let Some(ref order) = request.order {
                    rows.sort_by_key(|row| sort_key(row, &order.column));
                    if !order.ascending {
                        rows.reverse();
                    }
                }
                if let Some(limit) = request.limit {
                    rows.truncate(limit);
                }

                Ok(rows
                    .iter()
                    .map(|row| self.project(&tables, row, &request.embeds))
                    .collect())
            }

            Operation::Update { changes } => {
                let now = self.next_timestamp();
                let mut updated = Vec::new();
                if let Some(rows) = tables.get_mut(&request.table) {
                    for row in rows.iter_mut() {
                        if !request.filters.iter().all(|f| f.matches(row)) {
                            continue;
                        }
                        if let Some(fields) = changes.as_object() {
                            for (column, value) in fields {
                                row[column.as_str()] = value.clone();
                            }
                        }
                        row["updated_at"] = Value::String(now.clone());
                        updated.push(row.clone());
                    }
                }
                Ok(updated
                    .iter()
                    .map(|row| self.project(&tables, row, &request.embeds))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Filter, Order};
    use serde_json::json;

    #[tokio::test]
    async fn insert_generates_id_and_timestamps() {
        let backend = MemoryBackend::new();
        let rows = backend
            .execute(Request::insert("courses", json!({ "name": "Algebra" })))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(rows[0]["name"], "Algebra");
    }

    #[tokio::test]
    async fn select_applies_filters_order_and_limit() {
        let backend = MemoryBackend::new();
        for (name, specialty) in [("a", "CS"), ("b", "EE"), ("c", "CS"), ("d", "CS")] {
            backend
                .execute(Request::insert(
                    "courses",
                    json!({ "name": name, "specialty": specialty }),
                ))
                .await
                .unwrap();
        }

        let rows = backend
            .execute(
                Request::select("courses")
                    .filter(Filter::eq("specialty", "CS"))
                    .order(Order::desc("created_at"))
                    .limit(2),
            )
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn embeds_resolve_through_foreign_keys_and_shared_ids() {
        let backend = MemoryBackend::new();
        backend
            .execute(Request::insert(
                "users",
                json!({ "id": "u1", "full_name": "A B" }),
            ))
            .await
            .unwrap();
        backend
            .execute(Request::insert(
                "messages",
                json!({ "id": "m1", "user_id": "u1", "content": "hi" }),
            ))
            .await
            .unwrap();
        // Role-extension table: shares the user's id instead of a user_id column.
        backend
            .execute(Request::insert(
                "students",
                json!({ "id": "u1", "student_id": "S1" }),
            ))
            .await
            .unwrap();

        let messages = backend
            .execute(Request::select("messages").embed(Embed::table("users")))
            .await
            .unwrap();
        assert_eq!(messages[0]["users"]["full_name"], "A B");

        let students = backend
            .execute(Request::select("students").embed(Embed::table("users")))
            .await
            .unwrap();
        assert_eq!(students[0]["users"]["full_name"], "A B");
    }

    #[tokio::test]
    async fn update_merges_fields_into_matching_rows() {
        let backend = MemoryBackend::new();
        backend
            .execute(Request::insert(
                "users",
                json!({ "id": "u1", "full_name": "Old" }),
            ))
            .await
            .unwrap();

        let rows = backend
            .execute(
                Request::update("users", json!({ "full_name": "New" }))
                    .filter(Filter::eq("id", "u1")),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["full_name"], "New");

        let unchanged = backend
            .execute(
                Request::update("users", json!({ "full_name": "Other" }))
                    .filter(Filter::eq("id", "missing")),
            )
            .await
            .unwrap();
        assert!(unchanged.is_empty());
    }
}
