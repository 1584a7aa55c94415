//! `SQLite` implementation of [`RuleRepository`].
//!
//! Triggers and actions are stored as tagged JSON records. Reading goes
//! through the registry: nodes of unknown kind are dropped and malformed
//! fields fall back to defaults, so rules written by a newer build still
//! load.

use std::str::FromStr;

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use looprule_app::ports::RuleRepository;
use looprule_domain::automation::{Registry, Rule, Trigger};
use looprule_domain::error::{LoopRuleError, NotFoundError};
use looprule_domain::id::RuleId;
use looprule_domain::time::Timestamp;

use crate::error::StorageError;

/// A decoded row, or `None` when the row's id cannot be parsed.
struct Wrapper(Option<Rule>);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rule> {
        value.and_then(|w| w.0)
    }

    fn collect(rows: Vec<Self>) -> Vec<Rule> {
        rows.into_iter().filter_map(|w| w.0).collect()
    }
}

fn parse_json(column: &'static str, id: RuleId, raw: &str) -> Option<Value> {
    serde_json::from_str(raw)
        .inspect_err(|err| {
            tracing::warn!(rule_id = %id, column, error = %err, "unreadable rule column");
        })
        .ok()
}

fn parse_last_fired(id: RuleId, raw: &str) -> Option<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_utc())
        .inspect_err(|err| {
            tracing::warn!(rule_id = %id, error = %err, "unreadable last_fired, ignoring");
        })
        .ok()
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let trigger_json: String = row.try_get("trigger_data")?;
        let actions_json: String = row.try_get("actions")?;
        let last_fired_str: Option<String> = row.try_get("last_fired")?;

        let Ok(id) = RuleId::from_str(&raw_id) else {
            tracing::warn!(id = %raw_id, %name, "skipping rule with malformed id");
            return Ok(Self(None));
        };

        let registry = Registry::global();
        let trigger = parse_json("trigger_data", id, &trigger_json)
            .and_then(|value| registry.decode_trigger(&value))
            .unwrap_or_else(|| Trigger::And(Vec::new()));
        let actions = parse_json("actions", id, &actions_json)
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| registry.decode_actions(items))
            .unwrap_or_default();
        let last_fired = last_fired_str.and_then(|raw| parse_last_fired(id, &raw));

        Ok(Self(Some(Rule {
            id,
            name,
            enabled,
            trigger,
            actions,
            last_fired,
        })))
    }
}

fn encode(rule: &Rule) -> Result<(String, String), StorageError> {
    let trigger_json = serde_json::to_string(&rule.trigger)?;
    let actions_json = serde_json::to_string(&rule.actions)?;
    Ok((trigger_json, actions_json))
}

fn not_found(id: RuleId) -> LoopRuleError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed rule repository. Rules are listed in insertion order.
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: Rule) -> Result<Rule, LoopRuleError> {
        let (trigger_json, actions_json) = encode(&rule)?;
        let last_fired = rule.last_fired.map(|ts| ts.to_rfc3339());

        sqlx::query(
            "INSERT INTO rules (id, name, enabled, trigger_data, actions, last_fired, position) \
             VALUES (?, ?, ?, ?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM rules))",
        )
        .bind(rule.id.to_string())
        .bind(&rule.name)
        .bind(rule.enabled)
        .bind(&trigger_json)
        .bind(&actions_json)
        .bind(&last_fired)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, LoopRuleError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM rules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Rule>, LoopRuleError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM rules ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::collect(rows))
    }

    async fn get_enabled(&self) -> Result<Vec<Rule>, LoopRuleError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM rules WHERE enabled = 1 ORDER BY position")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(Wrapper::collect(rows))
    }

    async fn update(&self, rule: Rule) -> Result<Rule, LoopRuleError> {
        let (trigger_json, actions_json) = encode(&rule)?;
        let last_fired = rule.last_fired.map(|ts| ts.to_rfc3339());

        let result = sqlx::query(
            "UPDATE rules SET name = ?, enabled = ?, trigger_data = ?, actions = ?, last_fired = ? \
             WHERE id = ?",
        )
        .bind(&rule.name)
        .bind(rule.enabled)
        .bind(&trigger_json)
        .bind(&actions_json)
        .bind(&last_fired)
        .bind(rule.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(rule.id));
        }
        Ok(rule)
    }

    async fn delete(&self, id: RuleId) -> Result<(), LoopRuleError> {
        sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn record_fired(&self, id: RuleId, at: Timestamp) -> Result<(), LoopRuleError> {
        let result = sqlx::query("UPDATE rules SET last_fired = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
