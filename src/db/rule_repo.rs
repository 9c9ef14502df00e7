//! PostgreSQL rule store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use podium_common::{Money, PrizeError, PrizeResult, RuleId};
use podium_rules::prelude::*;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::store::{check_save_shape, RuleFilter, RuleStore};

/// Rule store backed by the `prize_rules` and `prize_rule_versions` tables.
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Selection columns mirrored out of the rule document.
struct RuleColumns<'a> {
    match_type: Option<&'a str>,
    game_type: Option<&'a str>,
    distribution_type: String,
    min_participants: i64,
    max_participants: i64,
    entry_fee_min: Money,
    entry_fee_max: Option<Money>,
    prize_pool_min: Money,
    prize_pool_max: Option<Money>,
    effective_from: DateTime<Utc>,
    effective_until: Option<DateTime<Utc>>,
    version: i64,
}

impl<'a> From<&'a PrizeRule> for RuleColumns<'a> {
    fn from(rule: &'a PrizeRule) -> Self {
        Self {
            match_type: rule.scope.match_type.as_specific().map(String::as_str),
            game_type: rule.scope.game_type.as_specific().map(String::as_str),
            distribution_type: rule.distribution_type.to_string(),
            min_participants: i64::from(rule.min_participants),
            max_participants: i64::from(rule.max_participants),
            entry_fee_min: rule.entry_fee_range.min,
            entry_fee_max: rule.entry_fee_range.max,
            prize_pool_min: rule.prize_pool_range.min,
            prize_pool_max: rule.prize_pool_range.max,
            effective_from: rule.effective.from,
            effective_until: rule.effective.until,
            version: i64::from(rule.version),
        }
    }
}

#[derive(FromRow)]
struct VersionRow {
    rule_id: RuleId,
    version: i64,
    snapshot: Json<PrizeRule>,
    changed_at: DateTime<Utc>,
    changed_by: String,
    reason: Option<String>,
}

impl TryFrom<VersionRow> for RuleVersion {
    type Error = PrizeError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(RuleVersion {
            rule_id: row.rule_id,
            version: stored_version(row.version)?,
            snapshot: row.snapshot.0,
            changed_at: row.changed_at,
            changed_by: row.changed_by,
            reason: row.reason,
        })
    }
}

fn stored_version(raw: i64) -> PrizeResult<u32> {
    u32::try_from(raw).map_err(|_| PrizeError::Storage(format!("Stored version {raw} out of range")))
}

fn storage(err: sqlx::Error) -> PrizeError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PrizeError::Validation("Rule already exists".to_string())
        }
        _ => PrizeError::Storage(err.to_string()),
    }
}

#[async_trait]
impl RuleStore for PgRuleStore {
    async fn find(&self, filter: &RuleFilter) -> PrizeResult<Vec<PrizeRule>> {
        // Each criterion is its own clause; none of them share a bind slot.
        let rows: Vec<Json<PrizeRule>> = match filter {
            RuleFilter::Applicable(ctx) => {
                sqlx::query_scalar::<_, Json<PrizeRule>>(
                    r#"
                    SELECT document FROM prize_rules
                    WHERE is_active
                        AND (match_type IS NULL OR match_type = $1)
                        AND (game_type IS NULL OR game_type = $2)
                        AND min_participants <= $3 AND max_participants >= $3
                        AND entry_fee_min <= $4
                        AND (entry_fee_max IS NULL OR entry_fee_max >= $4)
                        AND prize_pool_min <= $5
                        AND (prize_pool_max IS NULL OR prize_pool_max >= $5)
                        AND effective_from <= $6
                        AND (effective_until IS NULL OR effective_until >= $6)
                    ORDER BY created_at, id
                    "#,
                )
                .bind(&ctx.match_type)
                .bind(&ctx.game_type)
                .bind(i64::from(ctx.max_slots))
                .bind(ctx.entry_fee)
                .bind(ctx.prize_pool)
                .bind(ctx.now)
                .fetch_all(&self.pool)
                .await
            }
            RuleFilter::ActiveDefaults => {
                sqlx::query_scalar::<_, Json<PrizeRule>>(
                    r#"
                    SELECT document FROM prize_rules
                    WHERE is_active AND is_default
                    ORDER BY created_at, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
            RuleFilter::All => {
                sqlx::query_scalar::<_, Json<PrizeRule>>(r#"SELECT document FROM prize_rules ORDER BY created_at, id"#)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage)?;

        Ok(rows.into_iter().map(|Json(rule)| rule).collect())
    }

    async fn get(&self, id: RuleId) -> PrizeResult<Option<PrizeRule>> {
        let row: Option<Json<PrizeRule>> =
            sqlx::query_scalar(r#"SELECT document FROM prize_rules WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;

        Ok(row.map(|Json(rule)| rule))
    }

    async fn insert(&self, rule: &PrizeRule) -> PrizeResult<()> {
        if rule.version != 1 {
            return Err(PrizeError::Validation(format!(
                "New rules start at version 1 (got {})",
                rule.version
            )));
        }

        let cols = RuleColumns::from(rule);
        sqlx::query(
            r#"
            INSERT INTO prize_rules (
                id, name, match_type, game_type, distribution_type,
                min_participants, max_participants, entry_fee_min, entry_fee_max,
                prize_pool_min, prize_pool_max, effective_from, effective_until,
                priority, is_active, is_default, version, created_by,
                created_at, updated_at, document
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(cols.match_type)
        .bind(cols.game_type)
        .bind(&cols.distribution_type)
        .bind(cols.min_participants)
        .bind(cols.max_participants)
        .bind(cols.entry_fee_min)
        .bind(cols.entry_fee_max)
        .bind(cols.prize_pool_min)
        .bind(cols.prize_pool_max)
        .bind(cols.effective_from)
        .bind(cols.effective_until)
        .bind(rule.priority)
        .bind(rule.is_active)
        .bind(rule.is_default)
        .bind(cols.version)
        .bind(&rule.created_by)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .bind(Json(rule))
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        tracing::debug!(rule_id = %rule.id, "Rule inserted");
        Ok(())
    }

    async fn save(
        &self,
        rule: &PrizeRule,
        expected_version: u32,
        entry: &RuleVersion,
    ) -> PrizeResult<()> {
        check_save_shape(rule, expected_version, entry)?;

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let updated = update_if_current(&mut tx, rule, expected_version).await?;

        if updated == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar(r#"SELECT version FROM prize_rules WHERE id = $1"#)
                    .bind(rule.id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage)?;
            tx.rollback().await.map_err(storage)?;

            return match actual {
                None => Err(PrizeError::NotFound(format!("Rule {}", rule.id))),
                Some(actual) => Err(PrizeError::ConcurrentModification {
                    rule_id: rule.id,
                    expected: expected_version,
                    actual: stored_version(actual)?,
                }),
            };
        }

        sqlx::query(
            r#"
            INSERT INTO prize_rule_versions (rule_id, version, snapshot, changed_at, changed_by, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.rule_id)
        .bind(i64::from(entry.version))
        .bind(Json(&entry.snapshot))
        .bind(entry.changed_at)
        .bind(&entry.changed_by)
        .bind(&entry.reason)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        tracing::debug!(rule_id = %rule.id, version = rule.version, "Rule saved");
        Ok(())
    }

    async fn history(&self, id: RuleId) -> PrizeResult<Vec<RuleVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT rule_id, version, snapshot, changed_at, changed_by, reason
            FROM prize_rule_versions
            WHERE rule_id = $1
            ORDER BY version
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(RuleVersion::try_from).collect()
    }
}

async fn update_if_current(
    tx: &mut Transaction<'_, Postgres>,
    rule: &PrizeRule,
    expected_version: u32,
) -> PrizeResult<u64> {
    let cols = RuleColumns::from(rule);
    let result = sqlx::query(
        r#"
        UPDATE prize_rules
        SET
            name = $3,
            match_type = $4,
            game_type = $5,
            distribution_type = $6,
            min_participants = $7,
            max_participants = $8,
            entry_fee_min = $9,
            entry_fee_max = $10,
            prize_pool_min = $11,
            prize_pool_max = $12,
            effective_from = $13,
            effective_until = $14,
            priority = $15,
            is_active = $16,
            is_default = $17,
            version = $18,
            updated_at = $19,
            document = $20
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(rule.id)
    .bind(i64::from(expected_version))
    .bind(&rule.name)
    .bind(cols.match_type)
    .bind(cols.game_type)
    .bind(&cols.distribution_type)
    .bind(cols.min_participants)
    .bind(cols.max_participants)
    .bind(cols.entry_fee_min)
    .bind(cols.entry_fee_max)
    .bind(cols.prize_pool_min)
    .bind(cols.prize_pool_max)
    .bind(cols.effective_from)
    .bind(cols.effective_until)
    .bind(rule.priority)
    .bind(rule.is_active)
    .bind(rule.is_default)
    .bind(cols.version)
    .bind(rule.updated_at)
    .bind(Json(rule))
    .execute(&mut **tx)
    .await
    .map_err(storage)?;

    Ok(result.rows_affected())
}
