//! Raw sqlx query helpers for the performance table.

use crate::database::models::{NewPerformance, PerformanceRecord};
use sqlx::SqlitePool;

const RECORD_COLUMNS: &str = "id, content_hash, resource_id, performance_value, accuracy_percent, modifier_flags, last_computed_at";

/// Retrieves the record for a content hash.
pub async fn find_by_hash(
    pool: &SqlitePool,
    content_hash: &str,
) -> Result<Option<PerformanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM performance WHERE content_hash = ?1");
    sqlx::query_as(&sql)
        .bind(content_hash)
        .fetch_optional(pool)
        .await
}

/// Retrieves every record carrying a beatmap id.
///
/// Fetches at most two rows: callers only need to know whether the match is unique.
pub async fn find_by_resource_id(
    pool: &SqlitePool,
    resource_id: u32,
) -> Result<Vec<PerformanceRecord>, sqlx::Error> {
    let sql =
        format!("SELECT {RECORD_COLUMNS} FROM performance WHERE resource_id = ?1 ORDER BY id LIMIT 2");
    sqlx::query_as(&sql)
        .bind(resource_id)
        .fetch_all(pool)
        .await
}

/// Inserts a record and returns its id.
///
/// Two concurrent misses for the same hash both end up here; the later write wins.
pub async fn insert_record(pool: &SqlitePool, new: &NewPerformance) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO performance (content_hash, resource_id, performance_value, accuracy_percent, modifier_flags, last_computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(content_hash) DO UPDATE SET
            resource_id = COALESCE(performance.resource_id, excluded.resource_id),
            performance_value = excluded.performance_value,
            accuracy_percent = excluded.accuracy_percent,
            modifier_flags = excluded.modifier_flags,
            last_computed_at = excluded.last_computed_at
         RETURNING id",
    )
    .bind(&new.content_hash)
    .bind(new.resource_id)
    .bind(new.performance_value)
    .bind(new.accuracy_percent)
    .bind(new.modifier_flags)
    .bind(new.computed_at)
    .fetch_one(pool)
    .await
}

/// Overwrites the computed values of an existing row, backfilling the beatmap id.
pub async fn update_record(
    pool: &SqlitePool,
    id: i64,
    new: &NewPerformance,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE performance SET
            resource_id = COALESCE(resource_id, ?1),
            performance_value = ?2,
            accuracy_percent = ?3,
            modifier_flags = ?4,
            last_computed_at = ?5
         WHERE id = ?6",
    )
    .bind(new.resource_id)
    .bind(new.performance_value)
    .bind(new.accuracy_percent)
    .bind(new.modifier_flags)
    .bind(new.computed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Sets the beatmap id on a row that does not have one yet.
pub async fn backfill_resource_id(
    pool: &SqlitePool,
    id: i64,
    resource_id: u32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE performance SET resource_id = ?1 WHERE id = ?2 AND resource_id IS NULL")
        .bind(resource_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<PerformanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM performance WHERE id = ?1");
    sqlx::query_as(&sql).bind(id).fetch_optional(pool).await
}

pub async fn count_records(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM performance")
        .fetch_one(pool)
        .await
}
