use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::application::repos::{DocumentStore, RepoError};
use crate::domain::records::{Record, RecordId, StoredRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    body: Json<Map<String, Value>>,
}

impl From<RecordRow> for StoredRecord {
    fn from(row: RecordRow) -> Self {
        Record::new(row.body.0).with_id(RecordId::from(row.id.to_string()))
    }
}

/// Identifiers that are not UUIDs cannot exist in the table.
fn parse_id(id: &RecordId) -> Option<Uuid> {
    Uuid::parse_str(id.as_str()).ok()
}

#[async_trait]
impl DocumentStore for PostgresRepositories {
    async fn find_one(&self, id: &RecordId) -> Result<Option<StoredRecord>, RepoError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, RecordRow>("SELECT id, body FROM records WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(StoredRecord::from))
    }

    async fn find_all(&self) -> Result<Vec<StoredRecord>, RepoError> {
        let rows =
            sqlx::query_as::<_, RecordRow>("SELECT id, body FROM records ORDER BY position")
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn insert_one(&self, record: &Record) -> Result<RecordId, RepoError> {
        let id: Uuid = sqlx::query_scalar("INSERT INTO records (body) VALUES ($1) RETURNING id")
            .bind(Json(record))
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(RecordId::from(id.to_string()))
    }

    async fn insert_many(&self, records: &[Record]) -> Result<Vec<RecordId>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let id: Uuid =
                sqlx::query_scalar("INSERT INTO records (body) VALUES ($1) RETURNING id")
                    .bind(Json(record))
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            ids.push(RecordId::from(id.to_string()));
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ids)
    }

    async fn replace_one(&self, id: &RecordId, record: &Record) -> Result<bool, RepoError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };

        let result = sqlx::query("UPDATE records SET body = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(record))
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn merge_one(
        &self,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<StoredRecord>, RepoError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        // `||` on two JSONB objects is a shallow merge with the right side winning.
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            UPDATE records
            SET body = body || $2
            WHERE id = $1
            RETURNING id, body
            "#,
        )
        .bind(id)
        .bind(Json(patch))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(StoredRecord::from))
    }

    async fn delete_one(&self, id: &RecordId) -> Result<bool, RepoError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
