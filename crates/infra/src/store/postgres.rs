//! Postgres-backed document store.
//!
//! Documents live in a single `documents` table as JSONB, keyed by
//! `(collection, id)`. Unique values are claimed in `document_unique_keys`,
//! whose primary key `(collection, field, value)` makes the database reject a
//! duplicate claim.
//!
//! ## Error Mapping
//!
//! | Failure | PostgreSQL code | StoreError |
//! |---------|-----------------|------------|
//! | duplicate unique-key claim | `23505` | `UniqueViolation` |
//! | duplicate document id | `23505` | `VersionConflict` |
//! | stale expected version | n/a | `VersionConflict` |
//! | anything else | any | `Backend` |

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use storefront_core::{Document, ExpectedVersion};

use super::{DocumentStore, Query, StoreError, from_body, to_body};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id UUID NOT NULL,
        version BIGINT NOT NULL CHECK (version > 0),
        body JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_unique_keys (
        collection TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        document_id UUID NOT NULL,
        PRIMARY KEY (collection, field, value)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS documents_body_idx
        ON documents USING GIN (body jsonb_path_ops)
    "#,
];

/// Create the document tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Postgres-backed store for one collection.
///
/// Writes run in a transaction that locks the current row (`FOR UPDATE`)
/// before the version check, so concurrent writers serialize on the document.
pub struct PostgresDocumentStore<D> {
    pool: Arc<PgPool>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> PostgresDocumentStore<D> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            _doc: PhantomData,
        }
    }
}

impl<D> Clone for PostgresDocumentStore<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> PostgresDocumentStore<D> {
    async fn claim_unique_keys(
        tx: &mut Transaction<'_, Postgres>,
        doc: &D,
        id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM document_unique_keys WHERE collection = $1 AND document_id = $2")
            .bind(D::COLLECTION)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("release_unique_keys", e))?;

        for key in doc.unique_keys() {
            sqlx::query(
                r#"
                INSERT INTO document_unique_keys (collection, field, value, document_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(D::COLLECTION)
            .bind(key.field)
            .bind(&key.value)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::UniqueViolation {
                        collection: D::COLLECTION,
                        field: key.field.to_string(),
                        value: key.value.clone(),
                    }
                } else {
                    map_sqlx_error("claim_unique_key", e)
                }
            })?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for PostgresDocumentStore<D> {
    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, id = %doc.id()), err)]
    async fn insert(&self, mut doc: D) -> Result<D, StoreError> {
        let id: Uuid = doc.id().into();
        doc.set_version(1);
        let body = to_body(&doc)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        Self::claim_unique_keys(&mut tx, &doc, id).await?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, version, body)
            VALUES ($1, $2, 1, $3)
            "#,
        )
        .bind(D::COLLECTION)
        .bind(id)
        .bind(&body)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::VersionConflict(format!("{} document {id} already exists", D::COLLECTION))
            } else {
                map_sqlx_error("insert_document", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let id: Uuid = id.into();
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_document", e))?;

        row.map(|row| {
            let body: JsonValue = row
                .try_get("body")
                .map_err(|e| map_sqlx_error("decode_document", e))?;
            from_body(body)
        })
        .transpose()
    }

    async fn find(&self, query: &Query) -> Result<Vec<D>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY id ASC
            "#,
        )
        .bind(D::COLLECTION)
        .bind(query.containment())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_documents", e))?;

        let mut bodies = Vec::with_capacity(rows.len());
        for row in rows {
            let body: JsonValue = row
                .try_get("body")
                .map_err(|e| map_sqlx_error("decode_document", e))?;
            bodies.push(body);
        }
        // Null filters and sorting are evaluated in process.
        query.apply(bodies).into_iter().map(from_body).collect()
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, id = %doc.id(), expected = ?expected), err)]
    async fn update(&self, mut doc: D, expected: ExpectedVersion) -> Result<D, StoreError> {
        let id: Uuid = doc.id().into();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            "SELECT version FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(D::COLLECTION)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_document", e))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound {
                collection: D::COLLECTION,
                id,
            });
        };
        let current: i64 = row
            .try_get("version")
            .map_err(|e| map_sqlx_error("decode_version", e))?;
        let current = current as u64;

        if !expected.matches(current) {
            return Err(StoreError::VersionConflict(format!(
                "{} document {id}: expected {expected:?}, found {current}",
                D::COLLECTION
            )));
        }

        Self::claim_unique_keys(&mut tx, &doc, id).await?;

        let next = current + 1;
        doc.set_version(next);
        let body = to_body(&doc)?;

        sqlx::query(
            r#"
            UPDATE documents
            SET version = $3, body = $4, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(D::COLLECTION)
        .bind(id)
        .bind(next as i64)
        .bind(&body)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_document", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(doc)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
