// src/repositories/shortened_url.rs - Data access
use async_trait::async_trait;
use log::{debug, error};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::db::Database;
use crate::errors::RepositoryError;
use crate::hashid::{scope_hashid, HashidFilter};
use crate::models::{ShortenedUrl, ShortenedUrlQueryParams};

use super::EntityRepository;

type Result<T> = std::result::Result<T, RepositoryError>;

const TABLE: &str = "shortened_urls";

pub struct ShortenedUrlRepository {
    pool: PgPool,
    /// Column storing the hashid; validated as a bare identifier when config loads
    hashid_column: String,
}

impl ShortenedUrlRepository {
    pub fn new(db: Database, hashid_column: impl Into<String>) -> Self {
        Self {
            pool: db.get_pool().clone(),
            hashid_column: hashid_column.into(),
        }
    }

    // Helper method for transactions
    async fn begin_transaction(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start database transaction: {}", e);
            RepositoryError::Database(e)
        })
    }

    /// Column list mapping the configured hashid column onto `ShortenedUrl::hashid`
    fn columns(&self) -> String {
        format!(
            "id, {} AS hashid, original_url, created_at, last_accessed, access_count, expires_at",
            self.hashid_column
        )
    }

    fn select(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE 1=1",
            self.columns(),
            TABLE
        ))
    }

    fn visit_query(&self, id: i64) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET access_count = access_count + 1, last_accessed = NOW() WHERE id = ",
            TABLE
        ));
        builder.push_bind(id);
        builder.push(" RETURNING ").push(self.columns());
        builder
    }

    /// Counts one visit in a single statement, so concurrent redirects never lose a count
    pub async fn record_visit(&self, id: i64) -> Result<ShortenedUrl> {
        let record = self
            .visit_query(id)
            .build_query_as::<ShortenedUrl>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to record visit for URL {}: {}", id, e);
                RepositoryError::from(e)
            })?;

        record.ok_or_else(|| RepositoryError::NotFound(format!("URL with key {} not found", id)))
    }

    /// Lists shortened URLs matching the search parameters, newest first
    pub async fn search(&self, params: &ShortenedUrlQueryParams) -> Result<Vec<ShortenedUrl>> {
        let mut query_builder = self.select();

        if let Some(hashid) = &params.hashid {
            scope_hashid(&mut query_builder, &self.hashid_column, hashid);
        }

        if let Some(url) = &params.original_url {
            query_builder.push(" AND original_url LIKE ");
            query_builder.push_bind(format!("%{}%", url));
        }

        query_builder.push(" ORDER BY id DESC");

        if let Some(limit) = params.limit {
            query_builder.push(" LIMIT ");
            query_builder.push_bind(limit);
        }

        if let Some(offset) = params.offset {
            query_builder.push(" OFFSET ");
            query_builder.push_bind(offset);
        }

        let results = query_builder
            .build_query_as::<ShortenedUrl>()
            .fetch_all(&self.pool)
            .await?;

        debug!("Search {:?} matched {} URLs", params, results.len());
        Ok(results)
    }
}

#[async_trait]
impl EntityRepository for ShortenedUrlRepository {
    type Entity = ShortenedUrl;

    async fn insert(&self, url: &ShortenedUrl) -> Result<ShortenedUrl> {
        let mut tx = self.begin_transaction().await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (original_url, {}, created_at, last_accessed, access_count, expires_at) VALUES (",
            TABLE, self.hashid_column
        ));
        builder.push_bind(url.original_url.clone());
        builder.push(", ").push_bind(url.hashid.clone());
        builder.push(", ").push_bind(url.created_at);
        builder.push(", ").push_bind(url.last_accessed);
        builder.push(", ").push_bind(url.access_count);
        builder.push(", ").push_bind(url.expires_at);
        builder.push(") RETURNING ").push(self.columns());

        let record = builder
            .build_query_as::<ShortenedUrl>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert shortened URL: {}", e);
                RepositoryError::from(e)
            })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            RepositoryError::Database(e)
        })?;

        debug!("Inserted shortened URL with key {:?}", record.id);
        Ok(record)
    }

    async fn persist(&self, url: &ShortenedUrl) -> Result<ShortenedUrl> {
        let id = url.id.ok_or_else(|| {
            RepositoryError::InvalidData("Cannot persist a URL that was never inserted".into())
        })?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", TABLE));
        // an existing hashid wins over whatever the caller holds
        builder
            .push(format!(
                "{col} = COALESCE(NULLIF({col}, ''), ",
                col = self.hashid_column
            ))
            .push_bind(url.hashid.clone())
            .push(")");
        builder.push(", original_url = ").push_bind(url.original_url.clone());
        builder.push(", last_accessed = ").push_bind(url.last_accessed);
        builder.push(", access_count = ").push_bind(url.access_count);
        builder.push(", expires_at = ").push_bind(url.expires_at);
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(self.columns());

        let record = builder
            .build_query_as::<ShortenedUrl>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to persist shortened URL {}: {}", id, e);
                RepositoryError::from(e)
            })?;

        record.ok_or_else(|| RepositoryError::NotFound(format!("URL with key {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortenedUrl>> {
        let mut query_builder = self.select();
        query_builder.push(" AND id = ").push_bind(id);

        query_builder
            .build_query_as::<ShortenedUrl>()
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::Database)
    }

    async fn find_where(&self, filter: &HashidFilter) -> Result<Vec<ShortenedUrl>> {
        let mut query_builder = self.select();
        filter.apply(&mut query_builder);

        let results = query_builder
            .build_query_as::<ShortenedUrl>()
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }
}
