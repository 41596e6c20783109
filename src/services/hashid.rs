// src/services/hashid.rs - Hashid assignment and lookups over any entity repository
use std::sync::Arc;

use log::{debug, info, warn};
use sqlx::{Postgres, QueryBuilder};

use crate::errors::{RepositoryError, ServiceError};
use crate::hashid::{scope_hashid, HasHashid, HashidCodec, HashidFilter};
use crate::repositories::EntityRepository;

type Result<T> = std::result::Result<T, ServiceError>;

/// Ties the entities of one repository to their hashids.
///
/// Two lookup paths are offered. `find_by_hashid*` decode the hashid and fetch by key, which
/// stays correct even if a stored hashid is stale. `where_hashid`, `scope_hashid` and
/// `resolve_route_key` compare the stored column literally, which is a single index match
/// and works for caller-chosen hashids that never decode.
pub struct HashidService<R: EntityRepository> {
    repository: Arc<R>,
    codec: Arc<HashidCodec>,
    field: String,
}

impl<R: EntityRepository> HashidService<R> {
    pub fn new(repository: Arc<R>, codec: Arc<HashidCodec>, field: impl Into<String>) -> Self {
        Self {
            repository,
            codec,
            field: field.into(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Name of the column the routing layer binds external identifiers to
    pub fn route_key_name(&self) -> &str {
        &self.field
    }

    pub fn encode_key(&self, key: i64) -> Result<String> {
        Ok(self.codec.encode_key(key)?)
    }

    /// Decodes a hashid to its key, or `None` when it does not decode
    pub fn decode_hashid(&self, hashid: &str) -> Option<i64> {
        self.codec.decode_opt(hashid)
    }

    /// Inserts `entity` and binds its hashid to the freshly assigned key.
    ///
    /// A hashid supplied by the caller is stored untouched, unless it decodes under this
    /// codec (see `check_caller_hashid`). Otherwise the key is encoded and written with a
    /// second persist; if that one fails the row stays without a hashid and
    /// `ServiceError::PartialAssignment` is returned. The two writes are not atomic.
    pub async fn create(&self, entity: R::Entity) -> Result<R::Entity> {
        self.check_caller_hashid(&entity)?;
        let saved = self.repository.insert(&entity).await?;
        self.assign_if_unassigned(saved).await
    }

    /// Inserts a new entity or persists an existing one.
    ///
    /// A stored hashid is never changed. A row still lacking one, e.g. after a failed
    /// assignment, gets it on this save.
    pub async fn save(&self, entity: R::Entity) -> Result<R::Entity> {
        if entity.key().is_none() {
            return self.create(entity).await;
        }

        self.check_caller_hashid(&entity)?;
        let saved = self.repository.persist(&entity).await?;
        self.assign_if_unassigned(saved).await
    }

    /// A caller-chosen hashid must not decode to a key other than the entity's own.
    ///
    /// Such a value is the generated hashid of another row, present or future, and would
    /// make `find_by_hashid` and `resolve_route_key` disagree for the same string.
    fn check_caller_hashid(&self, entity: &R::Entity) -> Result<()> {
        let Some(hashid) = entity.hashid().filter(|h| !h.is_empty()) else {
            return Ok(());
        };

        match self.codec.decode_opt(hashid) {
            Some(decoded) if Some(decoded) != entity.key() => {
                debug!("Rejected caller hashid '{}' decoding to key {}", hashid, decoded);
                Err(ServiceError::Validation(format!(
                    "Hashid '{}' is reserved for generated identifiers",
                    hashid
                )))
            }
            _ => Ok(()),
        }
    }

    async fn assign_if_unassigned(&self, mut saved: R::Entity) -> Result<R::Entity> {
        if saved.has_hashid() {
            return Ok(saved);
        }

        let key = saved.key().ok_or_else(|| {
            ServiceError::Repository(RepositoryError::InvalidData(
                "Repository returned a record without a key".into(),
            ))
        })?;

        let hashid = self.codec.encode_key(key)?;
        debug!("Assigning hashid '{}' to key {}", hashid, key);
        saved.set_hashid(hashid);

        match self.repository.persist(&saved).await {
            Ok(assigned) => {
                info!("Hashid assigned to key {}", key);
                Ok(assigned)
            }
            Err(source) => {
                warn!("Key {} persisted without a hashid: {}", key, source);
                Err(ServiceError::PartialAssignment { id: key, source })
            }
        }
    }

    /// Finds the entity a hashid decodes to; undecodable input is simply absent
    pub async fn find_by_hashid(&self, hashid: &str) -> Result<Option<R::Entity>> {
        let Some(id) = self.codec.decode_opt(hashid) else {
            debug!("Hashid '{}' does not decode", hashid);
            return Ok(None);
        };

        Ok(self.repository.find_by_id(id).await?)
    }

    /// Finds the entity a hashid decodes to, or fails with `ServiceError::NotFound`
    pub async fn find_by_hashid_or_fail(&self, hashid: &str) -> Result<R::Entity> {
        let not_found = || ServiceError::NotFound(format!("No record for hashid '{}'", hashid));

        let id = self.codec.decode_opt(hashid).ok_or_else(not_found)?;

        match self.repository.find_by_id_or_fail(id).await {
            Ok(entity) => Ok(entity),
            Err(RepositoryError::NotFound(_)) => Err(not_found()),
            Err(err) => Err(err.into()),
        }
    }

    /// Filter matching rows whose stored hashid is exactly `hashid`
    pub fn where_hashid(&self, hashid: &str) -> HashidFilter {
        HashidFilter::new(self.field.clone(), hashid)
    }

    /// Adds the `where_hashid` condition to a query the caller is building
    pub fn scope_hashid<'b, 'args>(
        &self,
        builder: &'b mut QueryBuilder<'args, Postgres>,
        hashid: &str,
    ) -> &'b mut QueryBuilder<'args, Postgres> {
        scope_hashid(builder, &self.field, hashid)
    }

    /// Runs a filter built by `where_hashid`
    pub async fn find_matching(&self, filter: &HashidFilter) -> Result<Vec<R::Entity>> {
        Ok(self.repository.find_where(filter).await?)
    }

    /// Route binding: the entity whose route key column equals `value`, without decoding
    pub async fn resolve_route_key(&self, value: &str) -> Result<Option<R::Entity>> {
        let filter = self.where_hashid(value);
        Ok(self.repository.find_where(&filter).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mockall::{mock, predicate};

    use super::*;
    use crate::config::HashidConfig;
    use crate::models::ShortenedUrl;

    type RepoResult<T> = std::result::Result<T, RepositoryError>;

    /// Repository keeping rows in memory, mirroring the database's handling of hashids
    #[derive(Default)]
    struct InMemoryRepository {
        rows: Mutex<BTreeMap<i64, ShortenedUrl>>,
    }

    impl InMemoryRepository {
        fn with_key_offset(start: i64) -> Self {
            let repository = Self::default();
            {
                let mut rows = repository.rows.lock().unwrap();
                // placeholder row so the next key is start
                rows.insert(start - 1, ShortenedUrl::new("https://placeholder.test"));
            }
            repository
        }

        fn stored(&self, id: i64) -> Option<ShortenedUrl> {
            self.rows.lock().unwrap().get(&id).cloned()
        }
    }

    /// Same check as the `UNIQUE` constraint on the hashid column
    fn ensure_unique(
        rows: &BTreeMap<i64, ShortenedUrl>,
        id: Option<i64>,
        hashid: Option<&str>,
    ) -> RepoResult<()> {
        let Some(hashid) = hashid else {
            return Ok(());
        };
        let taken = rows
            .iter()
            .any(|(key, row)| Some(*key) != id && row.hashid.as_deref() == Some(hashid));
        if taken {
            return Err(RepositoryError::Conflict("Resource already exists".to_string()));
        }
        Ok(())
    }

    #[async_trait]
    impl EntityRepository for InMemoryRepository {
        type Entity = ShortenedUrl;

        async fn insert(&self, entity: &ShortenedUrl) -> RepoResult<ShortenedUrl> {
            let mut rows = self.rows.lock().unwrap();
            ensure_unique(&rows, None, entity.hashid.as_deref())?;
            let id = rows.keys().next_back().map_or(1, |last| last + 1);
            let mut record = entity.clone();
            record.id = Some(id);
            rows.insert(id, record.clone());
            Ok(record)
        }

        async fn persist(&self, entity: &ShortenedUrl) -> RepoResult<ShortenedUrl> {
            let id = entity
                .id
                .ok_or_else(|| RepositoryError::InvalidData("no key".into()))?;
            let mut rows = self.rows.lock().unwrap();
            let stored = rows
                .get(&id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?
                .hashid
                .clone();

            let hashid = match stored {
                Some(stored) if !stored.is_empty() => Some(stored),
                _ => entity.hashid.clone(),
            };
            ensure_unique(&rows, Some(id), hashid.as_deref())?;
            let existing = rows
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
            *existing = ShortenedUrl {
                hashid,
                ..entity.clone()
            };
            Ok(existing.clone())
        }

        async fn find_by_id(&self, id: i64) -> RepoResult<Option<ShortenedUrl>> {
            Ok(self.stored(id))
        }

        async fn find_where(&self, filter: &HashidFilter) -> RepoResult<Vec<ShortenedUrl>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.values().filter(|row| filter.matches(*row)).cloned().collect())
        }
    }

    mock! {
        pub UrlRepository {}

        #[async_trait]
        impl EntityRepository for UrlRepository {
            type Entity = ShortenedUrl;

            async fn insert(&self, entity: &ShortenedUrl) -> RepoResult<ShortenedUrl>;
            async fn persist(&self, entity: &ShortenedUrl) -> RepoResult<ShortenedUrl>;
            async fn find_by_id(&self, id: i64) -> RepoResult<Option<ShortenedUrl>>;
            async fn find_where(&self, filter: &HashidFilter) -> RepoResult<Vec<ShortenedUrl>>;
        }
    }

    fn codec() -> Arc<HashidCodec> {
        let config = HashidConfig::new("abc")
            .min_length(6)
            .alphabet("0123456789abcdefghijklmnopqrstuvwxyz");
        Arc::new(HashidCodec::new(&config).unwrap())
    }

    fn service<R: EntityRepository>(repository: R) -> HashidService<R> {
        HashidService::new(Arc::new(repository), codec(), "hashid")
    }

    fn stored_with_key(id: i64) -> ShortenedUrl {
        ShortenedUrl {
            id: Some(id),
            ..ShortenedUrl::new("https://example.com")
        }
    }

    #[tokio::test]
    async fn test_create_assigns_hashid_of_key() {
        let service = service(InMemoryRepository::with_key_offset(42));

        let url = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(url.id, Some(42));
        let hashid = url.hashid.clone().unwrap();
        assert!(!hashid.is_empty());
        assert_eq!(service.decode_hashid(&hashid), Some(42));
        assert_eq!(service.repository().stored(42).unwrap().hashid, Some(hashid));
    }

    #[tokio::test]
    async fn test_create_keeps_caller_supplied_hashid() {
        let service = service(InMemoryRepository::default());
        let mut url = ShortenedUrl::new("https://example.com");
        url.hashid = Some("promo".into());

        let url = service.create(url).await.unwrap();

        assert_eq!(url.hashid.as_deref(), Some("promo"));
    }

    #[tokio::test]
    async fn test_hashid_survives_later_saves() {
        let service = service(InMemoryRepository::default());
        let created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();
        let first = created.hashid.clone();

        let mut changed = created.clone();
        changed.hashid = Some("overwritten".into());
        changed.touch();
        let saved = service.save(changed).await.unwrap();
        let saved_again = service.save(saved.clone()).await.unwrap();

        assert_eq!(saved.hashid, first);
        assert_eq!(saved_again.hashid, first);
        assert_eq!(saved_again.access_count, 1);
    }

    #[tokio::test]
    async fn test_save_without_key_creates() {
        let service = service(InMemoryRepository::default());
        let url = service
            .save(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(url.id, Some(1));
        assert_eq!(service.decode_hashid(url.hashid.as_deref().unwrap()), Some(1));
    }

    #[tokio::test]
    async fn test_save_repairs_unassigned_row() {
        let repository = InMemoryRepository::default();
        let inserted = repository
            .insert(&ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();
        let service = service(repository);

        let saved = service.save(inserted).await.unwrap();

        assert_eq!(service.decode_hashid(saved.hashid.as_deref().unwrap()), saved.id);
    }

    #[tokio::test]
    async fn test_find_by_hashid() {
        let service = service(InMemoryRepository::default());
        let created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        let found = service
            .find_by_hashid(created.hashid.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_find_by_hashid_garbage_is_absent() {
        let service = service(InMemoryRepository::default());

        let found = service
            .find_by_hashid("garbage-not-a-real-code")
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_find_by_hashid_or_fail_missing_key() {
        let service = service(InMemoryRepository::default());
        let hashid = service.encode_key(9999).unwrap();

        let result = service.find_by_hashid_or_fail(&hashid).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_hashid_or_fail_garbage() {
        let service = service(InMemoryRepository::default());

        let result = service.find_by_hashid_or_fail("!!").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_hashid_or_fail_found() {
        let service = service(InMemoryRepository::default());
        let created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        let found = service
            .find_by_hashid_or_fail(created.hashid.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_where_hashid_matches_literal_value() {
        let service = service(InMemoryRepository::default());
        let mut custom = ShortenedUrl::new("https://custom.example.com");
        custom.hashid = Some("not-decodable".into());
        let custom = service.create(custom).await.unwrap();
        let generated = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        let filter = service.where_hashid("not-decodable");
        assert_eq!(filter.column(), "hashid");
        let matches = service.find_matching(&filter).await.unwrap();
        assert_eq!(matches, vec![custom]);

        let filter = service.where_hashid(generated.hashid.as_deref().unwrap());
        let matches = service.find_matching(&filter).await.unwrap();
        assert_eq!(matches, vec![generated]);
    }

    #[tokio::test]
    async fn test_resolve_route_key() {
        let service = service(InMemoryRepository::default());
        let created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(service.route_key_name(), "hashid");
        let resolved = service
            .resolve_route_key(created.hashid.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(resolved, Some(created));
        assert_eq!(service.resolve_route_key("missing").await.unwrap(), None);
    }

    #[test]
    fn test_scope_hashid_uses_configured_field() {
        let service = HashidService::new(
            Arc::new(InMemoryRepository::default()),
            codec(),
            "public_id",
        );
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM shortened_urls WHERE 1=1");
        service.scope_hashid(&mut builder, "abc123");

        assert_eq!(
            builder.sql(),
            "SELECT * FROM shortened_urls WHERE 1=1 AND public_id = $1"
        );
    }

    #[tokio::test]
    async fn test_failed_assignment_reports_partial_failure() {
        let mut repository = MockUrlRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(|_| Ok(stored_with_key(42)));
        repository
            .expect_persist()
            .times(1)
            .withf(|url: &ShortenedUrl| url.id == Some(42) && url.hashid.is_some())
            .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));

        let result = service(repository)
            .create(ShortenedUrl::new("https://example.com"))
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::PartialAssignment { id: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_assigned_hashid_skips_second_persist() {
        let mut repository = MockUrlRepository::new();
        repository.expect_insert().times(1).returning(|url| {
            Ok(ShortenedUrl {
                id: Some(7),
                ..url.clone()
            })
        });
        repository.expect_persist().times(0);

        let mut url = ShortenedUrl::new("https://example.com");
        url.hashid = Some("chosen".into());
        let created = service(repository).create(url).await.unwrap();

        assert_eq!(created.hashid.as_deref(), Some("chosen"));
    }

    #[tokio::test]
    async fn test_find_by_hashid_looks_up_decoded_key() {
        let hashid = codec().encode(5);
        let mut repository = MockUrlRepository::new();
        repository
            .expect_find_by_id()
            .with(predicate::eq(5))
            .times(1)
            .returning(|id| Ok(Some(stored_with_key(id))));

        let found = service(repository).find_by_hashid(&hashid).await.unwrap();
        assert_eq!(found.and_then(|url| url.id), Some(5));
    }

    #[tokio::test]
    async fn test_invalid_hashid_never_reaches_repository() {
        let mut repository = MockUrlRepository::new();
        repository.expect_find_by_id().times(0);

        let service = service(repository);
        assert_eq!(service.find_by_hashid("").await.unwrap(), None);
        assert!(service.find_by_hashid_or_fail("").await.is_err());
    }

    #[tokio::test]
    async fn test_repository_errors_are_not_swallowed() {
        let hashid = codec().encode(5);
        let mut repository = MockUrlRepository::new();
        repository
            .expect_find_by_id()
            .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolClosed)));

        let result = service(repository).find_by_hashid(&hashid).await;
        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_hashid_reserved_for_another_key() {
        let service = service(InMemoryRepository::default());
        let reserved = service.encode_key(2).unwrap();
        let mut alias = ShortenedUrl::new("https://alias.example.com");
        alias.hashid = Some(reserved.clone());

        let result = service.create(alias).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        service
            .create(ShortenedUrl::new("https://first.example.com"))
            .await
            .unwrap();
        let second = service
            .create(ShortenedUrl::new("https://second.example.com"))
            .await
            .unwrap();
        assert_eq!(second.id, Some(2));
        assert_eq!(second.hashid.as_deref(), Some(reserved.as_str()));

        let decoded = service.find_by_hashid(&reserved).await.unwrap();
        let routed = service.resolve_route_key(&reserved).await.unwrap();
        assert_eq!(decoded.and_then(|url| url.id), Some(2));
        assert_eq!(routed.and_then(|url| url.id), Some(2));
    }

    #[tokio::test]
    async fn test_save_accepts_entity_own_hashid() {
        let service = service(InMemoryRepository::default());
        let created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();

        let saved = service.save(created.clone()).await.unwrap();
        assert_eq!(saved.hashid, created.hashid);
    }

    #[tokio::test]
    async fn test_save_rejects_hashid_of_another_key() {
        let service = service(InMemoryRepository::default());
        let mut created = service
            .create(ShortenedUrl::new("https://example.com"))
            .await
            .unwrap();
        created.hashid = Some(service.encode_key(99).unwrap());

        let result = service.save(created).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_taken_alias_is_a_conflict() {
        let service = service(InMemoryRepository::default());
        let mut first = ShortenedUrl::new("https://one.example.com");
        first.hashid = Some("promo".into());
        service.create(first).await.unwrap();

        let mut second = ShortenedUrl::new("https://two.example.com");
        second.hashid = Some("promo".into());
        let result = service.create(second).await;

        assert!(matches!(
            result,
            Err(ServiceError::Repository(RepositoryError::Conflict(_)))
        ));
    }
}
