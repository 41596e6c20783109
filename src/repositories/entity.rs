use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::hashid::{HasHashid, HashidFilter};

type Result<T> = std::result::Result<T, RepositoryError>;

/// Key-based storage for one entity type, as consumed by the hashid adapter.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    type Entity: HasHashid;

    /// Inserts a new record and assigns its primary key
    ///
    /// ### Returns
    /// * `Result<Entity>` - The stored record, with `key()` set
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If a database error occurs
    /// * `RepositoryError::Conflict` - If a unique constraint is violated (e.g., a taken hashid)
    async fn insert(&self, entity: &Self::Entity) -> Result<Self::Entity>;

    /// Writes an already inserted record back
    ///
    /// A hashid already stored on the row is kept even if `entity` carries another one.
    ///
    /// ### Errors
    /// * `RepositoryError::NotFound` - If no row has the entity's key
    /// * `RepositoryError::InvalidData` - If the entity has no key
    /// * `RepositoryError::Database` - If a database error occurs
    async fn persist(&self, entity: &Self::Entity) -> Result<Self::Entity>;

    /// Finds a record by primary key
    ///
    /// ### Returns
    /// * `Result<Option<Entity>>` - The record if found, or `None` if not found
    async fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Finds every record matching a hashid filter
    async fn find_where(&self, filter: &HashidFilter) -> Result<Vec<Self::Entity>>;

    /// Finds a record by primary key, failing when it does not exist
    ///
    /// ### Errors
    /// * `RepositoryError::NotFound` - If no row has this key
    async fn find_by_id_or_fail(&self, id: i64) -> Result<Self::Entity> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Record with key {} not found", id)))
    }
}
