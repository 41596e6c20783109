/// A persisted record that carries a hashid next to its numeric key.
///
/// The key is assigned by the database on first insert and never changes. The hashid
/// starts empty and, once set, is permanently bound to that key.
pub trait HasHashid: Send + Sync + 'static {
    /// Primary key, `None` until the record has been inserted
    fn key(&self) -> Option<i64>;

    fn hashid(&self) -> Option<&str>;

    fn set_hashid(&mut self, hashid: String);

    /// True once a non-empty hashid is stored on the record
    fn has_hashid(&self) -> bool {
        self.hashid().is_some_and(|hashid| !hashid.is_empty())
    }
}
