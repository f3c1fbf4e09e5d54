//! Authenticated session and its persisted form.

use crate::storage::{KeyValueStore, StoreError, TOKEN_KEY, USER_KEY};
use crate::types::User;

/// Bearer token plus the user it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Read a previously persisted session.
    ///
    /// Returns `Ok(None)` unless both keys are present and the token is
    /// non-empty. The token is not validated against the server.
    pub fn restore<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, StoreError> {
        let token = match store.get(TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };
        let Some(raw_user) = store.get(USER_KEY)? else {
            return Ok(None);
        };
        let user = serde_json::from_str(&raw_user).map_err(StoreError::CorruptUser)?;
        Ok(Some(Self { token, user }))
    }

    pub fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let user = serde_json::to_string(&self.user).map_err(StoreError::CorruptUser)?;
        store.set(TOKEN_KEY, &self.token)?;
        store.set(USER_KEY, &user)
    }

    /// Remove both keys. Both removals are attempted even if the first fails.
    pub fn clear<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
        let token = store.remove(TOKEN_KEY);
        let user = store.remove(USER_KEY);
        token.and(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn persist_then_restore() {
        let mut store = MemoryStore::new();
        let session = Session::new("tok", User::new("admin"));
        session.persist(&mut store).unwrap();
        assert_eq!(Session::restore(&store).unwrap(), Some(session));
    }

    #[test]
    fn restore_needs_both_keys() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok").unwrap();
        assert_eq!(Session::restore(&store).unwrap(), None);

        let mut store = MemoryStore::new();
        store.set(USER_KEY, r#"{"username":"admin"}"#).unwrap();
        assert_eq!(Session::restore(&store).unwrap(), None);
    }

    #[test]
    fn restore_ignores_empty_token() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "").unwrap();
        store.set(USER_KEY, r#"{"username":"admin"}"#).unwrap();
        assert_eq!(Session::restore(&store).unwrap(), None);
    }

    #[test]
    fn restore_reports_corrupt_user() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "not json").unwrap();
        assert!(matches!(
            Session::restore(&store),
            Err(StoreError::CorruptUser(_))
        ));
    }

    #[test]
    fn clear_removes_both_keys() {
        let mut store = MemoryStore::new();
        Session::new("tok", User::new("admin")).persist(&mut store).unwrap();
        Session::clear(&mut store).unwrap();
        assert!(store.is_empty());
    }
}
