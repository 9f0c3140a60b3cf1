use super::*;
use crate::net::types::UserType;

fn elder() -> User {
    User::new("1", "Asha", "asha@example.com", UserType::Elder)
}

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("carehive-store-{}.json", uuid::Uuid::new_v4()))
}

/// Accepts the token write, refuses the user write.
#[derive(Default)]
struct HalfBrokenStore {
    inner: MemoryStore,
}

impl SessionStore for HalfBrokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == "user" {
            return Err(StoreError::Unavailable("quota exceeded".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[test]
fn persist_then_load_returns_same_pair() {
    let store = MemoryStore::new();
    let keys = StorageKeys::default();
    persist_pair(&store, &keys, &elder(), "tok-123").unwrap();

    assert_eq!(store.get("token").unwrap().as_deref(), Some("tok-123"));
    let (user, token) = load_pair(&store, &keys).unwrap().unwrap();
    assert_eq!(user, elder());
    assert_eq!(token, "tok-123");
}

#[test]
fn load_pair_empty_store_is_none() {
    let store = MemoryStore::new();
    assert!(load_pair(&store, &StorageKeys::default()).unwrap().is_none());
}

#[test]
fn load_pair_half_present_is_corrupt() {
    let store = MemoryStore::new();
    store.set("token", "tok-123").unwrap();
    let err = load_pair(&store, &StorageKeys::default()).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "user"));

    let store = MemoryStore::new();
    store.set("user", r#"{"id":1,"userType":"Elder"}"#).unwrap();
    assert!(matches!(load_pair(&store, &StorageKeys::default()), Err(StoreError::Corrupt { .. })));
}

#[test]
fn load_pair_unparseable_user_is_corrupt() {
    let store = MemoryStore::new();
    store.set("token", "tok-123").unwrap();
    store.set("user", "{not json").unwrap();
    assert!(matches!(load_pair(&store, &StorageKeys::default()), Err(StoreError::Corrupt { .. })));
}

#[test]
fn failed_persist_rolls_back_partial_write() {
    let store = HalfBrokenStore::default();
    let err = persist_pair(&store, &StorageKeys::default(), &elder(), "tok-123").unwrap_err();
    assert_eq!(err, StoreError::Unavailable("quota exceeded".into()));
    assert!(store.inner.is_empty());
}

#[test]
fn clear_pair_removes_both_keys() {
    let store = MemoryStore::new();
    let keys = StorageKeys::default();
    persist_pair(&store, &keys, &elder(), "tok-123").unwrap();
    store.set("unrelated", "kept").unwrap();
    clear_pair(&store, &keys).unwrap();
    assert_eq!(store.len(), 1);
    assert!(load_pair(&store, &keys).unwrap().is_none());
}

#[test]
fn file_store_survives_reopen() {
    let path = temp_path();
    let keys = StorageKeys::default();
    {
        let store = FileStore::new(&path);
        persist_pair(&store, &keys, &elder(), "tok-file").unwrap();
    }
    let reopened = FileStore::new(&path);
    let (user, token) = load_pair(&reopened, &keys).unwrap().unwrap();
    assert_eq!(user.name, "Asha");
    assert_eq!(token, "tok-file");

    clear_pair(&reopened, &keys).unwrap();
    assert!(!path.exists());
}

#[test]
fn file_store_missing_file_reads_empty() {
    let store = FileStore::new(temp_path());
    assert_eq!(store.get("token").unwrap(), None);
    store.remove("token").unwrap();
}

#[test]
fn file_store_corrupt_file_reports_then_clears() {
    let path = temp_path();
    std::fs::write(&path, "[[[").unwrap();
    let store = FileStore::new(&path);
    assert!(matches!(store.get("token"), Err(StoreError::Corrupt { .. })));

    clear_pair(&store, &StorageKeys::default()).unwrap();
    assert_eq!(store.get("token").unwrap(), None);
}
