//! Checkout session store
//!
//! Keeps one shopper's in-progress checkout in a key-value storage under a fixed key,
//! rewriting the whole JSON blob after every mutation. A saved session is reused
//! only when it belongs to the same tenant; otherwise a fresh one replaces it.
//!
//! Storage failures never break the checkout: they are logged and the in-memory
//! session stays authoritative.

use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::ids::generate_session_id;
use crate::models::{
    Cart, CheckoutData, CheckoutSession, CheckoutStatus, PaymentMethod, ShippingAddress,
};

/// Storage key the session is persisted under.
pub const SESSION_STORAGE_KEY: &str = "fastcheckout_session";

/// Currency for sessions created before the tenant's cart is known.
pub const DEFAULT_SESSION_CURRENCY: &str = "EUR";

/// Minimal string key-value storage, the shape of browser local storage.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove_item(key)
    }
}

/// Process-local storage, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn new_session(tenant_id: Uuid) -> CheckoutSession {
    let now = Utc::now();
    CheckoutSession {
        id: generate_session_id(),
        tenant_id,
        cart: Cart::empty(DEFAULT_SESSION_CURRENCY),
        shipping_address: None,
        selected_shipping_method: None,
        selected_payment_method: None,
        status: CheckoutStatus::Pending,
        created_at: now,
        updated_at: now,
        metadata: None,
    }
}

pub struct CheckoutSessionStore<S: SessionStorage> {
    storage: S,
    session: CheckoutSession,
}

impl<S: SessionStorage> CheckoutSessionStore<S> {
    /// Rehydrates the saved session for `tenant_id`, or starts and saves a new one.
    pub fn open(storage: S, tenant_id: Uuid) -> Self {
        let saved = match storage.get_item(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<CheckoutSession>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable checkout session");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read checkout session");
                None
            }
        };

        match saved {
            Some(session) if session.tenant_id == tenant_id => {
                tracing::debug!(session_id = %session.id, "Resumed checkout session");
                Self { storage, session }
            }
            _ => {
                let store = Self {
                    storage,
                    session: new_session(tenant_id),
                };
                store.persist();
                tracing::debug!(session_id = %store.session.id, tenant_id = %tenant_id, "Created checkout session");
                store
            }
        }
    }

    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Partial view for plugin hooks.
    pub fn checkout_data(&self) -> CheckoutData {
        CheckoutData::from(&self.session)
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize checkout session");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(SESSION_STORAGE_KEY, &raw) {
            tracing::error!(error = %e, session_id = %self.session.id, "Failed to save checkout session");
        }
    }

    fn mutate(&mut self, change: impl FnOnce(&mut CheckoutSession)) {
        change(&mut self.session);
        self.session.updated_at = Utc::now();
        self.persist();
    }

    pub fn update_cart(&mut self, cart: Cart) {
        self.mutate(|s| s.cart = cart);
    }

    pub fn update_shipping_address(&mut self, address: ShippingAddress) {
        self.mutate(|s| s.shipping_address = Some(address));
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.mutate(|s| s.selected_payment_method = Some(method));
    }

    pub fn select_shipping_method(&mut self, method_id: impl Into<String>) {
        let method_id = method_id.into();
        self.mutate(|s| s.selected_shipping_method = Some(method_id));
    }

    pub fn set_status(&mut self, status: CheckoutStatus) {
        self.mutate(|s| s.status = status);
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: JsonValue) {
        let key = key.into();
        self.mutate(|s| {
            s.metadata.get_or_insert_with(HashMap::new).insert(key, value);
        });
    }

    /// Discards the saved session and starts over for the same tenant.
    pub fn reset(&mut self) {
        if let Err(e) = self.storage.remove_item(SESSION_STORAGE_KEY) {
            tracing::warn!(error = %e, "Failed to remove checkout session");
        }
        self.session = new_session(self.session.tenant_id);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    fn saved(storage: &impl SessionStorage) -> CheckoutSession {
        let raw = storage.get_item(SESSION_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_open_creates_and_persists_pending_session() {
        let storage = Arc::new(MemoryStorage::new());
        let tenant = Uuid::new_v4();
        let store = CheckoutSessionStore::open(storage.clone(), tenant);

        assert_eq!(store.session().status, CheckoutStatus::Pending);
        assert_eq!(store.session().cart.currency, "EUR");
        assert!(store.session().cart.is_empty());
        assert_eq!(saved(&storage).id, store.session().id);
    }

    #[test]
    fn test_open_resumes_same_tenant() {
        let storage = Arc::new(MemoryStorage::new());
        let tenant = Uuid::new_v4();
        let first = CheckoutSessionStore::open(storage.clone(), tenant);
        let second = CheckoutSessionStore::open(storage.clone(), tenant);
        assert_eq!(first.session().id, second.session().id);
    }

    #[test]
    fn test_open_replaces_other_tenant_session() {
        let storage = Arc::new(MemoryStorage::new());
        let first = CheckoutSessionStore::open(storage.clone(), Uuid::new_v4());
        let other_tenant = Uuid::new_v4();
        let second = CheckoutSessionStore::open(storage.clone(), other_tenant);

        assert_ne!(first.session().id, second.session().id);
        assert_eq!(saved(&storage).tenant_id, other_tenant);
    }

    #[test]
    fn test_open_ignores_corrupt_blob() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(SESSION_STORAGE_KEY, "{not json").unwrap();
        let store = CheckoutSessionStore::open(storage.clone(), Uuid::new_v4());
        assert_eq!(saved(&storage).id, store.session().id);
    }

    #[test]
    fn test_mutations_persist_and_refresh_updated_at() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CheckoutSessionStore::open(storage.clone(), Uuid::new_v4());
        let created = store.session().updated_at;

        std::thread::sleep(std::time::Duration::from_millis(2));
        store.select_payment_method(PaymentMethod::Stripe);
        store.select_shipping_method("express");
        store.set_status(CheckoutStatus::PaymentRequired);
        store.set_metadata("coupon", serde_json::json!("WELCOME10"));

        let persisted = saved(&storage);
        assert_eq!(persisted.selected_payment_method, Some(PaymentMethod::Stripe));
        assert_eq!(persisted.selected_shipping_method.as_deref(), Some("express"));
        assert_eq!(persisted.status, CheckoutStatus::PaymentRequired);
        assert_eq!(persisted.metadata.unwrap()["coupon"], "WELCOME10");
        assert!(persisted.updated_at > created);
        assert_eq!(persisted.created_at, store.session().created_at);
    }

    #[test]
    fn test_update_cart_is_visible_to_plugins() {
        let mut store = CheckoutSessionStore::open(MemoryStorage::new(), Uuid::new_v4());
        let mut cart = Cart::empty("EUR");
        cart.total = Decimal::from(12);
        store.update_cart(cart);
        assert_eq!(store.checkout_data().total(), Some(Decimal::from(12)));
    }

    #[test]
    fn test_reset_recreates_session_for_same_tenant() {
        let storage = Arc::new(MemoryStorage::new());
        let tenant = Uuid::new_v4();
        let mut store = CheckoutSessionStore::open(storage.clone(), tenant);
        let old_id = store.session().id.clone();
        store.set_status(CheckoutStatus::Abandoned);

        std::thread::sleep(std::time::Duration::from_millis(2));
        store.reset();

        assert_ne!(store.session().id, old_id);
        assert_eq!(store.session().tenant_id, tenant);
        assert_eq!(store.session().status, CheckoutStatus::Pending);
        assert_eq!(saved(&storage).id, store.session().id);
    }

    #[test]
    fn test_broken_storage_is_not_fatal() {
        let mut store = CheckoutSessionStore::open(BrokenStorage, Uuid::new_v4());
        store.set_status(CheckoutStatus::Processing);
        assert_eq!(store.session().status, CheckoutStatus::Processing);
    }

    #[test]
    fn test_file_storage_round_trips_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let tenant = Uuid::new_v4();
        let id = {
            let mut store =
                CheckoutSessionStore::open(FileStorage::new(dir.path()).unwrap(), tenant);
            store.select_payment_method(PaymentMethod::Paypal);
            store.session().id.clone()
        };

        let reopened = CheckoutSessionStore::open(FileStorage::new(dir.path()).unwrap(), tenant);
        assert_eq!(reopened.session().id, id);
        assert_eq!(
            reopened.session().selected_payment_method,
            Some(PaymentMethod::Paypal)
        );
        assert!(dir.path().join("fastcheckout_session.json").exists());
    }

    #[test]
    fn test_file_storage_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.remove_item("absent").is_ok());
        assert_eq!(storage.get_item("absent").unwrap(), None);
    }
}
