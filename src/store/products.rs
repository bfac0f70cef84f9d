//! Product records and the persisted product store

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::storage::{keys, KeyValueStorage, StorageError};

/// Message shown when a required form field is left blank
pub const MSG_FIELDS_REQUIRED: &str = "Nama produk & harga wajib diisi.";
/// Message shown when the price is not a whole, non-negative number
pub const MSG_PRICE_INVALID: &str = "Harga harus berupa bilangan bulat tidak negatif.";

/// Product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ProductId)
            .map_err(|_| StoreError::Validation(format!("Invalid product id: {:?}", s)))
    }
}

/// A single product entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Price in whole currency units (Rupiah)
    pub price: u64,
}

impl Product {
    pub fn new(id: u64, name: &str, price: u64) -> Self {
        Self {
            id: ProductId(id),
            name: name.to_string(),
            price,
        }
    }
}

/// Products written on first entry to the list view when nothing is stored
pub fn default_products() -> Vec<Product> {
    vec![
        Product::new(1, "Oli Mesin", 35_000),
        Product::new(2, "Kampas Rem", 45_000),
        Product::new(3, "Busi Motor", 25_000),
    ]
}

/// Validated product form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: u64,
}

impl ProductDraft {
    /// Validate raw form text: both fields required after trimming, price
    /// must be a non-negative integer.
    pub fn parse(name: &str, price: &str) -> Result<Self, StoreError> {
        let name = name.trim();
        let price = price.trim();

        if name.is_empty() || price.is_empty() {
            return Err(StoreError::Validation(MSG_FIELDS_REQUIRED.to_string()));
        }

        let price = price
            .parse::<u64>()
            .map_err(|_| StoreError::Validation(MSG_PRICE_INVALID.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            price,
        })
    }
}

/// Everything stored under the application key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl PersistedState {
    /// Read the stored state. A missing key yields an empty collection.
    pub fn load(storage: &dyn KeyValueStorage) -> Result<Self, StoreError> {
        match storage.get(keys::APP_STATE)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                StoreError::Storage(StorageError::Corrupt {
                    path: keys::APP_STATE.to_string(),
                    reason: e.to_string(),
                })
            }),
            None => Ok(Self::default()),
        }
    }

    /// Overwrite the stored state with `self`
    pub fn save(&self, storage: &dyn KeyValueStorage) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self).map_err(StorageError::from)?;
        storage.set(keys::APP_STATE, &raw)?;
        Ok(())
    }
}

/// Dashboard aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_products: usize,
    /// Placeholder metric: two sales per listed product
    pub total_sales: usize,
    pub total_revenue: u64,
}

impl Summary {
    pub fn of(products: &[Product]) -> Self {
        Self {
            total_products: products.len(),
            total_sales: products.len() * 2,
            total_revenue: products
                .iter()
                .fold(0u64, |total, p| total.saturating_add(p.price)),
        }
    }
}

/// Product store: in-memory collection kept in sync with storage
pub struct ProductStore {
    storage: Arc<dyn KeyValueStorage>,
    state: PersistedState,
    /// Highest id ever handed out or seen; ids are never reused
    last_id: u64,
}

impl ProductStore {
    /// Open the store, reading whatever is already persisted
    pub fn open(storage: Arc<dyn KeyValueStorage>) -> Result<Self, StoreError> {
        let state = PersistedState::load(storage.as_ref())?;
        let last_id = max_id(&state.products);

        debug!(products = state.products.len(), "Loaded product store");

        Ok(Self {
            storage,
            state,
            last_id,
        })
    }

    /// Fresh read of the persisted collection, bypassing the in-memory copy
    pub fn load(&self) -> Result<Vec<Product>, StoreError> {
        Ok(PersistedState::load(self.storage.as_ref())?.products)
    }

    /// Populate the defaults when the collection is empty.
    /// Returns whether seeding happened.
    pub fn seed_if_empty(&mut self) -> Result<bool, StoreError> {
        if !self.state.products.is_empty() {
            return Ok(false);
        }

        let products = default_products();
        let highest = max_id(&products);
        self.commit(products)?;
        self.last_id = self.last_id.max(highest);

        info!(products = self.state.products.len(), "Seeded default products");
        Ok(true)
    }

    /// Current collection in insertion order
    pub fn list(&self) -> &[Product] {
        &self.state.products
    }

    pub fn len(&self) -> usize {
        self.state.products.len()
    }

    /// Look up a product by id
    pub fn get(&self, id: ProductId) -> Result<&Product, StoreError> {
        self.state
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Validate and append a new product
    pub fn add(&mut self, name: &str, price: &str) -> Result<Product, StoreError> {
        let draft = ProductDraft::parse(name, price)?;
        let id = self.last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;

        let product = Product {
            id: ProductId(id),
            name: draft.name,
            price: draft.price,
        };

        let mut products = self.state.products.clone();
        products.push(product.clone());
        self.commit(products)?;
        self.last_id = id;

        info!(id = %product.id, name = %product.name, price = product.price, "Product added");
        Ok(product)
    }

    /// Validate and overwrite the fields of an existing product
    pub fn update(&mut self, id: ProductId, name: &str, price: &str) -> Result<Product, StoreError> {
        let draft = ProductDraft::parse(name, price)?;

        let mut products = self.state.products.clone();
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;

        product.name = draft.name;
        product.price = draft.price;
        let updated = product.clone();

        self.commit(products)?;

        info!(id = %id, name = %updated.name, price = updated.price, "Product updated");
        Ok(updated)
    }

    /// Remove every product with `id`. Unknown ids are a no-op.
    /// Returns the number of removed records.
    pub fn delete(&mut self, id: ProductId) -> Result<usize, StoreError> {
        let mut products = self.state.products.clone();
        products.retain(|p| p.id != id);
        let removed = self.state.products.len() - products.len();

        self.commit(products)?;

        if removed > 0 {
            info!(id = %id, "Product deleted");
        } else {
            debug!(id = %id, "Delete of unknown product ignored");
        }
        Ok(removed)
    }

    /// Persist `products`, then adopt them as the in-memory collection.
    /// On a failed write the in-memory collection is left as it was.
    fn commit(&mut self, products: Vec<Product>) -> Result<(), StoreError> {
        let next = PersistedState { products };
        next.save(self.storage.as_ref())?;
        self.state = next;
        Ok(())
    }
}

fn max_id(products: &[Product]) -> u64 {
    products.iter().map(|p| p.id.0).max().unwrap_or(0)
}

/// Product store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Product {0} not found")]
    NotFound(ProductId),

    #[error("No product ids left to assign")]
    IdsExhausted,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::store::storage::MemoryStorage;

    /// Memory storage whose writes can be switched to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl FlakyStorage {
        fn fail_writes(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
            }
            self.inner.set(key, value)
        }

        fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    fn empty_store() -> (Arc<MemoryStorage>, ProductStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = ProductStore::open(storage.clone()).unwrap();
        (storage, store)
    }

    fn id_of(store: &ProductStore, name: &str) -> ProductId {
        store.list().iter().find(|p| p.name == name).unwrap().id
    }

    #[test]
    fn load_without_stored_data_is_empty() {
        let (_, store) = empty_store();
        assert!(store.list().is_empty());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn seed_only_when_empty() {
        let (_, mut store) = empty_store();
        assert!(store.seed_if_empty().unwrap());
        assert_eq!(store.list(), default_products().as_slice());
        assert_eq!(store.load().unwrap(), default_products());

        store.add("Helm", "150000").unwrap();
        assert!(!store.seed_if_empty().unwrap());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn add_rejects_blank_fields() {
        let (_, mut store) = empty_store();

        for (name, price) in [("", "100"), ("   ", "100"), ("Helm", ""), ("Helm", "  ")] {
            let err = store.add(name, price).unwrap_err();
            assert!(matches!(err, StoreError::Validation(ref m) if m == MSG_FIELDS_REQUIRED));
        }
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_rejects_bad_price() {
        let (_, mut store) = empty_store();
        assert!(matches!(
            store.add("Helm", "-5").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            store.add("Helm", "12abc").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_trims_and_is_retrievable() {
        let (_, mut store) = empty_store();
        let product = store.add("  Helm  ", " 150000 ").unwrap();

        assert_eq!(product.name, "Helm");
        assert_eq!(product.price, 150_000);
        assert_eq!(store.get(product.id).unwrap(), &product);
        assert_eq!(store.load().unwrap(), store.list());
    }

    #[test]
    fn back_to_back_adds_get_distinct_ids() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        let a = store.add("A", "1").unwrap();
        let b = store.add("B", "2").unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id > ProductId(3));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_, mut store) = empty_store();
        let a = store.add("A", "1").unwrap();
        store.delete(a.id).unwrap();
        let b = store.add("B", "2").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn reopened_store_continues_after_highest_id() {
        let (storage, mut store) = empty_store();
        store.seed_if_empty().unwrap();
        store.add("Helm", "150000").unwrap();

        let mut reopened = ProductStore::open(storage).unwrap();
        let next = reopened.add("Spion", "20000").unwrap();
        assert_eq!(next.id, ProductId(5));
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        let err = store.update(ProductId(99), "Helm", "1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ProductId(99))));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn update_validates_before_mutating() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        let err = store.update(ProductId(1), "", "1").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get(ProductId(1)).unwrap().name, "Oli Mesin");
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        assert_eq!(store.delete(ProductId(42)).unwrap(), 0);
        assert_eq!(store.list(), default_products().as_slice());
    }

    #[test]
    fn delete_all_then_list_is_empty() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        for id in [1, 2, 3] {
            store.delete(ProductId(id)).unwrap();
        }
        assert!(store.list().is_empty());
        assert!(store.load().unwrap().is_empty());

        assert!(store.seed_if_empty().unwrap());
        assert_eq!(store.list(), default_products().as_slice());
    }

    #[test]
    fn seed_add_update_delete_scenario() {
        let (_, mut store) = empty_store();
        store.seed_if_empty().unwrap();
        let ids: Vec<u64> = store.list().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        store.add("Helm", "150000").unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(Summary::of(store.list()).total_revenue, 255_000);

        let helm = id_of(&store, "Helm");
        store.update(helm, "Helm SNI", "175000").unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(Summary::of(store.list()).total_revenue, 280_000);
        assert_eq!(store.load().unwrap(), store.list());

        store.delete(helm).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(Summary::of(store.list()).total_revenue, 105_000);
        assert_eq!(store.load().unwrap(), store.list());
    }

    #[test]
    fn summary_counts_sales_as_twice_products() {
        let summary = Summary::of(&default_products());
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_sales, 6);
        assert_eq!(summary.total_revenue, 105_000);
    }

    #[test]
    fn persisted_layout_matches_browser_format() {
        let (storage, mut store) = empty_store();
        store.seed_if_empty().unwrap();

        let raw = storage.get(keys::APP_STATE).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["products"][0],
            serde_json::json!({ "id": 1, "name": "Oli Mesin", "price": 35000 })
        );
    }

    #[test]
    fn corrupt_state_is_a_storage_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::APP_STATE, "{oops").unwrap();

        let err = ProductStore::open(storage).err().unwrap();
        assert!(matches!(err, StoreError::Storage(StorageError::Corrupt { .. })));
    }

    #[test]
    fn failed_writes_leave_memory_untouched() {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = ProductStore::open(storage.clone()).unwrap();
        store.seed_if_empty().unwrap();
        storage.fail_writes();

        assert!(matches!(store.add("Helm", "150000"), Err(StoreError::Storage(_))));
        assert!(matches!(store.update(ProductId(1), "X", "1"), Err(StoreError::Storage(_))));
        assert!(matches!(store.delete(ProductId(2)), Err(StoreError::Storage(_))));

        assert_eq!(store.list(), default_products().as_slice());
        assert_eq!(store.load().unwrap(), default_products());
    }

    #[test]
    fn failed_add_does_not_burn_an_id() {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = ProductStore::open(storage.clone()).unwrap();
        store.seed_if_empty().unwrap();

        storage.fail_writes();
        assert!(store.add("Helm", "1").is_err());

        storage.failing.store(false, Ordering::SeqCst);
        assert_eq!(store.add("Helm", "1").unwrap().id, ProductId(4));
    }

    #[test]
    fn failed_seed_stays_empty() {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = ProductStore::open(storage.clone()).unwrap();
        storage.fail_writes();

        assert!(store.seed_if_empty().is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_after_highest_possible_id_is_an_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                keys::APP_STATE,
                &format!(r#"{{"products":[{{"id":{},"name":"A","price":1}}]}}"#, u64::MAX),
            )
            .unwrap();
        let mut store = ProductStore::open(storage).unwrap();

        assert!(matches!(store.add("B", "2"), Err(StoreError::IdsExhausted)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn product_id_parses_from_form_text() {
        assert_eq!(" 17 ".parse::<ProductId>().unwrap(), ProductId(17));
        assert!("abc".parse::<ProductId>().is_err());
        assert!("".parse::<ProductId>().is_err());
    }
}
