//! Locally persisted shopping cart.
//!
//! The store owns the canonical line vector and is the sole mutator:
//! storage is read once at construction and only written afterwards, so
//! two mutations in the same tick can never interleave a read-modify-write
//! on the persisted blob. Every mutation persists the cart and then
//! broadcasts a full snapshot to any number of listeners (badge counter,
//! order summary) - fire and forget, no acknowledgment.
//!
//! Persistence failures degrade to "empty cart": a corrupt or missing
//! blob is logged and treated as no data, and a failed write keeps the
//! in-memory cart authoritative for the rest of the session.

pub mod storage;

pub use storage::{CartStorage, FileStorage, MemoryStorage};

use bravex_core::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Broadcast channel depth for cart snapshots.
const EVENT_CAPACITY: usize = 16;

/// A full copy of the cart, sent to listeners after each mutation.
pub type CartSnapshot = Vec<CartLine>;

/// One distinct purchasable selection (item + variant) with a quantity.
///
/// Serialized camelCase so a persisted cart round-trips byte-compatibly
/// across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Stable product identifier.
    pub item_id: ProductId,
    /// Display title.
    pub title: String,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Preview image URL.
    pub image: Option<String>,
    /// Product page slug.
    pub slug: Option<String>,
    /// Selected variant label; empty string means "no variant".
    pub variant: String,
    /// Short description.
    pub description: Option<String>,
    /// Units of this line, always >= 1.
    pub quantity: u32,
    /// When the line was first added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Item data passed to [`CartStore::add`].
#[derive(Debug, Clone)]
pub struct CartItem {
    /// Stable product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Preview image URL.
    pub image: Option<String>,
    /// Product page slug.
    pub slug: Option<String>,
    /// Selected variant label; empty string means "no variant".
    pub variant: String,
    /// Short description.
    pub description: Option<String>,
}

/// The cart store: owns cart state, persistence, and change broadcast.
pub struct CartStore<S: CartStorage> {
    storage: S,
    lines: Vec<CartLine>,
    events: broadcast::Sender<CartSnapshot>,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart, loading any persisted lines.
    ///
    /// Unreadable or malformed stored data is treated as no data.
    pub fn new(storage: S) -> Self {
        let lines = match storage.load() {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<CartLine>>(&blob) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(error = %e, "stored cart is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "cart storage unreadable, starting empty");
                Vec::new()
            }
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            storage,
            lines,
            events,
        }
    }

    /// Subscribe to cart snapshots broadcast after each mutation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartSnapshot> {
        self.events.subscribe()
    }

    /// Current lines, in add order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add an item to the cart.
    ///
    /// An existing line with the same (item, variant) key accumulates
    /// the quantity; otherwise a new line is appended. A quantity of 0
    /// is treated as 1 so a line below one unit can never exist.
    pub fn add(&mut self, item: CartItem, quantity: u32) {
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.item_id == item.id && line.variant == item.variant)
        {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                item_id: item.id,
                title: item.title,
                unit_price: item.unit_price,
                image: item.image,
                slug: item.slug,
                variant: item.variant,
                description: item.description,
                quantity,
                added_at: Utc::now(),
            });
        }

        self.persist_and_broadcast();
    }

    /// Remove lines for an item.
    ///
    /// With a variant, only the matching (item, variant) line is
    /// removed; without one, every line for the item goes regardless of
    /// variant.
    pub fn remove(&mut self, item_id: &ProductId, variant: Option<&str>) {
        self.lines.retain(|line| match variant {
            Some(v) => !(line.item_id == *item_id && line.variant == v),
            None => line.item_id != *item_id,
        });

        self.persist_and_broadcast();
    }

    /// Set a line's quantity directly (not additive).
    ///
    /// A quantity of 0 removes the line. Returns false when no matching
    /// line exists.
    pub fn update_quantity(
        &mut self,
        item_id: &ProductId,
        quantity: u32,
        variant: Option<&str>,
    ) -> bool {
        let found = self.lines.iter().position(|line| match variant {
            Some(v) => line.item_id == *item_id && line.variant == v,
            None => line.item_id == *item_id,
        });

        let Some(index) = found else {
            return false;
        };

        if quantity == 0 {
            self.remove(item_id, variant);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = quantity;
            self.persist_and_broadcast();
        }

        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist_and_broadcast();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Total price across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Whether any line carries this item, ignoring variants.
    #[must_use]
    pub fn contains(&self, item_id: &ProductId) -> bool {
        self.lines.iter().any(|line| line.item_id == *item_id)
    }

    /// Persist the cart, then notify listeners.
    ///
    /// Write failures are logged and swallowed; the in-memory cart stays
    /// authoritative either way.
    fn persist_and_broadcast(&mut self) {
        match serde_json::to_string(&self.lines) {
            Ok(blob) => {
                if let Err(e) = self.storage.save(&blob) {
                    tracing::error!(error = %e, "failed to persist cart");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize cart");
            }
        }

        // Fire and forget: no receivers is fine.
        let _ = self.events.send(self.lines.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use storage::StorageError;

    fn item(id: &str, variant: &str, price: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            unit_price: Decimal::from(price),
            image: None,
            slug: Some(format!("product-{id}")),
            variant: variant.to_string(),
            description: None,
        }
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::new(MemoryStorage::new())
    }

    #[test]
    fn test_add_merges_same_item_and_variant() {
        let mut cart = store();
        cart.add(item("p1", "M", 10), 2);
        cart.add(item("p1", "M", 10), 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_keeps_variants_as_separate_lines() {
        let mut cart = store();
        cart.add(item("p1", "M", 10), 1);
        cart.add(item("p1", "L", 10), 1);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_count_and_total_derive_from_lines() {
        let mut cart = store();
        cart.add(item("p1", "", 10), 2);
        cart.add(item("p2", "", 25), 1);

        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), Decimal::from(45));
    }

    #[test]
    fn test_remove_with_variant_only_removes_matching_line() {
        let mut cart = store();
        cart.add(item("p1", "M", 10), 1);
        cart.add(item("p1", "L", 10), 1);

        cart.remove(&ProductId::new("p1"), Some("M"));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].variant, "L");
    }

    #[test]
    fn test_remove_without_variant_removes_all_lines_for_item() {
        let mut cart = store();
        cart.add(item("p1", "M", 10), 1);
        cart.add(item("p1", "L", 10), 1);
        cart.add(item("p2", "", 5), 1);

        cart.remove(&ProductId::new("p1"), None);
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.contains(&ProductId::new("p2")));
        assert!(!cart.contains(&ProductId::new("p1")));
    }

    #[test]
    fn test_update_quantity_sets_not_adds() {
        let mut cart = store();
        cart.add(item("p1", "", 10), 5);

        assert!(cart.update_quantity(&ProductId::new("p1"), 2, None));
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = store();
        cart.add(item("p1", "", 10), 3);

        assert!(cart.update_quantity(&ProductId::new("p1"), 0, None));
        assert!(cart.is_empty());
        assert!(!cart.contains(&ProductId::new("p1")));
    }

    #[test]
    fn test_update_quantity_missing_line_signals_not_found() {
        let mut cart = store();
        assert!(!cart.update_quantity(&ProductId::new("ghost"), 4, None));
    }

    #[test]
    fn test_add_quantity_zero_is_clamped_to_one() {
        let mut cart = store();
        cart.add(item("p1", "", 10), 0);
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = store();
        cart.add(item("p1", "", 10), 2);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_persisted_cart_round_trips_in_order() {
        let mut storage = MemoryStorage::new();
        {
            let mut cart = CartStore::new(std::mem::take(&mut storage));
            cart.add(item("p2", "", 25), 1);
            cart.add(item("p1", "M", 10), 2);
            storage = cart.storage;
        }

        let reloaded = CartStore::new(storage);
        let ids: Vec<&str> = reloaded
            .lines()
            .iter()
            .map(|l| l.item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert_eq!(reloaded.count(), 3);
        assert_eq!(reloaded.total(), Decimal::from(45));
    }

    #[test]
    fn test_malformed_blob_degrades_to_empty_cart() {
        let mut storage = MemoryStorage::new();
        storage.save("not json at all").unwrap();

        let cart = CartStore::new(storage);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stored_non_array_degrades_to_empty_cart() {
        let mut storage = MemoryStorage::new();
        storage.save("{\"oops\": true}").unwrap();

        let cart = CartStore::new(storage);
        assert!(cart.is_empty());
    }

    /// Storage that always fails, for degradation tests.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn save(&mut self, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_broken_storage_never_panics_or_propagates() {
        let mut cart = CartStore::new(BrokenStorage);
        cart.add(item("p1", "", 10), 1);
        cart.update_quantity(&ProductId::new("p1"), 3, None);
        assert_eq!(cart.count(), 3);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_mutations_broadcast_snapshots() {
        let mut cart = store();
        let mut events = cart.subscribe();

        cart.add(item("p1", "", 10), 2);
        let snapshot = events.try_recv().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 2);

        cart.clear();
        let snapshot = events.try_recv().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_key_uniqueness_invariant_holds_across_mutations() {
        let mut cart = store();
        cart.add(item("p1", "M", 10), 1);
        cart.add(item("p1", "L", 10), 1);
        cart.add(item("p1", "M", 10), 4);
        cart.update_quantity(&ProductId::new("p1"), 2, Some("L"));

        let mut keys: Vec<(String, String)> = cart
            .lines()
            .iter()
            .map(|l| (l.item_id.to_string(), l.variant.clone()))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
        assert_eq!(
            cart.count(),
            cart.lines().iter().map(|l| l.quantity).sum::<u32>()
        );
    }
}
