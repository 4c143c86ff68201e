//! # Cart Store
//!
//! The authoritative cart for one session. Applies `storefront_core::Cart`
//! rules, then persists to on-device storage (guest) or the remote cart API
//! (authenticated).
//!
//! ## Load State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UNLOADED ──load()──► LOADING ──────────► LOADED                       │
//! │      │                    ▲                  │ ▲                        │
//! │      │ any mutation       │                  │ │ mutations keep LOADED  │
//! │      └────────────────────┘                  └─┘                        │
//! │                                                                         │
//! │   A failed remote fetch or an unreadable guest cart still ends in       │
//! │   LOADED, with an empty cart.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence by Mode
//! ```text
//! Operation            Guest                      Authenticated
//! ─────────            ─────                      ─────────────
//! add_item (new)       write cart array           POST /cart, adopt server id
//! add_item (merge)     write cart array           PATCH /cart/{id}
//! increment/decrement  write cart array           PATCH (DELETE at qty 0)
//! remove_item(s)       write cart array           DELETE /cart/{id} per line
//! clear                write empty array          DELETE /cart/{id} per line
//! rental dates         write cart array           in memory only
//! ```
//!
//! Every mutation holds the cart lock until its persist call returns, so
//! two rapid increments never race on a stale quantity. A failed persist is
//! returned to the caller; the in-memory change stays.
//!
//! ## Keeping the Remote Cart Honest
//! - A line whose `POST /cart` failed keeps its local id and is marked
//!   unsynced. Its next change (or the next load) POSTs it with the current
//!   quantity instead of PATCHing an id the server never issued; removing it
//!   makes no remote call.
//! - Server lines that repeat a variant are folded into the first line on
//!   load: the repeat is DELETEd, then the survivor is PATCHed with the sum.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use storefront_core::{
    split_repeated_variants, AuthToken, Cart, CartChange, CartItemCandidate, CartLineItem,
    CartMode, CoreError, RentalSelection, Session, GUEST_CART_KEY,
};

use crate::error::ClientResult;
use crate::ports::{LocalStorage, NewRemoteLine, RemoteCart};

/// Where the cart is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// One session's cart.
pub struct CartStore {
    session: Session,
    storage: Arc<dyn LocalStorage>,
    remote: Arc<dyn RemoteCart>,
    cart_key: String,
    cart: Mutex<Cart>,
    /// Local ids of authenticated lines the server has not created yet.
    unsynced: Mutex<HashSet<String>>,
    state_tx: watch::Sender<LoadState>,
}

impl CartStore {
    /// Creates an unloaded store. The mode follows the session.
    pub fn new(
        session: Session,
        storage: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteCart>,
    ) -> Self {
        let (state_tx, _) = watch::channel(LoadState::Unloaded);
        CartStore {
            session,
            storage,
            remote,
            cart_key: GUEST_CART_KEY.to_string(),
            cart: Mutex::new(Cart::new()),
            unsynced: Mutex::new(HashSet::new()),
            state_tx,
        }
    }

    /// Uses a different storage key for the guest cart.
    pub fn with_cart_key(mut self, key: impl Into<String>) -> Self {
        self.cart_key = key.into();
        self
    }

    pub fn mode(&self) -> CartMode {
        self.session.cart_mode()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> LoadState {
        *self.state_tx.borrow()
    }

    /// Watches load state changes (for a loading indicator).
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state_tx.subscribe()
    }

    /// Current lines in cart order, loading first if needed.
    pub async fn items(&self) -> Vec<CartLineItem> {
        self.lock_loaded().await.items().to_vec()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// (Re)loads the cart from its backing store.
    ///
    /// Never fails: an absent, malformed or unreachable cart loads as empty.
    /// Rental dates on authenticated lines survive a reload by line id, and
    /// lines the server never created are sent again.
    pub async fn load(&self) -> Vec<CartLineItem> {
        let mut cart = self.cart.lock().await;
        self.load_into(&mut cart).await;
        cart.items().to_vec()
    }

    async fn lock_loaded(&self) -> MutexGuard<'_, Cart> {
        let mut cart = self.cart.lock().await;
        if self.state() == LoadState::Unloaded {
            self.load_into(&mut cart).await;
        }
        cart
    }

    async fn load_into(&self, cart: &mut Cart) {
        self.state_tx.send_replace(LoadState::Loading);

        let items = match &self.session {
            Session::Guest => self.read_guest_cart().await,
            Session::Authenticated { token, .. } => match self.remote.fetch(token).await {
                Ok(items) => self.reconcile_remote(token, cart, items).await,
                Err(e) => {
                    warn!(error = %e, "Failed to fetch remote cart, showing empty cart");
                    Vec::new()
                }
            },
        };

        *cart = Cart::from_items(items);
        self.unsynced
            .lock()
            .await
            .retain(|id| cart.get(id).is_some());
        info!(mode = ?self.mode(), items = cart.len(), "Cart loaded");
        self.state_tx.send_replace(LoadState::Loaded);
    }

    /// Brings a freshly fetched remote cart in line with the cart rules.
    ///
    /// A repeated variant whose DELETE fails is left out until the next load
    /// rather than counted twice.
    async fn reconcile_remote(
        &self,
        token: &AuthToken,
        previous: &Cart,
        fetched: Vec<CartLineItem>,
    ) -> Vec<CartLineItem> {
        let (mut items, repeats) = split_repeated_variants(fetched);
        for item in &mut items {
            if let Some(prev) = previous.get(&item.id) {
                item.rental_selection = prev.rental_selection;
            }
        }

        let mut survivors: Vec<String> = Vec::new();
        for repeat in repeats {
            if let Err(e) = self.remote.remove(token, &repeat.line.id).await {
                warn!(item_id = %repeat.line.id, error = %e, "Failed to delete repeated remote cart line");
                continue;
            }
            if let Some(keep) = items.iter_mut().find(|i| i.id == repeat.keep_id) {
                keep.quantity += repeat.line.quantity;
            }
            if !survivors.contains(&repeat.keep_id) {
                survivors.push(repeat.keep_id);
            }
        }
        for keep in items.iter().filter(|i| survivors.contains(&i.id)) {
            if let Err(e) = self.remote.update_quantity(token, &keep.id, keep.quantity).await {
                warn!(item_id = %keep.id, error = %e, "Failed to sync merged cart quantity");
            }
        }

        let pending: Vec<CartLineItem> = {
            let unsynced = self.unsynced.lock().await;
            previous
                .items()
                .iter()
                .filter(|i| unsynced.contains(&i.id))
                .cloned()
                .collect()
        };
        for line in pending {
            let existing = items.iter_mut().find(|i| {
                i.is_same_variant(&line.product_id, &line.color, &line.size, &line.condition)
            });
            let result = match existing {
                Some(existing) => {
                    let quantity = existing.quantity + line.quantity;
                    self.remote
                        .update_quantity(token, &existing.id, quantity)
                        .await
                        .map(|()| existing.quantity = quantity)
                }
                None => self
                    .remote
                    .add(token, &NewRemoteLine::from(&line))
                    .await
                    .map(|created| {
                        items.push(CartLineItem {
                            id: created.id,
                            ..line.clone()
                        })
                    }),
            };
            if let Err(e) = result {
                warn!(item_id = %line.id, error = %e, "Cart line still not on the server");
                items.push(line);
            }
        }
        items
    }

    async fn read_guest_cart(&self) -> Vec<CartLineItem> {
        let raw = match self.storage.get(&self.cart_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read guest cart, starting empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Guest cart is malformed, starting empty");
            Vec::new()
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of a variant, merging with an existing line.
    ///
    /// ## Returns
    /// The line as it now stands (with the server id in authenticated mode).
    ///
    /// ## Errors
    /// - `Validation` when a variant field is missing; nothing changes
    /// - Persist failures; the line stays in memory
    pub async fn add_item(&self, candidate: &CartItemCandidate) -> ClientResult<CartLineItem> {
        let mut cart = self.lock_loaded().await;
        let change = cart.add_item(candidate, || Uuid::new_v4().to_string())?;
        let id = self.persist(&mut cart, &change).await?;

        debug!(item_id = %id, "Cart item added");
        cart.get(&id)
            .cloned()
            .ok_or_else(|| CoreError::ItemNotFound(id).into())
    }

    /// Adds one to a line's quantity.
    pub async fn increment(&self, id: &str) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        let change = cart.increment(id)?;
        self.persist(&mut cart, &change).await.map(|_| ())
    }

    /// Subtracts one from a line's quantity; at quantity 1 the line is removed.
    pub async fn decrement(&self, id: &str) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        let change = cart.decrement(id)?;
        self.persist(&mut cart, &change).await.map(|_| ())
    }

    /// Removes a line. An unknown id is logged and ignored.
    pub async fn remove_item(&self, id: &str) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        match cart.remove_item(id) {
            Some(item) => self
                .persist(&mut cart, &CartChange::Removed(item))
                .await
                .map(|_| ()),
            None => {
                warn!(item_id = %id, "Tried to remove an item that is not in the cart");
                Ok(())
            }
        }
    }

    /// Removes several lines, e.g. the ones just ordered.
    ///
    /// In authenticated mode every line is deleted remotely even if one
    /// delete fails; the first failure is returned.
    pub async fn remove_items<S: AsRef<str>>(&self, ids: &[S]) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        let removed = cart.remove_items(ids);
        self.persist_removals(&mut cart, removed).await
    }

    /// Empties the cart. A guest cart's storage key is removed.
    pub async fn clear(&self) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        let removed = cart.clear();
        match &self.session {
            Session::Guest => self.storage.remove(&self.cart_key).await.map_err(|e| {
                warn!(error = %e, "Failed to remove guest cart");
                e
            }),
            Session::Authenticated { .. } => self.persist_removals(&mut cart, removed).await,
        }
    }

    /// Returns the lines with the given ids, in cart order.
    pub async fn select_items<S: AsRef<str>>(&self, ids: &[S]) -> Vec<CartLineItem> {
        self.lock_loaded().await.select(ids)
    }

    /// Attaches a rental date range to a line.
    ///
    /// `end <= start` fails with `InvalidRentalSelection` and changes nothing.
    pub async fn set_rental_dates(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ClientResult<RentalSelection> {
        let selection = RentalSelection::new(start, end)?;
        let mut cart = self.lock_loaded().await;
        cart.set_rental_selection(id, Some(selection))?;
        if !self.session.is_authenticated() {
            self.write_guest_cart(&cart).await?;
        }
        debug!(item_id = %id, days = selection.day_count, "Rental dates set");
        Ok(selection)
    }

    pub async fn clear_rental_dates(&self, id: &str) -> ClientResult<()> {
        let mut cart = self.lock_loaded().await;
        cart.set_rental_selection(id, None)?;
        if !self.session.is_authenticated() {
            self.write_guest_cart(&cart).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persists one change and returns the changed line's id afterwards,
    /// which differs from the local id once the server has created the line.
    async fn persist(&self, cart: &mut Cart, change: &CartChange) -> ClientResult<String> {
        match &self.session {
            Session::Guest => {
                self.write_guest_cart(cart).await?;
                Ok(changed_id(change))
            }
            Session::Authenticated { token, .. } => self.push_change(token, cart, change).await,
        }
    }

    async fn persist_removals(
        &self,
        cart: &mut Cart,
        removed: Vec<CartLineItem>,
    ) -> ClientResult<()> {
        let token = match &self.session {
            Session::Guest => return self.write_guest_cart(cart).await,
            Session::Authenticated { token, .. } => token,
        };

        let mut first_error = None;
        for item in removed {
            if let Err(e) = self
                .push_change(token, cart, &CartChange::Removed(item))
                .await
            {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn push_change(
        &self,
        token: &AuthToken,
        cart: &mut Cart,
        change: &CartChange,
    ) -> ClientResult<String> {
        let id = changed_id(change);
        let unsynced = self.unsynced.lock().await.contains(&id);

        let result = match change {
            CartChange::Added(_) => self.create_remote(token, cart, &id).await,
            CartChange::QuantityChanged { .. } if unsynced => {
                self.create_remote(token, cart, &id).await
            }
            CartChange::QuantityChanged { quantity, .. } => self
                .remote
                .update_quantity(token, &id, *quantity)
                .await
                .map(|()| id.clone()),
            CartChange::Removed(_) if unsynced => {
                self.unsynced.lock().await.remove(&id);
                Ok(id.clone())
            }
            CartChange::Removed(_) => self.remote.remove(token, &id).await.map(|()| id.clone()),
        };

        if let Err(e) = &result {
            warn!(item_id = %id, error = %e, "Failed to sync cart change");
        }
        result
    }

    /// POSTs a line with its current quantity and adopts the server id.
    /// On failure the line is marked unsynced.
    async fn create_remote(
        &self,
        token: &AuthToken,
        cart: &mut Cart,
        id: &str,
    ) -> ClientResult<String> {
        let line = cart
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;

        match self.remote.add(token, &NewRemoteLine::from(&line)).await {
            Ok(created) => {
                cart.reassign_id(id, &created.id)?;
                self.unsynced.lock().await.remove(id);
                Ok(created.id)
            }
            Err(e) => {
                self.unsynced.lock().await.insert(id.to_string());
                Err(e)
            }
        }
    }

    async fn write_guest_cart(&self, cart: &Cart) -> ClientResult<()> {
        let json = serde_json::to_string(cart.items())?;
        self.storage
            .set(&self.cart_key, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to persist guest cart");
                e
            })
    }
}

fn changed_id(change: &CartChange) -> String {
    match change {
        CartChange::Added(item) | CartChange::Removed(item) => item.id.clone(),
        CartChange::QuantityChanged { id, .. } => id.clone(),
    }
}
