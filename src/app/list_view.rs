//! Product list view: add/edit form state over the product store

use serde::Serialize;
use tracing::debug;

use crate::store::products::{Product, ProductId, ProductStore, StoreError};

/// Form mode of the list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "id", rename_all = "snake_case")]
pub enum FormMode {
    /// Form is empty, submit adds a product
    #[default]
    Viewing,
    /// Form holds an existing product, submit updates it
    Editing(ProductId),
}

/// What a form submission did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "product", rename_all = "snake_case")]
pub enum Submitted {
    Added(Product),
    Updated(Product),
}

/// Per-session list view state
#[derive(Debug, Default)]
pub struct ListView {
    mode: FormMode,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Pending-edit identifier, if any
    pub fn pending(&self) -> Option<ProductId> {
        match self.mode {
            FormMode::Viewing => None,
            FormMode::Editing(id) => Some(id),
        }
    }

    /// Enter the list view: seed defaults into an empty store, clear the form
    pub fn enter(&mut self, store: &mut ProductStore) -> Result<(), StoreError> {
        store.seed_if_empty()?;
        self.mode = FormMode::Viewing;
        Ok(())
    }

    /// Load an existing product into the form
    pub fn begin_edit(&mut self, store: &ProductStore, id: ProductId) -> Result<Product, StoreError> {
        let product = store.get(id)?.clone();
        self.mode = FormMode::Editing(id);
        debug!(id = %id, "Editing product");
        Ok(product)
    }

    /// Reset the form back to add mode
    pub fn reset(&mut self) {
        self.mode = FormMode::Viewing;
    }

    /// Submit the form: add in `Viewing`, update the pending product in
    /// `Editing`. The mode is left untouched on error.
    pub fn submit(
        &mut self,
        store: &mut ProductStore,
        name: &str,
        price: &str,
    ) -> Result<Submitted, StoreError> {
        match self.mode {
            FormMode::Viewing => store.add(name, price).map(Submitted::Added),
            FormMode::Editing(id) => {
                let product = store.update(id, name, price)?;
                self.mode = FormMode::Viewing;
                Ok(Submitted::Updated(product))
            }
        }
    }

    /// Delete a product once the user has confirmed. Returns the number of
    /// removed records (0 when unconfirmed or unknown).
    pub fn delete(
        &mut self,
        store: &mut ProductStore,
        id: ProductId,
        confirmed: bool,
    ) -> Result<usize, StoreError> {
        if !confirmed {
            return Ok(0);
        }

        let removed = store.delete(id)?;
        if self.pending() == Some(id) {
            self.mode = FormMode::Viewing;
        }
        Ok(removed)
    }
}
