use rust_decimal::Decimal;

use super::model::{Extra, ExtraId, ExtrasPayload, FoodItem, OrderRecord};

/// In-memory selection state for one food item.
///
/// Quantities are local to the session; nothing here talks to the data API.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSession {
    item: FoodItem,
    extras: Vec<Extra>,
    base_quantity: u32,
    favorite: bool,
}

impl SelectionSession {
    /// Starts a session from a freshly fetched item. Every extra starts at zero.
    pub fn new(mut item: FoodItem, favorite: bool) -> Self {
        for extra in &mut item.extras {
            extra.quantity = 0;
        }
        let extras = item.extras.clone();
        Self {
            item,
            extras,
            base_quantity: 1,
            favorite,
        }
    }

    pub fn item(&self) -> &FoodItem {
        &self.item
    }

    pub fn extras(&self) -> &[Extra] {
        &self.extras
    }

    pub fn base_quantity(&self) -> u32 {
        self.base_quantity
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite
    }

    pub(crate) fn set_favorite(&mut self, favorite: bool) {
        self.favorite = favorite;
    }

    fn extra_mut(&mut self, id: ExtraId) -> Option<&mut Extra> {
        self.extras.iter_mut().find(|e| e.id == id)
    }

    /// Returns the new quantity, or `None` when the id is unknown.
    pub fn increment_extra(&mut self, id: ExtraId) -> Option<u32> {
        let extra = self.extra_mut(id)?;
        extra.quantity = extra.quantity.saturating_add(1);
        Some(extra.quantity)
    }

    /// Floors at zero. Returns the new quantity, or `None` when the id is unknown.
    pub fn decrement_extra(&mut self, id: ExtraId) -> Option<u32> {
        let extra = self.extra_mut(id)?;
        extra.quantity = extra.quantity.saturating_sub(1);
        Some(extra.quantity)
    }

    pub fn increment_base_quantity(&mut self) -> u32 {
        self.base_quantity = self.base_quantity.saturating_add(1);
        self.base_quantity
    }

    pub fn decrement_base_quantity(&mut self) -> u32 {
        if self.base_quantity > 1 {
            self.base_quantity -= 1;
        }
        self.base_quantity
    }

    /// `price * base_quantity + sum(value * quantity)`, computed on every call.
    /// `None` when the amount does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        let base = self
            .item
            .price
            .checked_mul(Decimal::from(self.base_quantity))?;
        self.extras
            .iter()
            .try_fold(base, |acc, e| acc.checked_add(e.subtotal()?))
    }

    /// Item body for `POST favorites`.
    pub fn favorite_payload(&self, payload: ExtrasPayload) -> FoodItem {
        match payload {
            ExtrasPayload::Definition => self.item.clone(),
            ExtrasPayload::Selected => FoodItem {
                extras: self.extras.clone(),
                ..self.item.clone()
            },
        }
    }

    pub fn order_record(&self, payload: ExtrasPayload) -> OrderRecord {
        let extras = match payload {
            ExtrasPayload::Definition => self.item.extras.clone(),
            ExtrasPayload::Selected => self.extras.clone(),
        };
        OrderRecord {
            product_id: self.item.id,
            name: self.item.name.clone(),
            description: self.item.description.clone(),
            price: self.item.price,
            category: self.item.category.clone(),
            thumbnail_url: self.item.thumbnail_url.clone(),
            extras,
        }
    }
}
