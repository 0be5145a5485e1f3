use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of a food item in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(pub u64);

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an extra, unique within one food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraId(pub u64);

impl fmt::Display for ExtraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional add-on to a food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub id: ExtraId,
    pub name: String,
    pub value: Decimal,
    #[serde(default)]
    pub quantity: u32,
}

impl Extra {
    /// `None` when `value * quantity` overflows.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.value.checked_mul(Decimal::from(self.quantity))
    }
}

/// Food item as served by the data API (`GET foods/:id`, `GET favorites`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: FoodId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub extras: Vec<Extra>,
    // set locally once the item is loaded into a session
    #[serde(
        rename = "formattedPrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub formatted_price: Option<String>,
}

/// Which extras list goes into a submitted order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrasPayload {
    /// The item's extras as loaded, quantities all zero.
    #[default]
    Definition,
    /// The session's extras with the selected quantities.
    Selected,
}

impl std::str::FromStr for ExtrasPayload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "definition" => Ok(Self::Definition),
            "selected" => Ok(Self::Selected),
            other => Err(format!("unknown extras payload mode: {other}")),
        }
    }
}

/// Body of `POST orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub product_id: FoodId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub thumbnail_url: String,
    pub extras: Vec<Extra>,
}
