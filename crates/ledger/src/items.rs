//! Shopping item primitives.
//!
//! A `ShoppingItem` is a planned purchase whose estimated price the ledger
//! earmarks against the budget balance the moment the item is stored.

use chrono::Weekday;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, ResultLedger};

/// Fixed set of shopping categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Health,
    Clothes,
    Electronics,
    Cleaning,
    Recreation,
    Misc,
}

impl Category {
    /// All categories, in display order. Summary consumers iterate this so
    /// charts come out deterministic.
    pub const ALL: [Category; 7] = [
        Self::Food,
        Self::Health,
        Self::Clothes,
        Self::Electronics,
        Self::Cleaning,
        Self::Recreation,
        Self::Misc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Health => "health",
            Self::Clothes => "clothes",
            Self::Electronics => "electronics",
            Self::Cleaning => "cleaning",
            Self::Recreation => "recreation",
            Self::Misc => "misc",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "food" => Ok(Self::Food),
            "health" => Ok(Self::Health),
            "clothes" => Ok(Self::Clothes),
            "electronics" => Ok(Self::Electronics),
            "cleaning" => Ok(Self::Cleaning),
            "recreation" => Ok(Self::Recreation),
            "misc" => Ok(Self::Misc),
            other => Err(LedgerError::InvalidItem(format!(
                "invalid category: {other}"
            ))),
        }
    }
}

/// A planned purchase.
///
/// `id == 0` marks an item not yet persisted; the store assigns a positive,
/// stable id on insert. `acquired` and `day_of_week` are metadata only and
/// never move the balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: i32,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub price_minor: i64,
    pub acquired: bool,
    pub day_of_week: Weekday,
}

impl ShoppingItem {
    /// Builds a not-yet-persisted item, validating producer input.
    ///
    /// Rejects an empty (or whitespace-only) title and a negative estimated
    /// price. Validation lives here, at the producer boundary; the ledger
    /// operations additionally clamp prices when computing deltas and never
    /// trust this check alone.
    pub fn new(
        title: impl Into<String>,
        category: Category,
        description: impl Into<String>,
        price_minor: i64,
        day_of_week: Weekday,
    ) -> ResultLedger<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LedgerError::InvalidItem("title must not be empty".to_string()));
        }
        if price_minor < 0 {
            return Err(LedgerError::InvalidItem(
                "estimated price must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: 0,
            title,
            category,
            description: description.into(),
            price_minor,
            acquired: false,
            day_of_week,
        })
    }

    /// The amount this item earmarks against the balance.
    ///
    /// A stored price should never be negative, but the ledger does not trust
    /// that when computing deltas: a corrupt price contributes zero instead of
    /// inflating the balance on refund.
    pub(crate) fn earmark_minor(&self) -> i64 {
        self.price_minor.max(0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shopping_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub category: String,
    pub description: String,
    pub price_minor: i64,
    pub acquired: bool,
    pub day_of_week: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ShoppingItem> for ActiveModel {
    fn from(item: &ShoppingItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id),
            title: ActiveValue::Set(item.title.clone()),
            category: ActiveValue::Set(item.category.as_str().to_string()),
            description: ActiveValue::Set(item.description.clone()),
            price_minor: ActiveValue::Set(item.price_minor),
            acquired: ActiveValue::Set(item.acquired),
            day_of_week: ActiveValue::Set(item.day_of_week.to_string()),
        }
    }
}

impl TryFrom<Model> for ShoppingItem {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let category = Category::try_from(model.category.as_str())?;
        let day_of_week = model
            .day_of_week
            .parse::<Weekday>()
            .map_err(|_| {
                LedgerError::InvalidItem(format!("invalid day of week: {}", model.day_of_week))
            })?;
        Ok(Self {
            id: model.id,
            title: model.title,
            category,
            description: model.description,
            price_minor: model.price_minor,
            acquired: model.acquired,
            day_of_week,
        })
    }
}
