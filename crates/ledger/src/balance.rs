//! The persisted budget balance.
//!
//! A single scalar row keyed by a fixed name. It is never deleted; every
//! ledger operation that moves money rewrites `amount_minor` in place.

use sea_orm::entity::prelude::*;

/// Key of the one balance the ledger reconciles.
pub(crate) const MAIN_BALANCE: &str = "main";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
