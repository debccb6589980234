//! The ledger operations: paired item/balance mutations.
//!
//! Split in two coordinating halves: [`items`] holds the item-collection
//! operations and their compensating deltas, [`balance`] holds the serialized
//! balance read-modify-write and the direct adjustments.

pub(crate) mod balance;
pub(crate) mod items;
