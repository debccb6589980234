//! Item-collection operations and their compensating balance deltas.
//!
//! Each operation commits its item-store half first, republishes the item
//! snapshot, then applies the balance delta. The two halves are deliberately
//! separate durable writes: if the item half fails the balance is untouched;
//! if the balance half fails after the item committed, the paired-delta
//! helper reports the inconsistency and the error reaches the caller.

use sea_orm::{ActiveValue, QueryFilter, prelude::*, sea_query::Expr};
use tracing::{debug, error, warn};

use crate::{Ledger, ResultLedger, ShoppingItem, items};

impl Ledger {
    /// Inserts a planned purchase and earmarks its price against the balance.
    ///
    /// Returns the id the store assigned. The balance may legally go negative
    /// here; only direct withdrawals are gated.
    pub async fn add_item(&self, item: &ShoppingItem) -> ResultLedger<i32> {
        let mut model = items::ActiveModel::from(item);
        if item.id == 0 {
            model.id = ActiveValue::NotSet;
        }
        let inserted = items::Entity::insert(model).exec(&self.database).await?;
        let id = inserted.last_insert_id;
        debug!(id, title = %item.title, price_minor = item.price_minor, "item added");
        self.republish_after_commit().await?;

        self.apply_paired_delta(-item.earmark_minor()).await?;
        Ok(id)
    }

    /// Deletes an item and refunds its earmark.
    ///
    /// The refund is computed from the committed row, not from whatever copy
    /// the caller holds. An unknown id degrades to a logged no-op.
    pub async fn remove_item(&self, id: i32) -> ResultLedger<()> {
        let Some(model) = items::Entity::find_by_id(id).one(&self.database).await? else {
            warn!(id, "remove targets an unknown item; nothing deleted");
            return Ok(());
        };
        let item = ShoppingItem::try_from(model)?;

        items::Entity::delete_by_id(id).exec(&self.database).await?;
        debug!(id, title = %item.title, price_minor = item.price_minor, "item removed");
        self.republish_after_commit().await?;

        self.apply_paired_delta(item.earmark_minor()).await?;
        Ok(())
    }

    /// Replaces a stored item and applies the price difference to the balance.
    ///
    /// The previous value is read from the committed store by `item.id` -- a
    /// caller-supplied "old" item could be stale and would corrupt the delta.
    /// When no previous row exists the update degrades to a no-op on the
    /// store and the edit is balance-neutral; that inconsistency is logged,
    /// not fatal.
    pub async fn edit_item(&self, item: &ShoppingItem) -> ResultLedger<()> {
        let previous = items::Entity::find_by_id(item.id)
            .one(&self.database)
            .await?
            .map(ShoppingItem::try_from)
            .transpose()?;

        let updated = items::Entity::update_many()
            .set(items::ActiveModel::from(item))
            .filter(items::Column::Id.eq(item.id))
            .exec(&self.database)
            .await?;
        if updated.rows_affected == 0 {
            warn!(id = item.id, "edit targets an unknown item; nothing updated");
        } else {
            self.republish_after_commit().await?;
        }

        match previous {
            Some(old) => {
                let delta = old.earmark_minor() - item.earmark_minor();
                debug!(id = item.id, price_difference_minor = delta, "item edited");
                self.apply_paired_delta(delta).await?;
            }
            None => {
                warn!(
                    id = item.id,
                    "no committed item found for edit; skipping balance delta"
                );
            }
        }
        Ok(())
    }

    /// Deletes every item and refunds the sum of their earmarks.
    ///
    /// The refund is computed from the snapshot taken before the delete. A
    /// non-positive total skips the balance write entirely.
    pub async fn clear_items(&self) -> ResultLedger<()> {
        let snapshot = self.items().await?;
        let total_refund: i64 = snapshot.iter().map(ShoppingItem::earmark_minor).sum();

        items::Entity::delete_many().exec(&self.database).await?;
        debug!(
            cleared = snapshot.len(),
            total_refund_minor = total_refund,
            "all items cleared"
        );
        self.republish_after_commit().await?;

        if total_refund > 0 {
            self.apply_paired_delta(total_refund).await?;
        }
        Ok(())
    }

    /// Flips the "acquired" flag. Metadata only: bypasses the balance.
    pub async fn set_item_acquired(&self, id: i32, acquired: bool) -> ResultLedger<()> {
        let updated = items::Entity::update_many()
            .col_expr(items::Column::Acquired, Expr::value(acquired))
            .filter(items::Column::Id.eq(id))
            .exec(&self.database)
            .await?;
        if updated.rows_affected == 0 {
            warn!(id, "status toggle targets an unknown item; nothing updated");
            return Ok(());
        }
        self.publish_items().await?;
        Ok(())
    }

    /// Republishes the item snapshot between the committed item write and its
    /// balance delta. A failure here aborts the operation before the delta is
    /// applied, leaving the stores inconsistent just like a failed balance
    /// half; it gets the same error-severity report before surfacing.
    async fn republish_after_commit(&self) -> ResultLedger<()> {
        match self.publish_items().await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(
                    %err,
                    "snapshot republish failed after committed item mutation; \
                     paired balance delta skipped, stores are inconsistent"
                );
                Err(err)
            }
        }
    }
}
