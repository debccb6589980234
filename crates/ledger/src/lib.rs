//! Budget-ledger reconciliation engine.
//!
//! The ledger keeps one persisted balance in lock-step with a persisted
//! collection of priced shopping items: every structural change to the item
//! collection (add, remove, edit, bulk clear) is paired with the compensating
//! balance delta, and the balance can also be adjusted directly (manual
//! deposit or withdrawal). Both stores live in SQLite; committed state is
//! republished on observable streams that replay the current value to every
//! new subscriber.

use sea_orm::{
    ActiveValue, QueryOrder, TransactionTrait, prelude::*, sea_query::OnConflict,
};
use tokio::sync::{Mutex, watch};

pub use error::LedgerError;
pub use items::{Category, ShoppingItem};
pub use ops::balance::BalanceAdjustment;
pub use scan::{LookupError, ProductLookup, ScanIngestor};
pub use summary::{CategoryArc, SummaryReport, category_arcs};

mod balance;
mod error;
mod items;
pub mod money;
mod ops;
mod scan;
mod summary;

type ResultLedger<T> = Result<T, LedgerError>;

/// The reconciliation engine and only mutation entry point.
///
/// All operations take `&self` and may be invoked concurrently; the balance
/// read-modify-write is serialized behind one mutex so interleaved operations
/// never lose an update, while item writes for independent ids proceed
/// freely.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
    balance_lock: Mutex<()>,
    items_tx: watch::Sender<Vec<ShoppingItem>>,
    balance_tx: watch::Sender<i64>,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Snapshot of the current item collection, ordered by id.
    pub async fn items(&self) -> ResultLedger<Vec<ShoppingItem>> {
        let models = items::Entity::find()
            .order_by_asc(items::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(ShoppingItem::try_from).collect()
    }

    /// Return a single committed item.
    pub async fn item(&self, id: i32) -> ResultLedger<ShoppingItem> {
        let model = items::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound(id.to_string()))?;
        ShoppingItem::try_from(model)
    }

    /// Current committed balance, in minor units.
    pub async fn balance(&self) -> ResultLedger<i64> {
        self.read_balance().await
    }

    /// Live stream of item snapshots.
    ///
    /// Each subscriber immediately sees the current snapshot and then a new
    /// one after every committed mutation.
    pub fn observe_items(&self) -> watch::Receiver<Vec<ShoppingItem>> {
        self.items_tx.subscribe()
    }

    /// Live stream of the balance. Replays the current value on subscribe.
    pub fn observe_balance(&self) -> watch::Receiver<i64> {
        self.balance_tx.subscribe()
    }

    /// Republish the committed item collection. Called after every durable
    /// item mutation, never before the commit.
    pub(crate) async fn publish_items(&self) -> ResultLedger<()> {
        let snapshot = self.items().await?;
        self.items_tx.send_replace(snapshot);
        Ok(())
    }

    pub(crate) async fn read_balance(&self) -> ResultLedger<i64> {
        let model = balance::Entity::find_by_id(balance::MAIN_BALANCE.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound(balance::MAIN_BALANCE.to_string()))?;
        Ok(model.amount_minor)
    }

    /// Durably writes the balance, then emits it on the stream.
    pub(crate) async fn write_balance(&self, amount_minor: i64) -> ResultLedger<()> {
        let model = balance::ActiveModel {
            name: ActiveValue::Set(balance::MAIN_BALANCE.to_string()),
            amount_minor: ActiveValue::Set(amount_minor),
        };
        model.update(&self.database).await?;
        self.balance_tx.send_replace(amount_minor);
        Ok(())
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`, seeding the balance row at 0 when absent and
    /// priming both streams with the committed state.
    pub async fn build(self) -> ResultLedger<Ledger> {
        let db_tx = self.database.begin().await?;
        let opening = match balance::Entity::find_by_id(balance::MAIN_BALANCE.to_string())
            .one(&db_tx)
            .await?
        {
            Some(model) => model.amount_minor,
            None => {
                let seed = balance::ActiveModel {
                    name: ActiveValue::Set(balance::MAIN_BALANCE.to_string()),
                    amount_minor: ActiveValue::Set(0),
                };
                balance::Entity::insert(seed)
                    .on_conflict(
                        OnConflict::column(balance::Column::Name)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&db_tx)
                    .await?;
                0
            }
        };
        db_tx.commit().await?;

        let (items_tx, _) = watch::channel(Vec::new());
        let (balance_tx, _) = watch::channel(opening);
        let ledger = Ledger {
            database: self.database,
            balance_lock: Mutex::new(()),
            items_tx,
            balance_tx,
        };

        let snapshot = ledger.items().await?;
        ledger.items_tx.send_replace(snapshot);
        Ok(ledger)
    }
}
