//! Initial schema migration - creates both tables from scratch.
//!
//! The complete persisted state of Carrello:
//!
//! - `shopping_items`: planned purchases with their estimated prices
//! - `balances`: scalar budget balances keyed by a fixed name

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ShoppingItems {
    Table,
    Id,
    Title,
    Category,
    Description,
    PriceMinor,
    Acquired,
    DayOfWeek,
}

#[derive(Iden)]
enum Balances {
    Table,
    Name,
    AmountMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShoppingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShoppingItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShoppingItems::Title).string().not_null())
                    .col(ColumnDef::new(ShoppingItems::Category).string().not_null())
                    .col(
                        ColumnDef::new(ShoppingItems::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShoppingItems::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShoppingItems::Acquired).boolean().not_null())
                    .col(ColumnDef::new(ShoppingItems::DayOfWeek).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Balances::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingItems::Table).to_owned())
            .await?;
        Ok(())
    }
}
