use entity::{
    auth_token, cart, category, group, menu_item, order, order_item, user, user_group,
};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // referenced tables first, foreign keys are declared inline
        create_table(manager, user::Entity).await?;
        create_table(manager, group::Entity).await?;
        create_table(manager, user_group::Entity).await?;
        create_table(manager, auth_token::Entity).await?;
        create_table(manager, category::Entity).await?;
        create_table(manager, menu_item::Entity).await?;
        create_table(manager, cart::Entity).await?;
        create_table(manager, order::Entity).await?;
        create_table(manager, order_item::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-carts-user-menu-item")
                    .table(cart::Entity)
                    .col(cart::Column::UserId)
                    .col(cart::Column::MenuItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-delivery-crew")
                    .table(order::Entity)
                    .col(order::Column::DeliveryCrewId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, order_item::Entity).await?;
        drop_table(manager, order::Entity).await?;
        drop_table(manager, cart::Entity).await?;
        drop_table(manager, menu_item::Entity).await?;
        drop_table(manager, category::Entity).await?;
        drop_table(manager, auth_token::Entity).await?;
        drop_table(manager, user_group::Entity).await?;
        drop_table(manager, group::Entity).await?;
        drop_table(manager, user::Entity).await
    }
}

async fn create_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let schema = Schema::new(manager.get_database_backend());

    manager
        .create_table(schema.create_table_from_entity(entity))
        .await
}

async fn drop_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
