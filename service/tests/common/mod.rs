#![allow(dead_code)]

use entity::{category, group, menu_item, user, user_group};
use little_lemon_service::{
    account::{self, Registration},
    Caller,
};
use migration::{Migrator, MigratorTrait};
use rust_decimal_macros::dec;
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};

pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Register `username` and put it into `groups`
pub async fn user_in(db: &DatabaseConnection, username: &str, groups: &[&str]) -> Caller {
    let user = account::register(
        db,
        Registration {
            username: username.to_owned(),
            password: "lemon".to_owned(),
            email: format!("{username}@littlelemon.test"),
        },
    )
    .await
    .unwrap();

    for name in groups {
        let group = group::Entity::find()
            .filter(group::Column::Name.eq(*name))
            .one(db)
            .await
            .unwrap()
            .unwrap();
        user_group::Entity::insert(user_group::ActiveModel {
            user_id: Set(user.id),
            group_id: Set(group.id),
        })
        .exec_without_returning(db)
        .await
        .unwrap();
    }

    reload(db, user.id).await
}

pub async fn superuser(db: &DatabaseConnection, username: &str) -> Caller {
    assert!(account::ensure_superuser(db, username, "admin").await.unwrap());
    let user = account::get_by_username(db, username).await.unwrap();
    reload(db, user.id).await
}

pub async fn reload(db: &DatabaseConnection, user_id: i32) -> Caller {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    Caller::load(db, user).await.unwrap()
}

pub async fn category(db: &DatabaseConnection, slug: &str, title: &str) -> category::Model {
    category::ActiveModel {
        slug: Set(slug.to_owned()),
        title: Set(title.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn menu_item(
    db: &DatabaseConnection,
    category_id: i32,
    title: &str,
    price: Decimal,
) -> menu_item::Model {
    menu_item::ActiveModel {
        title: Set(title.to_owned()),
        price: Set(price),
        inventory: Set(20),
        featured: Set(false),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A "Mains" category holding Bruschetta (10.00) and Lemon Dessert (15.00)
pub async fn menu(db: &DatabaseConnection) -> (menu_item::Model, menu_item::Model) {
    let mains = category(db, "mains", "Mains").await;
    let a = menu_item(db, mains.id, "Bruschetta", dec!(10.00)).await;
    let b = menu_item(db, mains.id, "Lemon Dessert", dec!(15.00)).await;
    (a, b)
}
