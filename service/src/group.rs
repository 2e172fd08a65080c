//! Membership of the "Manager" and "Delivery" groups.

use crate::{account, Caller, Result, ServiceError};
use entity::{group, user, user_group};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Manager,
    Delivery,
}

impl GroupKind {
    /// Resolve a group by its stored name, ignoring case
    pub fn from_name(name: &str) -> Result<Self> {
        [Self::Manager, Self::Delivery]
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ServiceError::not_found("group", name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Manager => group::MANAGER,
            Self::Delivery => group::DELIVERY,
        }
    }

    /// Managers are administered by admins; delivery crew by superusers
    /// and managers.
    pub fn authorize(self, caller: &Caller) -> Result<()> {
        let allowed = match self {
            Self::Manager => caller.is_admin(),
            Self::Delivery => caller.is_superuser || caller.is_manager(),
        };

        if allowed {
            Ok(())
        } else {
            warn!(user_id = caller.id, group = self.name(), "group management denied");
            Err(ServiceError::Forbidden("forbidden".to_owned()))
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Membership {
    pub username: String,
}

/// Body of an admin's group assignment, `{"group": "Manager"}`
#[derive(Clone, Debug, Deserialize)]
pub struct Assignment {
    pub group: String,
}

pub async fn members<C>(db: &C, caller: &Caller, kind: GroupKind) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    kind.authorize(caller)?;
    let group = find_group(db, kind).await?;

    Ok(group
        .find_related(user::Entity)
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

/// Adding an existing member is a no-op
pub async fn add_member<C>(
    db: &C,
    caller: &Caller,
    kind: GroupKind,
    membership: &Membership,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    kind.authorize(caller)?;
    let user = account::get_by_username(db, &membership.username).await?;
    join(db, caller, &user, kind).await?;

    Ok(user)
}

/// Put the user with id `user_id` into any group. Reserved to admins.
pub async fn assign<C>(
    db: &C,
    caller: &Caller,
    user_id: i32,
    assignment: &Assignment,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    account::require_admin(caller)?;
    let kind = GroupKind::from_name(&assignment.group)?;
    let user = account::get_by_id(db, user_id).await?;
    join(db, caller, &user, kind).await?;

    Ok(user)
}

async fn join<C>(db: &C, caller: &Caller, user: &user::Model, kind: GroupKind) -> Result<()>
where
    C: ConnectionTrait,
{
    let group = find_group(db, kind).await?;

    let existing = user_group::Entity::find_by_id((user.id, group.id))
        .one(db)
        .await?;
    if existing.is_none() {
        user_group::Entity::insert(user_group::ActiveModel {
            user_id: Set(user.id),
            group_id: Set(group.id),
        })
        .exec_without_returning(db)
        .await?;
        info!(user_id = user.id, group = %group.name, by = caller.id, "added group member");
    }

    Ok(())
}

/// Removing a non-member is a no-op
pub async fn remove_member<C>(
    db: &C,
    caller: &Caller,
    kind: GroupKind,
    membership: &Membership,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    kind.authorize(caller)?;
    let user = account::get_by_username(db, &membership.username).await?;
    let group = find_group(db, kind).await?;

    let res = user_group::Entity::delete_many()
        .filter(user_group::Column::UserId.eq(user.id))
        .filter(user_group::Column::GroupId.eq(group.id))
        .exec(db)
        .await?;
    if res.rows_affected > 0 {
        info!(user_id = user.id, group = %group.name, by = caller.id, "removed group member");
    }

    Ok(user)
}

/// Whether `user_id` belongs to the group
pub async fn is_member<C>(db: &C, kind: GroupKind, user_id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let group = find_group(db, kind).await?;

    Ok(user_group::Entity::find_by_id((user_id, group.id))
        .one(db)
        .await?
        .is_some())
}

async fn find_group<C>(db: &C, kind: GroupKind) -> Result<group::Model>
where
    C: ConnectionTrait,
{
    group::Entity::find()
        .filter(group::Column::Name.eq(kind.name()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("group", kind.name()))
}
