use entity::{group, user};
use sea_orm::{ConnectionTrait, DbErr, ModelTrait, QueryOrder};
use serde::Serialize;

/// The authenticated user on whose behalf an operation runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

/// Order visibility class of a caller, see [`Caller::role`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Superuser,
    /// No group membership at all
    Customer,
    DeliveryCrew,
    /// Any other membership, managers included
    Manager,
}

impl Caller {
    /// Resolve the group memberships of `user`
    pub async fn load<C>(db: &C, user: user::Model) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let groups = user
            .find_related(group::Entity)
            .order_by_asc(group::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect();

        Ok(Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            groups,
        })
    }

    pub fn in_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn is_manager(&self) -> bool {
        self.in_group(group::MANAGER)
    }

    /// Branches are checked in order: superuser, no groups, delivery crew.
    /// Everything else falls through to [`Role::Manager`].
    pub fn role(&self) -> Role {
        if self.is_superuser {
            Role::Superuser
        } else if self.groups.is_empty() {
            Role::Customer
        } else if self.in_group(group::DELIVERY) {
            Role::DeliveryCrew
        } else {
            Role::Manager
        }
    }
}
