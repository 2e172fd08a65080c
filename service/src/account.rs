//! Users and token authentication.

use crate::{Caller, Result, ServiceError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use entity::{auth_token, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Admin edit of an account; absent fields stay as they are
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_staff: Option<bool>,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Register a customer account, without staff rights or group membership
#[instrument(level = "debug", skip(db, registration), fields(username = %registration.username))]
pub async fn register<C>(db: &C, registration: Registration) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let username = registration.username.trim();
    if username.is_empty() {
        return Err(ServiceError::Validation("username may not be blank".to_owned()));
    }
    if registration.password.is_empty() {
        return Err(ServiceError::Validation("password may not be blank".to_owned()));
    }
    if find_by_username(db, username).await?.is_some() {
        return Err(ServiceError::Validation(
            "a user with that username already exists".to_owned(),
        ));
    }

    let user = create_user(db, username, &registration.email, &registration.password, false).await?;
    info!(user_id = user.id, "registered user");

    Ok(user)
}

/// Create the superuser `username` unless a user of that name exists.
/// Returns whether a user was created.
pub async fn ensure_superuser<C>(db: &C, username: &str, password: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    if find_by_username(db, username).await?.is_some() {
        return Ok(false);
    }

    let user = create_user(db, username, "", password, true).await?;
    info!(user_id = user.id, username, "created superuser");

    Ok(true)
}

/// Exchange credentials for an auth token, reusing the user's existing token
#[instrument(level = "debug", skip(db))]
pub async fn login<C>(db: &C, credentials: &Credentials) -> Result<String>
where
    C: ConnectionTrait,
{
    let user = find_by_username(db, &credentials.username)
        .await?
        .filter(|user| verify_password(&credentials.password, &user.password))
        .ok_or_else(|| {
            ServiceError::Validation("unable to log in with provided credentials".to_owned())
        })?;

    if let Some(token) = auth_token::Entity::find()
        .filter(auth_token::Column::UserId.eq(user.id))
        .one(db)
        .await?
    {
        return Ok(token.key);
    }

    let token = auth_token::ActiveModel {
        key: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(user.id),
        created: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;
    info!(user_id = user.id, "issued auth token");

    Ok(token.key)
}

/// Revoke every token of the caller
pub async fn logout<C>(db: &C, caller: &Caller) -> Result<u64>
where
    C: ConnectionTrait,
{
    let res = auth_token::Entity::delete_many()
        .filter(auth_token::Column::UserId.eq(caller.id))
        .exec(db)
        .await?;

    Ok(res.rows_affected)
}

/// Resolve a token key into the caller it belongs to
pub async fn authenticate<C>(db: &C, key: &str) -> Result<Option<Caller>>
where
    C: ConnectionTrait,
{
    let found = auth_token::Entity::find_by_id(key.to_owned())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    match found {
        Some((_, Some(user))) => Ok(Some(Caller::load(db, user).await?)),
        _ => Ok(None),
    }
}

/// Account administration is reserved to staff and superusers
pub fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        warn!(user_id = caller.id, "user administration denied");
        Err(ServiceError::Forbidden("forbidden".to_owned()))
    }
}

/// Create a customer account on behalf of an admin
pub async fn create_user_as_admin<C>(
    db: &C,
    caller: &Caller,
    registration: Registration,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    require_admin(caller)?;
    register(db, registration).await
}

pub async fn list_users<C>(db: &C, caller: &Caller) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    require_admin(caller)?;

    Ok(user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_user<C>(db: &C, caller: &Caller, id: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    require_admin(caller)?;
    get_by_id(db, id).await
}

#[instrument(level = "debug", skip(db, caller, update), fields(by = caller.id))]
pub async fn update_user<C>(
    db: &C,
    caller: &Caller,
    id: i32,
    update: UserUpdate,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    require_admin(caller)?;
    let mut user = get_by_id(db, id).await?.into_active_model();

    if let Some(username) = update.username {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::Validation("username may not be blank".to_owned()));
        }
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Id.ne(id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Validation(
                "a user with that username already exists".to_owned(),
            ));
        }
        user.username = Set(username.to_owned());
    }
    if let Some(email) = update.email {
        user.email = Set(email);
    }
    if let Some(is_staff) = update.is_staff {
        user.is_staff = Set(is_staff);
    }

    let user = user.update(db).await?;
    info!(user_id = user.id, "updated user");

    Ok(user)
}

/// Deleting a user takes their tokens, cart, memberships and orders with them
pub async fn delete_user<C>(db: &C, caller: &Caller, id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    require_admin(caller)?;
    if caller.id == id {
        return Err(ServiceError::Validation(
            "cannot delete your own account".to_owned(),
        ));
    }

    let res = user::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("user", id));
    }
    info!(user_id = id, by = caller.id, "deleted user");

    Ok(())
}

pub async fn get_by_id<C>(db: &C, id: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", id))
}

pub async fn find_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Look up a user by name, failing with [`ServiceError::NotFound`]
pub async fn get_by_username<C>(db: &C, username: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    find_by_username(db, username)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", username))
}

async fn create_user<C>(
    db: &C,
    username: &str,
    email: &str,
    password: &str,
    superuser: bool,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    Ok(user::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password: Set(hash_password(password)?),
        is_staff: Set(superuser),
        is_superuser: Set(superuser),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Argon2id hash in PHC string format
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}
