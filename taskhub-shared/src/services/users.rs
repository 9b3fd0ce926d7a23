/// Identity: registration, login, token authentication, roles, admin seed

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{load_user, validation};
use crate::auth::access::{authorize_role_change, Actor, DenyReason};
use crate::auth::jwt::{self, JwtError};
use crate::auth::password;
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::{NewUser, User, UserRole};
use crate::store::{Store, StoreError};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Issued token plus the user it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    auth: Arc<AuthSettings>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, auth: AuthSettings) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
        }
    }

    fn session(&self, user: User) -> ServiceResult<AuthSession> {
        let token = jwt::issue_token(user.id, &self.auth.jwt_secret, self.auth.token_ttl_hours)?;
        Ok(AuthSession { token, user })
    }

    /// Creates a regular account and signs it in
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad name, email, or weak password
    /// - `Conflict` if the email is already registered
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<AuthSession> {
        let name = validation::user_name(&input.name)?;
        let email = validation::email(&input.email)?;
        password::validate_password_strength(&input.password).map_err(ServiceError::Validation)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let user = self
            .store
            .insert_user(NewUser {
                name,
                email,
                password_hash: password::hash_password(&input.password)?,
                role: UserRole::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Checks credentials; any mismatch yields the same `Unauthorized`
    pub async fn login(&self, input: LoginInput) -> ServiceResult<AuthSession> {
        let email = input.email.trim().to_lowercase();

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !password::verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.session(user)
    }

    /// Resolves a bearer token to the current state of its user
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Actor> {
        let claims = jwt::validate_token(token, &self.auth.jwt_secret).map_err(|e| match e {
            JwtError::Expired => ServiceError::Unauthorized("Token has expired".to_string()),
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        })?;

        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User no longer exists".to_string()))?;

        Ok(Actor::from(&user))
    }

    pub async fn current_user(&self, actor: &Actor) -> ServiceResult<User> {
        load_user(self.store.as_ref(), actor.id).await
    }

    /// All users; admins only
    pub async fn list(&self, actor: &Actor) -> ServiceResult<Vec<User>> {
        if !actor.is_admin() {
            return Err(DenyReason::AdminRequired.into());
        }
        Ok(self.store.list_users().await?)
    }

    /// Overwrites a user's global role
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is an admin
    /// - `Validation` if `role` is not `user` or `admin`
    /// - `Conflict` if an admin tries to demote themselves
    /// - `NotFound` if the target doesn't exist
    pub async fn set_role(&self, actor: &Actor, target_id: Uuid, role: &str) -> ServiceResult<User> {
        if !actor.is_admin() {
            return Err(DenyReason::AdminRequired.into());
        }

        let role: UserRole = role.parse().map_err(ServiceError::Validation)?;
        authorize_role_change(actor, target_id, role).into_result()?;

        let user = self
            .store
            .set_user_role(target_id, role)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        tracing::info!(actor_id = %actor.id, user_id = %user.id, role = %role, "User role updated");
        Ok(user)
    }

    /// Ensures an admin account exists for `email`
    ///
    /// Creates it if missing; promotes an existing non-admin account with
    /// that email. Running it again changes nothing.
    pub async fn seed_admin(&self, email: &str, password: &str, name: &str) -> ServiceResult<User> {
        let email = validation::email(email)?;

        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            if existing.role.is_admin() {
                tracing::debug!(user_id = %existing.id, "Admin account already present");
                return Ok(existing);
            }

            let promoted = self
                .store
                .set_user_role(existing.id, UserRole::Admin)
                .await?
                .ok_or_else(|| ServiceError::not_found("User"))?;
            tracing::info!(user_id = %promoted.id, "Existing user promoted to admin");
            return Ok(promoted);
        }

        let created = self
            .store
            .insert_user(NewUser {
                name: name.trim().to_string(),
                email: email.clone(),
                password_hash: password::hash_password(password)?,
                role: UserRole::Admin,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Admin account created");
                Ok(user)
            }
            // Lost a race with a concurrent seed or registration: promote instead
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .store
                    .find_user_by_email(&email)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("User"))?;
                self.store
                    .set_user_role(existing.id, UserRole::Admin)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("User"))
            }
            Err(e) => Err(e.into()),
        }
    }
}
