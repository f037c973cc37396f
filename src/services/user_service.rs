use async_trait::async_trait;
use std::sync::Arc;

use crate::models::auth::RequestIdentity;
use crate::models::user::{
    CreateUserRequest, DeletedUser, NewUser, ReplaceUserRequest, User, UserChanges, UserField,
};
use crate::repositories::RepositoryError;
use crate::repositories::user_repository::UserRepository;
use crate::services::access_policy::require_admin;
use crate::services::auth_service::hash_password;

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Admin role required")]
    Forbidden,

    #[error("Administrators cannot delete their own account")]
    CannotDeleteSelf,

    #[error("At least one field must be provided")]
    NothingToUpdate,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for UserError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::ConstraintViolation(_) => UserError::DuplicateEmail,
            RepositoryError::NothingToUpdate => UserError::NothingToUpdate,
            RepositoryError::InvalidReference(msg) | RepositoryError::DatabaseError(msg) => {
                UserError::DatabaseError(msg)
            }
        }
    }
}

/// Trait defining user administration operations. Every call requires an admin caller.
#[async_trait]
pub trait UserService: Send + Sync {
    /// List all users ordered by id
    async fn list_users(&self, caller: &RequestIdentity) -> Result<Vec<User>, UserError>;

    async fn get_user(&self, caller: &RequestIdentity, id: i32) -> Result<User, UserError>;

    /// Create a user, hashing the supplied password
    async fn create_user(
        &self,
        caller: &RequestIdentity,
        request: CreateUserRequest,
    ) -> Result<User, UserError>;

    /// Replace name, email and role; the password is re-hashed only when supplied
    async fn replace_user(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceUserRequest,
    ) -> Result<User, UserError>;

    /// Change only the supplied fields
    async fn update_user(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: UserChanges,
    ) -> Result<User, UserError>;

    /// Delete a user together with every expense they own
    async fn delete_user(&self, caller: &RequestIdentity, id: i32) -> Result<DeletedUser, UserError>;
}

/// Implementation of UserService
pub struct UserServiceImpl {
    user_repository: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    fn hash(password: &str) -> Result<String, UserError> {
        hash_password(password)
            .map_err(|e| UserError::DatabaseError(format!("Password hashing failed: {}", e)))
    }

    fn authorize(caller: &RequestIdentity) -> Result<(), UserError> {
        require_admin(caller).map_err(|_| {
            tracing::warn!(user_id = caller.user_id, "non-admin attempted user administration");
            UserError::Forbidden
        })
    }

    async fn apply_changes(&self, id: i32, changes: UserChanges) -> Result<User, UserError> {
        if changes.is_empty() {
            return Err(UserError::NothingToUpdate);
        }

        let mut fields = Vec::new();
        if let Some(name) = changes.name {
            fields.push(UserField::Name(name));
        }
        if let Some(email) = changes.email {
            fields.push(UserField::Email(email));
        }
        if let Some(password) = changes.password {
            fields.push(UserField::PasswordHash(Self::hash(&password)?));
        }
        if let Some(role) = changes.role {
            fields.push(UserField::Role(role));
        }

        self.user_repository
            .update(id, fields)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn list_users(&self, caller: &RequestIdentity) -> Result<Vec<User>, UserError> {
        Self::authorize(caller)?;
        Ok(self.user_repository.list().await?)
    }

    async fn get_user(&self, caller: &RequestIdentity, id: i32) -> Result<User, UserError> {
        Self::authorize(caller)?;
        self.user_repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn create_user(
        &self,
        caller: &RequestIdentity,
        request: CreateUserRequest,
    ) -> Result<User, UserError> {
        Self::authorize(caller)?;

        let new_user = NewUser {
            name: request.name,
            email: request.email,
            password_hash: Self::hash(&request.password)?,
            role: request.role,
        };

        let user = self.user_repository.create(new_user).await?;
        tracing::info!(user_id = user.id, role = ?user.role, "user created");
        Ok(user)
    }

    async fn replace_user(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceUserRequest,
    ) -> Result<User, UserError> {
        Self::authorize(caller)?;
        self.apply_changes(id, UserChanges::from(request)).await
    }

    async fn update_user(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: UserChanges,
    ) -> Result<User, UserError> {
        Self::authorize(caller)?;
        self.apply_changes(id, changes).await
    }

    async fn delete_user(&self, caller: &RequestIdentity, id: i32) -> Result<DeletedUser, UserError> {
        Self::authorize(caller)?;
        if caller.user_id == id {
            return Err(UserError::CannotDeleteSelf);
        }

        self.user_repository
            .delete_cascade(id)
            .await?
            .ok_or(UserError::NotFound)
    }
}
