use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::user::{DeletedUser, NewUser, User, UserField};
use crate::repositories::statement_builder::{Assignment, compose_update};
use crate::repositories::{OwnerScope, RepositoryError};

const USER_COLUMNS: &str = "id, name, email, password_hash, role";

/// Trait defining user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError>;

    /// List every user ordered by ID
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Apply the given assignments; `None` when no user has this ID
    async fn update(&self, id: i32, fields: Vec<UserField>) -> Result<Option<User>, RepositoryError>;

    /// Delete a user together with all of their expenses, atomically.
    /// `None` when no user has this ID, in which case nothing is deleted.
    async fn delete_cascade(&self, id: i32) -> Result<Option<DeletedUser>, RepositoryError>;
}

impl Assignment for UserField {
    fn column(&self) -> &'static str {
        match self {
            UserField::Name(_) => "name",
            UserField::Email(_) => "email",
            UserField::PasswordHash(_) => "password_hash",
            UserField::Role(_) => "role",
        }
    }

    fn push_value(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            UserField::Name(name) => builder.push_bind(name),
            UserField::Email(email) => builder.push_bind(email),
            UserField::PasswordHash(hash) => builder.push_bind(hash),
            UserField::Role(role) => builder.push_bind(role),
        };
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, id: i32, fields: Vec<UserField>) -> Result<Option<User>, RepositoryError> {
        let mut builder = compose_update("users", USER_COLUMNS, id, OwnerScope::Any, fields)?;

        let user = builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete_cascade(&self, id: i32) -> Result<Option<DeletedUser>, RepositoryError> {
        // The transaction owns one pooled connection until commit/rollback;
        // dropping it on any early return rolls back and releases it.
        let mut tx = self.pool.begin().await?;

        // Row lock on the user: inserts of expenses for this owner take a
        // KEY SHARE lock on it through the foreign key, so they wait for
        // this transaction instead of landing between the two deletes.
        let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let expenses = sqlx::query("DELETE FROM expenses WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted_id = sqlx::query_scalar::<_, i32>("DELETE FROM users WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = deleted_id,
            expenses_deleted = expenses.rows_affected(),
            "deleted user and owned expenses"
        );

        Ok(Some(DeletedUser {
            id: deleted_id,
            expenses_deleted: expenses.rows_affected(),
        }))
    }
}
