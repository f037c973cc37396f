use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::category::{Category, CategoryField, CreateCategoryRequest};
use crate::repositories::statement_builder::{Assignment, compose_update};
use crate::repositories::{OwnerScope, RepositoryError};

const CATEGORY_COLUMNS: &str = "id, name, description";

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: CreateCategoryRequest) -> Result<Category, RepositoryError>;

    /// Find a category by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepositoryError>;

    /// List all categories, newest first
    async fn list(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Apply the given assignments; `None` when no category has this ID
    async fn update(
        &self,
        id: i32,
        fields: Vec<CategoryField>,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Delete a category by ID; `false` when nothing matched
    async fn delete(&self, id: i32) -> Result<bool, RepositoryError>;
}

impl Assignment for CategoryField {
    fn column(&self) -> &'static str {
        match self {
            CategoryField::Name(_) => "name",
            CategoryField::Description(_) => "description",
        }
    }

    fn push_value(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            CategoryField::Name(name) => builder.push_bind(name),
            CategoryField::Description(description) => builder.push_bind(description),
        };
    }
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: CreateCategoryRequest) -> Result<Category, RepositoryError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(category.name)
        .bind(category.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description
            FROM categories
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update(
        &self,
        id: i32,
        fields: Vec<CategoryField>,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut builder =
            compose_update("categories", CATEGORY_COLUMNS, id, OwnerScope::Any, fields)?;

        let category = builder
            .build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query_scalar::<_, i32>("DELETE FROM categories WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(deleted.is_some())
    }
}
