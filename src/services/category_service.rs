use async_trait::async_trait;
use std::sync::Arc;

use crate::models::auth::RequestIdentity;
use crate::models::category::{
    Category, CategoryChanges, CreateCategoryRequest, ReplaceCategoryRequest,
};
use crate::repositories::RepositoryError;
use crate::repositories::category_repository::CategoryRepository;
use crate::services::access_policy::require_admin;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Category is in use and cannot be deleted")]
    CategoryInUse,

    #[error("Only administrators may modify categories")]
    Forbidden,

    #[error("At least one field must be provided")]
    NothingToUpdate,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::InvalidReference(_) => CategoryError::CategoryInUse,
            RepositoryError::NothingToUpdate => CategoryError::NothingToUpdate,
            RepositoryError::ConstraintViolation(msg) | RepositoryError::DatabaseError(msg) => {
                CategoryError::DatabaseError(msg)
            }
        }
    }
}

/// Trait defining category service operations.
///
/// Categories are shared: anyone may read them, only admins may change them.
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// All categories, newest first
    async fn get_categories(&self) -> Result<Vec<Category>, CategoryError>;

    async fn get_category(&self, id: i32) -> Result<Category, CategoryError>;

    async fn create_category(
        &self,
        caller: &RequestIdentity,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    async fn replace_category(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceCategoryRequest,
    ) -> Result<Category, CategoryError>;

    async fn update_category(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: CategoryChanges,
    ) -> Result<Category, CategoryError>;

    /// Delete a category no expense refers to
    async fn delete_category(&self, caller: &RequestIdentity, id: i32) -> Result<(), CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            category_repository,
        }
    }

    fn authorize(caller: &RequestIdentity) -> Result<(), CategoryError> {
        require_admin(caller).map_err(|_| {
            tracing::debug!(user_id = caller.user_id, "category mutation rejected");
            CategoryError::Forbidden
        })
    }

    async fn apply_changes(
        &self,
        id: i32,
        changes: CategoryChanges,
    ) -> Result<Category, CategoryError> {
        if changes.is_empty() {
            return Err(CategoryError::NothingToUpdate);
        }

        self.category_repository
            .update(id, changes.into_fields())
            .await?
            .ok_or(CategoryError::CategoryNotFound)
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn get_categories(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.category_repository.list().await?)
    }

    async fn get_category(&self, id: i32) -> Result<Category, CategoryError> {
        self.category_repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)
    }

    async fn create_category(
        &self,
        caller: &RequestIdentity,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        Self::authorize(caller)?;
        Ok(self.category_repository.create(request).await?)
    }

    async fn replace_category(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceCategoryRequest,
    ) -> Result<Category, CategoryError> {
        Self::authorize(caller)?;
        self.apply_changes(id, CategoryChanges::from(request)).await
    }

    async fn update_category(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: CategoryChanges,
    ) -> Result<Category, CategoryError> {
        Self::authorize(caller)?;
        self.apply_changes(id, changes).await
    }

    async fn delete_category(&self, caller: &RequestIdentity, id: i32) -> Result<(), CategoryError> {
        Self::authorize(caller)?;
        if self.category_repository.delete(id).await? {
            Ok(())
        } else {
            Err(CategoryError::CategoryNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::test_utils::InMemoryStore;
    use rust_decimal::Decimal;

    fn identity(user_id: i32, role: Role) -> RequestIdentity {
        RequestIdentity {
            user_id,
            role,
            name: "Someone".to_string(),
        }
    }

    fn create_request(name: &str) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            description: format!("{} expenses", name),
        }
    }

    #[tokio::test]
    async fn test_get_categories_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let rent = store.seed_category("Rent");
        let service = CategoryServiceImpl::new(store);

        let categories = service.get_categories().await.unwrap();

        assert_eq!(categories, vec![rent, food]);
    }

    #[tokio::test]
    async fn test_get_categories_database_error() {
        let store = Arc::new(InMemoryStore::with_failure());
        let service = CategoryServiceImpl::new(store);

        assert!(matches!(
            service.get_categories().await,
            Err(CategoryError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_creates_category() {
        let store = Arc::new(InMemoryStore::new());
        let service = CategoryServiceImpl::new(store.clone());

        let category = service
            .create_category(&identity(1, Role::Admin), create_request("Travel"))
            .await
            .unwrap();

        assert_eq!(category.name, "Travel");
        assert_eq!(store.stored_category(category.id), Some(category));
    }

    #[tokio::test]
    async fn test_common_user_cannot_mutate_categories() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let service = CategoryServiceImpl::new(store.clone());
        let caller = identity(7, Role::Common);

        assert!(matches!(
            service.create_category(&caller, create_request("Travel")).await,
            Err(CategoryError::Forbidden)
        ));
        assert!(matches!(
            service.replace_category(&caller, food.id, create_request("Groceries")).await,
            Err(CategoryError::Forbidden)
        ));
        assert!(matches!(
            service.delete_category(&caller, food.id).await,
            Err(CategoryError::Forbidden)
        ));
        assert_eq!(store.stored_category(food.id), Some(food));
    }

    #[tokio::test]
    async fn test_common_user_reads_categories() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let service = CategoryServiceImpl::new(store);

        assert_eq!(service.get_category(food.id).await.unwrap(), food);
    }

    #[tokio::test]
    async fn test_update_category_changes_only_supplied_fields() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let service = CategoryServiceImpl::new(store);

        let changes = CategoryChanges {
            description: Some("Groceries and restaurants".to_string()),
            ..Default::default()
        };
        let updated = service
            .update_category(&identity(1, Role::Admin), food.id, changes)
            .await
            .unwrap();

        assert_eq!(updated.name, "Food");
        assert_eq!(updated.description, "Groceries and restaurants");
    }

    #[tokio::test]
    async fn test_update_category_without_fields() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let service = CategoryServiceImpl::new(store.clone());
        let calls_before = store.storage_calls();

        let result = service
            .update_category(&identity(1, Role::Admin), food.id, CategoryChanges::default())
            .await;

        assert!(matches!(result, Err(CategoryError::NothingToUpdate)));
        assert_eq!(store.storage_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_replace_missing_category() {
        let store = Arc::new(InMemoryStore::new());
        let service = CategoryServiceImpl::new(store);

        assert!(matches!(
            service
                .replace_category(&identity(1, Role::Admin), 42, create_request("Food"))
                .await,
            Err(CategoryError::CategoryNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_category_in_use() {
        let store = Arc::new(InMemoryStore::new());
        let owner = store.seed_user("Carl", "carl@example.com", "password123", Role::Common);
        let food = store.seed_category("Food");
        store.seed_expense(owner.id, food.id, "Lunch", Decimal::new(1250, 2));
        let service = CategoryServiceImpl::new(store.clone());

        let result = service.delete_category(&identity(1, Role::Admin), food.id).await;

        assert!(matches!(result, Err(CategoryError::CategoryInUse)));
        assert!(store.stored_category(food.id).is_some());
    }

    #[tokio::test]
    async fn test_delete_category() {
        let store = Arc::new(InMemoryStore::new());
        let food = store.seed_category("Food");
        let service = CategoryServiceImpl::new(store.clone());
        let admin = identity(1, Role::Admin);

        service.delete_category(&admin, food.id).await.unwrap();

        assert!(store.stored_category(food.id).is_none());
        assert!(matches!(
            service.delete_category(&admin, food.id).await,
            Err(CategoryError::CategoryNotFound)
        ));
    }
}
