use async_trait::async_trait;
use std::sync::Arc;

use crate::models::auth::RequestIdentity;
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseChanges, NewExpense, ReplaceExpenseRequest,
};
use crate::repositories::RepositoryError;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::services::access_policy::{self, AccessDecision};

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("At least one field must be provided")]
    NothingToUpdate,

    #[error("Referenced owner or category does not exist")]
    InvalidReference,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::InvalidReference(_) => ExpenseError::InvalidReference,
            RepositoryError::NothingToUpdate => ExpenseError::NothingToUpdate,
            RepositoryError::ConstraintViolation(msg) | RepositoryError::DatabaseError(msg) => {
                ExpenseError::DatabaseError(msg)
            }
        }
    }
}

const FOREIGN_OWNER: &str = "Only administrators may assign expenses to other users";
const OWNER_CHANGE: &str = "Only administrators may change the owner of an expense";

/// Trait defining expense service operations.
///
/// Admins see every expense. Everyone else only sees their own, and an
/// expense owned by someone else is reported as not found.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Expenses visible to the caller, newest first
    async fn list_expenses(&self, caller: &RequestIdentity) -> Result<Vec<Expense>, ExpenseError>;

    async fn get_expense(&self, caller: &RequestIdentity, id: i32) -> Result<Expense, ExpenseError>;

    /// Create an expense; the owner defaults to the caller
    async fn create_expense(
        &self,
        caller: &RequestIdentity,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    async fn replace_expense(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Change only the supplied fields
    async fn update_expense(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: ExpenseChanges,
    ) -> Result<Expense, ExpenseError>;

    async fn delete_expense(&self, caller: &RequestIdentity, id: i32) -> Result<(), ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
}

impl ExpenseServiceImpl {
    pub fn new(expense_repository: Arc<dyn ExpenseRepository>) -> Self {
        Self { expense_repository }
    }

    fn ensure_may_own(caller: &RequestIdentity, owner_id: i32) -> Result<(), ExpenseError> {
        match access_policy::check(caller, owner_id) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny => {
                tracing::warn!(
                    user_id = caller.user_id,
                    owner_id,
                    "rejected expense assignment to another user"
                );
                Err(ExpenseError::Forbidden(FOREIGN_OWNER))
            }
        }
    }

    async fn apply_changes(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: ExpenseChanges,
    ) -> Result<Expense, ExpenseError> {
        self.expense_repository
            .update(id, access_policy::expense_scope(caller), changes.into_fields())
            .await?
            .ok_or(ExpenseError::ExpenseNotFound)
    }
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn list_expenses(&self, caller: &RequestIdentity) -> Result<Vec<Expense>, ExpenseError> {
        Ok(self
            .expense_repository
            .list(access_policy::expense_scope(caller))
            .await?)
    }

    async fn get_expense(&self, caller: &RequestIdentity, id: i32) -> Result<Expense, ExpenseError> {
        self.expense_repository
            .find_by_id(id, access_policy::expense_scope(caller))
            .await?
            .ok_or(ExpenseError::ExpenseNotFound)
    }

    async fn create_expense(
        &self,
        caller: &RequestIdentity,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let owner_id = request.owner_id.unwrap_or(caller.user_id);
        Self::ensure_may_own(caller, owner_id)?;

        let expense = NewExpense {
            owner_id,
            category_id: request.category_id,
            title: request.title,
            amount: request.amount,
            date: request.date,
        };

        Ok(self.expense_repository.create(expense).await?)
    }

    async fn replace_expense(
        &self,
        caller: &RequestIdentity,
        id: i32,
        request: ReplaceExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        Self::ensure_may_own(caller, request.owner_id)?;
        self.apply_changes(caller, id, ExpenseChanges::from(request))
            .await
    }

    async fn update_expense(
        &self,
        caller: &RequestIdentity,
        id: i32,
        changes: ExpenseChanges,
    ) -> Result<Expense, ExpenseError> {
        if changes.is_empty() {
            return Err(ExpenseError::NothingToUpdate);
        }
        if changes.owner_id.is_some()
            && access_policy::check_reassign_owner(caller) == AccessDecision::Deny
        {
            return Err(ExpenseError::Forbidden(OWNER_CHANGE));
        }

        self.apply_changes(caller, id, changes).await
    }

    async fn delete_expense(&self, caller: &RequestIdentity, id: i32) -> Result<(), ExpenseError> {
        let deleted = self
            .expense_repository
            .delete(id, access_policy::expense_scope(caller))
            .await?;

        if deleted {
            Ok(())
        } else {
            Err(ExpenseError::ExpenseNotFound)
        }
    }
}
