use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::expense::{Expense, ExpenseField, NewExpense};
use crate::repositories::statement_builder::{
    Assignment, compose_delete, compose_find, compose_list, compose_update,
};
use crate::repositories::{OwnerScope, RepositoryError};

const EXPENSE_TABLE: &str = "expenses";
const EXPENSE_COLUMNS: &str = "id, owner_id, category_id, title, amount, date";

/// Trait defining expense repository operations.
///
/// Every read and write takes an [`OwnerScope`]; a row outside the scope
/// behaves exactly like a missing row.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Insert a new expense
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError>;

    /// Find an expense by ID within the scope
    async fn find_by_id(&self, id: i32, scope: OwnerScope) -> Result<Option<Expense>, RepositoryError>;

    /// List expenses within the scope, newest first
    async fn list(&self, scope: OwnerScope) -> Result<Vec<Expense>, RepositoryError>;

    /// Apply the given assignments to an expense within the scope
    async fn update(
        &self,
        id: i32,
        scope: OwnerScope,
        fields: Vec<ExpenseField>,
    ) -> Result<Option<Expense>, RepositoryError>;

    /// Delete an expense within the scope; `false` when nothing matched
    async fn delete(&self, id: i32, scope: OwnerScope) -> Result<bool, RepositoryError>;
}

impl Assignment for ExpenseField {
    fn column(&self) -> &'static str {
        match self {
            ExpenseField::OwnerId(_) => "owner_id",
            ExpenseField::CategoryId(_) => "category_id",
            ExpenseField::Title(_) => "title",
            ExpenseField::Amount(_) => "amount",
            ExpenseField::Date(_) => "date",
        }
    }

    fn push_value(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            ExpenseField::OwnerId(owner_id) => builder.push_bind(owner_id),
            ExpenseField::CategoryId(category_id) => builder.push_bind(category_id),
            ExpenseField::Title(title) => builder.push_bind(title),
            ExpenseField::Amount(amount) => builder.push_bind(amount),
            ExpenseField::Date(date) => builder.push_bind(date),
        };
    }
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError> {
        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (owner_id, category_id, title, amount, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, category_id, title, amount, date
            "#,
        )
        .bind(expense.owner_id)
        .bind(expense.category_id)
        .bind(expense.title)
        .bind(expense.amount)
        .bind(expense.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i32, scope: OwnerScope) -> Result<Option<Expense>, RepositoryError> {
        let mut builder = compose_find(EXPENSE_TABLE, EXPENSE_COLUMNS, id, scope);

        let expense = builder
            .build_query_as::<Expense>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    async fn list(&self, scope: OwnerScope) -> Result<Vec<Expense>, RepositoryError> {
        let mut builder = compose_list(EXPENSE_TABLE, EXPENSE_COLUMNS, scope, "id DESC");

        let expenses = builder
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    async fn update(
        &self,
        id: i32,
        scope: OwnerScope,
        fields: Vec<ExpenseField>,
    ) -> Result<Option<Expense>, RepositoryError> {
        let mut builder = compose_update(EXPENSE_TABLE, EXPENSE_COLUMNS, id, scope, fields)?;

        let expense = builder
            .build_query_as::<Expense>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    async fn delete(&self, id: i32, scope: OwnerScope) -> Result<bool, RepositoryError> {
        let mut builder = compose_delete(EXPENSE_TABLE, id, scope);

        let deleted = builder
            .build_query_scalar::<i32>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(deleted.is_some())
    }
}
