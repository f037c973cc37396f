use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_amount;

/// Expense entity as stored in the `expenses` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Expense {
    pub id: i32,
    pub owner_id: i32,
    pub category_id: i32,
    pub title: String,
    pub amount: Decimal,
    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,
}

/// Request payload for creating an expense.
///
/// `owner_id` defaults to the caller. Only admins may create expenses for
/// someone else.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub owner_id: Option<i32>,

    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub category_id: i32,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,

    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,
}

/// Request payload for replacing an expense; every field is required
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReplaceExpenseRequest {
    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub owner_id: i32,

    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub category_id: i32,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,

    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,
}

/// Partial update of an expense. Absent and `null` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExpenseChanges {
    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub owner_id: Option<i32>,

    #[validate(range(min = 1, message = "Identifiers must be positive integers"))]
    pub category_id: Option<i32>,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_amount"))]
    pub amount: Option<Decimal>,

    #[schema(format = "date", example = "2024-01-16")]
    pub date: Option<NaiveDate>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none()
            && self.category_id.is_none()
            && self.title.is_none()
            && self.amount.is_none()
            && self.date.is_none()
    }

    pub fn into_fields(self) -> Vec<ExpenseField> {
        let mut fields = Vec::new();
        if let Some(owner_id) = self.owner_id {
            fields.push(ExpenseField::OwnerId(owner_id));
        }
        if let Some(category_id) = self.category_id {
            fields.push(ExpenseField::CategoryId(category_id));
        }
        if let Some(title) = self.title {
            fields.push(ExpenseField::Title(title));
        }
        if let Some(amount) = self.amount {
            fields.push(ExpenseField::Amount(amount));
        }
        if let Some(date) = self.date {
            fields.push(ExpenseField::Date(date));
        }
        fields
    }
}

impl From<ReplaceExpenseRequest> for ExpenseChanges {
    fn from(request: ReplaceExpenseRequest) -> Self {
        Self {
            owner_id: Some(request.owner_id),
            category_id: Some(request.category_id),
            title: Some(request.title),
            amount: Some(request.amount),
            date: Some(request.date),
        }
    }
}

/// A single column assignment in an expense update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseField {
    OwnerId(i32),
    CategoryId(i32),
    Title(String),
    Amount(Decimal),
    Date(NaiveDate),
}

/// Validated expense ready for insertion, with its owner resolved
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub owner_id: i32,
    pub category_id: i32,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}
