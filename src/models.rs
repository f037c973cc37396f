pub mod auth;
pub mod category;
pub mod expense;
pub mod user;

pub use auth::{LoginRequest, LoginResponse, RequestIdentity};
pub use category::{Category, CategoryChanges, CategoryField, CreateCategoryRequest, ReplaceCategoryRequest};
pub use expense::{
    CreateExpenseRequest, Expense, ExpenseChanges, ExpenseField, NewExpense, ReplaceExpenseRequest,
};
pub use user::{
    CreateUserRequest, DeletedUser, NewUser, ReplaceUserRequest, Role, User, UserChanges, UserField,
};
