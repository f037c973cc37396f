//! In-memory repositories for unit tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::models::category::{Category, CategoryField, CreateCategoryRequest};
use crate::models::expense::{Expense, ExpenseField, NewExpense};
use crate::models::user::{DeletedUser, NewUser, Role, User, UserField};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::{OwnerScope, RepositoryError};

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    categories: BTreeMap<i32, Category>,
    expenses: BTreeMap<i32, Expense>,
    last_id: i32,
    storage_calls: usize,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_references(&self, owner_id: i32, category_id: i32) -> Result<(), RepositoryError> {
        if !self.users.contains_key(&owner_id) {
            return Err(RepositoryError::InvalidReference("owner does not exist".to_string()));
        }
        if !self.categories.contains_key(&category_id) {
            return Err(RepositoryError::InvalidReference(
                "category does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

fn in_scope(expense: &Expense, scope: OwnerScope) -> bool {
    match scope {
        OwnerScope::Any => true,
        OwnerScope::Owner(owner_id) => expense.owner_id == owner_id,
    }
}

/// One store backing all three repository traits, so that cascading deletes
/// and foreign keys behave like the real schema.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    should_fail: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every repository call fails with a database error
    pub fn with_failure() -> Self {
        Self {
            state: Mutex::new(State::default()),
            should_fail: true,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::DatabaseError(
                "Database connection failed".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.storage_calls += 1;
        Ok(state)
    }

    pub fn seed_user(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let id = self.state.lock().unwrap().next_id();
        self.seed_user_with_id(id, name, email, password, role)
    }

    pub fn seed_user_with_id(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> User {
        let mut state = self.state.lock().unwrap();
        state.last_id = state.last_id.max(id);
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            role,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let mut state = self.state.lock().unwrap();
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
            description: format!("{} expenses", name),
        };
        state.categories.insert(category.id, category.clone());
        category
    }

    pub fn seed_expense(&self, owner_id: i32, category_id: i32, title: &str, amount: Decimal) -> Expense {
        let id = self.state.lock().unwrap().next_id();
        self.seed_expense_with_id(id, owner_id, category_id, title, amount)
    }

    pub fn seed_expense_with_id(
        &self,
        id: i32,
        owner_id: i32,
        category_id: i32,
        title: &str,
        amount: Decimal,
    ) -> Expense {
        let mut state = self.state.lock().unwrap();
        state.last_id = state.last_id.max(id);
        let expense = Expense {
            id,
            owner_id,
            category_id,
            title: title.to_string(),
            amount,
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        state.expenses.insert(expense.id, expense.clone());
        expense
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let state = self.state.lock().unwrap();
        state.users.values().find(|u| u.email == email).cloned()
    }

    pub fn stored_user(&self, id: i32) -> Option<User> {
        self.state.lock().unwrap().users.get(&id).cloned()
    }

    pub fn stored_category(&self, id: i32) -> Option<Category> {
        self.state.lock().unwrap().categories.get(&id).cloned()
    }

    pub fn stored_expense(&self, id: i32) -> Option<Expense> {
        self.state.lock().unwrap().expenses.get(&id).cloned()
    }

    pub fn expense_count(&self) -> usize {
        self.state.lock().unwrap().expenses.len()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    /// Number of repository calls that reached storage
    pub fn storage_calls(&self) -> usize {
        self.state.lock().unwrap().storage_calls
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }

        let created = User {
            id: state.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.values().cloned().collect())
    }

    async fn update(&self, id: i32, fields: Vec<UserField>) -> Result<Option<User>, RepositoryError> {
        if fields.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }
        let mut state = self.lock()?;
        let Some(mut user) = state.users.get(&id).cloned() else {
            return Ok(None);
        };

        for field in fields {
            match field {
                UserField::Name(name) => user.name = name,
                UserField::Email(email) => {
                    if state.email_taken(&email, Some(id)) {
                        return Err(RepositoryError::ConstraintViolation(
                            "Email already exists".to_string(),
                        ));
                    }
                    user.email = email;
                }
                UserField::PasswordHash(hash) => user.password_hash = hash,
                UserField::Role(role) => user.role = role,
            }
        }

        state.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn delete_cascade(&self, id: i32) -> Result<Option<DeletedUser>, RepositoryError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }

        let before = state.expenses.len();
        state.expenses.retain(|_, e| e.owner_id != id);
        let expenses_deleted = (before - state.expenses.len()) as u64;
        state.users.remove(&id);

        Ok(Some(DeletedUser {
            id,
            expenses_deleted,
        }))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: CreateCategoryRequest) -> Result<Category, RepositoryError> {
        let mut state = self.lock()?;
        let created = Category {
            id: state.next_id(),
            name: category.name,
            description: category.description,
        };
        state.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.categories.values().rev().cloned().collect())
    }

    async fn update(
        &self,
        id: i32,
        fields: Vec<CategoryField>,
    ) -> Result<Option<Category>, RepositoryError> {
        if fields.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }
        let mut state = self.lock()?;
        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };

        for field in fields {
            match field {
                CategoryField::Name(name) => category.name = name,
                CategoryField::Description(description) => category.description = description,
            }
        }
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        if state.expenses.values().any(|e| e.category_id == id) {
            return Err(RepositoryError::InvalidReference(
                "category is referenced by expenses".to_string(),
            ));
        }
        Ok(state.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryStore {
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError> {
        let mut state = self.lock()?;
        state.check_references(expense.owner_id, expense.category_id)?;

        let created = Expense {
            id: state.next_id(),
            owner_id: expense.owner_id,
            category_id: expense.category_id,
            title: expense.title,
            amount: expense.amount,
            date: expense.date,
        };
        state.expenses.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i32, scope: OwnerScope) -> Result<Option<Expense>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .expenses
            .get(&id)
            .filter(|e| in_scope(e, scope))
            .cloned())
    }

    async fn list(&self, scope: OwnerScope) -> Result<Vec<Expense>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .expenses
            .values()
            .rev()
            .filter(|e| in_scope(e, scope))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: i32,
        scope: OwnerScope,
        fields: Vec<ExpenseField>,
    ) -> Result<Option<Expense>, RepositoryError> {
        if fields.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }
        let mut state = self.lock()?;
        let Some(mut expense) = state.expenses.get(&id).filter(|e| in_scope(e, scope)).cloned()
        else {
            return Ok(None);
        };

        for field in fields {
            match field {
                ExpenseField::OwnerId(owner_id) => expense.owner_id = owner_id,
                ExpenseField::CategoryId(category_id) => expense.category_id = category_id,
                ExpenseField::Title(title) => expense.title = title,
                ExpenseField::Amount(amount) => expense.amount = amount,
                ExpenseField::Date(date) => expense.date = date,
            }
        }
        state.check_references(expense.owner_id, expense.category_id)?;

        state.expenses.insert(id, expense.clone());
        Ok(Some(expense))
    }

    async fn delete(&self, id: i32, scope: OwnerScope) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let matches = state.expenses.get(&id).is_some_and(|e| in_scope(e, scope));
        if matches {
            state.expenses.remove(&id);
        }
        Ok(matches)
    }
}
