use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Expense category, shared by all users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Full replacement of a category; same rules as creation
pub type ReplaceCategoryRequest = CreateCategoryRequest;

/// Partial update of a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryChanges {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn into_fields(self) -> Vec<CategoryField> {
        let mut fields = Vec::new();
        if let Some(name) = self.name {
            fields.push(CategoryField::Name(name));
        }
        if let Some(description) = self.description {
            fields.push(CategoryField::Description(description));
        }
        fields
    }
}

impl From<CreateCategoryRequest> for CategoryChanges {
    fn from(request: CreateCategoryRequest) -> Self {
        Self {
            name: Some(request.name),
            description: Some(request.description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryField {
    Name(String),
    Description(String),
}
