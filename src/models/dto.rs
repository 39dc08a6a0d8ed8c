// Request and response shapes of the JSON API.
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{ingredient, tag, users};

// ----------------------------------------------------------------------------
// Users
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: String,
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "First name must be 1 to 150 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Last name must be 1 to 150 characters."))]
    pub last_name: String,
    #[validate(length(min = 8, max = 150, message = "Password must be 8 to 150 characters."))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 150, message = "Password must be 8 to 150 characters."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 150, message = "First name must be 1 to 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150, message = "Last name must be 1 to 150 characters."))]
    pub last_name: Option<String>,
}

/// Response of `POST /auth/token/login/`
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Profile returned right after registration
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<users::Model> for CreatedUserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Public profile, rendered for a viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: users::Model, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Profile of a followed author with their recipes
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribedAuthorResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes_count: u64,
    pub recipes: Vec<ShortRecipeResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    // collides with the /users/me/ route
    if username.eq_ignore_ascii_case("me") {
        let mut error = ValidationError::new("reserved_username");
        error.message = Some("This username is reserved.".into());
        return Err(error);
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some("Username may contain only letters, digits and @/./+/-/_".into());
        Err(error)
    }
}

// ----------------------------------------------------------------------------
// Tags & ingredients
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters."))]
    pub name: String,
    #[validate(custom(function = "validate_color"))]
    pub color: String,
    #[validate(
        length(min = 1, max = 200, message = "Slug must be 1 to 200 characters."),
        custom(function = "validate_slug")
    )]
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Measurement unit must be 1 to 200 characters."))]
    pub measurement_unit: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearchQuery {
    pub name: Option<String>,
}

pub type TagResponse = tag::Model;
pub type IngredientResponse = ingredient::Model;

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_color");
        error.message = Some("Color must be a hex value like #E26C2D.".into());
        Err(error)
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_slug");
        error.message = Some("Slug may contain only latin letters, digits, - and _.".into());
        Err(error)
    }
}

// ----------------------------------------------------------------------------
// Recipes
// ----------------------------------------------------------------------------

/// `{id, amount}` pair of a recipe write payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientAmount {
    pub id: i32,
    #[validate(range(min = 1, message = "Amount must be at least 1."))]
    pub amount: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters."))]
    pub name: String,
    #[validate(length(min = 1, message = "Text must not be empty."))]
    pub text: String,
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Cooking time must be between 1 and 1000 minutes."
    ))]
    pub cooking_time: i32,
}

/// PATCH payload: omitted fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Text must not be empty."))]
    pub text: Option<String>,
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Cooking time must be between 1 and 1000 minutes."
    ))]
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Read model of a recipe, also echoed back by create/update
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortRecipeResponse {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}
