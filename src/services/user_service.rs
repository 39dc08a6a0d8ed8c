use sea_orm::*;
use tracing::{info, warn};
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::dto::{LoginRequest, RegisterRequest, SetPasswordRequest, UpdateProfileRequest, UserResponse};
use crate::models::users;
use crate::services::subscription_service::SubscriptionService;
use crate::utils::pagination::PageRequest;
use crate::utils::{jwt, password};

pub struct UserService;

impl UserService {
    pub async fn get(db: &DatabaseConnection, id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn register(db: &DatabaseConnection, request: RegisterRequest) -> AppResult<users::Model> {
        request.validate()?;

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .count(db)
            .await?
            > 0;
        if email_taken {
            return Err(AppError::BadRequest("A user with this email already exists.".to_string()));
        }

        let username_taken = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .count(db)
            .await?
            > 0;
        if username_taken {
            return Err(AppError::BadRequest("A user with this username already exists.".to_string()));
        }

        let password_hash = password::hash_password(&request.password).map_err(AppError::Internal)?;

        let user = users::ActiveModel {
            email: Set(request.email),
            username: Set(request.username),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            password_hash: Set(password_hash),
            is_staff: Set(false),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Exchange email and password for a token
    pub async fn login(db: &DatabaseConnection, config: &AppConfig, request: LoginRequest) -> AppResult<String> {
        let invalid = || AppError::BadRequest("Unable to log in with provided credentials.".to_string());

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(db)
            .await?
            .ok_or_else(invalid)?;

        let matches = password::verify_password(&request.password, &user.password_hash).unwrap_or_else(|e| {
            warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
            false
        });
        if !matches || !user.is_active {
            return Err(invalid());
        }

        let token = jwt::generate_token(config, &user).map_err(AppError::Internal)?;
        info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    pub async fn set_password(db: &DatabaseConnection, user_id: i32, request: SetPasswordRequest) -> AppResult<()> {
        request.validate()?;
        let user = Self::get(db, user_id).await?;

        let current_ok = password::verify_password(&request.current_password, &user.password_hash).unwrap_or(false);
        if !current_ok {
            return Err(AppError::BadRequest("Current password is incorrect.".to_string()));
        }

        let password_hash = password::hash_password(&request.new_password).map_err(AppError::Internal)?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.update(db).await?;

        info!(user_id, "password changed");
        Ok(())
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user: users::Model,
        request: UpdateProfileRequest,
    ) -> AppResult<users::Model> {
        request.validate()?;

        let mut active: users::ActiveModel = user.clone().into();
        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name);
        }
        if !active.is_changed() {
            return Ok(user);
        }
        Ok(active.update(db).await?)
    }

    /// Profile as seen by `viewer`; nobody is subscribed to themselves
    pub async fn render(db: &DatabaseConnection, user: users::Model, viewer: Option<i32>) -> AppResult<UserResponse> {
        let is_subscribed = match viewer {
            Some(viewer) if viewer != user.id => SubscriptionService::is_subscribed(db, viewer, user.id).await?,
            _ => false,
        };
        Ok(UserResponse::new(user, is_subscribed))
    }

    pub async fn list(
        db: &DatabaseConnection,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(u64, Vec<UserResponse>)> {
        let paginator = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .paginate(db, page.per_page);
        let count = paginator.num_items().await?;
        page.check_in_range(count)?;

        let users = paginator.fetch_page(page.index()).await?;
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let followed = match viewer {
            Some(viewer) => SubscriptionService::subscribed_authors(db, viewer, &ids).await?,
            None => Default::default(),
        };

        let results = users
            .into_iter()
            .map(|user| {
                let is_subscribed = followed.contains(&user.id);
                UserResponse::new(user, is_subscribed)
            })
            .collect();
        Ok((count, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn registration(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_register_and_login() {
        let db = test_utils::setup_db().await;
        let config = test_utils::test_config();

        let user = UserService::register(&db, registration("anna@example.com", "anna")).await.unwrap();
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert_ne!(user.password_hash, "s3cret-pass");

        let token = UserService::login(
            &db,
            &config,
            LoginRequest { email: "anna@example.com".into(), password: "s3cret-pass".into() },
        )
        .await
        .unwrap();
        let claims = jwt::verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, user.id);

        let wrong = UserService::login(
            &db,
            &config,
            LoginRequest { email: "anna@example.com".into(), password: "nope".into() },
        )
        .await;
        assert!(matches!(wrong, Err(AppError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicates() {
        let db = test_utils::setup_db().await;
        test_utils::create_user(&db, "anna", false).await;

        let same_email = UserService::register(&db, registration("anna@example.com", "other")).await;
        assert!(matches!(same_email, Err(AppError::BadRequest(_))));

        let same_username = UserService::register(&db, registration("other@example.com", "anna")).await;
        assert!(matches!(same_username, Err(AppError::BadRequest(_))));

        let invalid = UserService::register(&db, registration("not-an-email", "boris")).await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_inactive_user_cannot_login() {
        let db = test_utils::setup_db().await;
        let config = test_utils::test_config();
        let user = test_utils::create_user(&db, "anna", false).await;
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let result = UserService::login(
            &db,
            &config,
            LoginRequest { email: "anna@example.com".into(), password: test_utils::TEST_PASSWORD.into() },
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_set_password() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;

        let wrong = UserService::set_password(
            &db,
            user.id,
            SetPasswordRequest { current_password: "nope".into(), new_password: "brand-new-pass".into() },
        )
        .await;
        assert!(matches!(wrong, Err(AppError::BadRequest(_))));

        UserService::set_password(
            &db,
            user.id,
            SetPasswordRequest {
                current_password: test_utils::TEST_PASSWORD.into(),
                new_password: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap();

        let stored = UserService::get(&db, user.id).await.unwrap();
        assert!(password::verify_password("brand-new-pass", &stored.password_hash).unwrap());
    }

    #[actix_web::test]
    async fn test_render_and_list_subscription_flags() {
        let db = test_utils::setup_db().await;
        let anna = test_utils::create_user(&db, "anna", false).await;
        let boris = test_utils::create_user(&db, "boris", false).await;
        SubscriptionService::subscribe(&db, anna.id, boris.id).await.unwrap();

        let seen = UserService::render(&db, boris.clone(), Some(anna.id)).await.unwrap();
        assert!(seen.is_subscribed);
        let own = UserService::render(&db, anna.clone(), Some(anna.id)).await.unwrap();
        assert!(!own.is_subscribed);
        let anonymous = UserService::render(&db, boris, None).await.unwrap();
        assert!(!anonymous.is_subscribed);

        let page = PageRequest { page: 1, per_page: 10 };
        let (count, users) = UserService::list(&db, Some(anna.id), page).await.unwrap();
        assert_eq!(count, 2);
        assert!(!users[0].is_subscribed);
        assert!(users[1].is_subscribed);
    }

    #[actix_web::test]
    async fn test_update_profile() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;

        let updated = UserService::update_profile(
            &db,
            user,
            UpdateProfileRequest { first_name: Some("Annie".into()), last_name: None },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Annie");
        assert_eq!(updated.username, "anna");
    }
}
