//! User repository for database operations.

use cashtrackr_core::account::{AccountError, NewUser, User, UserChanges, UserStore};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, SqlErr,
};

use crate::entities::users;

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repository)?;

        Ok(model.map(to_domain))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repository)?;

        Ok(model.map(to_domain))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, AccountError> {
        if token.is_empty() {
            return Ok(None);
        }

        let model = users::Entity::find()
            .filter(users::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(repository)?;

        Ok(model.map(to_domain))
    }

    async fn create(&self, user: NewUser) -> Result<User, AccountError> {
        let now = Utc::now();
        let active_model = users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password: Set(user.password_hash),
            token: Set(Some(user.token)),
            confirmed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AccountError::EmailTaken
            } else {
                repository(e)
            }
        })?;

        Ok(to_domain(model))
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, AccountError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repository)?
            .ok_or(AccountError::UserNotFound)?;

        let mut active_model = model.into_active_model();
        if let Some(name) = changes.name {
            active_model.name = Set(name);
        }
        if let Some(email) = changes.email {
            active_model.email = Set(email);
        }
        if let Some(password_hash) = changes.password_hash {
            active_model.password = Set(password_hash);
        }
        if let Some(confirmed) = changes.confirmed {
            active_model.confirmed = Set(confirmed);
        }
        if let Some(token) = changes.token {
            active_model.token = Set(token.filter(|t| !t.is_empty()));
        }
        active_model.updated_at = Set(Utc::now());

        let model = active_model.update(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AccountError::EmailTaken
            } else {
                repository(e)
            }
        })?;

        Ok(to_domain(model))
    }
}

fn repository(e: DbErr) -> AccountError {
    tracing::error!(error = %e, "User query failed");
    AccountError::Repository(e.to_string())
}

fn to_domain(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password,
        confirmed: model.confirmed,
        token: model.token,
    }
}
