//! Users and partner banks.

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Bank, EngineError, ResultEngine, User, banks, password, users,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a new user and return its id.
    ///
    /// Emails are compared case-insensitively and must be unique. Only an
    /// Argon2id hash of the password is stored.
    pub async fn new_user(
        &self,
        email: &str,
        full_name: &str,
        phone: Option<&str>,
        password: &str,
    ) -> ResultEngine<Uuid> {
        let email = normalize_required_text(email, "email")?.to_lowercase();
        let full_name = normalize_required_text(full_name, "full name")?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = password::hash(password)?;
        let user_id = Uuid::new_v4();
        let created_at = self.now();

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            users::ActiveModel {
                id: ActiveValue::Set(user_id.to_string()),
                email: ActiveValue::Set(email.clone()),
                full_name: ActiveValue::Set(full_name),
                phone: ActiveValue::Set(normalize_optional_text(phone)),
                password: ActiveValue::Set(password_hash),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(%user_id, %email, "user created");
            Ok(user_id)
        })
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            User::try_from(model)
        })
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(email))?;
            User::try_from(model)
        })
    }

    /// Resolve login credentials. Returns `None` when they do not match.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<User>> {
        let email = email.trim().to_lowercase();
        with_tx!(self, |db_tx| {
            let Some(model) = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };
            if !password::verify(password, &model.password)? {
                return Ok(None);
            }
            User::try_from(model).map(Some)
        })
    }

    /// Register a partner bank.
    pub async fn new_bank(&self, bank_id: i16, name: &str) -> ResultEngine<Bank> {
        let name = normalize_required_text(name, "bank name")?;
        with_tx!(self, |db_tx| {
            if banks::Entity::find_by_id(bank_id).one(&db_tx).await?.is_some() {
                return Err(EngineError::ExistingKey(format!("bank {bank_id}")));
            }
            let model = banks::ActiveModel {
                id: ActiveValue::Set(bank_id),
                name: ActiveValue::Set(name),
            }
            .insert(&db_tx)
            .await?;
            Ok(Bank::from(model))
        })
    }

    pub async fn banks(&self) -> ResultEngine<Vec<Bank>> {
        with_tx!(self, |db_tx| {
            let models = banks::Entity::find()
                .order_by_asc(banks::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Bank::from).collect::<Vec<_>>())
        })
    }
}
