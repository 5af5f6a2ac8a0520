use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetSettings, EngineError, ResultEngine, User, balances, budget_settings,
    balances::DEFAULT_STARTING_BALANCE_MINOR,
    users,
    util::{ensure_positive_amount, normalize_required_text},
};

use super::{Engine, NewUser, with_tx};

impl Engine {
    /// Registers a student.
    ///
    /// The user row, the opening balance (starting = current) and the default
    /// budget settings are written in one transaction.
    pub async fn register_user(&self, new_user: NewUser) -> ResultEngine<User> {
        let student_id = normalize_required_text(&new_user.student_id, "student id")?;
        let name = normalize_required_text(&new_user.name, "name")?;
        let email = normalize_required_text(&new_user.email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(EngineError::InvalidInput(format!("invalid email: {email}")));
        }
        if new_user.password_hash.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        let starting_balance_minor = new_user
            .starting_balance_minor
            .unwrap_or(DEFAULT_STARTING_BALANCE_MINOR);
        ensure_positive_amount(starting_balance_minor, "starting balance")?;

        let now = Utc::now();
        let user = with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(
                    Condition::any()
                        .add(users::Column::StudentId.eq(student_id.as_str()))
                        .add(users::Column::Email.eq(email.as_str())),
                )
                .one(&db_tx)
                .await?;
            if let Some(existing) = existing {
                let key = if existing.student_id == student_id {
                    student_id.clone()
                } else {
                    email.clone()
                };
                return Err(EngineError::ExistingKey(key));
            }

            let user = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                student_id: ActiveValue::Set(student_id.clone()),
                name: ActiveValue::Set(name.clone()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(new_user.password_hash.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            balances::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                starting_balance_minor: ActiveValue::Set(starting_balance_minor),
                current_balance_minor: ActiveValue::Set(starting_balance_minor),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            budget_settings::ActiveModel::from(&BudgetSettings::defaults(user.id, now))
                .insert(&db_tx)
                .await?;

            Ok(User::from(user))
        })?;

        tracing::info!(user_id = %user.id, student_id = %user.student_id, "user registered");
        Ok(user)
    }

    /// Looks a user up by id.
    pub async fn user_by_id(&self, user_id: Uuid) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Looks a user up by student id.
    pub async fn user_by_student_id(&self, student_id: &str) -> ResultEngine<User> {
        users::Entity::find()
            .filter(users::Column::StudentId.eq(student_id.trim()))
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Checks a student id / credential pair.
    ///
    /// Returns `Ok(None)` for unknown students and wrong credentials alike.
    pub async fn authenticate(&self, student_id: &str, password: &str) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::StudentId.eq(student_id.trim()))
            .one(&self.database)
            .await?;
        Ok(model
            .filter(|user| !password.is_empty() && user.password_hash == password)
            .map(User::from))
    }
}
