#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, NewUser, User};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn student(engine: &Engine, student_id: &str, name: &str) -> User {
    engine
        .register_user(NewUser {
            student_id: student_id.to_string(),
            name: name.to_string(),
            email: format!("{student_id}@dons.usfca.edu"),
            password_hash: "password".to_string(),
            starting_balance_minor: None,
        })
        .await
        .unwrap()
}

/// Registers a student and opts them in as a fairy without a ceiling.
pub async fn fairy(engine: &Engine, student_id: &str, name: &str) -> User {
    let user = student(engine, student_id, name).await;
    engine.set_fairy_status(user.id, true, None).await.unwrap();
    user
}
