// src/history.rs - Client history recording
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Записать событие в client_history
///
/// Executor-generic so entries land in the same transaction as the
/// mutation they describe.
pub async fn record<'e, E>(
    executor: E,
    client_id: &str,
    user_id: Option<&str>,
    action: &str,
    description: &str,
    order_id: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"INSERT INTO client_history
           (id, client_id, order_id, created_by, action, description, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(client_id)
    .bind(order_id)
    .bind(user_id)
    .bind(action)
    .bind(description)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(())
}

/// Короткая версия для вызовов вне транзакции
pub async fn log_action(
    pool: &SqlitePool,
    client_id: &str,
    user_id: &str,
    action: &str,
    description: &str,
) {
    if let Err(e) = record(pool, client_id, Some(user_id), action, description, None).await {
        log::error!("Failed to write client history: {}", e);
    }
}
