// src/test_support.rs - Shared seed helpers for DB-backed tests
use chrono::Utc;
use sqlx::SqlitePool;

pub async fn seed_user(pool: &SqlitePool, id: &str) {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO users (
            id, username, email, password_hash, role, is_active,
            created_at, updated_at, failed_login_attempts
        ) VALUES (?, ?, ?, 'x', 'manager', 1, ?, ?, 0)"#,
    )
    .bind(id)
    .bind(format!("user_{}", id))
    .bind(format!("{}@shop.local", id))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed user");
}

pub async fn seed_client(pool: &SqlitePool, id: &str, user_id: &str, phone: &str) {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO clients (
            id, created_by, client_type, first_name, last_name, phone,
            is_active, created_at, updated_at
        ) VALUES (?, ?, 'individual', 'Ivan', 'Petrov', ?, 1, ?, ?)"#,
    )
    .bind(id)
    .bind(user_id)
    .bind(phone)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed client");
}

pub async fn seed_car(pool: &SqlitePool, id: &str, client_id: &str) {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO cars (id, client_id, brand, model, created_at, updated_at)
           VALUES (?, ?, 'Toyota', 'Corolla', ?, ?)"#,
    )
    .bind(id)
    .bind(client_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed car");
}

pub async fn seed_order(pool: &SqlitePool, id: &str, client_id: &str, car_id: &str, total: f64) {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO orders (
            id, client_id, car_id, order_number, status, payment_status,
            description, labor_cost, parts_cost, discount, prepayment,
            total_amount, warranty_period, created_at, updated_at
        ) VALUES (?, ?, ?, ?, 'new', 'unpaid', 'seeded', ?, 0, 0, 0, ?, 30, ?, ?)"#,
    )
    .bind(id)
    .bind(client_id)
    .bind(car_id)
    .bind(format!("WO-TEST-{}", id))
    .bind(total)
    .bind(total)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed order");
}

pub async fn set_order_status(pool: &SqlitePool, id: &str, status: &str) {
    sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .expect("failed to set order status");
}
