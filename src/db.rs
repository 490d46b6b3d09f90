// src/db.rs - Database migrations and setup

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys and WAL mode
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE CHECK(length(username) >= 3 AND length(username) <= 50),
            email TEXT NOT NULL UNIQUE CHECK(length(email) >= 5 AND length(email) <= 255),
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'manager' CHECK(
                role IN ('admin', 'manager', 'mechanic')
            ),
            is_active INTEGER NOT NULL DEFAULT 1 CHECK(is_active IN (0, 1)),
            last_login DATETIME,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            failed_login_attempts INTEGER NOT NULL DEFAULT 0,
            locked_until DATETIME
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create clients table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            created_by TEXT,
            client_type TEXT NOT NULL DEFAULT 'individual' CHECK(
                client_type IN ('individual', 'legal', 'regular')
            ),
            first_name TEXT NOT NULL CHECK(length(first_name) > 0 AND length(first_name) <= 100),
            last_name TEXT NOT NULL CHECK(length(last_name) > 0 AND length(last_name) <= 100),
            patronymic TEXT NOT NULL DEFAULT '' CHECK(length(patronymic) <= 100),
            phone TEXT NOT NULL UNIQUE CHECK(length(phone) > 0 AND length(phone) <= 20),
            email TEXT NOT NULL DEFAULT '' CHECK(length(email) <= 255),
            additional_phone TEXT NOT NULL DEFAULT '' CHECK(length(additional_phone) <= 20),
            company_name TEXT NOT NULL DEFAULT '' CHECK(length(company_name) <= 200),
            inn TEXT UNIQUE CHECK(inn IS NULL OR length(inn) <= 12),
            kpp TEXT NOT NULL DEFAULT '' CHECK(length(kpp) <= 9),
            address TEXT NOT NULL DEFAULT '',
            discount REAL NOT NULL DEFAULT 0 CHECK(discount >= 0 AND discount <= 100),
            notes TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '' CHECK(length(source) <= 100),
            tags TEXT NOT NULL DEFAULT '' CHECK(length(tags) <= 200),
            is_active INTEGER NOT NULL DEFAULT 1 CHECK(is_active IN (0, 1)),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (created_by) REFERENCES users (id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create cars table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cars (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            brand TEXT NOT NULL CHECK(length(brand) > 0 AND length(brand) <= 100),
            model TEXT NOT NULL CHECK(length(model) > 0 AND length(model) <= 100),
            year INTEGER CHECK(year IS NULL OR year >= 1900),
            vin TEXT UNIQUE CHECK(vin IS NULL OR length(vin) <= 17),
            license_plate TEXT NOT NULL DEFAULT '' CHECK(length(license_plate) <= 10),
            engine_volume REAL CHECK(engine_volume IS NULL OR engine_volume > 0),
            engine_power INTEGER CHECK(engine_power IS NULL OR engine_power > 0),
            transmission TEXT NOT NULL DEFAULT '' CHECK(
                transmission IN ('', 'manual', 'automatic', 'robot', 'variator')
            ),
            fuel_type TEXT NOT NULL DEFAULT '' CHECK(
                fuel_type IN ('', 'petrol', 'diesel', 'gas', 'electric', 'hybrid')
            ),
            mileage INTEGER NOT NULL DEFAULT 0 CHECK(mileage >= 0),
            color TEXT NOT NULL DEFAULT '' CHECK(length(color) <= 50),
            notes TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (client_id) REFERENCES clients (id) ON DELETE CASCADE,
            UNIQUE(client_id, vin)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create orders table - client/car references are protected, not cascaded
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            car_id TEXT NOT NULL,
            created_by TEXT,
            order_number TEXT NOT NULL UNIQUE CHECK(length(order_number) <= 50),
            status TEXT NOT NULL DEFAULT 'new' CHECK(
                status IN ('new', 'diagnostics', 'awaiting_parts', 'in_progress',
                           'ready', 'completed', 'cancelled')
            ),
            payment_status TEXT NOT NULL DEFAULT 'unpaid' CHECK(
                payment_status IN ('unpaid', 'partial', 'paid')
            ),
            description TEXT NOT NULL,
            master_notes TEXT NOT NULL DEFAULT '',
            appointment_date DATETIME,
            completed_at DATETIME,
            labor_cost REAL NOT NULL DEFAULT 0 CHECK(labor_cost >= 0),
            parts_cost REAL NOT NULL DEFAULT 0 CHECK(parts_cost >= 0),
            discount REAL NOT NULL DEFAULT 0 CHECK(discount >= 0),
            prepayment REAL NOT NULL DEFAULT 0 CHECK(prepayment >= 0),
            total_amount REAL NOT NULL DEFAULT 0,
            warranty_period INTEGER NOT NULL DEFAULT 30 CHECK(warranty_period >= 0),
            warranty_until DATE,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (client_id) REFERENCES clients (id) ON DELETE RESTRICT,
            FOREIGN KEY (car_id) REFERENCES cars (id) ON DELETE RESTRICT,
            FOREIGN KEY (created_by) REFERENCES users (id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create services table (order line items)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 200),
            quantity INTEGER NOT NULL DEFAULT 1 CHECK(quantity > 0),
            price REAL NOT NULL CHECK(price >= 0),
            total REAL NOT NULL,
            created_at DATETIME NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders (id) ON DELETE CASCADE
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create parts table (order line items)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 200),
            article TEXT NOT NULL DEFAULT '' CHECK(length(article) <= 100),
            quantity INTEGER NOT NULL DEFAULT 1 CHECK(quantity > 0),
            price REAL NOT NULL CHECK(price >= 0),
            total REAL NOT NULL,
            created_at DATETIME NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders (id) ON DELETE CASCADE
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Create client_history table (append-only audit trail)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_history (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            order_id TEXT,
            created_by TEXT,
            action TEXT NOT NULL CHECK(length(action) > 0 AND length(action) <= 200),
            description TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            FOREIGN KEY (client_id) REFERENCES clients (id) ON DELETE CASCADE,
            FOREIGN KEY (order_id) REFERENCES orders (id) ON DELETE SET NULL,
            FOREIGN KEY (created_by) REFERENCES users (id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Indexes for hot lookups
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_clients_created_by ON clients (created_by)",
        "CREATE INDEX IF NOT EXISTS idx_clients_phone ON clients (phone)",
        "CREATE INDEX IF NOT EXISTS idx_clients_created_at ON clients (created_at)",
        "CREATE INDEX IF NOT EXISTS idx_cars_client_id ON cars (client_id)",
        "CREATE INDEX IF NOT EXISTS idx_orders_client_id ON orders (client_id)",
        "CREATE INDEX IF NOT EXISTS idx_orders_car_id ON orders (car_id)",
        "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)",
        "CREATE INDEX IF NOT EXISTS idx_orders_order_number ON orders (order_number)",
        "CREATE INDEX IF NOT EXISTS idx_orders_appointment_date ON orders (appointment_date)",
        "CREATE INDEX IF NOT EXISTS idx_services_order_id ON services (order_id)",
        "CREATE INDEX IF NOT EXISTS idx_parts_order_id ON parts (order_id)",
        "CREATE INDEX IF NOT EXISTS idx_history_client_id ON client_history (client_id)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // A single connection keeps the in-memory database alive across queries
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    run_migrations(&pool).await.expect("migrations failed");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        for expected in [
            "cars",
            "client_history",
            "clients",
            "orders",
            "parts",
            "services",
            "users",
        ] {
            assert!(names.contains(&expected), "missing table {}", expected);
        }
    }

    #[actix_rt::test]
    async fn test_duplicate_phone_rejected_by_schema() {
        let pool = test_pool().await;

        let insert = r#"INSERT INTO clients
            (id, client_type, first_name, last_name, phone, created_at, updated_at)
            VALUES (?, 'individual', 'Ivan', 'Petrov', ?, datetime('now'), datetime('now'))"#;

        sqlx::query(insert)
            .bind("c1")
            .bind("+79991234567")
            .execute(&pool)
            .await
            .unwrap();

        let duplicate = sqlx::query(insert)
            .bind("c2")
            .bind("+79991234567")
            .execute(&pool)
            .await;

        assert!(duplicate.is_err());
    }
}
