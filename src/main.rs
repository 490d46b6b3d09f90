use actix_web::http::header;
use actix_web::{
    middleware::{Compress, DefaultHeaders, Logger},
    web, App, HttpResponse, HttpServer,
};
use actix_cors::Cors;
use actix_web_httpauth::middleware::HttpAuthentication;
use anyhow::Context;
use rand::{distributions::Alphanumeric, seq::SliceRandom, thread_rng, Rng};
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod auth;
mod auth_handlers;
mod car_handlers;
mod client_handlers;
mod config;
mod db;
mod error;
mod handlers;
mod history;
mod models;
mod order_handlers;
mod pagination;
pub mod query_builders;
pub mod validator;
#[cfg(test)]
mod test_support;

use auth::{jwt_middleware, AuthService};
use auth_handlers::{change_password, get_profile, login, logout, register};
use car_handlers::{create_car, delete_car, update_car};
use client_handlers::{
    create_client, delete_client, get_client, get_client_cars, get_clients, update_client,
};
use config::{load_config, Config};
use handlers::get_dashboard_stats;
use order_handlers::{
    add_order_part, add_order_service, change_order_status, create_order, delete_order,
    delete_order_part, delete_order_service, get_order, get_order_parts, get_order_services,
    get_orders, update_order, update_order_part, update_order_service,
};

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    // Setup logging
    setup_logging(&config)?;

    // Validate production config
    if env::var("SHOP_ENV").as_deref() == Ok("production") {
        validate_production_config(&config)?;
    }

    // Setup database
    setup_database(&config.database.url).await?;

    // Create database pool
    let pool = create_database_pool(&config.database).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    // Create auth service
    let auth_service = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiration_hours,
        config.auth.bcrypt_cost,
    ));

    // Create default admin if needed
    create_default_admin_if_needed(&pool, &auth_service).await?;

    // Create app state
    let app_state = Arc::new(AppState {
        db_pool: pool.clone(),
        config: config.clone(),
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let workers = config.server.workers;
    let keep_alive = config.server.keep_alive;

    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&config.security.allowed_origins);
        let auth_middleware = HttpAuthentication::bearer(jwt_middleware);
        let security_headers = setup_security_headers(&config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::JsonConfig::default().limit(config.security.max_request_size))

            // Health check (no auth)
            .service(
                web::scope("/health")
                    .route("", web::get().to(|| async {
                        HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
                    }))
            )

            // Auth endpoints (no authentication required)
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(login))
                    .route("/register", web::post().to(register))
            )

            // Protected API endpoints
            .service(
                web::scope("/api/v1")
                    .wrap(auth_middleware)

                    // Auth management
                    .service(
                        web::scope("/auth")
                            .route("/profile", web::get().to(get_profile))
                            .route("/change-password", web::post().to(change_password))
                            .route("/logout", web::post().to(logout))
                    )

                    // Dashboard
                    .service(
                        web::scope("/dashboard")
                            .route("/stats", web::get().to(get_dashboard_stats))
                    )

                    // Clients
                    .service(
                        web::scope("/clients")
                            .route("", web::get().to(get_clients))
                            .route("", web::post().to(create_client))
                            .route("/{id}", web::get().to(get_client))
                            .route("/{id}", web::put().to(update_client))
                            .route("/{id}", web::delete().to(delete_client))
                            .route("/{id}/cars", web::get().to(get_client_cars))
                            .route("/{id}/cars", web::post().to(create_car))
                            .route("/{id}/cars/{car_id}", web::put().to(update_car))
                            .route("/{id}/cars/{car_id}", web::delete().to(delete_car))
                    )

                    // Orders
                    .service(
                        web::scope("/orders")
                            .route("", web::get().to(get_orders))
                            .route("", web::post().to(create_order))
                            .route("/{id}", web::get().to(get_order))
                            .route("/{id}", web::put().to(update_order))
                            .route("/{id}", web::delete().to(delete_order))
                            .route("/{id}/status", web::post().to(change_order_status))
                            .route("/{id}/services", web::get().to(get_order_services))
                            .route("/{id}/services", web::post().to(add_order_service))
                            .route("/{id}/services/{item_id}", web::put().to(update_order_service))
                            .route("/{id}/services/{item_id}", web::delete().to(delete_order_service))
                            .route("/{id}/parts", web::get().to(get_order_parts))
                            .route("/{id}/parts", web::post().to(add_order_part))
                            .route("/{id}/parts/{item_id}", web::put().to(update_order_part))
                            .route("/{id}/parts/{item_id}", web::delete().to(delete_order_part))
                    )
            )
    })
    .keep_alive(Duration::from_secs(keep_alive));

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    let is_production = env::var("SHOP_ENV").as_deref() == Ok("production");

    if allowed_origins.contains(&"*".to_string()) {
        if is_production {
            panic!("Cannot start server with wildcard CORS in production");
        }
        log::warn!("Using wildcard CORS (*) in development mode");
        cors = cors.allow_any_origin().allow_any_header().allow_any_method();
    } else {
        for origin in allowed_origins {
            if origin.is_empty() {
                continue;
            }
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn validate_production_config(config: &Config) -> anyhow::Result<()> {
    if config.auth.jwt_secret.len() < 32 || config.auth.jwt_secret.contains("dummy") {
        anyhow::bail!("Insecure JWT secret in production! Must be at least 32 characters.");
    }

    if config.security.allowed_origins.contains(&"*".to_string()) {
        anyhow::bail!("Wildcard CORS origins not allowed in production!");
    }

    Ok(())
}

async fn setup_database(database_url: &str) -> anyhow::Result<()> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        log::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url).await?;
    }
    Ok(())
}

async fn create_database_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .idle_timeout(Duration::from_secs(db_config.idle_timeout))
        .connect_with(options)
        .await?;

    Ok(pool)
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains; preload",
        ));
    }

    headers
}

async fn create_default_admin_if_needed(
    pool: &SqlitePool,
    auth_service: &AuthService,
) -> anyhow::Result<()> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 == 0 {
        use crate::auth::{RegisterRequest, UserRole};

        let password = env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| {
            let mut rng = thread_rng();
            let digits: Vec<char> = ('0'..='9').collect();
            let uppercase: Vec<char> = ('A'..='Z').collect();
            let lowercase: Vec<char> = ('a'..='z').collect();

            let mut pwd_chars = vec![
                *digits.choose(&mut rng).unwrap(),
                *uppercase.choose(&mut rng).unwrap(),
                *lowercase.choose(&mut rng).unwrap(),
            ];
            pwd_chars.extend(
                (&mut rng)
                    .sample_iter(Alphanumeric)
                    .take(9)
                    .map(char::from),
            );
            pwd_chars.shuffle(&mut rng);

            pwd_chars.into_iter().collect()
        });

        let admin_request = RegisterRequest {
            username: "admin".to_string(),
            email: "admin@autoshop.local".to_string(),
            password: password.clone(),
        };

        crate::auth::User::create(pool, admin_request, UserRole::Admin, auth_service)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create default admin user: {}", e))?;

        log::warn!("Default admin user created:");
        log::warn!("  Username: admin");
        log::warn!("  Password: {} (generated - CHANGE IMMEDIATELY!)", password);
    }

    Ok(())
}
