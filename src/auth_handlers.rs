// src/auth_handlers.rs - Authentication endpoints
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{
    get_current_user, AuthService, ChangePasswordRequest, LoginRequest, LoginResponse,
    RegisterRequest, User, UserInfo, UserRole,
};
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::AppState;

pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    // Find user by username
    let mut user = User::find_by_username(&app_state.db_pool, &request.username)
        .await
        .map_err(|_| ApiError::BadRequest("Invalid username or password".to_string()))?;

    // Check if user is locked
    if user.is_locked() {
        return Err(ApiError::AuthError(
            "Account is temporarily locked. Try again later.".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::AuthError("Account is deactivated".to_string()));
    }

    // Verify password
    if !auth_service.verify_password(&request.password, &user.password_hash)? {
        user.increment_failed_attempts(&app_state.db_pool).await?;

        let max_attempts = app_state.config.auth.max_login_attempts;
        if user.failed_login_attempts >= max_attempts {
            let minutes = app_state.config.auth.lockout_duration_minutes as i64;
            user.lock_for_duration(&app_state.db_pool, Duration::minutes(minutes))
                .await?;
            return Err(ApiError::AuthError(format!(
                "Account locked due to too many failed attempts. Try again in {} minutes.",
                minutes
            )));
        }

        return Err(ApiError::BadRequest(
            "Invalid username or password".to_string(),
        ));
    }

    // Check if lock has expired and reset
    if let Some(locked_until) = user.locked_until {
        if Utc::now() > locked_until {
            user.reset_failed_attempts(&app_state.db_pool).await?;
        }
    }

    // Reset failed attempts on successful login
    user.reset_failed_attempts(&app_state.db_pool).await?;

    // Update last login
    user.update_last_login(&app_state.db_pool).await?;

    // Generate token
    let token = auth_service.generate_token(&user)?;

    let response = LoginResponse {
        token,
        expires_in: auth_service.token_expiration_hours() * 3600,
        user: user.clone().into(),
    };

    log::info!("User {} logged in successfully", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        response,
        "Login successful".to_string(),
    )))
}

pub async fn register(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    if !app_state.config.auth.allow_self_registration {
        return Err(ApiError::Forbidden(
            "Self-registration is disabled".to_string(),
        ));
    }

    // Uniqueness checks before insert so the caller gets a clear message
    let existing_username: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(&request.username)
            .fetch_one(&app_state.db_pool)
            .await?;
    if existing_username.0 > 0 {
        return Err(ApiError::ValidationError(
            "A user with this username already exists".to_string(),
        ));
    }

    let existing_email: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_one(&app_state.db_pool)
        .await?;
    if existing_email.0 > 0 {
        return Err(ApiError::ValidationError(
            "A user with this email is already registered".to_string(),
        ));
    }

    // Self-registered staff start as managers
    let user = User::create(
        &app_state.db_pool,
        request.into_inner(),
        UserRole::Manager,
        &auth_service,
    )
    .await?;

    let token = auth_service.generate_token(&user)?;

    log::info!("New user registered: {}", user.username);

    let response = LoginResponse {
        token,
        expires_in: auth_service.token_expiration_hours() * 3600,
        user: user.into(),
    };

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        response,
        "Registration successful".to_string(),
    )))
}

pub async fn get_profile(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;

    let user = User::find_by_id(&app_state.db_pool, &claims.sub).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserInfo::from(user))))
}

pub async fn change_password(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<ChangePasswordRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let claims = get_current_user(&http_request)?;
    let user = User::find_by_id(&app_state.db_pool, &claims.sub).await?;

    user.change_password(
        &app_state.db_pool,
        &request.current_password,
        &request.new_password,
        &auth_service,
    )
    .await?;

    log::info!("User {} changed password", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Password changed successfully".to_string(),
    )))
}

pub async fn logout() -> ApiResult<HttpResponse> {
    // JWT tokens are stateless - logout is handled client-side by removing the token
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Logged out successfully".to_string(),
    )))
}
