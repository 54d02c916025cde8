use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{AccountType, Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        EMPLOYEE_GROUP,
        customer_profiles::ActiveModel as ProfileActive,
        role_group_members::ActiveModel as MemberActive,
        role_groups::{ActiveModel as GroupActive, Column as GroupCol, Entity as RoleGroups},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Register a new identity. Employees are attached to the "Empleados"
/// group; customers get their storefront profile created in the same
/// transaction rather than through a side-effect hook.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
        account_type,
    } = payload;

    let username = username.trim().to_string();
    let email = email.trim().to_string();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "username, email and password are required".into(),
        ));
    }

    let password_hash = hash_password(&password)?;
    let is_staff = account_type == AccountType::Employee;

    let txn = state.orm.begin().await?;

    let exist = Users::find()
        .filter(UserCol::Username.eq(username.clone()))
        .one(&txn)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(format!(
            "username {username} is already taken"
        )));
    }

    // The select above races with concurrent registrations; the unique
    // index is the authority, so its violation is still a conflict.
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.clone()),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        is_staff: Set(is_staff),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("username {username} is already taken"))
        }
        _ => AppError::OrmError(err),
    })?;

    match account_type {
        AccountType::Employee => {
            let group = RoleGroups::find()
                .filter(GroupCol::Name.eq(EMPLOYEE_GROUP))
                .one(&txn)
                .await?;
            let group = match group {
                Some(g) => g,
                None => {
                    GroupActive {
                        id: Set(Uuid::new_v4()),
                        name: Set(EMPLOYEE_GROUP.to_string()),
                        created_at: NotSet,
                    }
                    .insert(&txn)
                    .await?
                }
            };
            MemberActive {
                id: Set(Uuid::new_v4()),
                group_id: Set(group.id),
                user_id: Set(user.id),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
        AccountType::Client => {
            ProfileActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(Some(user.id)),
                name: Set(username),
                legacy_password: Set(None),
                email: Set(email),
                phone: Set(String::new()),
                address: Set(String::new()),
                postal_code: Set(0),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id, "is_staff": is_staff })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User registered", user.into(), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;

    let user = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::Unauthorized(
                "Invalid username or password".into(),
            ));
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized(
            "Invalid username or password".into(),
        ));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        is_staff: user.is_staff,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {token}"),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}
