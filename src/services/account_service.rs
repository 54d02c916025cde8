use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::customers::{CustomerList, EmployeeList, SetStaffRequest, UpdateCustomerRequest},
    entity::{
        EMPLOYEE_GROUP,
        cart_items::Column as CartItemCol,
        carts::{Column as CartCol, Entity as Carts},
        customer_profiles::{
            ActiveModel as ProfileActive, Column as ProfileCol, Entity as CustomerProfiles,
        },
        order_lines::Column as LineCol,
        orders::Column as OrderCol,
        role_group_members::{Column as MemberCol, Entity as RoleGroupMembers},
        role_groups::{Column as GroupCol, Entity as RoleGroups},
        users::{Column as UserCol, Entity as Users},
        CartItems, OrderLines, Orders,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{CustomerProfile, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Option<Uuid>,
    name: String,
    email: String,
    phone: String,
    address: String,
    postal_code: i32,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

/// Customers are profiles whose linked identity is not staff (plus
/// unlinked profiles entered directly by staff). When the profile relation
/// has not been migrated yet, degrade to a read-only projection over the
/// identity table instead of failing the whole listing.
pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_staff(user)?;

    match fetch_profiles(state).await {
        Ok(items) => Ok(ApiResponse::success(
            "Customers",
            CustomerList {
                items,
                degraded: false,
            },
            Some(Meta::empty()),
        )),
        Err(AppError::SchemaUnavailable) => {
            tracing::warn!("customer_profiles relation missing, serving identity projection");
            let items = fetch_identity_projection(state).await?;
            Ok(ApiResponse::success(
                "Customers (degraded projection)",
                CustomerList {
                    items,
                    degraded: true,
                },
                Some(Meta::empty()),
            ))
        }
        Err(err) => Err(err),
    }
}

async fn fetch_profiles(state: &AppState) -> AppResult<Vec<CustomerProfile>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT p.id, p.user_id, p.name, p.email, p.phone, p.address, p.postal_code, p.created_at
        FROM customer_profiles p
        LEFT JOIN users u ON u.id = p.user_id
        WHERE p.user_id IS NULL OR u.is_staff = FALSE
        ORDER BY p.name
        "#,
    )
    .fetch_all(&state.pool)
    .await
    .map_err(|err| {
        if is_undefined_table(&err) {
            AppError::SchemaUnavailable
        } else {
            AppError::DbError(err)
        }
    })?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerProfile {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            postal_code: row.postal_code,
            created_at: row.created_at,
        })
        .collect())
}

async fn fetch_identity_projection(state: &AppState) -> AppResult<Vec<CustomerProfile>> {
    let rows = sqlx::query_as::<_, IdentityRow>(
        "SELECT id, username, email, created_at FROM users WHERE is_staff = FALSE ORDER BY username",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerProfile {
            id: row.id,
            user_id: Some(row.id),
            name: row.username,
            email: row.email,
            phone: String::new(),
            address: String::new(),
            postal_code: 0,
            created_at: row.created_at,
        })
        .collect())
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("42P01"),
        _ => false,
    }
}

/// Identities that are staff or belong to the Empleados group,
/// deduplicated and ordered by username.
pub async fn list_employees(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<EmployeeList>> {
    ensure_staff(user)?;

    let mut employees: Vec<User> = Users::find()
        .filter(UserCol::IsStaff.eq(true))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let group = RoleGroups::find()
        .filter(GroupCol::Name.eq(EMPLOYEE_GROUP))
        .one(&state.orm)
        .await?;

    if let Some(group) = group {
        let member_ids: Vec<Uuid> = RoleGroupMembers::find()
            .filter(MemberCol::GroupId.eq(group.id))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        if !member_ids.is_empty() {
            let members = Users::find()
                .filter(UserCol::Id.is_in(member_ids))
                .all(&state.orm)
                .await?;
            for member in members {
                if !employees.iter().any(|u| u.id == member.id) {
                    employees.push(member.into());
                }
            }
        }
    }

    employees.sort_by(|a, b| a.username.cmp(&b.username));

    Ok(ApiResponse::success(
        "Employees",
        EmployeeList { items: employees },
        Some(Meta::empty()),
    ))
}

pub async fn update_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<CustomerProfile>> {
    ensure_staff(user)?;

    let existing = CustomerProfiles::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProfileActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(postal_code);
    }
    let profile = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "customer_update",
        Some("customer_profiles"),
        Some(serde_json::json!({ "profile_id": profile.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Customer updated",
        profile.into(),
        Some(Meta::empty()),
    ))
}

/// Remove a profile and everything hanging off it: cart, cart items,
/// orders and order lines, in one transaction.
pub async fn delete_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let profile = CustomerProfiles::find_by_id(id).one(&txn).await?;
    let profile = match profile {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    delete_profile_dependents(&txn, profile.id).await?;
    profile.delete(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "customer_delete",
        Some("customer_profiles"),
        Some(serde_json::json!({ "profile_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Customer deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn set_staff_flag(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetStaffRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_staff(user)?;

    let existing = Users::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let mut active: crate::entity::users::ActiveModel = existing.into();
    active.is_staff = Set(payload.is_staff);
    let updated = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "staff_flag_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": updated.id, "is_staff": updated.is_staff })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

/// Delete an identity together with its group memberships and, when a
/// profile is linked, the whole profile subtree.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = Users::find_by_id(id).one(&txn).await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    RoleGroupMembers::delete_many()
        .filter(MemberCol::UserId.eq(id))
        .exec(&txn)
        .await?;

    let profile = CustomerProfiles::find()
        .filter(ProfileCol::UserId.eq(Some(id)))
        .one(&txn)
        .await?;
    if let Some(profile) = profile {
        delete_profile_dependents(&txn, profile.id).await?;
        profile.delete(&txn).await?;
    }

    existing.delete(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn delete_profile_dependents<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
) -> AppResult<()> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::ProfileId.eq(profile_id))
        .one(conn)
        .await?
    {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id))
            .exec(conn)
            .await?;
        cart.delete(conn).await?;
    }

    OrderLines::delete_many()
        .filter(LineCol::ProfileId.eq(profile_id))
        .exec(conn)
        .await?;
    Orders::delete_many()
        .filter(OrderCol::ProfileId.eq(profile_id))
        .exec(conn)
        .await?;

    Ok(())
}
