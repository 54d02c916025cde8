use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderLineRequest, CreateOrderRequest, OrderList, OrderLineView, OrderSummary,
        OrderWithLines, UpdateOrderLineRequest, UpdateOrderRequest,
    },
    entity::{
        customer_profiles::Entity as CustomerProfiles,
        order_lines::{ActiveModel as LineActive, Column as LineCol, Entity as OrderLines},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderLine},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Back-office order listing: newest first, joined with the owning
/// customer's name.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = pagination.normalize();

    let total = Orders::find().count(&state.orm).await? as i64;

    let rows = Orders::find()
        .find_also_related(CustomerProfiles)
        .order_by_desc(OrderCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(order, profile)| OrderSummary {
            order: order.into(),
            customer_name: profile.map(|p| p.name).unwrap_or_default(),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    ensure_staff(user)?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let lines = OrderLines::find()
        .filter(LineCol::OrderId.eq(order.id))
        .find_also_related(Products)
        .order_by_desc(LineCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(line, product)| OrderLineView {
            line: line.into(),
            product_name: product.map(|p| p.name).unwrap_or_default(),
        })
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithLines {
            order: order.into(),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Create an order header. `item_count` and `total` are bookkeeping values
/// entered by staff; they are not derived from lines.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    if payload.item_count < 0 {
        return Err(AppError::Validation("item_count cannot be negative".into()));
    }
    if payload.total < Decimal::ZERO {
        return Err(AppError::Validation("total cannot be negative".into()));
    }

    let profile = CustomerProfiles::find_by_id(payload.profile_id)
        .one(&state.orm)
        .await?;
    if profile.is_none() {
        return Err(AppError::NotFound);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        profile_id: Set(payload.profile_id),
        item_count: Set(payload.item_count),
        total: Set(payload.total),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    if let Some(item_count) = payload.item_count {
        if item_count < 0 {
            return Err(AppError::Validation("item_count cannot be negative".into()));
        }
        active.item_count = Set(item_count);
    }
    if let Some(total) = payload.total {
        if total < Decimal::ZERO {
            return Err(AppError::Validation("total cannot be negative".into()));
        }
        active.total = Set(total);
    }
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Delete an order header and its lines in one transaction.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    OrderLines::delete_many()
        .filter(LineCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    let result = Orders::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Create an order line. The order, profile and product references must
/// all resolve; the checks and the insert share one transaction.
pub async fn create_order_line(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CreateOrderLineRequest,
) -> AppResult<ApiResponse<OrderLine>> {
    ensure_staff(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }
    if payload.unit_price < Decimal::ZERO || payload.total < Decimal::ZERO {
        return Err(AppError::Validation("amounts cannot be negative".into()));
    }

    let txn = state.orm.begin().await?;

    if Orders::find_by_id(order_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if CustomerProfiles::find_by_id(payload.profile_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    if Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let line = LineActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        profile_id: Set(payload.profile_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        unit_price: Set(payload.unit_price),
        total: Set(payload.total),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_line_create",
        Some("order_lines"),
        Some(serde_json::json!({ "order_id": order_id, "line_id": line.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order line created",
        line.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_line(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderLineRequest,
) -> AppResult<ApiResponse<OrderLine>> {
    ensure_staff(user)?;

    let existing = OrderLines::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    let mut active: LineActive = existing.into();
    if let Some(quantity) = payload.quantity {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "quantity must be greater than 0".into(),
            ));
        }
        active.quantity = Set(quantity);
    }
    if let Some(unit_price) = payload.unit_price {
        if unit_price < Decimal::ZERO {
            return Err(AppError::Validation("unit_price cannot be negative".into()));
        }
        active.unit_price = Set(unit_price);
    }
    if let Some(total) = payload.total {
        if total < Decimal::ZERO {
            return Err(AppError::Validation("total cannot be negative".into()));
        }
        active.total = Set(total);
    }
    let line = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_line_update",
        Some("order_lines"),
        Some(serde_json::json!({ "line_id": line.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order line updated",
        line.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_line(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let result = OrderLines::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_line_delete",
        Some("order_lines"),
        Some(serde_json::json!({ "line_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order line deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
