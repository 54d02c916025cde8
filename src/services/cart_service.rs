use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddCartItemRequest, CartLineDto, CartView, SetQuantityRequest},
    entity::{
        cart_items::{ActiveModel as ItemActive, Column as ItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        customer_profiles::{Column as ProfileCol, Entity as CustomerProfiles},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolve the acting identity's storefront profile. Identities without a
/// profile (staff accounts, mostly) cannot own a cart.
async fn require_profile<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
) -> AppResult<crate::entity::customer_profiles::Model> {
    let profile = CustomerProfiles::find()
        .filter(ProfileCol::UserId.eq(Some(user.user_id)))
        .one(conn)
        .await?;
    profile.ok_or(AppError::Forbidden)
}

async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
) -> AppResult<crate::entity::carts::Model> {
    let cart = Carts::find()
        .filter(CartCol::ProfileId.eq(profile_id))
        .one(conn)
        .await?;
    match cart {
        Some(cart) => Ok(cart),
        None => {
            let cart = CartActive {
                id: Set(Uuid::new_v4()),
                profile_id: Set(profile_id),
                created_at: NotSet,
            }
            .insert(conn)
            .await?;
            Ok(cart)
        }
    }
}

/// The cart with live-priced subtotals: a price change after an item was
/// added shows up in the next read without a new add.
pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let profile = require_profile(&state.orm, user).await?;
    let cart = get_or_create_cart(&state.orm, profile.id).await?;

    let rows = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(ItemCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total = Decimal::ZERO;
    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item {} has no product", item.id))
        })?;
        let product = Product::from(product);
        let subtotal = product.price * Decimal::from(item.quantity);
        total += subtotal;
        items.push(CartLineDto {
            id: item.id,
            product,
            quantity: item.quantity,
            subtotal,
        });
    }

    Ok(ApiResponse::success(
        "Cart",
        CartView {
            id: cart.id,
            items,
            total,
        },
        Some(Meta::empty()),
    ))
}

/// Add a product to the caller's cart. A second add of the same product
/// increments the existing row instead of duplicating it; the row is
/// locked inside the transaction so two tabs adding at once cannot lose an
/// update.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartLineDto>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let profile = require_profile(&txn, user).await?;
    let cart = get_or_create_cart(&txn, profile.id).await?;

    let existing = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .filter(ItemCol::ProductId.eq(product.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let item = match existing {
        Some(item) => {
            let new_quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                AppError::Validation("quantity exceeds the representable range".into())
            })?;
            let mut active: ItemActive = item.into();
            active.quantity = Set(new_quantity);
            active.update(&txn).await?
        }
        None => {
            ItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product.id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let product = Product::from(product);
    let subtotal = product.price * Decimal::from(item.quantity);
    Ok(ApiResponse::success(
        "Added to cart",
        CartLineDto {
            id: item.id,
            product,
            quantity: item.quantity,
            subtotal,
        },
        Some(Meta::empty()),
    ))
}

/// Overwrite an item's quantity. Zero or negative means removal; a
/// non-positive quantity is never persisted.
pub async fn set_item_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let item = owned_item(&txn, user, item_id).await?;

    let removed = payload.quantity <= 0;
    if removed {
        item.delete(&txn).await?;
    } else {
        let mut active: ItemActive = item.into();
        active.quantity = Set(payload.quantity);
        active.update(&txn).await?;
    }
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_set_quantity",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = if removed { "Item removed" } else { "Quantity updated" };
    Ok(ApiResponse::success(
        message,
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let item = owned_item(&txn, user, item_id).await?;
    item.delete(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Item removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Fetch a cart item and verify the acting identity owns the cart it
/// belongs to.
async fn owned_item<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<crate::entity::cart_items::Model> {
    let item = CartItems::find_by_id(item_id).one(conn).await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let cart = Carts::find_by_id(item.cart_id).one(conn).await?;
    let cart = cart.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("cart item {} has no cart", item.id))
    })?;

    let profile = CustomerProfiles::find_by_id(cart.profile_id).one(conn).await?;
    let owns = profile
        .and_then(|p| p.user_id)
        .map(|uid| uid == user.user_id)
        .unwrap_or(false);
    if !owns {
        return Err(AppError::Forbidden);
    }

    Ok(item)
}
