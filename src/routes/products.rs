use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductList, ProductsByArtist, ProductsByKind, UpdateProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::{GenreQuery, NewReleasesQuery, ProductFilterQuery},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/by-kind", get(products_by_kind))
        .route("/by-artist", get(products_by_artist))
        .route("/new-releases", get(new_releases))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("genre" = Option<String>, Query, description = "Case-insensitive genre filter"),
        ("kind" = Option<String>, Query, description = "vinilo, cd or casete"),
        ("new_releases" = Option<bool>, Query, description = "Only new releases")
    ),
    responses(
        (status = 200, description = "Filtered products, ordered by name", body = ApiResponse<ProductList>),
        (status = 400, description = "Unknown media kind"),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductFilterQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/by-kind",
    params(
        ("genre" = Option<String>, Query, description = "Case-insensitive genre filter; omit for all genres")
    ),
    responses(
        (status = 200, description = "Products split into vinyls/cds/cassettes", body = ApiResponse<ProductsByKind>)
    ),
    tag = "Products"
)]
pub async fn products_by_kind(
    State(state): State<AppState>,
    Query(query): Query<GenreQuery>,
) -> AppResult<Json<ApiResponse<ProductsByKind>>> {
    let resp = catalog_service::products_by_kind(&state, query.genre).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/by-artist",
    responses(
        (status = 200, description = "Products grouped by artist, first-encounter order", body = ApiResponse<ProductsByArtist>)
    ),
    tag = "Products"
)]
pub async fn products_by_artist(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductsByArtist>>> {
    let resp = catalog_service::products_by_artist(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/new-releases",
    params(
        ("limit" = Option<u64>, Query, description = "Defaults to 4, capped at 8")
    ),
    responses(
        (status = 200, description = "Most recent new releases", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn new_releases(
    State(state): State<AppState>,
    Query(query): Query<NewReleasesQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::recent_new_releases(&state, query.limit).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid field"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Artist not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Update product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid field"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Delete product and cascade cart items and order lines", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = catalog_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}
