use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::artists::{
        ArtistCatalog, ArtistList, ArtistsByLetter, CreateArtistRequest, UpdateArtistRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Artist,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_artists).post(create_artist))
        .route("/by-letter", get(artists_by_letter))
        .route(
            "/{id}",
            axum::routing::put(update_artist).delete(delete_artist),
        )
        .route("/{id}/products", get(artist_catalog))
}

#[utoipa::path(
    get,
    path = "/api/artists",
    responses(
        (status = 200, description = "All artists, ordered by name", body = ApiResponse<ArtistList>)
    ),
    tag = "Artists"
)]
pub async fn list_artists(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ArtistList>>> {
    let resp = catalog_service::list_artists(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/artists/by-letter",
    responses(
        (status = 200, description = "Artists bucketed A-Z (all 26 keys present)", body = ApiResponse<ArtistsByLetter>)
    ),
    tag = "Artists"
)]
pub async fn artists_by_letter(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ArtistsByLetter>>> {
    let resp = catalog_service::artists_by_letter(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/artists/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Artist ID")
    ),
    responses(
        (status = 200, description = "Artist catalog split by media kind", body = ApiResponse<ArtistCatalog>),
        (status = 404, description = "Artist not found"),
    ),
    tag = "Artists"
)]
pub async fn artist_catalog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ArtistCatalog>>> {
    let resp = catalog_service::artist_catalog(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/artists",
    request_body = CreateArtistRequest,
    responses(
        (status = 200, description = "Create artist", body = ApiResponse<Artist>),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Artists"
)]
pub async fn create_artist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateArtistRequest>,
) -> AppResult<Json<ApiResponse<Artist>>> {
    let resp = catalog_service::create_artist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/artists/{id}",
    params(
        ("id" = Uuid, Path, description = "Artist ID")
    ),
    request_body = UpdateArtistRequest,
    responses(
        (status = 200, description = "Update artist", body = ApiResponse<Artist>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Artist not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Artists"
)]
pub async fn update_artist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateArtistRequest>,
) -> AppResult<Json<ApiResponse<Artist>>> {
    let resp = catalog_service::update_artist(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/artists/{id}",
    params(
        ("id" = Uuid, Path, description = "Artist ID")
    ),
    responses(
        (status = 200, description = "Delete artist and cascade its products", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Artist not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Artists"
)]
pub async fn delete_artist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = catalog_service::delete_artist(&state, &user, id).await?;
    Ok(Json(resp))
}
