use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::artists::{ArtistCatalog, ArtistList, ArtistsByLetter, CreateArtistRequest, UpdateArtistRequest},
    dto::products::{
        ArtistProductGroup, CreateProductRequest, ProductList, ProductsByArtist, ProductsByKind,
        UpdateProductRequest,
    },
    entity::{
        artists::{ActiveModel as ArtistActive, Column as ArtistCol, Entity as Artists},
        cart_items::Column as CartItemCol,
        order_lines::Column as LineCol,
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        CartItems, OrderLines,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Artist, MediaKind, Product},
    response::{ApiResponse, Meta},
    routes::params::ProductFilterQuery,
    state::AppState,
};

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NEW_RELEASE_DEFAULT: u64 = 4;
const NEW_RELEASE_MAX: u64 = 8;

pub async fn list_artists(state: &AppState) -> AppResult<ApiResponse<ArtistList>> {
    let items = Artists::find()
        .order_by_asc(ArtistCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Artist::from)
        .collect();
    Ok(ApiResponse::success(
        "Artists",
        ArtistList { items },
        Some(Meta::empty()),
    ))
}

pub async fn artists_by_letter(state: &AppState) -> AppResult<ApiResponse<ArtistsByLetter>> {
    let artists: Vec<Artist> = Artists::find()
        .order_by_asc(ArtistCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Artist::from)
        .collect();
    Ok(ApiResponse::success(
        "Artists by letter",
        ArtistsByLetter {
            letters: group_by_initial_letter(artists),
        },
        Some(Meta::empty()),
    ))
}

/// One artist's catalog split into vinyls, CDs and cassettes.
pub async fn artist_catalog(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ArtistCatalog>> {
    let artist = Artists::find_by_id(id).one(&state.orm).await?;
    let artist = match artist {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let products: Vec<Product> = Products::find()
        .filter(ProductCol::ArtistId.eq(artist.id))
        .order_by_asc(ProductCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let (vinyls, cds, cassettes) = split_by_kind(products);
    Ok(ApiResponse::success(
        "Artist catalog",
        ArtistCatalog {
            artist: artist.into(),
            vinyls,
            cds,
            cassettes,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductFilterQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let items = fetch_filtered(state, &query).await?;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

/// Genre storefront view: filtered products split by media kind.
pub async fn products_by_kind(
    state: &AppState,
    genre: Option<String>,
) -> AppResult<ApiResponse<ProductsByKind>> {
    let label = genre.clone().unwrap_or_else(|| "Todos los Géneros".to_string());
    let query = ProductFilterQuery {
        genre,
        kind: None,
        new_releases: None,
    };
    let products = fetch_filtered(state, &query).await?;
    let (vinyls, cds, cassettes) = split_by_kind(products);
    Ok(ApiResponse::success(
        "Products by kind",
        ProductsByKind {
            genre: label,
            vinyls,
            cds,
            cassettes,
        },
        Some(Meta::empty()),
    ))
}

pub async fn products_by_artist(state: &AppState) -> AppResult<ApiResponse<ProductsByArtist>> {
    let rows = Products::find()
        .find_also_related(Artists)
        .order_by_asc(ProductCol::Name)
        .all(&state.orm)
        .await?;

    let pairs = rows
        .into_iter()
        .map(|(product, artist)| {
            let name = artist.map(|a| a.name).unwrap_or_default();
            (name, Product::from(product))
        })
        .collect();

    Ok(ApiResponse::success(
        "Products by artist",
        ProductsByArtist {
            groups: group_by_artist(pairs),
        },
        Some(Meta::empty()),
    ))
}

/// Most recent new releases, newest first. The storefront shows 4 on the
/// landing page and up to 8 on the novelties page.
pub async fn recent_new_releases(
    state: &AppState,
    limit: Option<u64>,
) -> AppResult<ApiResponse<ProductList>> {
    let limit = limit.unwrap_or(NEW_RELEASE_DEFAULT).clamp(1, NEW_RELEASE_MAX);
    let items = Products::find()
        .filter(ProductCol::IsNewRelease.eq(true))
        .order_by_desc(ProductCol::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success(
        "New releases",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    match product {
        Some(p) => Ok(ApiResponse::success("Product", p.into(), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_artist(
    state: &AppState,
    user: &AuthUser,
    payload: CreateArtistRequest,
) -> AppResult<ApiResponse<Artist>> {
    ensure_staff(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("artist name is required".into()));
    }

    let artist = ArtistActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        photo: Set(payload.photo),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "artist_create",
        Some("artists"),
        Some(serde_json::json!({ "artist_id": artist.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Artist created",
        artist.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_artist(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateArtistRequest,
) -> AppResult<ApiResponse<Artist>> {
    ensure_staff(user)?;

    let existing = Artists::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let mut active: ArtistActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("artist name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(photo) = payload.photo {
        active.photo = Set(Some(photo));
    }
    let artist = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "artist_update",
        Some("artists"),
        Some(serde_json::json!({ "artist_id": artist.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Artist updated",
        artist.into(),
        Some(Meta::empty()),
    ))
}

/// Deleting an artist removes its products and, transitively, every cart
/// item and order line referencing them, in one transaction.
pub async fn delete_artist(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let artist = Artists::find_by_id(id).one(&txn).await?;
    let artist = match artist {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let product_ids: Vec<Uuid> = Products::find()
        .filter(ProductCol::ArtistId.eq(artist.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    if !product_ids.is_empty() {
        CartItems::delete_many()
            .filter(CartItemCol::ProductId.is_in(product_ids.clone()))
            .exec(&txn)
            .await?;
        OrderLines::delete_many()
            .filter(LineCol::ProductId.is_in(product_ids))
            .exec(&txn)
            .await?;
        Products::delete_many()
            .filter(ProductCol::ArtistId.eq(artist.id))
            .exec(&txn)
            .await?;
    }

    Artists::delete_by_id(artist.id).exec(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "artist_delete",
        Some("artists"),
        Some(serde_json::json!({ "artist_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Artist deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".into()));
    }
    let kind = MediaKind::parse(&payload.kind)?;
    if payload.stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::Validation("price cannot be negative".into()));
    }

    let artist = Artists::find_by_id(payload.artist_id).one(&state.orm).await?;
    if artist.is_none() {
        return Err(AppError::NotFound);
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        artist_id: Set(payload.artist_id),
        name: Set(payload.name),
        genre: Set(payload.genre),
        kind: Set(kind.as_str().to_string()),
        description: Set(payload.description),
        stock: Set(payload.stock),
        price: Set(payload.price),
        is_new_release: Set(payload.is_new_release),
        image: Set(payload.image),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    if let Some(artist_id) = payload.artist_id {
        let artist = Artists::find_by_id(artist_id).one(&state.orm).await?;
        if artist.is_none() {
            return Err(AppError::NotFound);
        }
        active.artist_id = Set(artist_id);
    }
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("product name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(genre) = payload.genre {
        active.genre = Set(genre);
    }
    if let Some(kind) = payload.kind {
        active.kind = Set(MediaKind::parse(&kind)?.as_str().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::Validation("stock cannot be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(price) = payload.price {
        if price < Decimal::ZERO {
            return Err(AppError::Validation("price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(is_new_release) = payload.is_new_release {
        active.is_new_release = Set(is_new_release);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Deleting a product removes dependent cart items and order lines with it.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    CartItems::delete_many()
        .filter(CartItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    OrderLines::delete_many()
        .filter(LineCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    let result = Products::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn fetch_filtered(
    state: &AppState,
    query: &ProductFilterQuery,
) -> AppResult<Vec<Product>> {
    let mut condition = Condition::all();
    if let Some(genre) = query.genre.as_ref().filter(|g| !g.is_empty()) {
        condition = condition.add(Expr::col(ProductCol::Genre).ilike(genre.clone()));
    }
    if let Some(kind) = query.kind.as_ref().filter(|k| !k.is_empty()) {
        let kind = MediaKind::parse(kind)?;
        condition = condition.add(ProductCol::Kind.eq(kind.as_str()));
    }
    if let Some(new_releases) = query.new_releases {
        condition = condition.add(ProductCol::IsNewRelease.eq(new_releases));
    }

    let items = Products::find()
        .filter(condition)
        .order_by_asc(ProductCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(items)
}

/// Fixed 26-key grouping. Every letter A-Z is present even when empty;
/// names not starting with an ASCII letter are left out of the buckets.
pub fn group_by_initial_letter(artists: Vec<Artist>) -> BTreeMap<String, Vec<Artist>> {
    let mut letters: BTreeMap<String, Vec<Artist>> = ALPHABET
        .chars()
        .map(|c| (c.to_string(), Vec::new()))
        .collect();

    for artist in artists {
        let initial = artist
            .name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .filter(char::is_ascii_alphabetic);
        if let Some(initial) = initial {
            if let Some(bucket) = letters.get_mut(&initial.to_string()) {
                bucket.push(artist);
            }
        }
    }

    letters
}

/// Group products by artist name, preserving the order of first encounter.
pub fn group_by_artist(pairs: Vec<(String, Product)>) -> Vec<ArtistProductGroup> {
    let mut groups: Vec<ArtistProductGroup> = Vec::new();
    for (artist, product) in pairs {
        match groups.iter_mut().find(|g| g.artist == artist) {
            Some(group) => group.items.push(product),
            None => groups.push(ArtistProductGroup {
                artist,
                items: vec![product],
            }),
        }
    }
    groups
}

/// Split a product sequence into vinyls, CDs and cassettes,
/// case-insensitively on the stored kind.
pub fn split_by_kind(products: Vec<Product>) -> (Vec<Product>, Vec<Product>, Vec<Product>) {
    let mut vinyls = Vec::new();
    let mut cds = Vec::new();
    let mut cassettes = Vec::new();
    for product in products {
        match MediaKind::parse(&product.kind) {
            Ok(MediaKind::Vinyl) => vinyls.push(product),
            Ok(MediaKind::Cd) => cds.push(product),
            Ok(MediaKind::Cassette) => cassettes.push(product),
            Err(_) => {
                tracing::warn!(product_id = %product.id, kind = %product.kind, "unknown media kind");
            }
        }
    }
    (vinyls, cds, cassettes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn artist(name: &str) -> Artist {
        Artist {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            photo: None,
            created_at: Utc::now(),
        }
    }

    fn product(name: &str, kind: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            artist_id: Uuid::new_v4(),
            name: name.to_string(),
            genre: "rock".to_string(),
            kind: kind.to_string(),
            description: String::new(),
            stock: 1,
            price: Decimal::new(1999, 2),
            is_new_release: false,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn grouping_always_yields_26_letters() {
        let grouped = group_by_initial_letter(vec![]);
        assert_eq!(grouped.len(), 26);
        assert!(grouped.values().all(Vec::is_empty));
    }

    #[test]
    fn grouping_uppercases_initials_and_keeps_everyone() {
        let artists = vec![artist("aurora"), artist("Bowie"), artist("beck")];
        let grouped = group_by_initial_letter(artists);
        assert_eq!(grouped.len(), 26);
        assert_eq!(grouped["A"].len(), 1);
        assert_eq!(grouped["B"].len(), 2);

        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn grouping_skips_non_letter_initials() {
        let grouped = group_by_initial_letter(vec![artist("311"), artist("Zappa")]);
        assert_eq!(grouped.len(), 26);
        assert_eq!(grouped["Z"].len(), 1);
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn group_by_artist_preserves_first_encounter_order() {
        let pairs = vec![
            ("Nina".to_string(), product("Baltimore", "vinilo")),
            ("Miles".to_string(), product("Kind of Blue", "cd")),
            ("Nina".to_string(), product("Pastel Blues", "cd")),
        ];
        let groups = group_by_artist(pairs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].artist, "Nina");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].artist, "Miles");
    }

    #[test]
    fn split_by_kind_is_case_insensitive() {
        let products = vec![
            product("a", "Vinilo"),
            product("b", "CD"),
            product("c", "casete"),
            product("d", "vinilo"),
        ];
        let (vinyls, cds, cassettes) = split_by_kind(products);
        assert_eq!(vinyls.len(), 2);
        assert_eq!(cds.len(), 1);
        assert_eq!(cassettes.len(), 1);
    }
}
