use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub artist_id: Uuid,
    pub name: String,
    pub genre: String,
    pub kind: String,
    pub description: String,
    pub stock: i32,
    pub price: Decimal,
    #[serde(default)]
    pub is_new_release: bool,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub artist_id: Option<Uuid>,
    pub name: Option<String>,
    pub genre: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub stock: Option<i32>,
    pub price: Option<Decimal>,
    pub is_new_release: Option<bool>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// Filtered products split by media kind, the storefront "genero" view.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsByKind {
    pub genre: String,
    pub vinyls: Vec<Product>,
    pub cds: Vec<Product>,
    pub cassettes: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtistProductGroup {
    pub artist: String,
    pub items: Vec<Product>,
}

/// Groups preserve the insertion order of first encounter.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductsByArtist {
    #[schema(value_type = Vec<ArtistProductGroup>)]
    pub groups: Vec<ArtistProductGroup>,
}
