use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Artist, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateArtistRequest {
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateArtistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ArtistList {
    #[schema(value_type = Vec<Artist>)]
    pub items: Vec<Artist>,
}

/// Fixed 26-key map: every letter A-Z is present, possibly empty.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ArtistsByLetter {
    #[schema(value_type = Object)]
    pub letters: BTreeMap<String, Vec<Artist>>,
}

/// An artist's catalog split by media kind, the storefront "comprar" view.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArtistCatalog {
    pub artist: Artist,
    pub vinyls: Vec<Product>,
    pub cds: Vec<Product>,
    pub cassettes: Vec<Product>,
}
