use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Platform identity. The password hash never leaves the entity layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Customer profile (the storefront "Usuario"), linked 1:1 to an identity.
/// `user_id` is optional: profiles entered directly by staff may predate
/// their identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The three media formats the store sells. Stored lowercase; parsed
/// case-insensitively from query strings and form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MediaKind {
    #[serde(rename = "vinilo")]
    Vinyl,
    #[serde(rename = "cd")]
    Cd,
    #[serde(rename = "casete")]
    Cassette,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Vinyl => "vinilo",
            MediaKind::Cd => "cd",
            MediaKind::Cassette => "casete",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_lowercase().as_str() {
            "vinilo" => Ok(MediaKind::Vinyl),
            "cd" => Ok(MediaKind::Cd),
            "casete" => Ok(MediaKind::Cassette),
            other => Err(AppError::Validation(format!(
                "unknown media kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub name: String,
    pub genre: String,
    pub kind: String,
    pub description: String,
    pub stock: i32,
    pub price: Decimal,
    pub is_new_release: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order header ("Pedido"). `item_count` and `total` are entered by staff
/// and are not derived from lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub item_count: i32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Order line ("DetallePedido"). `unit_price` is a snapshot taken at entry
/// time, unlike cart subtotals which track the live product price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub profile_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::users::Model> for User {
    fn from(m: crate::entity::users::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            is_staff: m.is_staff,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::customer_profiles::Model> for CustomerProfile {
    fn from(m: crate::entity::customer_profiles::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            address: m.address,
            postal_code: m.postal_code,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::artists::Model> for Artist {
    fn from(m: crate::entity::artists::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            photo: m.photo,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::products::Model> for Product {
    fn from(m: crate::entity::products::Model) -> Self {
        Self {
            id: m.id,
            artist_id: m.artist_id,
            name: m.name,
            genre: m.genre,
            kind: m.kind,
            description: m.description,
            stock: m.stock,
            price: m.price,
            is_new_release: m.is_new_release,
            image: m.image,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::orders::Model> for Order {
    fn from(m: crate::entity::orders::Model) -> Self {
        Self {
            id: m.id,
            profile_id: m.profile_id,
            item_count: m.item_count,
            total: m.total,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::order_lines::Model> for OrderLine {
    fn from(m: crate::entity::order_lines::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            profile_id: m.profile_id,
            product_id: m.product_id,
            quantity: m.quantity,
            unit_price: m.unit_price,
            total: m.total,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_parses_case_insensitively() {
        assert_eq!(MediaKind::parse("Vinilo").unwrap(), MediaKind::Vinyl);
        assert_eq!(MediaKind::parse("CD").unwrap(), MediaKind::Cd);
        assert_eq!(MediaKind::parse(" casete ").unwrap(), MediaKind::Cassette);
    }

    #[test]
    fn media_kind_rejects_unknown_values() {
        assert!(MediaKind::parse("8-track").is_err());
        assert!(MediaKind::parse("").is_err());
    }

    #[test]
    fn media_kind_round_trips_as_str() {
        for kind in [MediaKind::Vinyl, MediaKind::Cd, MediaKind::Cassette] {
            assert_eq!(MediaKind::parse(kind.as_str()).unwrap(), kind);
        }
    }
}
