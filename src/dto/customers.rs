use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CustomerProfile, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<i32>,
}

/// `degraded` flags that the rows were projected from identities because
/// the profile relation is unavailable; such rows are read-only.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<CustomerProfile>,
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct EmployeeList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStaffRequest {
    pub is_staff: bool,
}
