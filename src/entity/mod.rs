pub mod artists;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod customer_profiles;
pub mod order_lines;
pub mod orders;
pub mod products;
pub mod role_group_members;
pub mod role_groups;
pub mod users;

pub use artists::Entity as Artists;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use customer_profiles::Entity as CustomerProfiles;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use role_group_members::Entity as RoleGroupMembers;
pub use role_groups::Entity as RoleGroups;
pub use users::Entity as Users;

/// Name of the staff role group checked by `list_employees`.
pub const EMPLOYEE_GROUP: &str = "Empleados";
