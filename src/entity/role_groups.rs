use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "role_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_group_members::Entity")]
    RoleGroupMembers,
}

impl Related<super::role_group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleGroupMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
