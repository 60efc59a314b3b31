//! `SeaORM` Entity for consolidation_group_members table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "consolidation_group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: Uuid,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consolidation_groups::Entity",
        from = "Column::GroupId",
        to = "super::consolidation_groups::Column::Id",
        on_delete = "Cascade"
    )]
    ConsolidationGroups,
    #[sea_orm(
        belongs_to = "super::ledger_entities::Entity",
        from = "Column::EntityId",
        to = "super::ledger_entities::Column::Id"
    )]
    LedgerEntities,
}

impl Related<super::consolidation_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsolidationGroups.def()
    }
}

impl Related<super::ledger_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
