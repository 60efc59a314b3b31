//! `SeaORM` entity definitions, one module per table.

pub mod accounts;
pub mod audit_events;
pub mod consolidation_group_members;
pub mod consolidation_groups;
pub mod journal_entries;
pub mod journal_lines;
pub mod ledger_entities;
pub mod sea_orm_active_enums;
