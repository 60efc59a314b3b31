//! Conversions between table rows and domain types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::prelude::{DateTimeWithTimeZone, Json};
use sea_orm::{ActiveValue::NotSet, Set};
use tally_core::consolidation::ConsolidationGroup;
use tally_core::ledger::{Account, JournalEntry, JournalLine, LedgerEntity, Stamp, SubledgerKind};
use tally_core::store::StoreError;
use tally_shared::types::{
    AccountId, ClientId, ConsolidationGroupId, EntityId, JournalEntryId, JournalLineId, UserId,
};
use uuid::Uuid;

use super::error::corrupt;
use crate::entities::{
    accounts, consolidation_group_members, consolidation_groups, journal_entries, journal_lines,
    ledger_entities,
};

pub(crate) fn timestamp(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

pub(crate) fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn stamp(by: Option<Uuid>, at: Option<DateTimeWithTimeZone>) -> Option<Stamp> {
    match (by, at) {
        (Some(user_id), Some(at)) => Some(Stamp {
            user_id: UserId::from_uuid(user_id),
            at: utc(at),
        }),
        _ => None,
    }
}

fn stamp_by(stamp: Option<Stamp>) -> Option<Uuid> {
    stamp.map(|s| s.user_id.into_inner())
}

fn stamp_at(stamp: Option<Stamp>) -> Option<DateTimeWithTimeZone> {
    stamp.map(|s| timestamp(s.at))
}

// ========== Entities ==========

pub(crate) fn entity_model(entity: &LedgerEntity) -> ledger_entities::ActiveModel {
    ledger_entities::ActiveModel {
        id: Set(entity.id.into_inner()),
        client_id: Set(entity.client_id.into_inner()),
        name: Set(entity.name.clone()),
        currency: Set(entity.currency.clone()),
        created_at: Set(timestamp(entity.created_at)),
    }
}

pub(crate) fn entity_from_row(row: ledger_entities::Model) -> LedgerEntity {
    LedgerEntity {
        id: EntityId::from_uuid(row.id),
        client_id: ClientId::from_uuid(row.client_id),
        name: row.name,
        currency: row.currency.trim_end().to_string(),
        created_at: utc(row.created_at),
    }
}

// ========== Accounts ==========

pub(crate) fn account_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        entity_id: Set(account.entity_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.into()),
        subtype: Set(account.subtype.clone()),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        is_active: Set(account.is_active),
        subledger: Set(account.subledger.map(|k| k.as_str().to_string())),
        created_at: Set(timestamp(account.created_at)),
    }
}

pub(crate) fn account_from_row(row: accounts::Model) -> Result<Account, StoreError> {
    let subledger = row
        .subledger
        .as_deref()
        .map(|raw| SubledgerKind::parse(raw).ok_or_else(|| corrupt("accounts", format!("subledger '{raw}'"))))
        .transpose()?;

    Ok(Account {
        id: AccountId::from_uuid(row.id),
        entity_id: EntityId::from_uuid(row.entity_id),
        code: row.code,
        name: row.name,
        account_type: row.account_type.into(),
        subtype: row.subtype,
        parent_id: row.parent_id.map(AccountId::from_uuid),
        is_active: row.is_active,
        subledger,
        created_at: utc(row.created_at),
    })
}

// ========== Entries ==========

pub(crate) fn entry_model(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        client_id: Set(entry.client_id.into_inner()),
        entity_id: Set(entry.entity_id.into_inner()),
        reversal_of: Set(entry.reversal_of.map(JournalEntryId::into_inner)),
        reversed_by: Set(entry.reversed_by.map(JournalEntryId::into_inner)),
        resubmitted_from: Set(entry.resubmitted_from.map(JournalEntryId::into_inner)),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(timestamp(entry.created_at)),
        ..header_update(entry)
    }
    .merge_lifecycle(entry)
}

/// Columns a draft edit may change.
pub(crate) fn header_update(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        entry_date: Set(entry.entry_date),
        reference_number: Set(entry.reference_number.clone()),
        description: Set(entry.description.clone()),
        updated_at: Set(timestamp(entry.updated_at)),
        ..Default::default()
    }
}

/// Columns a status transition changes.
pub(crate) fn lifecycle_update(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        updated_at: Set(timestamp(entry.updated_at)),
        ..Default::default()
    }
    .merge_lifecycle(entry)
}

trait MergeLifecycle {
    fn merge_lifecycle(self, entry: &JournalEntry) -> Self;
}

impl MergeLifecycle for journal_entries::ActiveModel {
    fn merge_lifecycle(mut self, entry: &JournalEntry) -> Self {
        self.status = Set(entry.status.into());
        self.submitted_by = Set(stamp_by(entry.submitted));
        self.submitted_at = Set(stamp_at(entry.submitted));
        self.approved_by = Set(stamp_by(entry.approved));
        self.approved_at = Set(stamp_at(entry.approved));
        self.rejected_by = Set(stamp_by(entry.rejected));
        self.rejected_at = Set(stamp_at(entry.rejected));
        self.rejection_reason = Set(entry.rejection_reason.clone());
        self.posted_by = Set(stamp_by(entry.posted));
        self.posted_at = Set(stamp_at(entry.posted));
        self.voided_by = Set(stamp_by(entry.voided));
        self.voided_at = Set(stamp_at(entry.voided));
        self.void_reason = Set(entry.void_reason.clone());
        self
    }
}

pub(crate) fn line_model(line: &JournalLine) -> Result<journal_lines::ActiveModel, StoreError> {
    let position = i32::try_from(line.position)
        .map_err(|_| corrupt("journal_lines", format!("position {} out of range", line.position)))?;
    Ok(journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        entry_id: Set(line.entry_id.into_inner()),
        account_id: Set(line.account_id.into_inner()),
        side: Set(line.side.into()),
        amount: Set(line.amount),
        description: Set(line.description.clone()),
        dimensions: Set(Json::Array(line.dimensions.iter().cloned().map(Json::String).collect())),
        position: Set(position),
    })
}

pub(crate) fn line_from_row(row: journal_lines::Model) -> Result<JournalLine, StoreError> {
    let dimensions: Vec<String> =
        serde_json::from_value(row.dimensions).map_err(|e| corrupt("journal_lines", e))?;
    let position = u32::try_from(row.position)
        .map_err(|_| corrupt("journal_lines", format!("negative position {}", row.position)))?;
    Ok(JournalLine {
        id: JournalLineId::from_uuid(row.id),
        entry_id: JournalEntryId::from_uuid(row.entry_id),
        account_id: AccountId::from_uuid(row.account_id),
        side: row.side.into(),
        amount: row.amount.normalize(),
        description: row.description,
        dimensions,
        position,
    })
}

pub(crate) fn entry_from_rows(
    row: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> Result<JournalEntry, StoreError> {
    let mut lines = lines.into_iter().map(line_from_row).collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|l| l.position);

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(row.id),
        client_id: ClientId::from_uuid(row.client_id),
        entity_id: EntityId::from_uuid(row.entity_id),
        entry_date: row.entry_date,
        reference_number: row.reference_number,
        description: row.description,
        status: row.status.into(),
        created_by: UserId::from_uuid(row.created_by),
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
        submitted: stamp(row.submitted_by, row.submitted_at),
        approved: stamp(row.approved_by, row.approved_at),
        rejected: stamp(row.rejected_by, row.rejected_at),
        rejection_reason: row.rejection_reason,
        posted: stamp(row.posted_by, row.posted_at),
        voided: stamp(row.voided_by, row.voided_at),
        void_reason: row.void_reason,
        reversal_of: row.reversal_of.map(JournalEntryId::from_uuid),
        reversed_by: row.reversed_by.map(JournalEntryId::from_uuid),
        resubmitted_from: row.resubmitted_from.map(JournalEntryId::from_uuid),
        lines,
    })
}

// ========== Consolidation groups ==========

pub(crate) fn group_model(group: &ConsolidationGroup) -> consolidation_groups::ActiveModel {
    consolidation_groups::ActiveModel {
        id: Set(group.id.into_inner()),
        client_id: Set(group.client_id.into_inner()),
        name: Set(group.name.clone()),
        currency: Set(group.currency.clone()),
        period_start: Set(group.period_start),
        period_end: Set(group.period_end),
        created_at: Set(timestamp(group.created_at)),
    }
}

pub(crate) fn member_model(
    group_id: ConsolidationGroupId,
    entity_id: EntityId,
) -> consolidation_group_members::ActiveModel {
    consolidation_group_members::ActiveModel {
        group_id: Set(group_id.into_inner()),
        entity_id: Set(entity_id.into_inner()),
        added_at: NotSet,
    }
}

pub(crate) fn group_from_rows(
    row: consolidation_groups::Model,
    members: impl IntoIterator<Item = Uuid>,
) -> ConsolidationGroup {
    ConsolidationGroup {
        id: ConsolidationGroupId::from_uuid(row.id),
        client_id: ClientId::from_uuid(row.client_id),
        name: row.name,
        currency: row.currency.trim_end().to_string(),
        period_start: row.period_start,
        period_end: row.period_end,
        members: members.into_iter().map(EntityId::from_uuid).collect::<BTreeSet<_>>(),
        created_at: utc(row.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;
    use tally_core::ledger::{LineInput, NewEntry};
    use tally_core::workflow::EntryStatus;

    use crate::entities::sea_orm_active_enums;

    fn sample_entry() -> JournalEntry {
        let mut line = LineInput::debit(AccountId::new(), dec!(12.5));
        line.dimensions = vec!["dept:ops".into()];
        JournalEntry::draft(
            NewEntry {
                client_id: ClientId::new(),
                entity_id: EntityId::new(),
                entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                reference_number: "JE-1".into(),
                description: "Rent".into(),
                created_by: UserId::new(),
            },
            vec![line, LineInput::credit(AccountId::new(), dec!(12.5))],
            Utc::now(),
        )
    }

    #[test]
    fn test_line_row_round_trip_keeps_dimensions() {
        let entry = sample_entry();
        let model = line_model(&entry.lines[0]).unwrap();
        let row = journal_lines::Model {
            id: entry.lines[0].id.into_inner(),
            entry_id: entry.id.into_inner(),
            account_id: entry.lines[0].account_id.into_inner(),
            side: sea_orm_active_enums::EntrySide::Debit,
            amount: dec!(12.500000),
            description: None,
            dimensions: model.dimensions.unwrap(),
            position: 0,
        };

        let line = line_from_row(row).unwrap();
        assert_eq!(line, entry.lines[0]);
        assert_eq!(line.amount.to_string(), "12.5");
    }

    #[test]
    fn test_lifecycle_update_leaves_header_untouched() {
        let mut entry = sample_entry();
        entry.status = EntryStatus::PendingApproval;
        let update = lifecycle_update(&entry);

        assert_eq!(
            update.status,
            ActiveValue::Set(sea_orm_active_enums::EntryStatus::PendingApproval)
        );
        assert!(matches!(update.reference_number, ActiveValue::NotSet));
        assert!(matches!(update.entry_date, ActiveValue::NotSet));
    }

    #[test]
    fn test_unknown_subledger_is_reported() {
        let row = accounts::Model {
            id: Uuid::now_v7(),
            entity_id: Uuid::now_v7(),
            code: "1200".into(),
            name: "Receivables".into(),
            account_type: sea_orm_active_enums::AccountType::Asset,
            subtype: None,
            parent_id: None,
            is_active: true,
            subledger: Some("payroll".into()),
            created_at: timestamp(Utc::now()),
        };
        assert!(matches!(account_from_row(row), Err(StoreError::Unavailable(_))));
    }
}
