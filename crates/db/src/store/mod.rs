//! PostgreSQL implementation of the ledger store.
//!
//! Entry writes run in one database transaction with their lines. Status
//! changes are `UPDATE ... WHERE status = <expected>`; zero affected rows
//! means the caller lost a race or the entry is gone, and the row is read
//! back to tell which.

pub(crate) mod convert;
pub(crate) mod error;

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::consolidation::ConsolidationGroup;
use tally_core::ledger::{Account, JournalEntry, JournalLine, LedgerEntity};
use tally_core::store::{ActivityLine, ActivityQuery, EntryFilter, LedgerStore, StoreError};
use tally_core::workflow::EntryStatus;
use tally_shared::types::{
    AccountId, ClientId, ConsolidationGroupId, EntityId, JournalEntryId, PageRequest,
};
use tracing::debug;
use uuid::Uuid;

use self::convert::{
    account_from_row, account_model, entity_from_row, entity_model, entry_from_rows, entry_model,
    group_from_rows, group_model, header_update, lifecycle_update, line_model, member_model,
};
use self::error::{
    ACCOUNT_CODE_KEY, ENTRY_REFERENCE_KEY, GROUP_MEMBER_KEY, REVERSAL_OF_KEY, storage, violates,
};
use crate::entities::{
    accounts, consolidation_group_members, consolidation_groups, journal_entries, journal_lines,
    ledger_entities, sea_orm_active_enums,
};

/// `LedgerStore` over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
}

impl SeaOrmLedgerStore {
    /// Creates a store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn db_status(status: EntryStatus) -> sea_orm_active_enums::EntryStatus {
    status.into()
}

fn duplicate_reference(err: DbErr, entry: &JournalEntry) -> StoreError {
    if violates(&err, ENTRY_REFERENCE_KEY) {
        StoreError::DuplicateReference {
            entity_id: entry.entity_id,
            reference: entry.reference_number.clone(),
        }
    } else {
        storage(err)
    }
}

/// Escapes `%`, `_` and `\` so `needle` matches literally in `LIKE`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

async fn insert_lines<C: ConnectionTrait>(conn: &C, lines: &[JournalLine]) -> Result<(), StoreError> {
    if lines.is_empty() {
        return Ok(());
    }
    let models = lines.iter().map(line_model).collect::<Result<Vec<_>, _>>()?;
    journal_lines::Entity::insert_many(models)
        .exec_without_returning(conn)
        .await
        .map_err(storage)?;
    Ok(())
}

async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    entry_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<journal_lines::Model>>, StoreError> {
    let mut by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
    if entry_ids.is_empty() {
        return Ok(by_entry);
    }
    let rows = journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.is_in(entry_ids))
        .order_by_asc(journal_lines::Column::Position)
        .all(conn)
        .await
        .map_err(storage)?;
    for row in rows {
        by_entry.entry(row.entry_id).or_default().push(row);
    }
    Ok(by_entry)
}

/// Explains why a compare-and-set on `id` matched no row.
async fn status_conflict<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
    expected: EntryStatus,
) -> StoreError {
    match journal_entries::Entity::find_by_id(id.into_inner()).one(conn).await {
        Ok(Some(row)) => StoreError::StatusConflict {
            entry_id: id,
            expected,
            actual: row.status.into(),
        },
        Ok(None) => StoreError::not_found("Entry", id),
        Err(err) => storage(err),
    }
}

async fn group_members<C: ConnectionTrait>(
    conn: &C,
    group_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<Uuid>>, StoreError> {
    let mut by_group: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if group_ids.is_empty() {
        return Ok(by_group);
    }
    let rows = consolidation_group_members::Entity::find()
        .filter(consolidation_group_members::Column::GroupId.is_in(group_ids))
        .all(conn)
        .await
        .map_err(storage)?;
    for row in rows {
        by_group.entry(row.group_id).or_default().push(row.entity_id);
    }
    Ok(by_group)
}

impl LedgerStore for SeaOrmLedgerStore {
    // ========== Entities ==========

    async fn insert_entity(&self, entity: &LedgerEntity) -> Result<(), StoreError> {
        ledger_entities::Entity::insert(entity_model(entity))
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn get_entity(&self, id: EntityId) -> Result<Option<LedgerEntity>, StoreError> {
        let row = ledger_entities::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?;
        Ok(row.map(entity_from_row))
    }

    // ========== Accounts ==========

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        accounts::Entity::insert(account_model(account))
            .exec_without_returning(&self.db)
            .await
            .map_err(|err| {
                if violates(&err, ACCOUNT_CODE_KEY) {
                    StoreError::DuplicateAccountCode {
                        entity_id: account.entity_id,
                        code: account.code.clone(),
                    }
                } else {
                    storage(err)
                }
            })?;
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        account_model(account).update(&self.db).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => StoreError::not_found("Account", account.id),
            err if violates(&err, ACCOUNT_CODE_KEY) => StoreError::DuplicateAccountCode {
                entity_id: account.entity_id,
                code: account.code.clone(),
            },
            err => storage(err),
        })?;
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(account_from_row)
            .transpose()
    }

    async fn find_account_by_code(&self, entity_id: EntityId, code: &str) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::EntityId.eq(entity_id.into_inner()))
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(account_from_row)
            .transpose()
    }

    async fn list_accounts(&self, entity_id: EntityId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::EntityId.eq(entity_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(account_from_row)
            .collect()
    }

    // ========== Entries ==========

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;

        journal_entries::Entity::insert(entry_model(entry))
            .exec_without_returning(&txn)
            .await
            .map_err(|err| duplicate_reference(err, entry))?;
        insert_lines(&txn, &entry.lines).await?;

        txn.commit().await.map_err(storage)?;
        debug!(entry_id = %entry.id, lines = entry.lines.len(), "Entry inserted");
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        let Some(row) = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };
        let mut lines = load_lines(&self.db, vec![row.id]).await?;
        let lines = lines.remove(&row.id).unwrap_or_default();
        entry_from_rows(row, lines).map(Some)
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<JournalEntry>, u64), StoreError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::ClientId.eq(filter.client_id.into_inner()))
            .filter(journal_entries::Column::EntityId.eq(filter.entity_id.into_inner()));

        if !filter.statuses.is_empty() {
            query = query.filter(
                journal_entries::Column::Status.is_in(filter.statuses.iter().copied().map(db_status)),
            );
        }

        if let Some(date_from) = filter.date_from {
            query = query.filter(journal_entries::Column::EntryDate.gte(date_from));
        }

        if let Some(date_to) = filter.date_to {
            query = query.filter(journal_entries::Column::EntryDate.lte(date_to));
        }

        if let Some(account_id) = filter.account_id {
            query = query.filter(
                journal_entries::Column::Id.in_subquery(
                    Query::select()
                        .column(journal_lines::Column::EntryId)
                        .from(journal_lines::Entity)
                        .and_where(journal_lines::Column::AccountId.eq(account_id.into_inner()))
                        .to_owned(),
                ),
            );
        }

        if let Some(needle) = filter.search.as_deref() {
            let pattern = like_pattern(needle);
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(journal_entries::Column::ReferenceNumber)))
                            .like(pattern.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(journal_entries::Column::Description)))
                            .like(pattern.as_str()),
                    ),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(storage)?;

        let rows = query
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .order_by_desc(journal_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(storage)?;

        let mut lines = load_lines(&self.db, rows.iter().map(|r| r.id).collect()).await?;
        let entries = rows
            .into_iter()
            .map(|row| {
                let entry_lines = lines.remove(&row.id).unwrap_or_default();
                entry_from_rows(row, entry_lines)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((entries, total))
    }

    async fn reference_exists(&self, entity_id: EntityId, reference: &str) -> Result<bool, StoreError> {
        let count = journal_entries::Entity::find()
            .filter(journal_entries::Column::EntityId.eq(entity_id.into_inner()))
            .filter(journal_entries::Column::ReferenceNumber.eq(reference))
            .count(&self.db)
            .await
            .map_err(storage)?;
        Ok(count > 0)
    }

    async fn replace_entry(&self, entry: &JournalEntry, expected: EntryStatus) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;

        let updated = journal_entries::Entity::update_many()
            .set(header_update(entry))
            .filter(journal_entries::Column::Id.eq(entry.id.into_inner()))
            .filter(journal_entries::Column::Status.eq(db_status(expected)))
            .exec(&txn)
            .await
            .map_err(|err| duplicate_reference(err, entry))?;
        if updated.rows_affected == 0 {
            return Err(status_conflict(&txn, entry.id, expected).await);
        }

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(entry.id.into_inner()))
            .exec(&txn)
            .await
            .map_err(storage)?;
        insert_lines(&txn, &entry.lines).await?;

        txn.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn transition_entry(&self, entry: &JournalEntry, expected: EntryStatus) -> Result<(), StoreError> {
        let updated = journal_entries::Entity::update_many()
            .set(lifecycle_update(entry))
            .filter(journal_entries::Column::Id.eq(entry.id.into_inner()))
            .filter(journal_entries::Column::Status.eq(db_status(expected)))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        if updated.rows_affected == 0 {
            return Err(status_conflict(&self.db, entry.id, expected).await);
        }
        debug!(entry_id = %entry.id, from = %expected, to = %entry.status, "Entry status written");
        Ok(())
    }

    async fn delete_entry(&self, id: JournalEntryId, expected: EntryStatus) -> Result<(), StoreError> {
        let deleted = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(db_status(expected)))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        if deleted.rows_affected == 0 {
            return Err(status_conflict(&self.db, id, expected).await);
        }
        Ok(())
    }

    async fn insert_reversal(&self, reversal: &JournalEntry, original_id: JournalEntryId) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;

        if let Err(err) = journal_entries::Entity::insert(entry_model(reversal))
            .exec_without_returning(&txn)
            .await
        {
            if !violates(&err, REVERSAL_OF_KEY) {
                return Err(duplicate_reference(err, reversal));
            }
            // A concurrent reversal of the same original committed first.
            drop(txn);
            let existing = self.get_entry(original_id).await?;
            return Err(match existing.and_then(|e| e.reversed_by) {
                Some(reversed_by) => StoreError::AlreadyReversed {
                    entry_id: original_id,
                    reversed_by,
                },
                None => storage(err),
            });
        }
        insert_lines(&txn, &reversal.lines).await?;

        let linked = journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::ReversedBy, Expr::value(reversal.id.into_inner()))
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(convert::timestamp(reversal.created_at)),
            )
            .filter(journal_entries::Column::Id.eq(original_id.into_inner()))
            .filter(journal_entries::Column::Status.eq(db_status(EntryStatus::Posted)))
            .filter(journal_entries::Column::ReversedBy.is_null())
            .exec(&txn)
            .await
            .map_err(storage)?;

        if linked.rows_affected == 0 {
            let original = journal_entries::Entity::find_by_id(original_id.into_inner())
                .one(&txn)
                .await
                .map_err(storage)?;
            return Err(match original {
                None => StoreError::not_found("Entry", original_id),
                Some(row) if row.status != sea_orm_active_enums::EntryStatus::Posted => {
                    StoreError::StatusConflict {
                        entry_id: original_id,
                        expected: EntryStatus::Posted,
                        actual: row.status.into(),
                    }
                }
                Some(row) => match row.reversed_by {
                    Some(reversed_by) => StoreError::AlreadyReversed {
                        entry_id: original_id,
                        reversed_by: JournalEntryId::from_uuid(reversed_by),
                    },
                    None => StoreError::StatusConflict {
                        entry_id: original_id,
                        expected: EntryStatus::Posted,
                        actual: EntryStatus::Posted,
                    },
                },
            });
        }

        txn.commit().await.map_err(storage)?;
        debug!(reversal_id = %reversal.id, %original_id, "Reversal linked");
        Ok(())
    }

    // ========== Activity ==========

    async fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<ActivityLine>, StoreError> {
        let mut select = journal_lines::Entity::find()
            .find_also_related(journal_entries::Entity)
            .filter(
                journal_entries::Column::EntityId
                    .is_in(query.entity_ids.iter().map(|id| id.into_inner())),
            )
            .filter(journal_entries::Column::Status.is_in(query.statuses.iter().copied().map(db_status)))
            .filter(journal_entries::Column::EntryDate.lte(query.range.end()));

        if let Some(start) = query.range.start() {
            select = select.filter(journal_entries::Column::EntryDate.gte(start));
        }

        if let Some(account_ids) = &query.account_ids {
            select = select
                .filter(journal_lines::Column::AccountId.is_in(account_ids.iter().map(|id| id.into_inner())));
        }

        let rows = select
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::CreatedAt)
            .order_by_asc(journal_entries::Column::Id)
            .order_by_asc(journal_lines::Column::Position)
            .all(&self.db)
            .await
            .map_err(storage)?;

        rows.into_iter()
            .filter_map(|(line, entry)| entry.map(|entry| (line, entry)))
            .map(|(line, entry)| {
                let line = convert::line_from_row(line)?;
                Ok(ActivityLine {
                    entity_id: EntityId::from_uuid(entry.entity_id),
                    entry_id: JournalEntryId::from_uuid(entry.id),
                    entry_date: entry.entry_date,
                    reference_number: entry.reference_number,
                    entry_description: entry.description,
                    status: entry.status.into(),
                    created_at: convert::utc(entry.created_at),
                    line_id: line.id,
                    account_id: line.account_id,
                    side: line.side,
                    amount: line.amount,
                    line_description: line.description,
                    position: line.position,
                })
            })
            .collect()
    }

    // ========== Consolidation groups ==========

    async fn insert_group(&self, group: &ConsolidationGroup) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;

        consolidation_groups::Entity::insert(group_model(group))
            .exec_without_returning(&txn)
            .await
            .map_err(storage)?;
        if !group.members.is_empty() {
            consolidation_group_members::Entity::insert_many(
                group.members.iter().map(|entity_id| member_model(group.id, *entity_id)),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(storage)?;
        }

        txn.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn get_group(&self, id: ConsolidationGroupId) -> Result<Option<ConsolidationGroup>, StoreError> {
        let Some(row) = consolidation_groups::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };
        let mut members = group_members(&self.db, vec![row.id]).await?;
        let members = members.remove(&row.id).unwrap_or_default();
        Ok(Some(group_from_rows(row, members)))
    }

    async fn list_groups(&self, client_id: ClientId) -> Result<Vec<ConsolidationGroup>, StoreError> {
        let rows = consolidation_groups::Entity::find()
            .filter(consolidation_groups::Column::ClientId.eq(client_id.into_inner()))
            .order_by_asc(consolidation_groups::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage)?;
        let mut members = group_members(&self.db, rows.iter().map(|r| r.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let group_members = members.remove(&row.id).unwrap_or_default();
                group_from_rows(row, group_members)
            })
            .collect())
    }

    async fn add_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<bool, StoreError> {
        match consolidation_group_members::Entity::insert(member_model(group_id, entity_id))
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if violates(&err, GROUP_MEMBER_KEY) => Ok(false),
            Err(err) => Err(storage(err)),
        }
    }

    async fn remove_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<bool, StoreError> {
        let deleted = consolidation_group_members::Entity::delete_many()
            .filter(consolidation_group_members::Column::GroupId.eq(group_id.into_inner()))
            .filter(consolidation_group_members::Column::EntityId.eq(entity_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(deleted.rows_affected > 0)
    }
}
