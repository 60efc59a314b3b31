//! Engine scenarios covering entry creation, the lifecycle state machine,
//! draft editing, reversal, and role checks.

#![allow(clippy::too_many_lines)]

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::engine::{EngineError, UpdateAccount, UpdateEntry};
use tally_core::ledger::{AccountType, EntityScope, EntrySide, LedgerError, LineInput};
use tally_core::reports::ReportOptions;
use tally_core::store::{AuditAction, EntryFilter};
use tally_core::workflow::{ActorRole, EntryStatus, ReversalOptions, WorkflowError};
use tally_core::ErrorKind;
use tally_shared::types::{ClientId, EntityId, JournalEntryId, PageRequest};

use common::{Harness, actor, date, entry, pair};

#[tokio::test]
async fn test_cash_ap_scenario_post_report_reverse() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100.00))).await;
    assert_eq!(draft.status, EntryStatus::Draft);
    assert!(draft.totals().is_balanced());

    let posted = h.post_draft(e, &draft).await;
    assert_eq!(posted.status, EntryStatus::Posted);
    assert!(posted.posted.is_some());

    let tb = h
        .engine
        .trial_balance(&h.admin, e, None, date(2026, 3, 31), ReportOptions::default())
        .await
        .unwrap();
    let cash_line = tb.accounts.iter().find(|a| a.code == "1000").unwrap();
    let ap_line = tb.accounts.iter().find(|a| a.code == "2000").unwrap();
    assert_eq!(cash_line.total_debit, dec!(100.00));
    assert_eq!(ap_line.total_credit, dec!(100.00));
    assert_eq!(tb.totals.total_debit, tb.totals.total_credit);
    assert!(tb.totals.is_balanced);

    let reversal = h
        .engine
        .reverse(
            &h.admin,
            e,
            posted.id,
            ReversalOptions {
                entry_date: Some(date(2026, 3, 31)),
                ..ReversalOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reversal.status, EntryStatus::Draft);
    assert_eq!(reversal.entry_date, date(2026, 3, 31));
    assert_eq!(reversal.reversal_of, Some(posted.id));
    assert_eq!(reversal.reference_number, format!("REV-{}", posted.reference_number));
    let sides: Vec<(EntrySide, Decimal)> = reversal.lines.iter().map(|l| (l.side, l.amount)).collect();
    assert_eq!(
        sides,
        vec![(EntrySide::Credit, dec!(100.00)), (EntrySide::Debit, dec!(100.00))]
    );

    let original = h.engine.get_entry(&h.admin, e, posted.id).await.unwrap();
    assert_eq!(original.reversed_by, Some(reversal.id));

    h.post_draft(e, &reversal).await;

    let tb = h
        .engine
        .trial_balance(&h.admin, e, None, date(2026, 12, 31), ReportOptions::default())
        .await
        .unwrap();
    for line in &tb.accounts {
        assert_eq!(line.balance, Decimal::ZERO, "account {} should net to zero", line.code);
    }
}

#[tokio::test]
async fn test_unbalanced_entry_rejected_before_persistence() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    let err = h
        .engine
        .create_entry(
            &h.admin,
            e,
            entry(
                date(2026, 3, 1),
                Some("JE-UNBALANCED"),
                vec![LineInput::debit(cash.id, dec!(100.00)), LineInput::credit(ap.id, dec!(50.00))],
            ),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(err, EngineError::Ledger(LedgerError::Unbalanced { .. })));

    let (entries, total) = h
        .engine
        .list_entries(&h.admin, e, EntryFilter::all(e.client_id, e.entity_id), PageRequest::new(1, 50))
        .await
        .map(|page| (page.data, page.meta.total))
        .unwrap();
    assert!(entries.is_empty());
    assert_eq!(total, 0);
    assert!(h.audit.events_with(AuditAction::EntryCreated).await.is_empty());
}

#[tokio::test]
async fn test_explicit_duplicate_reference_is_conflict() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    h.engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 1), Some("JE-7"), pair(&cash, &ap, dec!(10))))
        .await
        .unwrap();
    let err = h
        .engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 2), Some("JE-7"), pair(&cash, &ap, dec!(20))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.error_code(), "DUPLICATE_REFERENCE");
}

#[tokio::test]
async fn test_generated_reference_format() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    let draft = h.draft(e, date(2026, 3, 9), pair(&cash, &ap, dec!(10))).await;
    assert!(draft.reference_number.starts_with("JE-20260309-"));
    assert_eq!(draft.reference_number.len(), "JE-20260309-".len() + 8);
}

#[tokio::test]
async fn test_illegal_transitions_leave_status_unchanged() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(40))).await;

    let err = h.engine.post(&h.admin, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
    assert_eq!(
        err,
        EngineError::Workflow(WorkflowError::IllegalTransition {
            from: EntryStatus::Draft,
            to: EntryStatus::Posted,
        })
    );

    let err = h.engine.approve(&h.admin, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    let err = h.engine.void(&h.admin, e, draft.id, "typo").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    // A blank reason does not mask the wrong starting status.
    let err = h.engine.reject(&h.admin, e, draft.id, "").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Workflow(WorkflowError::IllegalTransition {
            from: EntryStatus::Draft,
            to: EntryStatus::Rejected,
        })
    );
    let err = h.engine.void(&h.admin, e, draft.id, "  ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    let reloaded = h.engine.get_entry(&h.admin, e, draft.id).await.unwrap();
    assert_eq!(reloaded.status, EntryStatus::Draft);
    assert_eq!(reloaded.updated_at, draft.updated_at);

    let denials = h.audit.events_with(AuditAction::OperationDenied).await;
    assert_eq!(denials.len(), 5);
}

#[tokio::test]
async fn test_reject_and_resubmit() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h
        .engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 1), Some("INV-1"), pair(&cash, &ap, dec!(75))))
        .await
        .unwrap();
    h.engine.request_approval(&h.admin, e, draft.id).await.unwrap();

    let err = h.engine.reject(&h.admin, e, draft.id, "   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let rejected = h
        .engine
        .reject(&h.admin, e, draft.id, "wrong vendor")
        .await
        .unwrap();
    assert_eq!(rejected.status, EntryStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong vendor"));

    let copy = h.engine.resubmit(&h.admin, e, draft.id).await.unwrap();
    assert_eq!(copy.status, EntryStatus::Draft);
    assert_eq!(copy.reference_number, "INV-1-R1");
    assert_eq!(copy.resubmitted_from, Some(draft.id));
    assert_eq!(copy.line_inputs(), draft.line_inputs());

    let original = h.engine.get_entry(&h.admin, e, draft.id).await.unwrap();
    assert_eq!(original.status, EntryStatus::Rejected);

    let err = h.engine.resubmit(&h.admin, e, copy.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
}

#[tokio::test]
async fn test_void_keeps_lines_and_creates_no_reversal() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let posted = h.posted(e, date(2026, 3, 1), pair(&cash, &ap, dec!(60))).await;

    let err = h.engine.void(&h.admin, e, posted.id, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let voided = h
        .engine
        .void(&h.admin, e, posted.id, "duplicate invoice")
        .await
        .unwrap();
    assert_eq!(voided.status, EntryStatus::Voided);
    assert_eq!(voided.lines, posted.lines);
    assert!(voided.reversed_by.is_none());

    let tb = h
        .engine
        .trial_balance(&h.admin, e, None, date(2026, 12, 31), ReportOptions::default())
        .await
        .unwrap();
    assert_eq!(tb.totals.total_debit, Decimal::ZERO);
}

#[tokio::test]
async fn test_double_reversal_is_conflict() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let posted = h.posted(e, date(2026, 3, 1), pair(&cash, &ap, dec!(60))).await;

    h.engine
        .reverse(&h.admin, e, posted.id, ReversalOptions::default())
        .await
        .unwrap();
    let err = h
        .engine
        .reverse(&h.admin, e, posted.id, ReversalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.error_code(), "ALREADY_REVERSED");
}

#[tokio::test]
async fn test_reversal_of_draft_rejected() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(60))).await;

    let err = h
        .engine
        .reverse(&h.admin, e, draft.id, ReversalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "REVERSAL_REQUIRES_POSTED");
}

#[tokio::test]
async fn test_reversal_reference_collision_is_suffixed() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    let draft = h
        .engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 1), Some("JE-1"), pair(&cash, &ap, dec!(5))))
        .await
        .unwrap();
    let posted = h.post_draft(e, &draft).await;
    h.engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 2), Some("REV-JE-1"), pair(&cash, &ap, dec!(1))))
        .await
        .unwrap();

    let reversal = h
        .engine
        .reverse(&h.admin, e, posted.id, ReversalOptions::default())
        .await
        .unwrap();
    assert_ne!(reversal.reference_number, "REV-JE-1");
    assert!(reversal.reference_number.starts_with("REV-JE-1-"));
}

#[tokio::test]
async fn test_line_edits_on_draft() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let rent = h.account(e, "6000", AccountType::Expense, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;

    let added = h
        .engine
        .add_line(&h.admin, e, draft.id, LineInput::debit(rent.id, dec!(25)))
        .await
        .unwrap();
    assert_eq!(added.entry.lines.len(), 3);
    assert_eq!(added.entry.lines[2].position, 2);
    assert!(!added.balance.balanced);
    assert_eq!(added.balance.totals.total_debit, dec!(125));

    let err = h.engine.request_approval(&h.admin, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let ap_line = added.entry.lines[1].id;
    let updated = h
        .engine
        .update_line(&h.admin, e, draft.id, ap_line, LineInput::credit(ap.id, dec!(125)))
        .await
        .unwrap();
    assert!(updated.balance.balanced);
    assert_eq!(updated.entry.lines[1].id, ap_line);

    let err = h
        .engine
        .add_line(&h.admin, e, draft.id, LineInput::debit(rent.id, dec!(0)))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_AMOUNT");

    let rent_line = updated.entry.lines[2].id;
    let removed = h
        .engine
        .remove_line(&h.admin, e, draft.id, rent_line)
        .await
        .unwrap();
    assert_eq!(removed.entry.lines.len(), 2);
    assert!(!removed.balance.balanced);
}

#[tokio::test]
async fn test_last_line_removal_rejected() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;

    let first = draft.lines[0].id;
    let second = draft.lines[1].id;
    h.engine.remove_line(&h.admin, e, draft.id, first).await.unwrap();

    let err = h
        .engine
        .remove_line(&h.admin, e, draft.id, second)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Ledger(LedgerError::LastLineRemoval));

    let reloaded = h.engine.get_entry(&h.admin, e, draft.id).await.unwrap();
    assert_eq!(reloaded.lines.len(), 1);
}

#[tokio::test]
async fn test_edits_rejected_outside_draft() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;
    h.engine.request_approval(&h.admin, e, draft.id).await.unwrap();

    let err = h
        .engine
        .add_line(&h.admin, e, draft.id, LineInput::debit(cash.id, dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h
        .engine
        .update_entry(
            &h.admin,
            e,
            draft.id,
            UpdateEntry {
                description: Some("changed".into()),
                ..UpdateEntry::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ENTRY_NOT_EDITABLE");

    let err = h.engine.delete_entry(&h.admin, e, draft.id).await.unwrap_err();
    assert_eq!(err.error_code(), "CAN_ONLY_DELETE_DRAFT");

    assert!(h.engine.attachments_mutable(&h.admin, e, draft.id).await.unwrap());
    h.engine.approve(&h.admin, e, draft.id).await.unwrap();
    assert!(!h.engine.attachments_mutable(&h.admin, e, draft.id).await.unwrap());
}

#[tokio::test]
async fn test_update_replaces_lines_and_delete_draft() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;

    let err = h
        .engine
        .update_entry(
            &h.admin,
            e,
            draft.id,
            UpdateEntry {
                lines: Some(vec![LineInput::debit(cash.id, dec!(10))]),
                ..UpdateEntry::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let updated = h
        .engine
        .update_entry(
            &h.admin,
            e,
            draft.id,
            UpdateEntry {
                entry_date: Some(date(2026, 3, 5)),
                reference_number: Some("JE-NEW".into()),
                description: Some("Corrected".into()),
                lines: Some(pair(&cash, &ap, dec!(250))),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.reference_number, "JE-NEW");
    assert_eq!(updated.entry_date, date(2026, 3, 5));
    assert_eq!(updated.totals().total_debit, dec!(250));

    h.engine.delete_entry(&h.admin, e, draft.id).await.unwrap();
    let err = h.engine.get_entry(&h.admin, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_concurrent_posts_exactly_one_wins() {
    let h = Arc::new(Harness::new());
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;
    h.engine.request_approval(&h.admin, e, draft.id).await.unwrap();
    h.engine.approve(&h.admin, e, draft.id).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        let id = draft.id;
        handles.push(tokio::spawn(async move { h.engine.post(&h.admin, e, id).await }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(entry) => {
                assert_eq!(entry.status, EntryStatus::Posted);
                wins += 1;
            }
            Err(err) => assert_eq!(err.kind(), ErrorKind::IllegalTransition),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(h.audit.events_with(AuditAction::EntryPosted).await.len(), 1);
}

#[tokio::test]
async fn test_role_denial_is_forbidden_and_audited() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;

    let submitter = actor(ActorRole::Submitter);
    let draft = h
        .engine
        .create_entry(&submitter, e, entry(date(2026, 3, 1), None, pair(&cash, &ap, dec!(9))))
        .await
        .unwrap();
    h.engine.request_approval(&submitter, e, draft.id).await.unwrap();

    let err = h.engine.approve(&submitter, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.http_status_code(), 403);

    let viewer = actor(ActorRole::Viewer);
    let err = h
        .engine
        .create_entry(&viewer, e, entry(date(2026, 3, 1), None, pair(&cash, &ap, dec!(9))))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let denials = h.audit.events_with(AuditAction::OperationDenied).await;
    assert_eq!(denials.len(), 2);
    assert_eq!(denials[0].actor_id, submitter.user_id);
    assert_eq!(denials[0].target_id, Some(draft.id.into_inner()));
    assert_eq!(denials[0].detail["operation"], "approve");
    assert_eq!(denials[1].actor_id, viewer.user_id);

    let approver = actor(ActorRole::Approver);
    h.engine.approve(&approver, e, draft.id).await.unwrap();
    let err = h.engine.post(&approver, e, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_other_client_sees_not_found() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let ap = h.account(e, "2000", AccountType::Liability, None).await;
    let draft = h.draft(e, date(2026, 3, 1), pair(&cash, &ap, dec!(100))).await;

    let foreign = EntityScope::new(ClientId::new(), e.entity_id);
    let err = h.engine.get_entry(&h.admin, foreign, draft.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let other_entity = EntityScope::new(e.client_id, EntityId::new());
    let err = h
        .engine
        .get_entry(&h.admin, other_entity, draft.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .engine
        .get_entry(&h.admin, e, JournalEntryId::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ENTRY_NOT_FOUND");
}

#[tokio::test]
async fn test_lines_on_foreign_or_inactive_accounts_rejected() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let f = h.entity("Entity F").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let foreign = h.account(f, "2000", AccountType::Liability, None).await;

    let err = h
        .engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 1), None, pair(&cash, &foreign, dec!(5))))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let ap = h.account(e, "2001", AccountType::Liability, None).await;
    h.engine
        .update_account(
            &h.admin,
            e,
            ap.id,
            UpdateAccount {
                is_active: Some(false),
                ..UpdateAccount::default()
            },
        )
        .await
        .unwrap();
    let err = h
        .engine
        .create_entry(&h.admin, e, entry(date(2026, 3, 1), None, pair(&cash, &ap, dec!(5))))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_store_outage_surfaces_as_storage_error() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    h.store.set_unavailable(true);

    let err = h.engine.list_accounts(&h.admin, e).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}
