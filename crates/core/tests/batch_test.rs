//! Engine scenarios for batch import.

mod common;

use rust_decimal_macros::dec;
use tally_core::batch::{BatchLineInput, BatchRow};
use tally_core::engine::EngineError;
use tally_core::ledger::{Account, AccountType, EntrySide, MAX_REFERENCE_LEN};
use tally_core::store::AuditAction;
use tally_core::workflow::{ActorRole, EntryStatus};
use tally_core::ErrorKind;
use tally_shared::config::{AmbiguousLinePolicy, LedgerConfig};
use tally_shared::types::AccountId;

use common::{Harness, actor, date};

fn row(reference: Option<&str>, lines: Vec<BatchLineInput>) -> BatchRow {
    BatchRow {
        entry_date: date(2026, 4, 1),
        reference: reference.map(str::to_string),
        description: "Imported".into(),
        lines,
    }
}

fn simple(reference: Option<&str>, debit: &Account, credit: &Account, amount: &str) -> BatchRow {
    row(
        reference,
        vec![
            BatchLineInput::new(debit.id, amount, ""),
            BatchLineInput::new(credit.id, "", amount),
        ],
    )
}

#[tokio::test]
async fn test_one_invalid_row_is_isolated() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows = vec![
        simple(None, &cash, &sales, "10.00"),
        simple(None, &cash, &sales, "20.00"),
        simple(None, &cash, &sales, "12,x"),
        simple(None, &cash, &sales, "40.00"),
    ];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 3);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].row_index, 2);
    assert_eq!(result.failures[0].kind, ErrorKind::Validation);
    assert_eq!(result.failures[0].code, "MALFORMED_AMOUNT");

    let created_rows: Vec<usize> = result.created.iter().map(|c| c.row_index).collect();
    assert_eq!(created_rows, vec![0, 1, 3]);
    for created in &result.created {
        let entry = h.engine.get_entry(&h.admin, e, created.entry_id).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.reference_number, created.reference_number);
    }

    let audits = h.audit.events_with(AuditAction::BatchImported).await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].detail["failed"], 1);
}

#[tokio::test]
async fn test_duplicate_references_in_batch_both_succeed() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows = vec![
        simple(Some("INV-100"), &cash, &sales, "10"),
        simple(Some("INV-100"), &cash, &sales, "15"),
    ];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 2);
    assert!(result.failures.is_empty());
    assert_eq!(result.created[0].reference_number, "INV-100");
    assert_ne!(result.created[1].reference_number, "INV-100");
    assert!(result.created[1].reference_number.starts_with("INV-100-"));
}

#[tokio::test]
async fn test_long_duplicate_references_stay_within_limit() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let long = format!("IMPORT-{}", "7".repeat(88));
    let rows = vec![
        simple(Some(&long), &cash, &sales, "10"),
        simple(Some(&long), &cash, &sales, "15"),
        simple(Some(&long), &cash, &sales, "20"),
    ];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 3, "failures: {:?}", result.failures);
    assert_eq!(result.created[0].reference_number, long);
    let mut refs: Vec<&str> = result.created.iter().map(|c| c.reference_number.as_str()).collect();
    for reference in &refs {
        assert!(reference.chars().count() <= MAX_REFERENCE_LEN, "{reference}");
        assert!(reference.starts_with("IMPORT-777"));
    }
    refs.sort_unstable();
    refs.dedup();
    assert_eq!(refs.len(), 3);
}

#[tokio::test]
async fn test_batch_reference_taken_by_existing_entry_is_suffixed() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let first = h
        .engine
        .create_batch(&h.admin, e, vec![simple(Some("INV-9"), &cash, &sales, "1")])
        .await
        .unwrap();
    let second = h
        .engine
        .create_batch(&h.admin, e, vec![simple(Some("INV-9"), &cash, &sales, "1")])
        .await
        .unwrap();

    assert_eq!(first.created[0].reference_number, "INV-9");
    assert_ne!(second.created[0].reference_number, "INV-9");
}

#[tokio::test]
async fn test_ambiguous_line_flagged_by_default() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows = vec![row(
        None,
        vec![
            BatchLineInput::new(cash.id, "100", "30"),
            BatchLineInput::new(sales.id, "", "100"),
        ],
    )];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].row_index, 0);
    assert_eq!(result.warnings[0].line_index, 0);
    assert_eq!(result.warnings[0].chosen_side, EntrySide::Debit);

    let entry = h
        .engine
        .get_entry(&h.admin, e, result.created[0].entry_id)
        .await
        .unwrap();
    assert_eq!(entry.lines[0].side, EntrySide::Debit);
    assert_eq!(entry.lines[0].amount, dec!(100));
}

#[tokio::test]
async fn test_ambiguous_line_rejected_under_strict_policy() {
    let h = Harness::with_config(LedgerConfig {
        ambiguous_line_policy: AmbiguousLinePolicy::Reject,
        ..LedgerConfig::default()
    });
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows = vec![row(
        None,
        vec![
            BatchLineInput::new(cash.id, "100", "30"),
            BatchLineInput::new(sales.id, "", "100"),
        ],
    )];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 0);
    assert_eq!(result.failures[0].code, "AMBIGUOUS_LINE");
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn test_row_level_rule_failures() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows = vec![
        simple(None, &cash, &sales, "0"),
        row(
            None,
            vec![
                BatchLineInput::new(cash.id, "10", ""),
                BatchLineInput::new(sales.id, "", "9"),
            ],
        ),
        simple(None, &cash, &Account { id: AccountId::new(), ..sales.clone() }, "5"),
        BatchRow {
            description: "  ".into(),
            ..simple(None, &cash, &sales, "5")
        },
    ];
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    let codes: Vec<(usize, &str)> = result.failures.iter().map(|f| (f.row_index, f.code)).collect();
    assert_eq!(
        codes,
        vec![
            (0, "NO_POSITIVE_AMOUNT"),
            (1, "UNBALANCED_ENTRY"),
            (2, "ACCOUNT_NOT_FOUND"),
            (3, "MISSING_FIELD"),
        ]
    );
    assert_eq!(result.success_count, 0);
}

#[tokio::test]
async fn test_parallel_normalization_preserves_order() {
    let h = Harness::with_config(LedgerConfig {
        parallel_batch_threshold: 4,
        ..LedgerConfig::default()
    });
    let e = h.entity("Entity E").await;
    let cash = h.account(e, "1000", AccountType::Asset, Some("cash")).await;
    let sales = h.account(e, "4000", AccountType::Revenue, None).await;

    let rows: Vec<BatchRow> = (1..=20)
        .map(|i| {
            let amount = if i == 13 { "oops".to_string() } else { i.to_string() };
            simple(Some(&format!("B-{i}")), &cash, &sales, &amount)
        })
        .collect();
    let result = h.engine.create_batch(&h.admin, e, rows).await.unwrap();

    assert_eq!(result.success_count, 19);
    assert_eq!(result.failures[0].row_index, 12);
    let refs: Vec<&str> = result.created.iter().map(|c| c.reference_number.as_str()).collect();
    assert_eq!(refs[0], "B-1");
    assert_eq!(refs[12], "B-14");
    assert_eq!(refs[18], "B-20");
}

#[tokio::test]
async fn test_empty_batch_and_role_rejected() {
    let h = Harness::new();
    let e = h.entity("Entity E").await;

    let err = h.engine.create_batch(&h.admin, e, Vec::new()).await.unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_BATCH");
    assert_eq!(err.kind(), ErrorKind::Validation);

    let viewer = actor(ActorRole::Viewer);
    let err = h.engine.create_batch(&viewer, e, Vec::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::Workflow(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
