#![cfg(test)]

use crate::settings::VerifierConfig;
use crate::trace::{CapabilityTable, TraceEvent};
use crate::verifier::DiagnosticKind;
use crate::verifier::tests::test_support::{
    binding, borrow, declare, declare_mut, declare_typed, exclusive, expect_reject, in_root_scope,
    pos, run, run_with, scope, send_sync_table, shared,
};

#[test]
fn overlapping_exclusive_borrows_are_rejected() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        exclusive(1, 1, 2),
        exclusive(2, 1, 3),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::ConflictingBorrow);
    assert_eq!(diagnostics[0].binding, binding(1));
    assert_eq!(diagnostics[0].borrows, vec![borrow(1), borrow(2)]);
}

#[test]
fn shared_borrows_coexist() {
    let report = run(in_root_scope(vec![
        declare(1, 0, "x", 1),
        shared(1, 1, 2),
        shared(2, 1, 3),
        shared(3, 1, 4),
        TraceEvent::use_binding(binding(1), pos(5)),
    ]));

    assert!(report.is_accept());
    assert_eq!(report.stats.borrows_tracked, 3);
}

#[test]
fn shared_after_exclusive_reports_one_conflict() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        exclusive(1, 1, 2),
        shared(2, 1, 3),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::ConflictingBorrow);
    assert_eq!(diagnostics[0].binding, binding(1));
    assert_eq!(diagnostics[0].borrows, vec![borrow(1), borrow(2)]);
    assert!(diagnostics[0].message.contains("'x'"));
}

#[test]
fn move_then_use_is_rejected() {
    let report = run(in_root_scope(vec![
        declare(1, 0, "x", 1),
        TraceEvent::move_binding(binding(1), pos(2)),
        TraceEvent::use_binding(binding(1), pos(3)),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseAfterMove);
    assert!(diagnostics[0].message.contains("moved"));
}

#[test]
fn move_then_thread_transfer_is_accepted() {
    let table = send_sync_table(7);
    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "worker_input", 7, 1),
            TraceEvent::move_binding(binding(1), pos(2)),
            TraceEvent::thread_transfer(binding(1), pos(2)),
        ]),
        &table,
        &VerifierConfig::all_checks(),
    );

    assert!(report.is_accept());
}

#[test]
fn reassignment_makes_a_moved_binding_usable_again() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        TraceEvent::move_binding(binding(1), pos(2)),
        TraceEvent::assign(binding(1), pos(3)),
        TraceEvent::use_binding(binding(1), pos(4)),
    ]));

    assert!(report.is_accept());
}

#[test]
fn move_while_borrowed_is_rejected() {
    let report = run(in_root_scope(vec![
        declare(1, 0, "x", 1),
        shared(1, 1, 2),
        TraceEvent::move_binding(binding(1), pos(3)),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseWhileBorrowed);
    assert_eq!(diagnostics[0].borrows, vec![borrow(1)]);
}

#[test]
fn assign_while_borrowed_is_rejected() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        shared(1, 1, 2),
        TraceEvent::assign(binding(1), pos(3)),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseWhileBorrowed);
    assert!(diagnostics[0].message.contains("assign"));
}

#[test]
fn explicit_borrow_end_releases_the_binding() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        shared(1, 1, 2),
        shared(2, 1, 3),
        TraceEvent::borrow_end(borrow(1), pos(4)),
        TraceEvent::borrow_end(borrow(2), pos(5)),
        exclusive(3, 1, 6),
    ]));

    assert!(report.is_accept());
}

#[test]
fn scope_exit_releases_borrows_created_inside_it() {
    let trace = vec![
        TraceEvent::scope_enter(scope(0), None, pos(0)),
        declare_mut(1, 0, "x", 1),
        TraceEvent::scope_enter(scope(1), Some(scope(0)), pos(2)),
        exclusive(1, 1, 3),
        TraceEvent::scope_exit(scope(1), pos(4)),
        exclusive(2, 1, 5),
        TraceEvent::scope_exit(scope(0), pos(6)),
    ];

    assert!(run(trace).is_accept());
}

#[test]
fn use_after_scope_exit_is_rejected() {
    let trace = vec![
        TraceEvent::scope_enter(scope(0), None, pos(0)),
        TraceEvent::scope_enter(scope(1), Some(scope(0)), pos(1)),
        declare(1, 1, "x", 2),
        TraceEvent::scope_exit(scope(1), pos(3)),
        TraceEvent::use_binding(binding(1), pos(4)),
        TraceEvent::scope_exit(scope(0), pos(5)),
    ];

    let report = run(trace);
    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseAfterMove);
    assert!(diagnostics[0].message.contains("scope ended"));
}

#[test]
fn move_after_scope_exit_is_rejected() {
    let trace = vec![
        TraceEvent::scope_enter(scope(0), None, pos(0)),
        TraceEvent::scope_enter(scope(1), Some(scope(0)), pos(1)),
        declare(1, 1, "x", 2),
        TraceEvent::scope_exit(scope(1), pos(3)),
        TraceEvent::move_binding(binding(1), pos(4)),
        TraceEvent::scope_exit(scope(0), pos(5)),
    ];

    let report = run(trace);
    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseAfterMove);
    assert!(diagnostics[0].message.contains("scope ended"));
}

#[test]
fn assign_after_scope_exit_is_rejected() {
    let trace = vec![
        TraceEvent::scope_enter(scope(0), None, pos(0)),
        TraceEvent::scope_enter(scope(1), Some(scope(0)), pos(1)),
        declare_mut(1, 1, "x", 2),
        TraceEvent::scope_exit(scope(1), pos(3)),
        TraceEvent::assign(binding(1), pos(4)),
        TraceEvent::scope_exit(scope(0), pos(5)),
    ];

    let report = run(trace);
    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseAfterMove);
    assert!(diagnostics[0].message.contains("scope ended"));
}

#[test]
fn borrow_after_move_is_rejected_as_use() {
    let report = run(in_root_scope(vec![
        declare(1, 0, "x", 1),
        TraceEvent::move_binding(binding(1), pos(2)),
        shared(1, 1, 3),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UseAfterMove);
    assert!(diagnostics[0].message.contains("borrow"));
}

#[test]
fn cascading_conflicts_in_one_statement_are_suppressed() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        exclusive(1, 1, 2),
        shared(2, 1, 3),
        shared(3, 1, 3),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(report.stats.diagnostics_suppressed, 1);
}

#[test]
fn conflicts_on_different_bindings_in_one_statement_are_independent() {
    let report = run(in_root_scope(vec![
        declare_mut(1, 0, "x", 1),
        declare_mut(2, 0, "y", 2),
        exclusive(1, 1, 3),
        exclusive(2, 2, 3),
        shared(3, 1, 4),
        shared(4, 2, 4),
    ]));

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().any(|d| d.binding == binding(1)));
    assert!(diagnostics.iter().any(|d| d.binding == binding(2)));
}

#[test]
fn snapshots_reflect_live_borrows_at_end_of_trace() {
    // No scope exit: the root stays open so the borrow is still live.
    let trace = vec![
        TraceEvent::scope_enter(scope(0), None, pos(0)),
        declare(1, 0, "x", 1),
        shared(1, 1, 2),
    ];

    let report = run_with(
        trace,
        &CapabilityTable::new(),
        &VerifierConfig::all_checks(),
    );

    assert!(report.is_accept());
    assert_eq!(report.binding_states.len(), 1);
    let snapshot = &report.binding_states[0];
    assert_eq!(snapshot.name, "x");
    assert_eq!(snapshot.live_shared_borrows, vec![borrow(1)]);
    assert_eq!(snapshot.live_exclusive_borrow, None);
    assert!(!snapshot.moved_from);
    assert!(!snapshot.scope_ended);
}
