#![cfg(test)]

use crate::settings::VerifierConfig;
use crate::trace::{Capability, CapabilityTable, TraceEvent};
use crate::verifier::tests::test_support::{
    binding, declare_typed, expect_reject, in_root_scope, pos, run_with, send_sync_table, tag,
};
use crate::verifier::{DiagnosticKind, send_and_sync};
use crate::verifier_errors::InternalErrorKind;

#[test]
fn transfer_of_unsendable_type_is_rejected() {
    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "conn", 9, 1),
            TraceEvent::thread_transfer(binding(1), pos(2)),
        ]),
        &CapabilityTable::new(),
        &VerifierConfig::all_checks(),
    );

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsendableTransfer);
    assert_eq!(diagnostics[0].binding, binding(1));
    assert!(diagnostics[0].message.contains("not Send"));
}

#[test]
fn transfer_of_sendable_type_is_accepted() {
    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "job", 9, 1),
            TraceEvent::thread_transfer(binding(1), pos(2)),
        ]),
        &send_sync_table(9),
        &VerifierConfig::all_checks(),
    );

    assert!(report.is_accept());
}

#[test]
fn share_of_unsyncable_type_is_rejected() {
    // Send without Sync: transferable, not shareable.
    let mut table = CapabilityTable::new();
    table.register(tag(3), Capability::SEND);

    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "cache", 3, 1),
            TraceEvent::thread_transfer(binding(1), pos(2)),
            TraceEvent::thread_share(binding(1), pos(3)),
        ]),
        &table,
        &VerifierConfig::all_checks(),
    );

    let diagnostics = expect_reject(&report);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsyncableShare);
    assert!(diagnostics[0].message.contains("not Sync"));
}

#[test]
fn share_of_syncable_type_is_accepted() {
    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "registry", 4, 1),
            TraceEvent::thread_share(binding(1), pos(2)),
        ]),
        &send_sync_table(4),
        &VerifierConfig::all_checks(),
    );

    assert!(report.is_accept());
}

#[test]
fn unregistered_type_has_no_capabilities() {
    let table = send_sync_table(1);

    assert_eq!(table.lookup(tag(1)), send_and_sync());
    assert_eq!(table.lookup(tag(2)), Capability::UNSAFE);
    assert!(!table.lookup(tag(2)).is_send());
    assert!(!table.lookup(tag(2)).is_sync());
}

#[test]
fn composite_capability_is_the_intersection_of_its_parts() {
    let mut table = CapabilityTable::new();
    table.register(tag(1), send_and_sync());
    table.register(tag(2), Capability::SEND);

    assert_eq!(table.compose(&[tag(1)]), send_and_sync());
    assert_eq!(table.compose(&[tag(1), tag(2)]), Capability::SEND);
    assert_eq!(table.compose(&[tag(1), tag(2), tag(3)]), Capability::UNSAFE);
    // The empty composite has nothing unsafe in it.
    assert_eq!(table.compose(&[]), send_and_sync());
}

#[test]
fn thread_safety_check_can_be_disabled_per_run() {
    let config = VerifierConfig {
        check_thread_safety: false,
        ..VerifierConfig::all_checks()
    };

    let report = run_with(
        in_root_scope(vec![
            declare_typed(1, 0, "conn", 9, 1),
            TraceEvent::thread_transfer(binding(1), pos(2)),
            TraceEvent::thread_share(binding(1), pos(3)),
        ]),
        &CapabilityTable::new(),
        &config,
    );

    assert!(report.is_accept());
    // Lookups still happened, they just emitted nothing.
    assert_eq!(report.stats.conflicts_checked, 2);
}

#[test]
fn transfer_of_unknown_binding_is_fatal() {
    let trace = in_root_scope(vec![TraceEvent::thread_transfer(binding(42), pos(1))]);

    let error = crate::verifier::verify_trace(
        &trace,
        &CapabilityTable::new(),
        &VerifierConfig::all_checks(),
    )
    .unwrap_err();

    assert_eq!(error.kind, InternalErrorKind::UnknownBinding);
}
