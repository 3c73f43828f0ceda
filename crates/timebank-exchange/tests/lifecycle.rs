//! End-to-end lifecycle tests for the exchange engine.
//!
//! These tests exercise complete member journeys:
//! enrollment -> listing -> negotiation -> dual confirmation -> settlement,
//! plus the unhappy paths: rework loops, cancellations, disputes, and
//! administrative reversal. Every scenario finishes by re-verifying the
//! ledger chains and supply conservation.

use rust_decimal::Decimal;
use timebank_exchange::ExchangeEngine;
use timebank_types::{
    ExchangeConfig, Handshake, HandshakeId, HandshakeStatus, IssueType, ResolutionAction,
    ServiceId, TimebankError, UserId,
};

/// Helper: a small community with one admin and a funded dispute pool.
struct Community {
    engine: ExchangeEngine,
    admin: UserId,
}

impl Community {
    fn new() -> Self {
        let mut engine = ExchangeEngine::new(ExchangeConfig::default());
        let admin = UserId::new();
        engine.register_admin(admin);
        Self { engine, admin }
    }

    fn member(&mut self) -> UserId {
        self.engine.enroll().expect("enrollment should succeed")
    }

    fn fund_pool(&mut self, hours: Decimal) {
        self.engine
            .grant_hours(
                self.admin,
                UserId::community_pool(),
                hours,
                "community pool funding",
            )
            .expect("pool funding should succeed");
    }

    fn listing(&mut self, provider: UserId, title: &str, hours: Decimal) -> ServiceId {
        self.engine
            .register_service(provider, title, hours, None)
            .expect("listing registration should succeed")
            .id
    }

    /// Drive a handshake from first interest to approved details.
    fn negotiate(&mut self, requester: UserId, provider: UserId, service: ServiceId) -> HandshakeId {
        let hs = self
            .engine
            .express_interest(requester, service, None)
            .expect("interest should be accepted");
        self.engine
            .accept(provider, hs.id, None)
            .expect("accept should succeed");
        self.engine
            .propose_details(provider, hs.id, Handshake::dummy_details(), None)
            .expect("proposal should succeed");
        self.engine
            .approve_details(requester, hs.id, None)
            .expect("approval should succeed");
        hs.id
    }

    /// Both parties confirm; settlement fires on the second confirmation.
    fn settle(&mut self, requester: UserId, provider: UserId, id: HandshakeId) {
        self.engine
            .confirm(provider, id, None, None)
            .expect("provider confirm should succeed");
        self.engine
            .confirm(requester, id, None, None)
            .expect("requester confirm should succeed");
    }

    fn assert_consistent(&mut self) {
        self.engine
            .verify_ledger()
            .expect("ledger chains and supply should verify");
    }
}

// =============================================================================
// Test: happy path from enrollment to settlement
// =============================================================================
#[test]
fn e2e_happy_path() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "bicycle repair", Decimal::new(2, 0));

    let id = community.negotiate(requester, provider, service);
    community.settle(requester, provider, id);

    let hs = community.engine.get_handshake(id).unwrap();
    assert_eq!(hs.status, HandshakeStatus::Completed);
    assert!(hs.both_confirmed());

    assert_eq!(
        community.engine.balance(requester).available,
        Decimal::new(8, 0)
    );
    assert_eq!(community.engine.balance(requester).escrowed, Decimal::ZERO);
    assert_eq!(
        community.engine.balance(provider).available,
        Decimal::new(12, 0)
    );

    // Both chains carry the settlement pair, tied to the handshake.
    let requester_txs = community.engine.list_transactions(requester);
    assert_eq!(requester_txs.len(), 2, "grant + settlement debit");
    assert_eq!(requester_txs[1].handshake_id, Some(id));

    community.assert_consistent();
}

// =============================================================================
// Test: details rework loop, then settlement at revised hours
// =============================================================================
#[test]
fn e2e_negotiation_rework() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "language tutoring", Decimal::new(2, 0));

    let hs = community
        .engine
        .express_interest(requester, service, None)
        .unwrap();
    community.engine.accept(provider, hs.id, None).unwrap();

    // Provider proposes; requester pushes back; requester re-proposes.
    community
        .engine
        .propose_details(provider, hs.id, Handshake::dummy_details(), None)
        .unwrap();
    community
        .engine
        .request_changes(requester, hs.id, None)
        .unwrap();
    let record = community
        .engine
        .propose_details(requester, hs.id, Handshake::dummy_details(), None)
        .unwrap();
    assert_eq!(record.status, HandshakeStatus::Initiated);
    assert_eq!(record.current_proposer(), Some(requester));

    // Now the provider is the approving party.
    community
        .engine
        .approve_details(provider, hs.id, None)
        .unwrap();

    // Session ran long: provider confirms with the actual hours worked.
    community
        .engine
        .confirm(provider, hs.id, Some(Decimal::new(25, 1)), None)
        .unwrap();
    let settled = community
        .engine
        .confirm(requester, hs.id, None, None)
        .unwrap();

    assert_eq!(settled.status, HandshakeStatus::Completed);
    assert_eq!(settled.provisioned_hours, Decimal::new(25, 1));
    assert_eq!(
        community.engine.balance(provider).available,
        Decimal::new(125, 1)
    );
    assert_eq!(
        community.engine.balance(requester).available,
        Decimal::new(75, 1)
    );
    community.assert_consistent();
}

// =============================================================================
// Test: cancellation releases escrow for reuse
// =============================================================================
#[test]
fn e2e_cancellation_releases_escrow() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "moving help", Decimal::new(10, 0));

    let hs = community
        .engine
        .express_interest(requester, service, None)
        .unwrap();
    community.engine.accept(provider, hs.id, None).unwrap();

    // The full balance is escrowed; a second request cannot be covered.
    let other = community.listing(provider, "gardening", Decimal::new(2, 0));
    let err = community
        .engine
        .express_interest(requester, other, None)
        .unwrap_err();
    assert!(matches!(err, TimebankError::InsufficientHours { .. }));

    community.engine.cancel(requester, hs.id, None).unwrap();

    // After cancellation the hours are available again.
    assert!(community
        .engine
        .express_interest(requester, other, None)
        .is_ok());
    community.assert_consistent();
}

// =============================================================================
// Test: no-show dispute upheld, cancel plus pool compensation
// =============================================================================
#[test]
fn e2e_dispute_upheld() {
    let mut community = Community::new();
    community.fund_pool(Decimal::new(50, 0));
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "bicycle repair", Decimal::new(3, 0));

    let id = community.negotiate(requester, provider, service);
    let report = community
        .engine
        .report(
            requester,
            id,
            IssueType::NoShow,
            "provider never arrived at the agreed time",
            None,
        )
        .unwrap();

    // Settlement is frozen while the report is open.
    let err = community.engine.confirm(provider, id, None, None).unwrap_err();
    assert!(matches!(err, TimebankError::DisputeOpen(h) if h == id));

    let admin = community.admin;
    community.engine.pause_report(admin, id, None).unwrap();
    community
        .engine
        .resolve_report(
            admin,
            report.id,
            ResolutionAction::Uphold,
            Some("no-show confirmed with both parties".into()),
        )
        .unwrap();

    let hs = community.engine.get_handshake(id).unwrap();
    assert_eq!(hs.status, HandshakeStatus::Cancelled);

    // Escrow released plus 3h compensation; provider untouched.
    assert_eq!(
        community.engine.balance(requester).available,
        Decimal::new(13, 0)
    );
    assert_eq!(community.engine.balance(requester).escrowed, Decimal::ZERO);
    assert_eq!(
        community.engine.balance(provider).available,
        Decimal::new(10, 0)
    );
    community.assert_consistent();
}

// =============================================================================
// Test: dismissed dispute restores the handshake, which then settles
// =============================================================================
#[test]
fn e2e_dispute_dismissed_then_settles() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "cooking lessons", Decimal::new(2, 0));

    let id = community.negotiate(requester, provider, service);
    let report = community
        .engine
        .report(provider, id, IssueType::Conduct, "scope disagreement", None)
        .unwrap();

    let admin = community.admin;
    community
        .engine
        .resolve_report(admin, report.id, ResolutionAction::Dismiss, None)
        .unwrap();

    let hs = community.engine.get_handshake(id).unwrap();
    assert_eq!(hs.status, HandshakeStatus::Initiated);
    assert!(hs.details_approved, "approval survives a dismissed report");

    community.settle(requester, provider, id);
    assert_eq!(
        community.engine.get_handshake(id).unwrap().status,
        HandshakeStatus::Completed
    );
    community.assert_consistent();
}

// =============================================================================
// Test: settlement fires exactly once under confirm retries
// =============================================================================
#[test]
fn e2e_settlement_idempotent_under_retry() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "bicycle repair", Decimal::new(2, 0));

    let id = community.negotiate(requester, provider, service);

    // Provider's client retries its confirm; only one flag flips.
    community.engine.confirm(provider, id, None, None).unwrap();
    community.engine.confirm(provider, id, None, None).unwrap();
    assert_eq!(
        community.engine.get_handshake(id).unwrap().status,
        HandshakeStatus::Initiated
    );

    community.engine.confirm(requester, id, None, None).unwrap();
    // Replays after completion are answered with the settled record.
    let replay = community.engine.confirm(requester, id, None, None).unwrap();
    assert_eq!(replay.status, HandshakeStatus::Completed);

    // Exactly one credit, despite four confirm calls.
    assert_eq!(
        community.engine.balance(provider).available,
        Decimal::new(12, 0)
    );
    assert_eq!(community.engine.list_transactions(provider).len(), 2);
    community.assert_consistent();
}

// =============================================================================
// Test: administrative reversal leaves a full audit trail
// =============================================================================
#[test]
fn e2e_reversal_audit_trail() {
    let mut community = Community::new();
    let provider = community.member();
    let requester = community.member();
    let service = community.listing(provider, "bicycle repair", Decimal::new(2, 0));

    let id = community.negotiate(requester, provider, service);
    community.settle(requester, provider, id);

    let admin = community.admin;
    community.engine.reverse_settlement(admin, id).unwrap();

    // Balances are back where they started.
    assert_eq!(
        community.engine.balance(requester).available,
        Decimal::new(10, 0)
    );
    assert_eq!(
        community.engine.balance(provider).available,
        Decimal::new(10, 0)
    );

    // The chain keeps both the settlement and the reversal.
    let requester_txs = community.engine.list_transactions(requester);
    assert_eq!(requester_txs.len(), 3, "grant + settlement debit + refund");
    assert!(requester_txs.iter().all(|e| e.balance_after >= Decimal::ZERO));

    // The handshake stays completed; reversal is a ledger event only.
    assert_eq!(
        community.engine.get_handshake(id).unwrap().status,
        HandshakeStatus::Completed
    );
    community.assert_consistent();
}

// =============================================================================
// Test: busy community, mixed outcomes, supply conserved throughout
// =============================================================================
#[test]
fn e2e_mixed_outcomes_conserve_supply() {
    let mut community = Community::new();
    community.fund_pool(Decimal::new(20, 0));

    let alice = community.member();
    let bob = community.member();
    let carol = community.member();
    let repair = community.listing(alice, "bicycle repair", Decimal::new(2, 0));
    let tutoring = community.listing(bob, "language tutoring", Decimal::new(1, 0));

    // Bob gets his bike fixed by Alice.
    let settled = community.negotiate(bob, alice, repair);
    community.settle(bob, alice, settled);

    // Carol books tutoring with Bob, then cancels.
    let cancelled = community
        .engine
        .express_interest(carol, tutoring, None)
        .unwrap();
    community.engine.accept(bob, cancelled.id, None).unwrap();
    community.engine.cancel(carol, cancelled.id, None).unwrap();

    // Carol's repair booking with Alice goes to a dispute she wins.
    let disputed = community.negotiate(carol, alice, repair);
    let report = community
        .engine
        .report(carol, disputed, IssueType::NoShow, "no-show", None)
        .unwrap();
    let admin = community.admin;
    community
        .engine
        .resolve_report(admin, report.id, ResolutionAction::Uphold, None)
        .unwrap();

    // Every hour minted is still accounted for, in someone's buckets.
    community.assert_consistent();
    assert_eq!(
        community.engine.balance(alice).available,
        Decimal::new(12, 0)
    );
    assert_eq!(community.engine.balance(bob).available, Decimal::new(8, 0));
    assert_eq!(
        community.engine.balance(carol).available,
        Decimal::new(12, 0)
    );
}
