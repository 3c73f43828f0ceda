//! The exchange engine.
//!
//! `ExchangeEngine` is the authoritative write path for the marketplace:
//! every handshake mutation, escrow move, and settlement goes through it.
//! Each operation validates the caller, checks the optimistic revision if
//! the caller supplied one, applies the guarded transition, and emits one
//! notification on success.
//!
//! Admin-only operations (grants, pausing, report resolution, settlement
//! reversal) check the admin registry and refuse everyone else with
//! [`TimebankError::NotAParticipant`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use timebank_ledger::HourLedger;
use timebank_types::{
    ExchangeConfig, ExchangeDetails, Handshake, HandshakeId, HandshakeStatus, HourBalance,
    IssueType, LedgerEntry, Notification, NotificationKind, NotificationSink, Report, ReportId,
    ResolutionAction, Result, ServiceId, ServiceListing, TimebankError, UserId,
};

use crate::dispute::DisputeResolver;
use crate::quorum::Quorum;
use crate::settlement::{self, SettlementOutcome};
use crate::sink::TracingSink;

/// The marketplace core: services, handshakes, disputes, and the ledger.
pub struct ExchangeEngine {
    config: ExchangeConfig,
    ledger: HourLedger,
    services: HashMap<ServiceId, ServiceListing>,
    handshakes: HashMap<HandshakeId, Handshake>,
    disputes: DisputeResolver,
    admins: HashSet<UserId>,
    sink: Arc<dyn NotificationSink>,
}

/// Statuses during which the requester's hours are held in escrow.
fn escrow_active(status: HandshakeStatus) -> bool {
    matches!(
        status,
        HandshakeStatus::Accepted | HandshakeStatus::Initiated | HandshakeStatus::ChangesRequested
    )
}

fn require_participant(handshake: &Handshake, user: UserId) -> Result<()> {
    if !handshake.is_participant(user) {
        return Err(TimebankError::NotAParticipant(user));
    }
    Ok(())
}

fn guard_violation(action: &str, handshake: &Handshake) -> TimebankError {
    TimebankError::GuardViolation {
        action: action.to_string(),
        current: handshake.status,
        revision: handshake.revision,
    }
}

/// Change the provisioned hours, adjusting the escrow hold by the delta
/// when one is active. Clears both completion confirmations so the new
/// amount must be re-confirmed by both parties.
fn apply_hours_revision(
    ledger: &mut HourLedger,
    handshake: &mut Handshake,
    new_hours: Decimal,
    min_hours: Decimal,
) -> Result<()> {
    if new_hours < min_hours {
        return Err(TimebankError::InvalidHours(new_hours));
    }
    if escrow_active(handshake.status) {
        let delta = new_hours - handshake.provisioned_hours;
        if delta > Decimal::ZERO {
            ledger.escrow(handshake.requester_id, delta)?;
        } else if delta < Decimal::ZERO {
            ledger.release_escrow(handshake.requester_id, -delta)?;
        }
    }
    handshake.provisioned_hours = new_hours;
    handshake.reset_confirmations();
    Ok(())
}

impl ExchangeEngine {
    /// Create an engine that reports notifications through `tracing`.
    #[must_use]
    pub fn new(config: ExchangeConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create an engine with a caller-supplied notification sink.
    #[must_use]
    pub fn with_sink(config: ExchangeConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let ledger = HourLedger::new(config.settled_cache_size);
        Self {
            config,
            ledger,
            services: HashMap::new(),
            handshakes: HashMap::new(),
            disputes: DisputeResolver::new(),
            admins: HashSet::new(),
            sink,
        }
    }

    // =================================================================
    // Membership and listings
    // =================================================================

    /// Enroll a new member, granting the configured initial hours.
    ///
    /// # Errors
    /// Propagates ledger errors from the enrollment grant.
    pub fn enroll(&mut self) -> Result<UserId> {
        let user = UserId::new();
        if self.config.initial_grant_hours > Decimal::ZERO {
            self.ledger
                .grant(user, self.config.initial_grant_hours, "enrollment grant")?;
        }
        tracing::info!(%user, "member enrolled");
        Ok(user)
    }

    /// Add a member to the admin registry.
    pub fn register_admin(&mut self, user: UserId) {
        self.admins.insert(user);
    }

    /// Register a service listing. `capacity` defaults to the configured
    /// concurrency cap when not given.
    ///
    /// # Errors
    /// Returns [`TimebankError::InvalidHours`] if `default_hours` is below
    /// the configured minimum.
    pub fn register_service(
        &mut self,
        provider_id: UserId,
        title: impl Into<String>,
        default_hours: Decimal,
        capacity: Option<usize>,
    ) -> Result<ServiceListing> {
        if default_hours < self.config.min_provisioned_hours {
            return Err(TimebankError::InvalidHours(default_hours));
        }
        let mut listing = ServiceListing::new(provider_id, title, default_hours);
        listing.capacity = capacity.unwrap_or(self.config.default_service_capacity);
        self.services.insert(listing.id, listing.clone());
        tracing::info!(service = %listing.id, provider = %provider_id, "service registered");
        Ok(listing)
    }

    /// Admin top-up: grant hours to any member, including the community
    /// pool that funds dispute compensation.
    ///
    /// # Errors
    /// Returns [`TimebankError::NotAParticipant`] for non-admin callers,
    /// plus ledger errors.
    pub fn grant_hours(
        &mut self,
        admin: UserId,
        user: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<LedgerEntry> {
        self.require_admin(admin)?;
        self.ledger.grant(user, amount, description)
    }

    // =================================================================
    // Negotiation
    // =================================================================

    /// Open a handshake against a listing. `hours` defaults to the
    /// listing's default commitment.
    ///
    /// # Errors
    /// - [`TimebankError::ServiceNotFound`] for an unknown listing
    /// - [`TimebankError::SelfExchangeBlocked`] when the requester owns it
    /// - [`TimebankError::DuplicateActiveHandshake`] when the requester
    ///   already has a live handshake on it
    /// - [`TimebankError::ServiceAtCapacity`] when the concurrency cap is
    ///   reached
    /// - [`TimebankError::InvalidHours`] / [`TimebankError::InsufficientHours`]
    ///   when the commitment is below the minimum or not covered
    pub fn express_interest(
        &mut self,
        requester_id: UserId,
        service_id: ServiceId,
        hours: Option<Decimal>,
    ) -> Result<Handshake> {
        let listing = self
            .services
            .get(&service_id)
            .ok_or(TimebankError::ServiceNotFound(service_id))?;
        if requester_id == listing.provider_id {
            return Err(TimebankError::SelfExchangeBlocked);
        }
        let duplicate = self.handshakes.values().any(|hs| {
            hs.service_id == service_id
                && hs.requester_id == requester_id
                && hs.status.is_active()
        });
        if duplicate {
            return Err(TimebankError::DuplicateActiveHandshake {
                service: service_id,
                requester: requester_id,
            });
        }
        let active = self
            .handshakes
            .values()
            .filter(|hs| hs.service_id == service_id && hs.status.is_active())
            .count();
        if active >= listing.capacity {
            return Err(TimebankError::ServiceAtCapacity(service_id));
        }

        let hours = hours.unwrap_or(listing.default_hours);
        if hours < self.config.min_provisioned_hours {
            return Err(TimebankError::InvalidHours(hours));
        }
        let available = self.ledger.balance(requester_id).available;
        if available < hours {
            return Err(TimebankError::InsufficientHours {
                needed: hours,
                available,
            });
        }

        let handshake = Handshake::new(service_id, requester_id, listing.provider_id, hours);
        let snapshot = handshake.clone();
        self.handshakes.insert(handshake.id, handshake);
        self.emit(NotificationKind::InterestExpressed, snapshot.id, Some(requester_id));
        tracing::info!(
            handshake = %snapshot.id,
            service = %service_id,
            requester = %requester_id,
            %hours,
            "interest expressed"
        );
        Ok(snapshot)
    }

    /// Provider accepts the request, escrowing the requester's hours.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] if the caller is not the
    /// provider or the status does not allow acceptance, plus revision and
    /// ledger errors.
    pub fn accept(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if actor != hs.provider_id {
            return Err(guard_violation("accept", hs));
        }
        if !hs.status.can_transition_to(HandshakeStatus::Accepted) {
            return Err(guard_violation("accept", hs));
        }

        // Escrow before the transition so a failed hold leaves the
        // handshake in Pending.
        self.ledger.escrow(hs.requester_id, hs.provisioned_hours)?;
        hs.transition_to(HandshakeStatus::Accepted)?;
        let snapshot = hs.clone();
        self.emit(NotificationKind::Accepted, handshake_id, Some(actor));
        tracing::info!(handshake = %handshake_id, "request accepted, hours escrowed");
        Ok(snapshot)
    }

    /// Provider declines the request. Terminal.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] if the caller is not the
    /// provider or the handshake is not pending.
    pub fn deny(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if actor != hs.provider_id {
            return Err(guard_violation("deny", hs));
        }
        hs.transition_to(HandshakeStatus::Denied)?;
        let snapshot = hs.clone();
        self.emit(NotificationKind::Denied, handshake_id, Some(actor));
        Ok(snapshot)
    }

    /// Either party withdraws before completion, releasing any escrow.
    ///
    /// Cancellation of a reported or paused handshake goes through report
    /// resolution instead, so an open dispute cannot be abandoned
    /// unilaterally.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] outside the cancellable
    /// statuses.
    pub fn cancel(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if !matches!(
            hs.status,
            HandshakeStatus::Pending
                | HandshakeStatus::Accepted
                | HandshakeStatus::Initiated
                | HandshakeStatus::ChangesRequested
        ) {
            return Err(guard_violation("cancel", hs));
        }
        if escrow_active(hs.status) {
            self.ledger
                .release_escrow(hs.requester_id, hs.provisioned_hours)?;
        }
        hs.transition_to(HandshakeStatus::Cancelled)?;
        let snapshot = hs.clone();
        self.emit(NotificationKind::Cancelled, handshake_id, Some(actor));
        tracing::info!(handshake = %handshake_id, actor = %actor, "handshake cancelled");
        Ok(snapshot)
    }

    /// Propose (or re-propose) the concrete exchange details. Clears the
    /// counterparty's approval and both completion confirmations.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] outside the negotiable
    /// statuses.
    pub fn propose_details(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        details: ExchangeDetails,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if !matches!(
            hs.status,
            HandshakeStatus::Accepted
                | HandshakeStatus::Initiated
                | HandshakeStatus::ChangesRequested
        ) {
            return Err(guard_violation("propose details", hs));
        }
        hs.record_proposal(actor, details);
        if hs.status == HandshakeStatus::Initiated {
            hs.touch();
        } else {
            hs.transition_to(HandshakeStatus::Initiated)?;
        }
        let snapshot = hs.clone();
        self.emit(NotificationKind::DetailsProposed, handshake_id, Some(actor));
        Ok(snapshot)
    }

    /// The counterparty approves the current details proposal.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] if nothing is proposed,
    /// the caller proposed it themselves, or the status is wrong.
    pub fn approve_details(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if hs.status != HandshakeStatus::Initiated {
            return Err(guard_violation("approve details", hs));
        }
        match hs.current_proposer() {
            None => return Err(guard_violation("approve details", hs)),
            Some(proposer) if proposer == actor => {
                return Err(guard_violation("approve own proposal", hs));
            }
            Some(_) => {}
        }
        hs.details_approved = true;
        hs.touch();
        let snapshot = hs.clone();
        self.emit(NotificationKind::DetailsApproved, handshake_id, Some(actor));
        Ok(snapshot)
    }

    /// The counterparty rejects the proposal and asks for a revision.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] under the same conditions
    /// as [`approve_details`](Self::approve_details).
    pub fn request_changes(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if hs.status != HandshakeStatus::Initiated {
            return Err(guard_violation("request changes", hs));
        }
        match hs.current_proposer() {
            None => return Err(guard_violation("request changes", hs)),
            Some(proposer) if proposer == actor => {
                return Err(guard_violation("request changes on own proposal", hs));
            }
            Some(_) => {}
        }
        hs.details_approved = false;
        hs.reset_confirmations();
        hs.transition_to(HandshakeStatus::ChangesRequested)?;
        let snapshot = hs.clone();
        self.emit(NotificationKind::ChangesRequested, handshake_id, Some(actor));
        Ok(snapshot)
    }

    /// Change the provisioned hours mid-negotiation. Adjusts any escrow
    /// hold by the delta and resets both completion confirmations.
    ///
    /// # Errors
    /// Returns [`TimebankError::InvalidHours`] below the minimum,
    /// [`TimebankError::GuardViolation`] outside the revisable statuses,
    /// plus ledger errors on the escrow adjustment.
    pub fn revise_hours(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        hours: Decimal,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        let min_hours = self.config.min_provisioned_hours;
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if !matches!(
            hs.status,
            HandshakeStatus::Pending
                | HandshakeStatus::Accepted
                | HandshakeStatus::Initiated
                | HandshakeStatus::ChangesRequested
        ) {
            return Err(guard_violation("revise hours", hs));
        }
        apply_hours_revision(&mut self.ledger, hs, hours, min_hours)?;
        hs.touch();
        let snapshot = hs.clone();
        self.emit(NotificationKind::HoursRevised, handshake_id, Some(actor));
        tracing::info!(handshake = %handshake_id, %hours, "provisioned hours revised");
        Ok(snapshot)
    }

    // =================================================================
    // Completion and settlement
    // =================================================================

    /// Record one party's completion confirmation, optionally revising the
    /// hours to what was actually worked. When the second confirmation
    /// lands, settlement fires exactly once.
    ///
    /// A confirm replayed against an already-completed handshake returns
    /// the record unchanged.
    ///
    /// # Errors
    /// - [`TimebankError::DisputeOpen`] while a report is open
    /// - [`TimebankError::GuardViolation`] unless the handshake is
    ///   initiated with approved details
    /// - revision and ledger errors pass through
    pub fn confirm(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        hours: Option<Decimal>,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        if self.disputes.has_open(handshake_id) {
            return Err(TimebankError::DisputeOpen(handshake_id));
        }
        let min_hours = self.config.min_provisioned_hours;
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;

        if hs.status == HandshakeStatus::Completed {
            return Ok(hs.clone());
        }
        hs.check_revision(expected_revision)?;
        if hs.status != HandshakeStatus::Initiated || !hs.details_approved {
            return Err(guard_violation("confirm completion", hs));
        }

        if let Some(new_hours) = hours {
            if new_hours != hs.provisioned_hours {
                apply_hours_revision(&mut self.ledger, hs, new_hours, min_hours)?;
                self.sink.deliver(Notification::now(
                    NotificationKind::HoursRevised,
                    handshake_id,
                    Some(actor),
                ));
            }
        }

        if actor == hs.provider_id {
            hs.provider_confirmed_complete = true;
        } else {
            hs.receiver_confirmed_complete = true;
        }
        hs.touch();
        self.sink.deliver(Notification::now(
            NotificationKind::CompletionConfirmed,
            handshake_id,
            Some(actor),
        ));
        tracing::info!(handshake = %handshake_id, %actor, "completion confirmed");

        let mut quorum = Quorum::new([hs.requester_id, hs.provider_id]);
        if hs.provider_confirmed_complete {
            quorum.acknowledge(hs.provider_id)?;
        }
        if hs.receiver_confirmed_complete {
            quorum.acknowledge(hs.requester_id)?;
        }
        if quorum.is_complete() {
            let outcome = settlement::execute(hs, &mut self.ledger)?;
            if outcome == SettlementOutcome::Settled {
                self.sink
                    .deliver(Notification::now(NotificationKind::Settled, handshake_id, None));
            }
        }
        Ok(hs.clone())
    }

    /// Administrative reversal of a settled handshake. The ledger writes a
    /// refund pair; the handshake record stays `Completed` and untouched,
    /// so the original settlement remains auditable.
    ///
    /// # Errors
    /// Returns [`TimebankError::NotAParticipant`] for non-admin callers,
    /// [`TimebankError::GuardViolation`] unless the handshake is completed,
    /// plus ledger errors.
    pub fn reverse_settlement(
        &mut self,
        admin: UserId,
        handshake_id: HandshakeId,
    ) -> Result<(LedgerEntry, LedgerEntry)> {
        self.require_admin(admin)?;
        let hs = self
            .handshakes
            .get(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        if hs.status != HandshakeStatus::Completed {
            return Err(guard_violation("reverse settlement", hs));
        }
        let pair = self.ledger.reverse_settlement(hs)?;
        self.emit(NotificationKind::SettlementReversed, handshake_id, Some(admin));
        Ok(pair)
    }

    // =================================================================
    // Disputes
    // =================================================================

    /// File a dispute report, freezing the handshake in `Reported` until
    /// an admin resolves it.
    ///
    /// # Errors
    /// - [`TimebankError::DuplicateReport`] while a report is already open
    /// - [`TimebankError::GuardViolation`] from a terminal status
    pub fn report(
        &mut self,
        actor: UserId,
        handshake_id: HandshakeId,
        issue_type: IssueType,
        description: impl Into<String>,
        expected_revision: Option<u64>,
    ) -> Result<Report> {
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        require_participant(hs, actor)?;
        hs.check_revision(expected_revision)?;
        if self.disputes.has_open(handshake_id) {
            return Err(TimebankError::DuplicateReport(handshake_id));
        }
        let prior = hs.status;
        hs.transition_to(HandshakeStatus::Reported)?;
        hs.prior_status = Some(prior);
        let report = self
            .disputes
            .file(handshake_id, actor, issue_type, description)?;
        self.emit(NotificationKind::Reported, handshake_id, Some(actor));
        Ok(report)
    }

    /// Admin pauses a reported handshake pending investigation.
    ///
    /// # Errors
    /// Returns [`TimebankError::NotAParticipant`] for non-admin callers,
    /// [`TimebankError::GuardViolation`] unless the handshake is reported.
    pub fn pause_report(
        &mut self,
        admin: UserId,
        handshake_id: HandshakeId,
        expected_revision: Option<u64>,
    ) -> Result<Handshake> {
        self.require_admin(admin)?;
        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        hs.check_revision(expected_revision)?;
        if hs.status != HandshakeStatus::Reported {
            return Err(guard_violation("pause", hs));
        }
        hs.transition_to(HandshakeStatus::Paused)?;
        let snapshot = hs.clone();
        self.emit(NotificationKind::Paused, handshake_id, Some(admin));
        Ok(snapshot)
    }

    /// Admin resolves an open report.
    ///
    /// Upholding cancels the handshake, releases any escrow held before
    /// the report, and compensates the reporter from the community pool.
    /// Dismissing restores the handshake to its pre-report status.
    ///
    /// # Errors
    /// - [`TimebankError::NotAParticipant`] for non-admin callers
    /// - [`TimebankError::ReportNotFound`] / [`TimebankError::ReportAlreadyResolved`]
    /// - ledger errors if the community pool cannot cover compensation;
    ///   the report stays open in that case
    pub fn resolve_report(
        &mut self,
        admin: UserId,
        report_id: ReportId,
        action: ResolutionAction,
        notes: Option<String>,
    ) -> Result<Report> {
        self.require_admin(admin)?;
        let report = self.disputes.get(report_id)?;
        if !report.status.is_open() {
            return Err(TimebankError::ReportAlreadyResolved(report_id));
        }
        let handshake_id = report.handshake_id;
        let reporter_id = report.reporter_id;

        let hs = self
            .handshakes
            .get_mut(&handshake_id)
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))?;
        match action {
            ResolutionAction::Uphold => {
                if hs.prior_status.is_some_and(escrow_active) {
                    self.ledger
                        .release_escrow(hs.requester_id, hs.provisioned_hours)?;
                }
                self.ledger
                    .compensate(handshake_id, reporter_id, hs.provisioned_hours)?;
                hs.transition_to(HandshakeStatus::Cancelled)?;
                hs.prior_status = None;
            }
            ResolutionAction::Dismiss => {
                let prior = hs.prior_status.take().ok_or_else(|| {
                    TimebankError::Internal(format!(
                        "handshake {handshake_id} has no prior status to restore"
                    ))
                })?;
                hs.transition_to(prior)?;
            }
        }

        let resolved = self.disputes.resolve(report_id, admin, action, notes)?;
        self.emit(NotificationKind::ReportResolved, handshake_id, Some(admin));
        Ok(resolved)
    }

    // =================================================================
    // Reads and verification
    // =================================================================

    /// Look up one handshake.
    ///
    /// # Errors
    /// Returns [`TimebankError::HandshakeNotFound`].
    pub fn get_handshake(&self, handshake_id: HandshakeId) -> Result<Handshake> {
        self.handshakes
            .get(&handshake_id)
            .cloned()
            .ok_or(TimebankError::HandshakeNotFound(handshake_id))
    }

    /// Every handshake a member participates in, oldest first.
    #[must_use]
    pub fn list_handshakes(&self, user: UserId) -> Vec<Handshake> {
        let mut list: Vec<Handshake> = self
            .handshakes
            .values()
            .filter(|hs| hs.is_participant(user))
            .cloned()
            .collect();
        list.sort_by_key(|hs| hs.created_at);
        list
    }

    /// A member's ledger entries, oldest first.
    #[must_use]
    pub fn list_transactions(&self, user: UserId) -> Vec<LedgerEntry> {
        self.ledger.entries(user).to_vec()
    }

    /// A member's bucket balance.
    #[must_use]
    pub fn balance(&self, user: UserId) -> HourBalance {
        self.ledger.balance(user)
    }

    /// Look up one listing.
    ///
    /// # Errors
    /// Returns [`TimebankError::ServiceNotFound`].
    pub fn get_service(&self, service_id: ServiceId) -> Result<ServiceListing> {
        self.services
            .get(&service_id)
            .cloned()
            .ok_or(TimebankError::ServiceNotFound(service_id))
    }

    /// Look up one report.
    ///
    /// # Errors
    /// Returns [`TimebankError::ReportNotFound`].
    pub fn get_report(&self, report_id: ReportId) -> Result<Report> {
        self.disputes.get(report_id).cloned()
    }

    /// The open report against a handshake, if any.
    #[must_use]
    pub fn open_report(&self, handshake_id: HandshakeId) -> Option<Report> {
        self.disputes.open_report(handshake_id).cloned()
    }

    /// Verify every member's chain and supply conservation.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn verify_ledger(&mut self) -> Result<()> {
        self.ledger.verify_all()
    }

    /// Verify supply conservation only.
    ///
    /// # Errors
    /// Returns [`TimebankError::SupplyInvariantViolation`] on mismatch.
    pub fn verify_supply(&self) -> Result<()> {
        self.ledger.verify_supply()
    }

    /// Read access to the ledger.
    #[must_use]
    pub fn ledger(&self) -> &HourLedger {
        &self.ledger
    }

    fn require_admin(&self, user: UserId) -> Result<()> {
        if !self.admins.contains(&user) {
            return Err(TimebankError::NotAParticipant(user));
        }
        Ok(())
    }

    fn emit(&self, kind: NotificationKind, handshake_id: HandshakeId, actor: Option<UserId>) {
        self.sink
            .deliver(Notification::now(kind, handshake_id, actor));
    }
}
