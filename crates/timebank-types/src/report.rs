//! Dispute report types.
//!
//! A report freezes its handshake out of settlement until an admin resolves
//! it, either upholding the complaint (cancel + compensate) or dismissing it
//! (restore the prior status).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HandshakeId, ReportId, Result, TimebankError, UserId};

/// The category of complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    /// The counterparty never showed up.
    NoShow,
    /// The counterparty arrived significantly late.
    Lateness,
    /// The service was not delivered as agreed.
    IncompleteService,
    /// Behavioral complaint.
    Conduct,
    /// Anything else.
    Other,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoShow => write!(f, "NO_SHOW"),
            Self::Lateness => write!(f, "LATENESS"),
            Self::IncompleteService => write!(f, "INCOMPLETE_SERVICE"),
            Self::Conduct => write!(f, "CONDUCT"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// The lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Filed and awaiting an admin decision. Blocks settlement.
    Pending,
    /// The complaint was upheld.
    Resolved,
    /// The complaint was dismissed.
    Dismissed,
}

impl ReportStatus {
    /// An open report blocks settlement on its handshake.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Resolved => write!(f, "RESOLVED"),
            Self::Dismissed => write!(f, "DISMISSED"),
        }
    }
}

/// The admin's decision on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionAction {
    /// Cancel the handshake and compensate the reporter from the pool.
    Uphold,
    /// Restore the handshake to its pre-report status.
    Dismiss,
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uphold => write!(f, "UPHOLD"),
            Self::Dismiss => write!(f, "DISMISS"),
        }
    }
}

/// A dispute opened against a handshake. At most one open report may exist
/// per handshake at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Globally unique report identifier.
    pub id: ReportId,
    /// The handshake this report is against.
    pub handshake_id: HandshakeId,
    /// The member who filed the report.
    pub reporter_id: UserId,
    /// What kind of complaint this is.
    pub issue_type: IssueType,
    /// Current lifecycle state.
    pub status: ReportStatus,
    /// The reporter's account of what happened.
    pub description: String,
    /// The admin who resolved this report, if resolved.
    pub resolved_by: Option<UserId>,
    /// The admin's notes accompanying the resolution.
    pub resolution_notes: Option<String>,
    /// When the resolution was recorded.
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// File a new pending report.
    #[must_use]
    pub fn new(
        handshake_id: HandshakeId,
        reporter_id: UserId,
        issue_type: IssueType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ReportId::new(),
            handshake_id,
            reporter_id,
            issue_type,
            status: ReportStatus::Pending,
            description: description.into(),
            resolved_by: None,
            resolution_notes: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    /// Record the admin's decision, closing the report.
    ///
    /// # Errors
    /// Returns [`TimebankError::ReportAlreadyResolved`] if the report is not
    /// pending.
    pub fn resolve(
        &mut self,
        admin_id: UserId,
        action: ResolutionAction,
        notes: Option<String>,
    ) -> Result<()> {
        if !self.status.is_open() {
            return Err(TimebankError::ReportAlreadyResolved(self.id));
        }
        self.status = match action {
            ResolutionAction::Uphold => ReportStatus::Resolved,
            ResolutionAction::Dismiss => ReportStatus::Dismissed,
        };
        self.resolved_by = Some(admin_id);
        self.resolution_notes = notes;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}

/// Dummy report for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Report {
    /// Create a dummy pending report for unit tests.
    pub fn dummy(handshake_id: HandshakeId, reporter_id: UserId) -> Self {
        Self::new(handshake_id, reporter_id, IssueType::NoShow, "no-show")
    }
}
