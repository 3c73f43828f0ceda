//! Dispute report bookkeeping.
//!
//! The resolver owns every report ever filed and an index of the one open
//! report per handshake. Filing is refused while a report is already open;
//! resolution closes the report and clears the index, after which a new
//! report may be filed if the handshake is still live.

use std::collections::HashMap;

use timebank_types::{
    HandshakeId, IssueType, Report, ReportId, ResolutionAction, Result, TimebankError, UserId,
};

/// Owns all reports and the open-report-per-handshake index.
#[derive(Debug, Default)]
pub struct DisputeResolver {
    /// Every report ever filed, open or closed.
    reports: HashMap<ReportId, Report>,
    /// The single open report per handshake, if any.
    open_by_handshake: HashMap<HandshakeId, ReportId>,
}

impl DisputeResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new report against a handshake.
    ///
    /// # Errors
    /// Returns [`TimebankError::DuplicateReport`] if a report is already
    /// open against this handshake.
    pub fn file(
        &mut self,
        handshake_id: HandshakeId,
        reporter_id: UserId,
        issue_type: IssueType,
        description: impl Into<String>,
    ) -> Result<Report> {
        if self.open_by_handshake.contains_key(&handshake_id) {
            return Err(TimebankError::DuplicateReport(handshake_id));
        }
        let report = Report::new(handshake_id, reporter_id, issue_type, description);
        self.open_by_handshake.insert(handshake_id, report.id);
        self.reports.insert(report.id, report.clone());
        tracing::warn!(
            report = %report.id,
            handshake = %handshake_id,
            reporter = %reporter_id,
            issue = %issue_type,
            "dispute report filed"
        );
        Ok(report)
    }

    /// The open report against a handshake, if any.
    #[must_use]
    pub fn open_report(&self, handshake_id: HandshakeId) -> Option<&Report> {
        self.open_by_handshake
            .get(&handshake_id)
            .and_then(|id| self.reports.get(id))
    }

    /// Whether a report is currently open against this handshake.
    #[must_use]
    pub fn has_open(&self, handshake_id: HandshakeId) -> bool {
        self.open_by_handshake.contains_key(&handshake_id)
    }

    /// Look up a report by id.
    ///
    /// # Errors
    /// Returns [`TimebankError::ReportNotFound`].
    pub fn get(&self, report_id: ReportId) -> Result<&Report> {
        self.reports
            .get(&report_id)
            .ok_or(TimebankError::ReportNotFound(report_id))
    }

    /// Record the admin's decision and clear the open index.
    ///
    /// # Errors
    /// Returns [`TimebankError::ReportNotFound`] or
    /// [`TimebankError::ReportAlreadyResolved`].
    pub fn resolve(
        &mut self,
        report_id: ReportId,
        admin_id: UserId,
        action: ResolutionAction,
        notes: Option<String>,
    ) -> Result<Report> {
        let report = self
            .reports
            .get_mut(&report_id)
            .ok_or(TimebankError::ReportNotFound(report_id))?;
        report.resolve(admin_id, action, notes)?;
        self.open_by_handshake.remove(&report.handshake_id);
        tracing::info!(
            report = %report_id,
            handshake = %report.handshake_id,
            admin = %admin_id,
            %action,
            "dispute report resolved"
        );
        Ok(report.clone())
    }

    /// Every report filed against a handshake, oldest first.
    #[must_use]
    pub fn reports_for(&self, handshake_id: HandshakeId) -> Vec<Report> {
        let mut reports: Vec<Report> = self
            .reports
            .values()
            .filter(|r| r.handshake_id == handshake_id)
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.created_at);
        reports
    }
}
