//! Pure record merge.
//!
//! The server's record is authoritative: on every poll the remote copy
//! replaces the local one wholesale, except for fields the user is editing
//! right now. Those keep the local value so a poll landing mid-edit cannot
//! wipe unsaved input; the edit is pushed (and revision-checked) when the
//! user saves.

use timebank_types::Handshake;

/// A field the local client may hold mid-edit state for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditedField {
    /// The hour commitment being typed into a revision form.
    ProvisionedHours,
    /// A details proposal being drafted.
    Details,
}

/// Merge a freshly fetched remote record over the local one.
///
/// Every field takes the remote value except those listed in
/// `active_edits`, which keep the local value.
#[must_use]
pub fn merge(local: &Handshake, remote: Handshake, active_edits: &[EditedField]) -> Handshake {
    let mut merged = remote;
    for field in active_edits {
        match field {
            EditedField::ProvisionedHours => {
                merged.provisioned_hours = local.provisioned_hours;
            }
            EditedField::Details => {
                merged.details.clone_from(&local.details);
            }
        }
    }
    merged
}
