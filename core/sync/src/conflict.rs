//! Conflict detection and Last-Write-Wins resolution.

use tidepool_common::EpochMillis;

/// Which side survives a document conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictWinner {
    /// The local copy survives and is re-uploaded.
    Local,
    /// The remote copy overwrites the local one.
    Remote,
}

/// Whether a local/remote pair is in conflict.
///
/// A conflict needs both sides to have moved: the local copy carries an
/// unsynced edit while the remote copy is newer than the local stamp.
pub fn is_conflict(
    local_unsynced: bool,
    local_modified: EpochMillis,
    remote_modified: EpochMillis,
) -> bool {
    local_unsynced && remote_modified > local_modified
}

/// Last-Write-Wins on modification stamps.
///
/// Equal stamps resolve to the remote copy, so two devices observing the
/// same tie converge on the same version.
pub fn resolve_lww(
    local_modified: EpochMillis,
    remote_modified: EpochMillis,
) -> ConflictWinner {
    if local_modified > remote_modified {
        ConflictWinner::Local
    } else {
        ConflictWinner::Remote
    }
}
