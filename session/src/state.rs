//! Session states and the ballot presented to the voter.

use pollbox_store::NOTA_LABEL;
use pollbox_types::CandidateId;

/// Where the session stands for the current ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BallotState {
    /// Waiting for the voter to pick a ballot entry.
    AwaitingSelection,
    /// A tentative choice exists; nothing persisted yet.
    SelectionMade,
    /// A vote is being durably recorded. Transient: a successful cast lands
    /// on `AwaitingNextBallot` before control returns to the caller.
    BallotCast,
    /// Cast complete; waiting for the poll officer to open the next ballot.
    AwaitingNextBallot,
    /// Terminated by an authenticated `end` call. Terminal.
    Ended,
}

/// What a ballot entry resolves to when cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BallotChoice {
    /// A registered candidate.
    Candidate(CandidateId),
    /// The always-available "None of the Above" sentinel. Resolved to a
    /// real candidate row only at cast time.
    Nota,
}

/// One line on the displayed ballot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallotEntry {
    pub label: String,
    pub symbol: Option<String>,
    pub choice: BallotChoice,
}

impl BallotEntry {
    /// The synthetic NOTA line, appended after all real candidates.
    pub(crate) fn nota() -> Self {
        Self {
            label: NOTA_LABEL.to_string(),
            symbol: None,
            choice: BallotChoice::Nota,
        }
    }

    pub fn is_nota(&self) -> bool {
        matches!(self.choice, BallotChoice::Nota)
    }
}
