//! Roster check rules.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use pollbox_store::CandidateStore;
use pollbox_types::{CandidateId, ElectionId};

use crate::RosterError;

/// Outcome of a full roster check.
///
/// The rules apply in order and the first failure wins, so a verdict names
/// exactly one problem class at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterVerdict {
    /// Voting may start.
    Ready,
    /// The election has no ordinary candidates.
    NoCandidates,
    /// Candidates whose symbol path is empty or does not exist, by name.
    MissingSymbols(Vec<String>),
    /// Pairs of candidate names sharing one normalized symbol path.
    DuplicateSymbols(Vec<(String, String)>),
}

impl RosterVerdict {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for RosterVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "roster is ready"),
            Self::NoCandidates => write!(f, "no candidates registered"),
            Self::MissingSymbols(names) => {
                write!(f, "candidates missing symbol images: {}", names.join(", "))
            }
            Self::DuplicateSymbols(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(a, b)| format!("{a} and {b}"))
                    .collect();
                write!(f, "candidates sharing a symbol image: {}", rendered.join("; "))
            }
        }
    }
}

/// Decide whether voting may start for an election.
///
/// Rules, first failure wins:
/// 1. at least one ordinary (non-NOTA) candidate exists;
/// 2. every ordinary candidate has a non-empty symbol path that exists;
/// 3. no two ordinary candidates share a normalized symbol path.
pub fn check<S: CandidateStore>(
    store: &S,
    election: ElectionId,
) -> Result<RosterVerdict, RosterError> {
    let roster: Vec<_> = store
        .iter_candidates(election)?
        .into_iter()
        .filter(|c| !c.is_nota)
        .collect();
    if roster.is_empty() {
        return Ok(RosterVerdict::NoCandidates);
    }

    let mut missing = Vec::new();
    let mut symbols: Vec<(&str, String)> = Vec::new();
    for candidate in &roster {
        match candidate.symbol.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() && Path::new(path).exists() => {
                symbols.push((candidate.name.as_str(), normalize_symbol(path)));
            }
            _ => missing.push(candidate.name.clone()),
        }
    }
    if !missing.is_empty() {
        return Ok(RosterVerdict::MissingSymbols(missing));
    }

    let mut duplicates = Vec::new();
    for (i, (name_a, sym_a)) in symbols.iter().enumerate() {
        for (name_b, sym_b) in &symbols[i + 1..] {
            if sym_a == sym_b {
                duplicates.push((name_a.to_string(), name_b.to_string()));
            }
        }
    }
    if !duplicates.is_empty() {
        return Ok(RosterVerdict::DuplicateSymbols(duplicates));
    }

    Ok(RosterVerdict::Ready)
}

/// Reject a candidate write whose symbol is already used within the election.
///
/// `exclude` names the candidate being edited, so keeping its own symbol
/// is not a collision. NOTA rows carry no symbol and are never collisions.
pub fn ensure_symbol_available<S: CandidateStore>(
    store: &S,
    election: ElectionId,
    symbol: &str,
    exclude: Option<CandidateId>,
) -> Result<(), RosterError> {
    let wanted = normalize_symbol(symbol);
    for candidate in store.iter_candidates(election)? {
        if candidate.is_nota || Some(candidate.id) == exclude {
            continue;
        }
        if let Some(existing) = candidate.symbol.as_deref() {
            if normalize_symbol(existing) == wanted {
                return Err(RosterError::DuplicateSymbol {
                    symbol: symbol.to_string(),
                    name: candidate.name,
                });
            }
        }
    }
    Ok(())
}

/// Lexically normalize a symbol path: strips `.` components and resolves
/// `..` against preceding components, without touching the filesystem, so
/// `./img/a.png` and `img/a.png` compare equal.
pub fn normalize_symbol(path: &str) -> String {
    let mut out = PathBuf::new();
    for component in Path::new(path.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}
