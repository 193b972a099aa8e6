//! Picks the proof an engine should act on.
//!
//! A claim's `proof` may be a single object or an array of candidates. The
//! selector scans in order and takes the first candidate whose `type` is a
//! known [`ProofKind`]; unknown candidates are skipped.

use serde_json::Value;

use crate::descriptor::ProofKind;
use crate::error::ProofError;

/// A proof candidate with a recognized type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedProof<'a> {
    /// The recognized kind.
    pub kind: ProofKind,
    /// The proof object as it appears in the claim.
    pub proof: &'a Value,
}

/// Selects the first proof of a known type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofTypeSelector;

impl ProofTypeSelector {
    /// Select from a claim's `proof` attribute.
    ///
    /// # Errors
    ///
    /// [`ProofError::UnsupportedProofType`] if no candidate has a known type.
    pub fn select(proof: Option<&Value>) -> Result<SelectedProof<'_>, ProofError> {
        let candidates: &[Value] = match proof {
            Some(Value::Array(items)) => items,
            Some(single) => std::slice::from_ref(single),
            None => &[],
        };

        candidates
            .iter()
            .find_map(|candidate| {
                let kind = ProofKind::from_tag(candidate.get("type")?.as_str()?)?;
                Some(SelectedProof {
                    kind,
                    proof: candidate,
                })
            })
            .ok_or_else(|| ProofError::UnsupportedProofType {
                found: describe(candidates),
            })
    }
}

fn describe(candidates: &[Value]) -> String {
    if candidates.is_empty() {
        return "none".to_string();
    }
    candidates
        .iter()
        .map(|c| c.get("type").and_then(Value::as_str).unwrap_or("<untyped>"))
        .collect::<Vec<_>>()
        .join(", ")
}
