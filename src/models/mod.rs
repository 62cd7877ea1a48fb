use serde::{Deserialize, Serialize};

use crate::scraper::classifier::FreeSignal;
use crate::scraper::http_client::FetchError;

// ── Listing ───────────────────────────────────────────────────────────────────

/// A course discovered on a catalog page. `link` is the identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub platform: String,
    pub title: String, // HTML-escaped
    pub link: String,  // absolute
}

// ── Candidate ─────────────────────────────────────────────────────────────────

/// An anchor that matched a source's listing path, before free/rating policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub rating: Option<f64>,
    pub local: LocalEvidence,
}

// ── Classification evidence ───────────────────────────────────────────────────

/// Where the DOM-proximity pass found a free indicator, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEvidence {
    AnchorText,
    ParentText,
    /// `depth` 1 is the anchor's parent, 2 its grandparent, and so on.
    Ancestor { depth: usize },
    Inconclusive,
}

impl LocalEvidence {
    pub fn is_conclusive(self) -> bool {
        !matches!(self, LocalEvidence::Inconclusive)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FreeEvidence {
    Local(LocalEvidence),
    DetailPage(FreeSignal),
}

/// Outcome of classifying one candidate.
///
/// `NoEvidence` and `EscalationFailed` both mean "not free" to the caller,
/// but stay apart so logs can tell a paid course from an unreachable page.
#[derive(Debug)]
pub enum Verdict {
    Free(FreeEvidence),
    NoEvidence,
    EscalationFailed(FetchError),
}

impl Verdict {
    pub fn is_free(&self) -> bool {
        matches!(self, Verdict::Free(_))
    }
}
