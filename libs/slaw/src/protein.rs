use std::time::SystemTime;

use crate::error::SlawError;
use crate::slaw::{Repr, Slaw};

// ═══════════════════════════════════════════════════════════════
//  Protein — envelope handle with provenance
// ═══════════════════════════════════════════════════════════════

/// Where a protein was read from: the source's name, the deposit index
/// within that source, and the deposit wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub hose: String,
    pub index: u64,
    pub timestamp: SystemTime,
}

/// A protein-variant slaw plus optional read provenance.
///
/// Provenance is metadata about a particular retrieval, not part of the
/// value, so it never participates in equality.
#[derive(Debug, Clone)]
pub struct Protein {
    slaw: Slaw,
    origin: Option<Origin>,
}

impl Protein {
    pub fn new(descrips: Slaw, ingests: Slaw) -> Protein {
        Protein::with_rude(descrips, ingests, Vec::new())
    }

    pub fn with_rude(descrips: Slaw, ingests: Slaw, rude: Vec<u8>) -> Protein {
        Protein {
            slaw: Slaw::protein(descrips, ingests, rude),
            origin: None,
        }
    }

    /// Wrap an existing protein-variant slaw. Any other variant is an
    /// invalid operand.
    pub fn from_slaw(slaw: Slaw) -> Result<Protein, SlawError> {
        if !slaw.is_protein() {
            return Err(SlawError::InvalidOperand(
                "only a protein slaw can become a protein handle".into(),
            ));
        }
        Ok(Protein { slaw, origin: None })
    }

    pub fn slaw(&self) -> &Slaw {
        &self.slaw
    }

    pub fn into_slaw(self) -> Slaw {
        self.slaw
    }

    fn data(&self) -> (&Slaw, &Slaw, &[u8]) {
        match self.slaw.repr() {
            Repr::Protein(p) => (&p.descrips, &p.ingests, &p.rude),
            _ => unreachable!("protein handle wraps a protein slaw"),
        }
    }

    pub fn descrips(&self) -> Slaw {
        self.data().0.clone()
    }

    pub fn ingests(&self) -> Slaw {
        self.data().1.clone()
    }

    pub fn rude_data(&self) -> &[u8] {
        self.data().2
    }

    /// True when the descrips list contains `descrip`. Non-list descrips
    /// match only by whole-value equality.
    pub fn matches(&self, descrip: &Slaw) -> bool {
        let own = self.data().0;
        match own.repr() {
            Repr::List(items) => items.iter().any(|d| d == descrip),
            _ => own == descrip,
        }
    }

    /// True when every one of `descrips` matches.
    pub fn matches_all<'a, I>(&self, descrips: I) -> bool
    where
        I: IntoIterator<Item = &'a Slaw>,
    {
        descrips.into_iter().all(|d| self.matches(d))
    }

    /// Ingest lookup by string key; `None` when the ingests are not a map
    /// or the key is absent.
    pub fn ingest(&self, key: &str) -> Option<Slaw> {
        self.data().1.find(&Slaw::from(key)).ok().flatten()
    }

    // ── provenance ──────────────────────────────────────────────

    pub fn with_origin(mut self, origin: Origin) -> Protein {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn hose_name(&self) -> Option<&str> {
        self.origin.as_ref().map(|o| o.hose.as_str())
    }

    pub fn index(&self) -> Option<u64> {
        self.origin.as_ref().map(|o| o.index)
    }

    pub fn timestamp(&self) -> Option<SystemTime> {
        self.origin.as_ref().map(|o| o.timestamp)
    }
}

impl PartialEq for Protein {
    fn eq(&self, other: &Protein) -> bool {
        self.slaw == other.slaw
    }
}

impl Eq for Protein {}

impl From<Protein> for Slaw {
    fn from(p: Protein) -> Slaw {
        p.slaw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Protein {
        Protein::new(Slaw::list(["alpha", "beta"]), Slaw::map([("k", 1i64)]))
    }

    #[test]
    fn equality_ignores_provenance() {
        let plain = sample();
        let tagged = sample().with_origin(Origin {
            hose: "test-pool".into(),
            index: 7,
            timestamp: SystemTime::now(),
        });
        assert_eq!(plain, tagged);
        assert_eq!(tagged.index(), Some(7));
        assert_eq!(tagged.hose_name(), Some("test-pool"));
        assert_eq!(plain.index(), None);
    }

    #[test]
    fn descrip_matching() {
        let p = sample();
        assert!(p.matches(&Slaw::from("alpha")));
        assert!(!p.matches(&Slaw::from("gamma")));
        assert!(p.matches_all(&[Slaw::from("alpha"), Slaw::from("beta")]));
        assert!(!p.matches_all(&[Slaw::from("alpha"), Slaw::from("gamma")]));
    }

    #[test]
    fn from_slaw_requires_protein_variant() {
        assert!(Protein::from_slaw(Slaw::from(1i64)).is_err());
        let s = Slaw::protein(Slaw::nil(), Slaw::nil(), vec![]);
        assert!(Protein::from_slaw(s).is_ok());
    }

    #[test]
    fn ingest_lookup() {
        let p = sample();
        assert_eq!(p.ingest("k").unwrap(), 1i64);
        assert!(p.ingest("missing").is_none());
    }
}
