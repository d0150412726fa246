//! Result types for pairing runs

use common::Email;
use std::collections::HashMap;

use crate::error::PairingError;

/// Symmetric partner relation built during one run
///
/// Every insertion records both directions, so `partner_of(a) == Some(b)`
/// implies `partner_of(b) == Some(a)`.
#[derive(Debug, Clone, Default)]
pub struct PairingMap {
    partners: HashMap<Email, Email>,
    /// Pairs in the order they were made
    pairs: Vec<(Email, Email)>,
}

impl PairingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair two participants with each other
    pub fn pair(&mut self, a: &Email, b: &Email) -> Result<(), PairingError> {
        if a == b {
            return Err(PairingError::InvalidPairing(format!("{} paired with itself", a)));
        }
        for who in [a, b] {
            if let Some(existing) = self.partners.get(who) {
                return Err(PairingError::InvalidPairing(format!(
                    "{} is already paired with {}",
                    who, existing
                )));
            }
        }

        self.partners.insert(a.clone(), b.clone());
        self.partners.insert(b.clone(), a.clone());
        self.pairs.push((a.clone(), b.clone()));
        Ok(())
    }

    pub fn partner_of(&self, who: &Email) -> Option<&Email> {
        self.partners.get(who)
    }

    pub fn is_paired(&self, who: &Email) -> bool {
        self.partners.contains_key(who)
    }

    /// Pairs as `(chooser, chosen)` in creation order
    pub fn pairs(&self) -> &[(Email, Email)] {
        &self.pairs
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Outcome of one pairing run
#[derive(Debug, Clone, Default)]
pub struct PairingOutcome {
    pub pairings: PairingMap,
    /// Participants left without a partner, in the order they were given up on
    pub unmatched: Vec<Email>,
}

impl PairingOutcome {
    pub fn partner_of(&self, who: &Email) -> Option<&Email> {
        self.pairings.partner_of(who)
    }

    pub fn pair_count(&self) -> usize {
        self.pairings.len()
    }

    pub fn leftover_count(&self) -> usize {
        self.unmatched.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_pair_is_mutual() {
        let mut map = PairingMap::new();
        let a = Email::new("a@x");
        let b = Email::new("b@x");
        map.pair(&a, &b).unwrap();

        assert_eq!(map.partner_of(&a), Some(&b));
        assert_eq!(map.partner_of(&b), Some(&a));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_rejects_self_and_double_pairing() {
        let mut map = PairingMap::new();
        let a = Email::new("a@x");
        let b = Email::new("b@x");
        let c = Email::new("c@x");

        assert_matches!(map.pair(&a, &a), Err(PairingError::InvalidPairing(_)));
        map.pair(&a, &b).unwrap();
        assert_matches!(map.pair(&c, &b), Err(PairingError::InvalidPairing(_)));
        assert!(!map.is_paired(&c));
    }
}
