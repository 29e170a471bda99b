//! Low-vital advisory.
//!
//! The engine only decides *which* needs are pressing. Wording the request is
//! left to the chat layer, which receives these phrases as context.

use crate::types::{Vital, Vitals};

/// A vital at or below this percentage counts as a pressing need.
pub const NEED_PERCENT: u8 = 20;

/// Context phrase for a pressing need.
#[must_use]
pub fn need_phrase(vital: Vital) -> &'static str {
    match vital {
        Vital::Hunger => "I'm very hungry",
        Vital::Happiness => "I feel very sad",
        Vital::Energy => "I'm very tired",
        Vital::Hygiene => "I need a bath",
    }
}

/// Phrases for every pressing need, in hunger, happiness, energy, hygiene order.
///
/// An empty list means there is nothing to advise.
#[must_use]
pub fn need_phrases(vitals: &Vitals) -> Vec<&'static str> {
    Vital::ALL
        .into_iter()
        .filter(|&v| vitals.percent(v) <= NEED_PERCENT)
        .map(need_phrase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_pet_has_no_needs() {
        assert!(need_phrases(&Vitals::FULL).is_empty());
    }

    #[test]
    fn boundary_is_inclusive() {
        // 1600 / 8000 = 20%, 1680 / 8000 = 21%.
        let vitals = Vitals::new(1600, 1680, 8000, 8000);
        assert_eq!(need_phrases(&vitals), vec!["I'm very hungry"]);
    }

    #[test]
    fn phrases_keep_fixed_order() {
        let vitals = Vitals::new(100, 0, 500, 1000);
        assert_eq!(
            need_phrases(&vitals),
            vec![
                "I'm very hungry",
                "I feel very sad",
                "I'm very tired",
                "I need a bath"
            ]
        );
    }
}
