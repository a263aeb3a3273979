//! Enumeration and ranking of mode substitutions for degraded legs.

use std::cmp::Ordering;

use wayfarer_core::{Leg, ModeSubstitution, RerouteProposal};

/// Alternatives available for one flagged leg.
#[derive(Debug, Clone)]
pub(crate) struct LegOptions {
    pub(crate) index: usize,
    pub(crate) current: Leg,
    pub(crate) alternatives: Vec<Leg>,
}

/// A set of substitutions to evaluate together.
pub(crate) type Combination = Vec<(usize, Leg)>;

/// Every non-empty way of replacing some flagged legs with one of their
/// alternatives, at most `cap` of them. Single substitutions come first.
pub(crate) fn combinations(options: &[LegOptions], cap: usize) -> Vec<Combination> {
    let mut partials: Vec<Combination> = vec![Vec::new()];
    for option in options {
        let mut next = Vec::with_capacity(partials.len() * (option.alternatives.len() + 1));
        for partial in &partials {
            next.push(partial.clone());
            for alternative in &option.alternatives {
                let mut extended = partial.clone();
                extended.push((option.index, alternative.clone()));
                next.push(extended);
            }
        }
        next.truncate(cap.saturating_add(1));
        partials = next;
    }
    partials.retain(|combination| !combination.is_empty());
    partials.sort_by_key(Vec::len);
    partials.truncate(cap);
    partials
}

/// Describe `combination` relative to the legs it replaces.
pub(crate) fn substitutions(options: &[LegOptions], combination: &Combination) -> Vec<ModeSubstitution> {
    combination
        .iter()
        .filter_map(|(index, leg)| {
            options
                .iter()
                .find(|option| option.index == *index)
                .map(|option| ModeSubstitution {
                    leg_index: *index,
                    from: option.current.mode,
                    to: leg.mode,
                })
        })
        .collect()
}

/// Best `limit` proposals, lowest objective first.
pub(crate) fn rank(mut proposals: Vec<RerouteProposal>, limit: usize) -> Vec<RerouteProposal> {
    proposals.sort_by(|lhs, rhs| {
        lhs.objective
            .partial_cmp(&rhs.objective)
            .unwrap_or(Ordering::Equal)
            .then_with(|| lhs.substitutions.len().cmp(&rhs.substitutions.len()))
    });
    proposals.truncate(limit);
    proposals
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;
    use wayfarer_core::test_support::waypoint;
    use wayfarer_core::{RouteTotals, TransportMode};

    fn leg(mode: TransportMode) -> Leg {
        Leg::new(
            waypoint("a", 0.0, 0.0),
            waypoint("b", 1.0, 0.0),
            mode,
            1.0,
            Duration::from_secs(60),
            0.0,
        )
    }

    fn options(index: usize, alternatives: &[TransportMode]) -> LegOptions {
        LegOptions {
            index,
            current: leg(TransportMode::Taxi),
            alternatives: alternatives.iter().map(|&mode| leg(mode)).collect(),
        }
    }

    #[rstest]
    fn enumerates_every_non_empty_combination() {
        let options = vec![
            options(0, &[TransportMode::Bus, TransportMode::Train]),
            options(2, &[TransportMode::Bus]),
        ];
        let all = combinations(&options, 100);
        // (2 + 1) * (1 + 1) - 1 without the all-current combination.
        assert_eq!(all.len(), 5);
        assert!(all.iter().take(3).all(|combination| combination.len() == 1));
    }

    #[rstest]
    fn respects_the_cap() {
        let options = vec![
            options(0, &[TransportMode::Bus, TransportMode::Train]),
            options(1, &[TransportMode::Bus, TransportMode::Train]),
        ];
        assert_eq!(combinations(&options, 3).len(), 3);
    }

    #[rstest]
    fn substitutions_name_both_modes() {
        let options = vec![options(4, &[TransportMode::Train])];
        let combination = vec![(4, leg(TransportMode::Train))];
        assert_eq!(
            substitutions(&options, &combination),
            vec![ModeSubstitution {
                leg_index: 4,
                from: TransportMode::Taxi,
                to: TransportMode::Train,
            }]
        );
    }

    #[rstest]
    fn ranking_keeps_the_cheapest() {
        let proposal = |objective: f64| RerouteProposal {
            substitutions: Vec::new(),
            modes: Vec::new(),
            totals: RouteTotals::default(),
            objective,
            savings: 0.0,
        };
        let ranked = rank(vec![proposal(3.0), proposal(1.0), proposal(2.0)], 2);
        let objectives: Vec<f64> = ranked.iter().map(|p| p.objective).collect();
        assert_eq!(objectives, vec![1.0, 2.0]);
    }
}
