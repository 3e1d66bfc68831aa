//! Selection strategies.

use crate::error::SelectionError;
use crate::plan::{EndorsementPlan, StrategyKind};
use crate::required::RequiredOrgs;
use endorse_types::{Endorser, Layout, OrgId};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::collections::HashSet;
use tracing::trace;

/// A way of turning a channel's layouts into an [`EndorsementPlan`].
///
/// Implementations hold every per-call input themselves; randomness is the
/// only thing passed in, so a seeded RNG reproduces a selection exactly.
pub trait EndorsementStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn select(
        &self,
        layouts: &[Layout],
        rng: &mut dyn RngCore,
    ) -> Result<EndorsementPlan, SelectionError>;
}

/// Policy-default selection: a uniformly random non-empty layout, all of its
/// endorsers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomLayoutStrategy;

impl EndorsementStrategy for RandomLayoutStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PolicyDefault
    }

    fn select(
        &self,
        layouts: &[Layout],
        rng: &mut dyn RngCore,
    ) -> Result<EndorsementPlan, SelectionError> {
        let candidates: Vec<&Layout> = layouts
            .iter()
            .filter(|l| l.endorsers().next().is_some())
            .collect();

        let layout = candidates
            .choose(&mut *rng)
            .ok_or_else(|| SelectionError::NoSatisfyingTopology {
                required: "any".to_string(),
                layouts: layouts.len(),
            })?;

        let mut seen = HashSet::new();
        let endorsers: Vec<Endorser> = layout
            .endorsers()
            .filter(|e| seen.insert(e.endpoint.as_str()))
            .cloned()
            .collect();

        Ok(EndorsementPlan::new(
            endorsers,
            (*layout).clone(),
            StrategyKind::PolicyDefault,
        ))
    }
}

/// Significance-weighted selection: exactly one peer for each required
/// organization, all from the same layout.
#[derive(Clone, Debug)]
pub struct SignificanceStrategy {
    required: RequiredOrgs,
}

impl SignificanceStrategy {
    pub fn new(required: RequiredOrgs) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &RequiredOrgs {
        &self.required
    }
}

impl EndorsementStrategy for SignificanceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Significance
    }

    /// Layouts are drawn uniformly at random without replacement until one
    /// yields a peer for every required organization.
    fn select(
        &self,
        layouts: &[Layout],
        rng: &mut dyn RngCore,
    ) -> Result<EndorsementPlan, SelectionError> {
        let mut remaining: Vec<&Layout> = layouts.iter().collect();

        while !remaining.is_empty() {
            let index = rng.gen_range(0..remaining.len());
            let layout = remaining.swap_remove(index);

            if let Some(endorsers) = pick_from_layout(layout, &self.required, rng) {
                return Ok(EndorsementPlan::new(
                    endorsers,
                    layout.clone(),
                    StrategyKind::Significance,
                ));
            }
            trace!(
                required = %self.required,
                remaining = remaining.len(),
                "layout cannot satisfy required organizations, discarding"
            );
        }

        Err(SelectionError::NoSatisfyingTopology {
            required: self.required.to_string(),
            layouts: layouts.len(),
        })
    }
}

/// Pick one peer per required organization from `layout`, or `None` if the
/// layout lacks a candidate for some organization.
///
/// Groups are scanned in order and each contributes at most one uniformly
/// random peer among those whose organization is required and not yet
/// covered. Organizations still missing afterwards are completed from any
/// candidate of that organization in the layout.
fn pick_from_layout(
    layout: &Layout,
    required: &RequiredOrgs,
    rng: &mut dyn RngCore,
) -> Option<Vec<Endorser>> {
    let mut picked: Vec<Endorser> = Vec::with_capacity(required.len());
    let mut covered: HashSet<OrgId> = HashSet::new();

    for group in &layout.groups {
        let eligible: Vec<&Endorser> = group
            .endorsers
            .iter()
            .filter(|e| {
                let org = e.org();
                required.contains(&org) && !covered.contains(&org)
            })
            .collect();

        if let Some(endorser) = eligible.choose(&mut *rng) {
            covered.insert(endorser.org());
            picked.push((*endorser).clone());
        }
    }

    for org in required.iter() {
        if covered.contains(org) {
            continue;
        }
        let mut seen = HashSet::new();
        let candidates: Vec<&Endorser> = layout
            .endorsers()
            .filter(|e| &e.org() == org && seen.insert(e.endpoint.as_str()))
            .collect();
        let endorser = candidates.choose(&mut *rng)?;
        covered.insert(org.clone());
        picked.push((*endorser).clone());
    }

    Some(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use endorse_types::Group;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn peer(name: &str, org: &str) -> Endorser {
        Endorser::new(name, format!("grpcs://{name}:7051"), format!("{org}MSP"))
    }

    fn layout(groups: Vec<(&str, Vec<Endorser>)>) -> Layout {
        Layout::new(
            groups
                .into_iter()
                .map(|(name, endorsers)| Group::new(name, endorsers))
                .collect(),
        )
    }

    fn required(orgs: &[&str]) -> RequiredOrgs {
        RequiredOrgs::new(orgs.iter().copied()).unwrap()
    }

    #[test]
    fn picks_only_the_layout_that_can_satisfy() {
        let layouts = vec![
            layout(vec![("GroupA", vec![peer("peer1", "orgA"), peer("peer2", "orgB")])]),
            layout(vec![("GroupB", vec![peer("peer3", "orgC")])]),
        ];
        let strategy = SignificanceStrategy::new(required(&["orgA"]));

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = strategy.select(&layouts, &mut rng).unwrap();
            assert_eq!(plan.endorsers(), &[peer("peer1", "orgA")]);
            assert_eq!(plan.layout(), &layouts[0]);
            assert_eq!(plan.strategy(), StrategyKind::Significance);
        }
    }

    #[test]
    fn one_peer_per_required_org() {
        let layouts = vec![layout(vec![
            ("g1", vec![peer("a0", "orgA"), peer("a1", "orgA")]),
            ("g2", vec![peer("b0", "orgB"), peer("b1", "orgB")]),
            ("g3", vec![peer("c0", "orgC")]),
        ])];
        let strategy = SignificanceStrategy::new(required(&["orgA", "orgB"]));
        let mut rng = StdRng::seed_from_u64(7);
        let plan = strategy.select(&layouts, &mut rng).unwrap();

        assert_eq!(plan.len(), 2);
        let orgs: Vec<String> = plan.orgs().iter().map(|o| o.to_string()).collect();
        assert_eq!(orgs, vec!["orga", "orgb"]);
    }

    #[test]
    fn shared_group_is_completed_from_same_layout() {
        // Both organizations only appear in one group; the completion pass
        // must still find a peer for the second one.
        let layouts = vec![layout(vec![(
            "mixed",
            vec![peer("a0", "orgA"), peer("b0", "orgB")],
        )])];
        let strategy = SignificanceStrategy::new(required(&["orgA", "orgB"]));

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = strategy.select(&layouts, &mut rng).unwrap();
            assert_eq!(plan.len(), 2);
        }
    }

    #[test]
    fn no_satisfying_layout_is_an_error() {
        let layouts = vec![
            layout(vec![("g1", vec![peer("a0", "orgA")])]),
            layout(vec![("g2", vec![peer("b0", "orgB")])]),
        ];
        let strategy = SignificanceStrategy::new(required(&["orgA", "orgB"]));
        let mut rng = StdRng::seed_from_u64(1);
        let err = strategy.select(&layouts, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SelectionError::NoSatisfyingTopology {
                required: "orga, orgb".to_string(),
                layouts: 2,
            }
        );
    }

    #[test]
    fn empty_layout_collection_fails_both_strategies() {
        let mut rng = StdRng::seed_from_u64(1);
        let significance = SignificanceStrategy::new(required(&["orgA"]));
        assert!(significance.select(&[], &mut rng).is_err());
        assert!(RandomLayoutStrategy.select(&[], &mut rng).is_err());
    }

    #[test]
    fn same_seed_same_plan() {
        let layouts: Vec<Layout> = (0..5)
            .map(|i| {
                layout(vec![
                    ("a", vec![peer(&format!("a{i}"), "orgA"), peer(&format!("a{i}x"), "orgA")]),
                    ("b", vec![peer(&format!("b{i}"), "orgB")]),
                ])
            })
            .collect();
        let strategy = SignificanceStrategy::new(required(&["orgA", "orgB"]));

        let first = strategy.select(&layouts, &mut StdRng::seed_from_u64(99)).unwrap();
        let second = strategy.select(&layouts, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn random_layout_returns_all_endorsers_once() {
        let shared = peer("p0", "orgA");
        let layouts = vec![layout(vec![
            ("g1", vec![shared.clone(), peer("p1", "orgB")]),
            ("g2", vec![shared.clone(), peer("p2", "orgC")]),
        ])];
        let mut rng = StdRng::seed_from_u64(3);
        let plan = RandomLayoutStrategy.select(&layouts, &mut rng).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.strategy(), StrategyKind::PolicyDefault);
        assert_eq!(plan.layout(), &layouts[0]);
    }

    #[test]
    fn random_layout_skips_empty_layouts() {
        let layouts = vec![Layout::default(), layout(vec![("g", vec![peer("p0", "orgA")])])];
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = RandomLayoutStrategy.select(&layouts, &mut rng).unwrap();
            assert_eq!(plan.endorsers(), &[peer("p0", "orgA")]);
        }
    }

    #[test]
    fn random_layout_eventually_visits_every_layout() {
        let layouts = vec![
            layout(vec![("g", vec![peer("p0", "orgA")])]),
            layout(vec![("g", vec![peer("p1", "orgB")])]),
            layout(vec![("g", vec![peer("p2", "orgC")])]),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let plan = RandomLayoutStrategy.select(&layouts, &mut rng).unwrap();
            seen.insert(plan.endorsers()[0].name.clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
