//! Entry point used by the proposal pipeline.

use crate::error::SelectionError;
use crate::plan::EndorsementPlan;
use crate::required::RequiredOrgs;
use crate::strategy::{EndorsementStrategy, RandomLayoutStrategy, SignificanceStrategy};
use endorse_types::Layout;
use rand::RngCore;
use tracing::{debug, warn};

/// Chooses a strategy per proposal and runs it over the discovered layouts.
pub struct EndorsementSelector;

impl EndorsementSelector {
    /// Significance selection when organizations are required, the policy
    /// default otherwise.
    pub fn strategy_for(&self, required: Option<RequiredOrgs>) -> Box<dyn EndorsementStrategy> {
        match required {
            Some(required) => Box::new(SignificanceStrategy::new(required)),
            None => Box::new(RandomLayoutStrategy),
        }
    }

    /// Resolve a plan. Never returns a plan without a layout.
    pub fn select(
        &self,
        strategy: &dyn EndorsementStrategy,
        layouts: &[Layout],
        rng: &mut dyn RngCore,
    ) -> Result<EndorsementPlan, SelectionError> {
        match strategy.select(layouts, rng) {
            Ok(plan) => {
                debug!(
                    strategy = %plan.strategy(),
                    endorsers = plan.len(),
                    layouts = layouts.len(),
                    "resolved endorsement plan"
                );
                Ok(plan)
            }
            Err(e) => {
                warn!(strategy = %strategy.kind(), "endorser selection failed: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StrategyKind;
    use endorse_types::{Endorser, Group, OrgId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn peer(name: &str, org: &str) -> Endorser {
        Endorser::new(name, format!("grpcs://{name}:7051"), format!("{org}MSP"))
    }

    #[test]
    fn strategy_follows_requirement() {
        let selector = EndorsementSelector;
        assert_eq!(selector.strategy_for(None).kind(), StrategyKind::PolicyDefault);
        let required = RequiredOrgs::new(["orgA"]).unwrap();
        assert_eq!(
            selector.strategy_for(Some(required)).kind(),
            StrategyKind::Significance
        );
    }

    #[test]
    fn select_delegates_to_strategy() {
        let selector = EndorsementSelector;
        let layouts = vec![Layout::new(vec![Group::new(
            "g",
            vec![peer("p0", "orgA"), peer("p1", "orgB")],
        )])];
        let strategy = selector.strategy_for(Some(RequiredOrgs::new(["orgB"]).unwrap()));
        let mut rng = StdRng::seed_from_u64(5);
        let plan = selector.select(strategy.as_ref(), &layouts, &mut rng).unwrap();
        assert_eq!(plan.endorsers(), &[peer("p1", "orgB")]);
    }

    #[test]
    fn concurrent_selections_use_their_own_requirements() {
        let layouts = std::sync::Arc::new(vec![Layout::new(vec![
            Group::new("a", vec![peer("a0", "orgA"), peer("a1", "orgA")]),
            Group::new("b", vec![peer("b0", "orgB"), peer("b1", "orgB")]),
            Group::new("c", vec![peer("c0", "orgC")]),
        ])]);

        let handles: Vec<_> = ["orgA", "orgB", "orgC"]
            .into_iter()
            .enumerate()
            .map(|(i, org)| {
                let layouts = layouts.clone();
                std::thread::spawn(move || {
                    let selector = EndorsementSelector;
                    let strategy = selector.strategy_for(Some(RequiredOrgs::new([org]).unwrap()));
                    let mut rng = StdRng::seed_from_u64(i as u64);
                    for _ in 0..500 {
                        let plan = selector.select(strategy.as_ref(), &layouts, &mut rng).unwrap();
                        assert_eq!(plan.len(), 1);
                        assert_eq!(plan.endorsers()[0].org(), OrgId::new(org));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
