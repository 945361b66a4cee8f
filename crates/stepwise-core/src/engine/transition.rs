//! Next-step selection after a successful (or skipped) step.

use log::debug;
use rand::Rng;

use super::{
    condition::{matches_lenient, ConditionContext},
    predicates::PredicateRegistry,
};
use crate::{
    catalog::StepCatalog,
    error::{GuideError, Result},
    models::{NextStepCondition, Step},
};

/// Picks a routing entry from `step.next_step_conditions`.
///
/// Deterministic entries (no probability) are checked first, in order, and
/// the first match wins. Otherwise all matching probabilistic entries are
/// drawn from with their weights normalized over the matches. Returns `None`
/// when nothing matches or the matching weights sum to zero.
pub fn select_conditional<'s, R: Rng>(
    step: &'s Step,
    ctx: &ConditionContext,
    predicates: &PredicateRegistry,
    rng: &mut R,
) -> Option<&'s NextStepCondition> {
    let (weighted, deterministic): (Vec<_>, Vec<_>) = step
        .next_step_conditions
        .iter()
        .partition(|c| c.is_probabilistic());

    if let Some(hit) = deterministic
        .into_iter()
        .find(|c| matches_lenient(&c.condition, ctx, predicates))
    {
        return Some(hit);
    }

    let candidates: Vec<(&NextStepCondition, f64)> = weighted
        .into_iter()
        .filter(|c| matches_lenient(&c.condition, ctx, predicates))
        .map(|c| (c, c.probability.unwrap_or(0.0).max(0.0)))
        .collect();

    let total: f64 = candidates.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (candidate, weight) in &candidates {
        cumulative += weight;
        if draw < cumulative {
            return Some(*candidate);
        }
    }
    // rounding can leave the draw just past the final bucket
    candidates
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(c, _)| *c)
}

/// Selects the id of the step following `step`, or `None` when the problem is
/// finished.
///
/// Falls back to the next step by ascending step number when no routing entry
/// applies. A routing target that the catalog does not know is reported as
/// [`GuideError::StepNotFound`].
pub fn select_next<C, R>(
    step: &Step,
    ctx: &ConditionContext,
    catalog: &C,
    predicates: &PredicateRegistry,
    rng: &mut R,
) -> Result<Option<String>>
where
    C: StepCatalog + ?Sized,
    R: Rng,
{
    if let Some(chosen) = select_conditional(step, ctx, predicates, rng) {
        let target = &chosen.next_step_id;
        if catalog
            .get_step(&step.device_id, &step.problem_id, target)?
            .is_none()
        {
            return Err(GuideError::StepNotFound {
                step_id: target.clone(),
            });
        }
        debug!("Step '{}' routed to '{target}' by '{}'", step.id, chosen.condition);
        return Ok(Some(target.clone()));
    }

    let next = catalog.get_next_step(&step.device_id, &step.problem_id, step.step_number)?;
    Ok(next.map(|s| s.id))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    use super::*;
    use crate::{
        catalog::MemoryCatalog,
        models::{ActionType, Problem},
    };

    /// Rng replaying a fixed list of `gen::<f64>()` results.
    struct FixedRng {
        draws: Vec<f64>,
        index: usize,
    }

    impl FixedRng {
        fn new(draws: &[f64]) -> Self {
            Self {
                draws: draws.to_vec(),
                index: 0,
            }
        }
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let fraction = self.draws[self.index % self.draws.len()];
            self.index += 1;
            // f64 sampling uses the top 53 bits
            ((fraction * (1u64 << 53) as f64) as u64) << 11
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    fn step(id: &str, number: u32, next: Vec<NextStepCondition>) -> Step {
        Step {
            id: id.to_string(),
            problem_id: String::new(),
            device_id: String::new(),
            step_number: number,
            instruction: format!("Do {id}"),
            action_type: ActionType::ButtonPress,
            required_action: None,
            validation_rules: vec![],
            success_condition: None,
            failure_actions: vec![],
            next_step_conditions: next,
            estimated_time: 0,
        }
    }

    fn route(condition: &str, to: &str, probability: Option<f64>) -> NextStepCondition {
        NextStepCondition {
            condition: condition.to_string(),
            next_step_id: to.to_string(),
            probability,
        }
    }

    fn catalog(first: Step) -> (MemoryCatalog, Step) {
        let problem = Problem {
            id: "p".to_string(),
            device_id: "d".to_string(),
            title: "Problem".to_string(),
            description: None,
            category: None,
            steps: vec![first, step("s2", 2, vec![]), step("s3", 5, vec![])],
        };
        let catalog = MemoryCatalog::new().with_problem(problem);
        let first = catalog.get_first_step("d", "p").unwrap().unwrap();
        (catalog, first)
    }

    fn ctx(action: &str) -> ConditionContext {
        ConditionContext::new().with("action", action)
    }

    #[test]
    fn test_falls_back_to_next_step_number() {
        let (catalog, s1) = catalog(step("s1", 1, vec![]));
        let mut rng = StdRng::seed_from_u64(7);
        let next = select_next(&s1, &ctx("ok"), &catalog, &PredicateRegistry::new(), &mut rng).unwrap();
        assert_eq!(next.as_deref(), Some("s2"));

        let last = catalog.get_step("d", "p", "s3").unwrap().unwrap();
        let next = select_next(&last, &ctx("ok"), &catalog, &PredicateRegistry::new(), &mut rng).unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn test_first_deterministic_match_wins() {
        let (catalog, s1) = catalog(step(
            "s1",
            1,
            vec![
                route("action == no", "s2", None),
                route("action == yes", "s3", None),
                route("always", "s2", None),
            ],
        ));
        let mut rng = StdRng::seed_from_u64(1);
        let next = select_next(&s1, &ctx("yes"), &catalog, &PredicateRegistry::new(), &mut rng).unwrap();
        assert_eq!(next.as_deref(), Some("s3"));
    }

    #[test]
    fn test_deterministic_beats_probabilistic() {
        let s1 = step(
            "s1",
            1,
            vec![route("always", "s2", Some(1.0)), route("action == yes", "s3", None)],
        );
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let chosen = select_conditional(&s1, &ctx("yes"), &PredicateRegistry::new(), &mut rng);
            assert_eq!(chosen.map(|c| c.next_step_id.as_str()), Some("s3"));
        }
    }

    #[test]
    fn test_weighted_choice_follows_draws() {
        let s1 = step(
            "s1",
            1,
            vec![route("always", "s2", Some(0.75)), route("always", "s3", Some(0.25))],
        );
        let mut rng = FixedRng::new(&[0.1, 0.74, 0.76, 0.99]);
        let picks: Vec<_> = (0..4)
            .map(|_| {
                select_conditional(&s1, &ctx("x"), &PredicateRegistry::new(), &mut rng)
                    .map(|c| c.next_step_id.clone())
                    .unwrap()
            })
            .collect();
        assert_eq!(picks, ["s2", "s2", "s3", "s3"]);
    }

    #[test]
    fn test_weights_normalize_over_matching_candidates() {
        let s1 = step(
            "s1",
            1,
            vec![
                route("action == never_sent", "s2", Some(0.9)),
                route("always", "s3", Some(0.1)),
            ],
        );
        let mut rng = FixedRng::new(&[0.95]);
        let chosen = select_conditional(&s1, &ctx("x"), &PredicateRegistry::new(), &mut rng);
        assert_eq!(chosen.map(|c| c.next_step_id.as_str()), Some("s3"));
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let s1 = step(
            "s1",
            1,
            vec![route("always", "s2", Some(0.75)), route("always", "s3", Some(0.25))],
        );
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| {
                    select_conditional(&s1, &ctx("x"), &PredicateRegistry::new(), &mut rng)
                        .map(|c| c.next_step_id.clone())
                        .unwrap()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        let s2_count = run(42).iter().filter(|id| id.as_str() == "s2").count();
        assert!(s2_count > 25, "weighting ignored: {s2_count}/50 picks of s2");
    }

    #[test]
    fn test_zero_weights_fall_through() {
        let (catalog, s1) = catalog(step("s1", 1, vec![route("always", "s3", Some(0.0))]));
        let mut rng = StdRng::seed_from_u64(3);
        let next = select_next(&s1, &ctx("x"), &catalog, &PredicateRegistry::new(), &mut rng).unwrap();
        assert_eq!(next.as_deref(), Some("s2"));
    }

    #[test]
    fn test_unknown_routing_target_is_step_not_found() {
        let (catalog, s1) = catalog(step("s1", 1, vec![route("always", "ghost", None)]));
        let mut rng = StdRng::seed_from_u64(3);
        let err = select_next(&s1, &ctx("x"), &catalog, &PredicateRegistry::new(), &mut rng).unwrap_err();
        assert!(matches!(err, GuideError::StepNotFound { step_id } if step_id == "ghost"));
    }
}
