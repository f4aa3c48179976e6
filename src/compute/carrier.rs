//! Self-mutating encodings carried by kloner genomes.
//!
//! A kloner's genome parameterises how other segments mutate; these
//! operators make that genome mutate as well, so mutation rates and
//! move sizes evolve along with the solutions.

use std::sync::Arc;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{MetaModelError, Result};
use crate::genome::{GeneUnit, Mutator, Payload};
use crate::machine::Kloner;

use super::MutationRates;

/// Probability threshold a unit must also clear to escape rate mutation.
const RATE_KEEP_THRESHOLD: f64 = 0.25;

/// Self-mutation of a rate encoding.
///
/// Each coding rate unit is kept as it is when `u1 > rate && u2 > 0.25`
/// for two uniform draws; otherwise its rate moves by a gaussian step of
/// standard deviation `mutation_amount`, clamped to `[0, 1]`. High rates are
/// therefore themselves more likely to change.
pub fn mutate_rates<R: Rng>(code: &[GeneUnit], mutation_amount: f64, rng: &mut R) -> Result<Vec<GeneUnit>> {
    let step = Normal::new(0.0, mutation_amount)?;
    code.iter()
        .map(|unit| {
            if !unit.is_coding() {
                return Ok(unit.clone());
            }
            let rate = unit.rate()?;
            if rng.r#gen::<f64>() > rate && rng.r#gen::<f64>() > RATE_KEEP_THRESHOLD {
                Ok(unit.clone())
            } else {
                let mut mutated = unit.clone();
                *mutated.payload_mut() = Payload::Rate((rate + step.sample(rng)).clamp(0.0, 1.0));
                Ok(mutated)
            }
        })
        .collect()
}

/// Mutation operator for rate-carrier gene types.
pub fn rate_carrier_mutator(mutation_amount: f64) -> Mutator {
    Arc::new(move |code: &[GeneUnit], _: &Kloner| {
        mutate_rates(code, mutation_amount, &mut rand::thread_rng())
    })
}

/// Fresh rate-carrier code: deletion, duplication, translocation and point
/// rates in that order.
pub fn rate_carrier_code(gene_type: &Arc<crate::genome::GeneType>, rates: &MutationRates) -> Vec<GeneUnit> {
    [rates.deletion, rates.duplication, rates.translocation, rates.point]
        .into_iter()
        .map(|rate| GeneUnit::new(gene_type, Payload::Rate(rate)))
        .collect()
}

/// The four rearrangement rates a kloner carries.
pub fn carried_rates(kloner: &Kloner) -> Result<MutationRates> {
    Ok(MutationRates {
        deletion: kloner.rate(0)?,
        duplication: kloner.rate(1)?,
        translocation: kloner.rate(2)?,
        point: kloner.rate(3)?,
    })
}

/// Self-mutation of a degree encoding.
///
/// Every unit is copied with a fresh coding flag: units with the same degree
/// as the current first coding unit code with probability 0.5, units one
/// away with probability 0.25, all others never. Redrawn until at least one
/// unit codes, so the carrier always expresses some degree.
pub fn mutate_degrees<R: Rng>(code: &[GeneUnit], rng: &mut R) -> Result<Vec<GeneUnit>> {
    let current = code
        .iter()
        .find(|unit| unit.is_coding())
        .ok_or_else(|| MetaModelError::DegenerateGenome("degree carrier has no coding unit".into()))?
        .degree()?;
    let probabilities = code
        .iter()
        .map(|unit| {
            Ok(match unit.degree()?.abs_diff(current) {
                0 => 0.5,
                1 => 0.25,
                _ => 0.0,
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    loop {
        let result: Vec<GeneUnit> = code
            .iter()
            .zip(&probabilities)
            .map(|(unit, &p)| unit.clone().with_coding(rng.r#gen::<f64>() < p))
            .collect();
        if result.iter().any(GeneUnit::is_coding) {
            return Ok(result);
        }
    }
}

/// Mutation operator for degree-carrier gene types.
pub fn degree_carrier_mutator() -> Mutator {
    Arc::new(|code: &[GeneUnit], _: &Kloner| mutate_degrees(code, &mut rand::thread_rng()))
}

/// Fresh degree-carrier code: one unit per degree in `min..=max`, with only
/// `initial` coding.
pub fn degree_carrier_code(
    gene_type: &Arc<crate::genome::GeneType>,
    min: u32,
    max: u32,
    initial: u32,
) -> Vec<GeneUnit> {
    (min..=max)
        .map(|degree| GeneUnit::new(gene_type, Payload::Degree(degree)).with_coding(degree == initial))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GeneType;
    use crate::machine::{MachineKind, MachineRegistry};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn carrier_type() -> Arc<GeneType> {
        GeneType::builder("kloner", MachineKind::Kloner)
            .build(&MachineRegistry::with_builtins())
            .unwrap()
    }

    #[test]
    fn test_rates_stay_in_unit_interval() {
        let gene_type = carrier_type();
        let mut code = rate_carrier_code(
            &gene_type,
            &MutationRates {
                deletion: 0.0,
                duplication: 1.0,
                translocation: 0.5,
                point: 0.99,
            },
        );
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            code = mutate_rates(&code, 0.2, &mut rng).unwrap();
            for unit in &code {
                let rate = unit.rate().unwrap();
                assert!((0.0..=1.0).contains(&rate));
            }
        }
        assert_eq!(code.len(), 4);
    }

    #[test]
    fn test_certain_rate_always_changes_or_clamps() {
        let gene_type = carrier_type();
        let code = vec![GeneUnit::new(&gene_type, Payload::Rate(1.0))];
        let mut rng = StdRng::seed_from_u64(12);
        let mut moved = 0;
        for _ in 0..100 {
            let rate = mutate_rates(&code, 0.05, &mut rng).unwrap()[0].rate().unwrap();
            assert!(rate <= 1.0);
            if rate < 1.0 {
                moved += 1;
            }
        }
        assert!(moved > 20);
    }

    #[test]
    fn test_non_coding_rates_are_copied() {
        let gene_type = carrier_type();
        let code = vec![GeneUnit::non_coding(&gene_type, Payload::Rate(1.0))];
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..20 {
            assert_eq!(mutate_rates(&code, 0.5, &mut rng).unwrap(), code);
        }
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let gene_type = carrier_type();
        let code = vec![GeneUnit::new(&gene_type, Payload::Rate(0.5))];
        let mut rng = StdRng::seed_from_u64(14);
        assert!(matches!(
            mutate_rates(&code, -1.0, &mut rng),
            Err(MetaModelError::Distribution(_))
        ));
    }

    #[test]
    fn test_degree_mutation_stays_near_current_degree() {
        let gene_type = carrier_type();
        let code = degree_carrier_code(&gene_type, 2, 10, 5);
        let mut rng = StdRng::seed_from_u64(15);
        for _ in 0..100 {
            let mutated = mutate_degrees(&code, &mut rng).unwrap();
            let coding: Vec<u32> = mutated
                .iter()
                .filter(|u| u.is_coding())
                .map(|u| u.degree().unwrap())
                .collect();
            assert!(!coding.is_empty());
            assert!(coding.iter().all(|d| (4..=6).contains(d)));
        }
    }

    #[test]
    fn test_degree_mutation_needs_a_coding_unit() {
        let gene_type = carrier_type();
        let code = degree_carrier_code(&gene_type, 2, 4, 99);
        let mut rng = StdRng::seed_from_u64(16);
        assert!(matches!(
            mutate_degrees(&code, &mut rng),
            Err(MetaModelError::DegenerateGenome(_))
        ));
    }
}
