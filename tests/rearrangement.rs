//! Length and novelty properties of the ring rearrangements.

use std::sync::Arc;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use machina::compute::{
    MIN_DELETION_LENGTH, MIN_DUPLICATION_LENGTH, MIN_REMAINING_AFTER_DELETION, large_deletion,
    large_duplication, large_translocation,
};
use machina::genome::{GeneType, GeneUnit, Payload, PointGene};
use machina::machine::{MachineKind, MachineRegistry};

fn point_type() -> Arc<GeneType> {
    GeneType::builder("clusterer", MachineKind::Reproducer)
        .build(&MachineRegistry::with_builtins())
        .unwrap()
}

fn genome(gene_type: &Arc<GeneType>, len: usize) -> Vec<GeneUnit> {
    (0..len as u32)
        .map(|v| {
            GeneUnit::new(
                gene_type,
                Payload::Point(PointGene {
                    core_point: v,
                    dimension: v,
                    value: v as f64,
                }),
            )
        })
        .collect()
}

fn novel(original: &[GeneUnit], result: &[GeneUnit]) -> usize {
    result.iter().filter(|unit| !original.contains(unit)).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn deletion_never_lengthens(len in 0usize..160, seed in any::<u64>()) {
        let gene_type = point_type();
        let source = genome(&gene_type, len);
        let result = large_deletion(&source, &mut StdRng::seed_from_u64(seed));
        if len < MIN_DELETION_LENGTH {
            prop_assert_eq!(&result.code, &source);
        } else {
            let cut = -result.length_change;
            prop_assert!(cut > 3 && (cut as usize) < len - 3);
            prop_assert!(result.code.len() >= MIN_REMAINING_AFTER_DELETION);
            prop_assert!(novel(&source, &result.code) <= 1);
        }
        prop_assert_eq!(result.code.len() as isize, len as isize + result.length_change);
    }

    #[test]
    fn duplication_adds_the_cut(len in 0usize..160, seed in any::<u64>()) {
        let gene_type = point_type();
        let source = genome(&gene_type, len);
        let result = large_duplication(&source, &mut StdRng::seed_from_u64(seed));
        if len < MIN_DUPLICATION_LENGTH {
            prop_assert_eq!(result.length_change, 0);
        } else {
            let cut = result.length_change;
            prop_assert!(cut > 3 && (cut as usize) < len - 3);
            prop_assert!(novel(&source, &result.code) <= 2);
        }
        prop_assert_eq!(result.code.len() as isize, len as isize + result.length_change);
    }

    #[test]
    fn translocation_keeps_length(len in 0usize..160, seed in any::<u64>()) {
        let gene_type = point_type();
        let source = genome(&gene_type, len);
        let result = large_translocation(&source, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(result.length_change, 0);
        prop_assert_eq!(result.code.len(), len);
        prop_assert!(novel(&source, &result.code) <= 2);
    }
}
