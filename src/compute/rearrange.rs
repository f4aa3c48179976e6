//! Large-scale rearrangements and point mutation of ring-shaped genomes.
//!
//! Every operator treats the code as a ring (position `n - 1` is followed by
//! position `0`), never modifies its input, and reports the net change in
//! length alongside the new code.

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Binomial, Distribution};

use crate::error::Result;
use crate::genome::{GeneUnit, Payload};

/// Genomes shorter than this are never deleted from.
pub const MIN_DELETION_LENGTH: usize = 20;

/// Deletion always leaves at least this many units.
pub const MIN_REMAINING_AFTER_DELETION: usize = 10;

/// Genomes shorter than this are never duplicated into or translocated.
pub const MIN_DUPLICATION_LENGTH: usize = 8;

/// Translocation gives up after this many attempts to find non-overlapping positions.
pub const MAX_TRANSLOCATION_ATTEMPTS: usize = 1000;

/// New code produced by an operator and its net change in length.
#[derive(Debug, Clone, PartialEq)]
pub struct Rearranged {
    pub code: Vec<GeneUnit>,
    pub length_change: isize,
}

impl Rearranged {
    fn unchanged(code: &[GeneUnit]) -> Self {
        Self {
            code: code.to_vec(),
            length_change: 0,
        }
    }

    fn from_source(source_len: usize, code: Vec<GeneUnit>) -> Self {
        let length_change = code.len() as isize - source_len as isize;
        Self {
            code,
            length_change,
        }
    }
}

/// The kinds of large rearrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearrangement {
    Deletion,
    Duplication,
    Translocation,
}

/// Per-generation rates driving [`mutate_genome`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationRates {
    pub deletion: f64,
    pub duplication: f64,
    pub translocation: f64,
    pub point: f64,
}

/// Value space of point-mutated clustering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointBounds {
    pub core_points: u32,
    pub dimensions: u32,
    pub min_value: f64,
    pub value_range: f64,
}

/// Ring positions from `start` to `finish`, counting `start` but not `finish`.
///
/// Equal positions span the whole ring.
pub fn cut_size(start: usize, finish: usize, len: usize) -> usize {
    (finish + len - start - 1) % len + 1
}

/// Map a possibly negative position onto a ring of `len`.
pub fn normalise(position: isize, len: usize) -> usize {
    position.rem_euclid(len as isize) as usize
}

/// Copy units from `start` up to (not including) `finish`, going round the
/// ring. At least one unit is always copied, so equal positions copy the
/// whole ring.
fn copy_chunk(source: &[GeneUnit], dest: &mut Vec<GeneUnit>, start: usize, finish: usize) {
    let len = source.len();
    let mut position = start;
    loop {
        dest.push(source[position].clone());
        position = (position + 1) % len;
        if position == finish {
            break;
        }
    }
}

/// Clone of `first` with a nested subset of point fields taken from `second`.
///
/// Split 0 takes value, dimension and core point; 1 takes dimension and
/// core point; 2 takes only the core point; 3 takes nothing. Units without
/// point payloads merge to a plain clone of `first`.
pub fn splice(first: &GeneUnit, second: &GeneUnit, split: u8) -> GeneUnit {
    let mut merged = first.clone();
    if let (Payload::Point(target), Payload::Point(donor)) = (merged.payload_mut(), second.payload()) {
        if split == 0 {
            target.value = donor.value;
        }
        if split <= 1 {
            target.dimension = donor.dimension;
        }
        if split <= 2 {
            target.core_point = donor.core_point;
        }
    }
    merged
}

/// Remove the arc `from..to` (ring order), splicing its two ends together
/// with the given split.
fn delete_chunk(source: &[GeneUnit], from: usize, to: usize, cut: usize, split: u8) -> Vec<GeneUnit> {
    let len = source.len();
    let offset = ((len - cut) / 2) as isize;
    let start = if from < to {
        normalise(to as isize + offset, len)
    } else {
        normalise(from as isize - offset, len)
    };

    let mut result = Vec::with_capacity(len - cut);
    copy_chunk(source, &mut result, start, from);
    result.push(splice(&source[from], &source[to], split));
    copy_chunk(source, &mut result, (to + 1) % len, start);
    result
}

/// Pick the arc of a large deletion.
fn deletion_positions<R: Rng>(len: usize, rng: &mut R) -> (usize, usize, usize) {
    let i = rng.gen_range(0..len);
    loop {
        let j = rng.gen_range(0..len);
        let cut = cut_size(i, j, len);
        if 3 < cut && cut < len - 3 && len - cut >= MIN_REMAINING_AFTER_DELETION {
            return (i, j, cut);
        }
    }
}

/// Large deletion: remove a random arc, leaving at least ten units.
///
/// Genomes shorter than [`MIN_DELETION_LENGTH`] come back unchanged.
pub fn large_deletion<R: Rng>(source: &[GeneUnit], rng: &mut R) -> Rearranged {
    let len = source.len();
    if len < MIN_DELETION_LENGTH {
        return Rearranged::unchanged(source);
    }
    let (i, j, cut) = deletion_positions(len, rng);
    let code = delete_chunk(source, i, j, cut, rng.gen_range(0..4));
    debug!("Deleted {cut} units between {i} and {j} of {len}");
    Rearranged::from_source(len, code)
}

/// Positions `(i, j, cut, insert)` of a large duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DuplicationPositions {
    i: usize,
    j: usize,
    cut: usize,
    insert: usize,
}

impl DuplicationPositions {
    fn sample<R: Rng>(len: usize, rng: &mut R) -> Self {
        let i = rng.gen_range(0..len);
        let (j, cut) = loop {
            let j = rng.gen_range(0..len);
            let cut = cut_size(i, j, len);
            if 3 < cut && cut < len - 3 {
                break (j, cut);
            }
        };
        let insert = loop {
            let insert = rng.gen_range(0..len);
            if 2 < insert && insert < len - 2 {
                break insert;
            }
        };
        Self { i, j, cut, insert }
    }

    /// Whether the insertion point falls inside the duplicated arc.
    fn overlaps(&self) -> bool {
        match self.i.cmp(&self.j) {
            std::cmp::Ordering::Less => self.insert <= self.j,
            std::cmp::Ordering::Greater => self.i <= self.insert || self.insert < self.j,
            std::cmp::Ordering::Equal => true,
        }
    }
}

fn duplicate_at<R: Rng>(source: &[GeneUnit], at: DuplicationPositions, rng: &mut R) -> Vec<GeneUnit> {
    let len = source.len();
    let DuplicationPositions { i, j, cut, insert } = at;
    let split = rng.gen_range(0..4);

    let mut result = Vec::with_capacity(len + cut);
    copy_chunk(source, &mut result, 0, insert);
    result.push(splice(&source[insert], &source[i], split));
    copy_chunk(source, &mut result, (i + 1) % len, j);
    result.push(splice(&source[j], &source[insert], split));
    copy_chunk(source, &mut result, (insert + 1) % len, 0);
    result
}

/// Large duplication: insert a copy of a random arc at a random point.
///
/// The arc is bracketed by two merged units. Genomes shorter than
/// [`MIN_DUPLICATION_LENGTH`] come back unchanged.
pub fn large_duplication<R: Rng>(source: &[GeneUnit], rng: &mut R) -> Rearranged {
    let len = source.len();
    if len < MIN_DUPLICATION_LENGTH {
        debug!("Genome of {len} units is too short to duplicate");
        return Rearranged::unchanged(source);
    }
    let at = DuplicationPositions::sample(len, rng);
    let code = duplicate_at(source, at, rng);
    debug!(
        "Duplicated {} units between {} and {} to {} of {len}",
        at.cut, at.i, at.j, at.insert
    );
    Rearranged::from_source(len, code)
}

/// Large translocation: move a random arc to a non-overlapping point.
///
/// Implemented as a duplication followed by deletion of the original arc,
/// so the length is preserved. The junction left by the deletion keeps the
/// unit at `i` as it was; only the two splices bracketing the moved arc
/// introduce new units.
pub fn large_translocation<R: Rng>(source: &[GeneUnit], rng: &mut R) -> Rearranged {
    let len = source.len();
    if len < MIN_DUPLICATION_LENGTH {
        debug!("Genome of {len} units is too short to translocate");
        return Rearranged::unchanged(source);
    }
    let Some(at) = (0..MAX_TRANSLOCATION_ATTEMPTS)
        .map(|_| DuplicationPositions::sample(len, rng))
        .find(|at| !at.overlaps())
    else {
        debug!("No non-overlapping translocation found in a genome of {len} units");
        return Rearranged::unchanged(source);
    };

    let duplicated = duplicate_at(source, at, rng);
    let from = if at.i < at.j { at.i } else { at.i + at.cut };
    let code = delete_chunk(&duplicated, from, at.j, at.cut, 3);
    debug!(
        "Translocated {} units between {} and {} to {} of {len}",
        at.cut, at.i, at.j, at.insert
    );
    Rearranged::from_source(len, code)
}

/// Replace one uniformly chosen field of a point unit with a random value.
pub fn point_mutate<R: Rng>(unit: &mut GeneUnit, bounds: &PointBounds, rng: &mut R) -> Result<()> {
    match rng.gen_range(0..4) {
        0 => unit.set_coding(rng.r#gen::<bool>()),
        1 => unit.point_mut()?.core_point = rng.gen_range(0..bounds.core_points.max(1)),
        2 => unit.point_mut()?.dimension = rng.gen_range(0..bounds.dimensions.max(1)),
        _ => unit.point_mut()?.value = rng.r#gen::<f64>() * bounds.value_range + bounds.min_value,
    }
    Ok(())
}

/// Point mutations: a Binomial(len, 2 x rate) number of single-field changes
/// at random positions.
pub fn point_mutations<R: Rng>(
    source: &[GeneUnit],
    rate: f64,
    bounds: &PointBounds,
    rng: &mut R,
) -> Result<Rearranged> {
    let mut code = source.to_vec();
    if code.is_empty() {
        return Ok(Rearranged::from_source(source.len(), code));
    }
    let count = Binomial::new(code.len() as u64, (2.0 * rate).clamp(0.0, 1.0))?.sample(rng);
    for _ in 0..count {
        let position = rng.gen_range(0..code.len());
        point_mutate(&mut code[position], bounds, rng)?;
    }
    if count > 0 {
        debug!("Applied {count} point mutations to {} units", code.len());
    }
    Ok(Rearranged::from_source(source.len(), code))
}

/// One generation of genome mutation.
///
/// The number of each kind of rearrangement is drawn from Binomial(len, rate),
/// the pending rearrangements are shuffled and applied in turn, and point
/// mutations follow.
pub fn mutate_genome<R: Rng>(
    source: &[GeneUnit],
    rates: &MutationRates,
    bounds: &PointBounds,
    rng: &mut R,
) -> Result<Rearranged> {
    let len = source.len() as u64;
    let mut pending = Vec::new();
    for (kind, rate) in [
        (Rearrangement::Deletion, rates.deletion),
        (Rearrangement::Duplication, rates.duplication),
        (Rearrangement::Translocation, rates.translocation),
    ] {
        let count = Binomial::new(len, rate.clamp(0.0, 1.0))?.sample(rng);
        pending.extend(std::iter::repeat_n(kind, count as usize));
    }
    pending.shuffle(rng);

    let mut code = source.to_vec();
    for kind in pending {
        let step = match kind {
            Rearrangement::Deletion => large_deletion(&code, rng),
            Rearrangement::Duplication => large_duplication(&code, rng),
            Rearrangement::Translocation => large_translocation(&code, rng),
        };
        code = step.code;
    }
    let mutated = point_mutations(&code, rates.point, bounds, rng)?;
    Ok(Rearranged::from_source(source.len(), mutated.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{GeneType, PointGene};
    use crate::machine::{MachineKind, MachineRegistry};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn point_type() -> Arc<GeneType> {
        GeneType::builder("clusterer", MachineKind::Reproducer)
            .build(&MachineRegistry::with_builtins())
            .unwrap()
    }

    /// Unit `v` has every field set to `v` and is coding when `v` is even.
    fn numbered(gene_type: &Arc<GeneType>, len: u32) -> Vec<GeneUnit> {
        (0..len)
            .map(|v| {
                GeneUnit::new(
                    gene_type,
                    Payload::Point(PointGene {
                        core_point: v,
                        dimension: v,
                        value: v as f64,
                    }),
                )
                .with_coding(v % 2 == 0)
            })
            .collect()
    }

    fn bounds() -> PointBounds {
        PointBounds {
            core_points: 5,
            dimensions: 5,
            min_value: -2.0,
            value_range: 4.0,
        }
    }

    fn novel_units(original: &[GeneUnit], result: &[GeneUnit]) -> usize {
        result.iter().filter(|unit| !original.contains(unit)).count()
    }

    #[test]
    fn test_cut_size() {
        assert_eq!(cut_size(2, 5, 10), 3);
        assert_eq!(cut_size(8, 1, 10), 3);
        assert_eq!(cut_size(4, 4, 10), 10);
        assert_eq!(cut_size(9, 0, 10), 1);
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(-3, 10), 7);
        assert_eq!(normalise(12, 10), 2);
        assert_eq!(normalise(4, 10), 4);
    }

    #[test]
    fn test_splice_nesting() {
        let gene_type = point_type();
        let units = numbered(&gene_type, 2);
        let expect = |split, core, dim, value: f64| {
            let merged = splice(&units[0], &units[1], split);
            let point = merged.point().unwrap();
            assert_eq!((point.core_point, point.dimension, point.value), (core, dim, value));
            assert_eq!(merged.is_coding(), units[0].is_coding());
        };
        expect(0, 1, 1, 1.0);
        expect(1, 1, 1, 0.0);
        expect(2, 1, 0, 0.0);
        expect(3, 0, 0, 0.0);
    }

    #[test]
    fn test_short_genomes_are_not_deleted_from() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 19);
        let mut rng = StdRng::seed_from_u64(1);
        let result = large_deletion(&source, &mut rng);
        assert_eq!(result.code, source);
        assert_eq!(result.length_change, 0);
    }

    #[test]
    fn test_deletion_shortens() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 100);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let result = large_deletion(&source, &mut rng);
            let removed = -result.length_change;
            assert!(removed > 3 && removed < 97, "removed {removed}");
            assert!(result.code.len() >= MIN_REMAINING_AFTER_DELETION);
            assert_eq!(result.code.len() as isize, 100 + result.length_change);
            assert!(novel_units(&source, &result.code) <= 1);
        }
    }

    #[test]
    fn test_duplication_lengthens_by_cut() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 100);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let result = large_duplication(&source, &mut rng);
            assert!(result.length_change > 3 && result.length_change < 97);
            assert_eq!(result.code.len() as isize, 100 + result.length_change);
            assert!(novel_units(&source, &result.code) <= 2);
        }
        assert_eq!(source.len(), 100);
    }

    #[test]
    fn test_duplication_of_minimum_length() {
        let gene_type = point_type();
        let source = numbered(&gene_type, MIN_DUPLICATION_LENGTH as u32);
        let mut rng = StdRng::seed_from_u64(4);
        let result = large_duplication(&source, &mut rng);
        assert_eq!(result.length_change, 4);

        let short = numbered(&gene_type, 7);
        assert_eq!(large_duplication(&short, &mut rng).code, short);
        assert_eq!(large_translocation(&short, &mut rng).code, short);
    }

    #[test]
    fn test_translocation_preserves_length() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 100);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let result = large_translocation(&source, &mut rng);
            assert_eq!(result.length_change, 0);
            assert_eq!(result.code.len(), 100);
            assert!(novel_units(&source, &result.code) <= 2);
        }
    }

    #[test]
    fn test_overlap_rule() {
        let at = |i, j, insert| DuplicationPositions { i, j, cut: 0, insert };
        assert!(at(10, 20, 15).overlaps());
        assert!(at(10, 20, 20).overlaps());
        assert!(!at(10, 20, 21).overlaps());
        assert!(at(80, 20, 90).overlaps());
        assert!(at(80, 20, 5).overlaps());
        assert!(!at(80, 20, 20).overlaps());
        assert!(at(5, 5, 50).overlaps());
    }

    #[test]
    fn test_point_mutation_changes_single_field() {
        let gene_type = point_type();
        let original = numbered(&gene_type, 100);
        let mut rng = StdRng::seed_from_u64(6);

        let mut changed = 0;
        for unit in &original {
            let mut copy = unit.clone();
            point_mutate(&mut copy, &bounds(), &mut rng).unwrap();
            let (a, b) = (unit.point().unwrap(), copy.point().unwrap());
            let differing = [
                unit.is_coding() != copy.is_coding(),
                a.core_point != b.core_point,
                a.dimension != b.dimension,
                a.value != b.value,
            ]
            .iter()
            .filter(|d| **d)
            .count();
            assert!(differing <= 1);
            changed += differing;
        }
        assert!(changed > 55 && changed < 98, "changed {changed}");
    }

    #[test]
    fn test_point_mutation_rejects_other_payloads() {
        let gene_type = point_type();
        let mut unit = GeneUnit::new(&gene_type, Payload::Rate(0.1));
        let mut rng = StdRng::seed_from_u64(7);
        let failures = (0..50)
            .filter(|_| point_mutate(&mut unit, &bounds(), &mut rng).is_err())
            .count();
        assert!(failures > 0);
    }

    #[test]
    fn test_zero_rates_copy_exactly() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 60);
        let rates = MutationRates {
            deletion: 0.0,
            duplication: 0.0,
            translocation: 0.0,
            point: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let result = mutate_genome(&source, &rates, &bounds(), &mut rng).unwrap();
        assert_eq!(result.code, source);
        assert_eq!(result.length_change, 0);
    }

    #[test]
    fn test_mutate_genome_reports_length_change() {
        let gene_type = point_type();
        let source = numbered(&gene_type, 150);
        let rates = MutationRates {
            deletion: 0.01,
            duplication: 0.01,
            translocation: 0.01,
            point: 0.05,
        };
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let result = mutate_genome(&source, &rates, &bounds(), &mut rng).unwrap();
            assert_eq!(result.code.len() as isize, 150 + result.length_change);
        }
    }
}
