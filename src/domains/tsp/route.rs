//! Route mutation operators.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::genome::{GeneUnit, Mutator};
use crate::machine::Kloner;

/// The route visited backwards.
pub fn reverse_route(route: &[GeneUnit]) -> Vec<GeneUnit> {
    route.iter().rev().cloned().collect()
}

/// A k-opt shuffle of `route`.
///
/// The route is cut at `k` non-decreasing positions, all after the first
/// city. The start of the route (first city included) and its tail stay in
/// place; the `k - 1` fragments between the cuts are reassembled in random
/// order, each copied forwards or backwards at random. Fragments may be
/// empty, so the result can equal the input.
pub fn k_opt<R: Rng>(route: &[GeneUnit], k: usize, rng: &mut R) -> Vec<GeneUnit> {
    let len = route.len();
    if len == 0 || k == 0 {
        return route.to_vec();
    }

    let mut cuts: Vec<usize> = Vec::with_capacity(k);
    for i in 0..k {
        let low = if i == 0 { 1 } else { cuts[i - 1] };
        cuts.push(rng.gen_range(low..=len));
    }

    let mut result = Vec::with_capacity(len);
    result.extend_from_slice(&route[..cuts[0]]);

    let mut order: Vec<usize> = (0..k - 1).collect();
    order.shuffle(rng);
    for fragment in order {
        let piece = &route[cuts[fragment]..cuts[fragment + 1]];
        if rng.r#gen::<bool>() {
            result.extend_from_slice(piece);
        } else {
            result.extend(piece.iter().rev().cloned());
        }
    }

    result.extend_from_slice(&route[cuts[k - 1]..]);
    result
}

/// k-opt with `k` read from the mutating kloner's degree.
pub fn carried_k_opt_mutator() -> Mutator {
    Arc::new(|route: &[GeneUnit], kloner: &Kloner| {
        let k = kloner.degree()? as usize;
        Ok(k_opt(route, k, &mut rand::thread_rng()))
    })
}

pub fn fixed_k_opt_mutator(k: usize) -> Mutator {
    Arc::new(move |route: &[GeneUnit], _: &Kloner| Ok(k_opt(route, k, &mut rand::thread_rng())))
}

pub fn reverse_mutator() -> Mutator {
    Arc::new(|route: &[GeneUnit], _: &Kloner| Ok(reverse_route(route)))
}
