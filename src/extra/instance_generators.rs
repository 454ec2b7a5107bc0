use crate::genotype::{Chromosome, Genotype, Stock};
use crate::rules::MarkerSet;
use rand::prelude::*;

const ADMISSIBLE_ATTEMPTS: usize = 1000;

/// Draws both alleles of every chromosome in `chromosomes` uniformly from `alleles`.
///
/// # Panics
///
/// Panics if `alleles` is empty.
pub fn random_genotype<R: Rng + ?Sized>(
    rng: &mut R,
    chromosomes: &[Chromosome],
    alleles: &[&str],
) -> Genotype {
    Genotype::from_pairs(chromosomes.iter().map(|&c| {
        let a1 = alleles[rng.gen_range(0..alleles.len())];
        let a2 = alleles[rng.gen_range(0..alleles.len())];
        (c, (a1, a2))
    }))
}

/// Like [`random_genotype`], redrawing until the genotype is neither lethal nor homozygous for a
/// balancer under `markers`. `None` if no admissible draw turns up.
pub fn random_admissible_genotype<R: Rng + ?Sized>(
    rng: &mut R,
    chromosomes: &[Chromosome],
    alleles: &[&str],
    markers: &MarkerSet,
) -> Option<Genotype> {
    (0..ADMISSIBLE_ATTEMPTS)
        .map(|_| random_genotype(rng, chromosomes, alleles))
        .find(|x| markers.admissibility(x).is_ok())
}

/// Up to `n_stocks` admissible stocks named `S0`, `S1`, ...
pub fn init_stocks_random<R: Rng + ?Sized>(
    rng: &mut R,
    n_stocks: usize,
    chromosomes: &[Chromosome],
    alleles: &[&str],
    markers: &MarkerSet,
) -> Vec<Stock> {
    (0..n_stocks)
        .filter_map(|i| {
            random_admissible_genotype(rng, chromosomes, alleles, markers)
                .map(|x| Stock::new(format!("S{}", i), x))
        })
        .collect()
}
