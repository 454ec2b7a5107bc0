//! The cross engine: gamete enumeration and offspring distributions under whole-chromosome
//! independent assortment.

use crate::abstract_stocks::{BreedingRole, GameteModel};
use crate::error::{CrossError, Result};
use crate::genotype::{describe_chromosomes, Gamete, Genotype, GenotypeKey};
use crate::rules::MarkerSet;
use itertools::iproduct;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Mendelian segregation of whole chromosomes, identical for both roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentAssortment;

impl GameteModel for IndependentAssortment {
    /// Branches once per heterozygous chromosome, walking chromosomes in genotype order, so a
    /// genotype with `k` heterozygous chromosomes yields `2^k` gametes.
    fn gametes(&self, x: &Genotype, _role: BreedingRole) -> Vec<Gamete> {
        x.iter()
            .fold(vec![Gamete::default()], |gametes, (chrom, (a1, a2))| {
                gametes
                    .iter()
                    .flat_map(|g| {
                        let first = g.with(chrom, a1.clone());
                        if a1 == a2 {
                            vec![first]
                        } else {
                            vec![first, g.with(chrom, a2.clone())]
                        }
                    })
                    .collect()
            })
    }
}

/// One class of an offspring distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offspring {
    pub genotype: Genotype,
    pub frequency: f64,
}

#[derive(Debug, Clone)]
pub struct CrossEngine<'a, K: GameteModel = IndependentAssortment> {
    markers: &'a MarkerSet,
    model: K,
}

impl<'a> CrossEngine<'a, IndependentAssortment> {
    pub fn new(markers: &'a MarkerSet) -> Self {
        Self {
            markers,
            model: IndependentAssortment,
        }
    }
}

impl Default for CrossEngine<'static, IndependentAssortment> {
    fn default() -> Self {
        CrossEngine::new(MarkerSet::drosophila())
    }
}

impl<'a, K: GameteModel> CrossEngine<'a, K> {
    pub fn with_model(markers: &'a MarkerSet, model: K) -> Self {
        Self { markers, model }
    }

    pub fn markers(&self) -> &'a MarkerSet {
        self.markers
    }

    pub fn enumerate_gametes(&self, x: &Genotype, role: BreedingRole) -> Vec<Gamete> {
        self.model.gametes(x, role)
    }

    /// Every viable child of `female` x `male`, one entry per gamete pairing.
    pub fn cross(&self, female: &Genotype, male: &Genotype) -> Result<Vec<Genotype>> {
        if !female.same_chromosomes(male) {
            return Err(CrossError::ChromosomeMismatch {
                female: describe_chromosomes(female),
                male: describe_chromosomes(male),
            });
        }
        let gf = self.model.gametes(female, BreedingRole::Female);
        let gm = self.model.gametes(male, BreedingRole::Male);
        Ok(iproduct!(gf.iter(), gm.iter())
            .map(|(x, y)| Genotype::from_gametes(x, y))
            .filter(|z| !self.markers.is_lethal(z))
            .collect())
    }

    /// Groups the children of a cross by canonical genotype. Classes are ordered by descending
    /// frequency, ties in the order first seen; empty when nothing survives.
    pub fn summarize_offspring(&self, female: &Genotype, male: &Genotype) -> Result<Vec<Offspring>> {
        let children = self.cross(female, male)?;
        let total = children.len();
        let mut index: HashMap<GenotypeKey, usize> = HashMap::new();
        let mut classes: Vec<(Genotype, usize)> = vec![];
        for z in children {
            match index.entry(z.key()) {
                Entry::Occupied(e) => classes[*e.get()].1 += 1,
                Entry::Vacant(e) => {
                    e.insert(classes.len());
                    classes.push((z, 1));
                }
            }
        }
        classes.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(classes
            .into_iter()
            .map(|(genotype, n)| Offspring {
                genotype,
                frequency: n as f64 / total as f64,
            })
            .collect())
    }
}

pub fn enumerate_gametes(x: &Genotype, role: BreedingRole) -> Vec<Gamete> {
    CrossEngine::default().enumerate_gametes(x, role)
}

pub fn cross(female: &Genotype, male: &Genotype) -> Result<Vec<Genotype>> {
    CrossEngine::default().cross(female, male)
}

pub fn summarize_offspring(female: &Genotype, male: &Genotype) -> Result<Vec<Offspring>> {
    CrossEngine::default().summarize_offspring(female, male)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::instance_generators::random_genotype;
    use crate::genotype::Chromosome;
    use crate::rules::is_lethal;
    use rand::prelude::*;
    use std::collections::HashSet;

    fn g(s: &str) -> Genotype {
        s.parse().unwrap()
    }

    fn frequency_of(dist: &[Offspring], s: &str) -> f64 {
        let x = g(s);
        dist.iter()
            .find(|o| o.genotype.matches(&x))
            .map_or(0.0, |o| o.frequency)
    }

    #[test]
    fn gamete_count_test() {
        assert_eq!(2, enumerate_gametes(&g("2:a/+ 3:+/+ 4:+/+"), BreedingRole::Male).len());
        assert_eq!(4, enumerate_gametes(&g("2:a/+ 3:b/+ 4:+/+"), BreedingRole::Female).len());
        assert_eq!(2, enumerate_gametes(&g("2:CyO/a 3:+/+ 4:+/+"), BreedingRole::Female).len());
        assert_eq!(1, enumerate_gametes(&g("2:+/+ 3:+/+"), BreedingRole::Female).len());
    }

    #[test]
    fn gamete_count_random_test() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let x = random_genotype(&mut rng, &Chromosome::AUTOSOMES, &["+", "a", "CyO"]);
            let gametes = enumerate_gametes(&x, BreedingRole::Female);
            assert_eq!(1 << x.n_heterozygous(), gametes.len());
            let distinct: HashSet<_> = gametes.iter().collect();
            assert_eq!(gametes.len(), distinct.len());
        }
    }

    #[test]
    fn gamete_order_test() {
        let x = g("2:a/b").with(Chromosome::X, "w", "+");
        let gametes = enumerate_gametes(&x, BreedingRole::Female);
        let alleles: Vec<(String, String)> = gametes
            .iter()
            .map(|gx| {
                (
                    gx.get(Chromosome::X).unwrap().to_string(),
                    gx.get(Chromosome::Two).unwrap().to_string(),
                )
            })
            .collect();
        let expected: Vec<(String, String)> = [("w", "a"), ("w", "b"), ("+", "a"), ("+", "b")]
            .iter()
            .map(|(x, y)| (x.to_string(), y.to_string()))
            .collect();
        assert_eq!(expected, alleles);
    }

    #[test]
    fn role_does_not_change_gametes_test() {
        let x = g("2:CyO/a 3:b/+ 4:+/+");
        assert_eq!(
            enumerate_gametes(&x, BreedingRole::Female),
            enumerate_gametes(&x, BreedingRole::Male)
        );
    }

    /// Stand-in for a role dependent model: males pass on the first homologue only.
    #[derive(Debug)]
    struct FirstHomologueMales;

    impl GameteModel for FirstHomologueMales {
        fn gametes(&self, x: &Genotype, role: BreedingRole) -> Vec<Gamete> {
            match role {
                BreedingRole::Female => IndependentAssortment.gametes(x, role),
                BreedingRole::Male => vec![x
                    .iter()
                    .fold(Gamete::default(), |gx, (c, (a1, _))| gx.with(c, a1.clone()))],
            }
        }
    }

    #[test]
    fn custom_gamete_model_test() {
        let markers = MarkerSet::default();
        let engine = CrossEngine::with_model(&markers, FirstHomologueMales);
        let dist = engine
            .summarize_offspring(&g("2:+/+"), &g("2:Sb/+"))
            .unwrap();
        assert_eq!(1, dist.len());
        assert_eq!("2:+/Sb", dist[0].genotype.to_string());
    }

    #[test]
    fn cross_mismatch_test() {
        match cross(&g("2:+/+ 3:+/+"), &g("2:+/+")) {
            Err(CrossError::ChromosomeMismatch { female, male }) => {
                assert_eq!("{2,3}", female);
                assert_eq!("{2}", male);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cross_multiplicity_test() {
        let female = g("2:CyO/+ 3:+/+ 4:+/+");
        let male = g("2:CyO/+ 3:+/+ 4:+/+");
        let children = cross(&female, &male).unwrap();
        assert_eq!(3, children.len());
        assert!(children.iter().all(|z| !is_lethal(z)));
        // female allele first
        assert_eq!("2:CyO/+ 3:+/+ 4:+/+", children[0].to_string());
        assert_eq!("2:+/CyO 3:+/+ 4:+/+", children[1].to_string());
    }

    #[test]
    fn summarize_groups_unordered_test() {
        let dist = summarize_offspring(&g("2:CyO/+ 3:+/+"), &g("2:CyO/+ 3:+/+")).unwrap();
        assert_eq!(2, dist.len());
        assert_eq!("2:CyO/+ 3:+/+", dist[0].genotype.to_string());
        assert!((dist[0].frequency - 2.0 / 3.0).abs() < 1e-9);
        assert!((dist[1].frequency - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_tie_order_test() {
        let dist = summarize_offspring(&g("2:+/+ 3:+/+"), &g("2:CyO/+ 3:TM3/+")).unwrap();
        let names: Vec<String> = dist.iter().map(|o| o.genotype.to_string()).collect();
        assert_eq!(
            vec![
                "2:+/CyO 3:+/TM3",
                "2:+/CyO 3:+/+",
                "2:+/+ 3:+/TM3",
                "2:+/+ 3:+/+"
            ],
            names
        );
        assert!(dist.iter().all(|o| (o.frequency - 0.25).abs() < 1e-9));
    }

    #[test]
    fn triple_balanced_cross_test() {
        let x = g("2:CyO/+ 3:TM3/+ 4:TM6B/+");
        let children = cross(&x, &x).unwrap();
        assert_eq!(27, children.len());

        let dist = summarize_offspring(&x, &x).unwrap();
        assert_eq!(8, dist.len());
        assert!(dist.iter().all(|o| !is_lethal(&o.genotype)));
        let total: f64 = dist.iter().map(|o| o.frequency).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((frequency_of(&dist, "2:CyO/+ 3:TM3/+ 4:TM6B/+") - 8.0 / 27.0).abs() < 1e-9);
        assert!((frequency_of(&dist, "2:+/+ 3:+/+ 4:+/+") - 1.0 / 27.0).abs() < 1e-9);
        assert_eq!(0.0, frequency_of(&dist, "2:CyO/CyO 3:TM3/+ 4:TM6B/+"));
        assert_eq!(0.0, frequency_of(&dist, "2:CyO/CyO 3:TM3/TM3 4:+/+"));
    }

    #[test]
    fn total_lethality_test() {
        let x = g("2:CyO/CyO");
        assert!(cross(&x, &x).unwrap().is_empty());
        assert!(summarize_offspring(&x, &x).unwrap().is_empty());
    }

    #[test]
    fn distribution_random_test() {
        let mut rng = StdRng::seed_from_u64(3);
        let alleles = ["+", "a", "CyO", "TM3", "Sb"];
        for _ in 0..200 {
            let x = random_genotype(&mut rng, &Chromosome::AUTOSOMES, &alleles);
            let y = random_genotype(&mut rng, &Chromosome::AUTOSOMES, &alleles);
            let dist = summarize_offspring(&x, &y).unwrap();
            if dist.is_empty() {
                continue;
            }
            let total: f64 = dist.iter().map(|o| o.frequency).sum();
            assert!((total - 1.0).abs() < 1e-9);
            let keys: HashSet<_> = dist.iter().map(|o| o.genotype.key()).collect();
            assert_eq!(dist.len(), keys.len());
            assert!(dist.windows(2).all(|w| w[0].frequency >= w[1].frequency));
        }
    }
}
