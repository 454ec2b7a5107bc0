use crate::cross::Offspring;
use crate::genotype::{Gamete, Genotype, Stock};
use crate::provenance::{CrossStep, Provenance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The part a genotype plays in one mating. Not a property of the genotype itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BreedingRole {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

impl BreedingRole {
    pub fn symbol(self) -> &'static str {
        match self {
            BreedingRole::Female => "F",
            BreedingRole::Male => "M",
        }
    }
}

impl fmt::Display for BreedingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreedingRole::Female => write!(f, "F (female)"),
            BreedingRole::Male => write!(f, "M (male)"),
        }
    }
}

/// Produces the gametes a genotype can contribute when playing `role`.
///
/// This is where role dependent recombination plugs in; callers only ever see the gamete set.
pub trait GameteModel: fmt::Debug {
    fn gametes(&self, x: &Genotype, role: BreedingRole) -> Vec<Gamete>;
}

/// One parent of a recorded mating.
#[derive(Debug, Clone, Serialize)]
pub struct Parent {
    pub name: String,
    pub genotype: Genotype,
    pub role: BreedingRole,
}

impl Parent {
    /// Same name and role, and biologically equal genotype.
    pub fn same_as(&self, other: &Parent) -> bool {
        self.name == other.name && self.role == other.role && self.genotype.matches(&other.genotype)
    }
}

/// A virtual stock: a genotype reachable from the initial stocks together with the
/// probability and the crosses that produced it.
#[derive(Debug, Clone)]
pub struct BreedingState {
    pub name: String,
    pub genotype: Genotype,
    pub role: BreedingRole,
    pub route_probability: f64,
    pub provenance: Provenance,
}

impl BreedingState {
    pub fn from_stock(stock: &Stock) -> Self {
        Self {
            name: stock.name.clone(),
            genotype: stock.genotype.clone(),
            role: BreedingRole::Male,
            route_probability: 1.0,
            provenance: Provenance::new(),
        }
    }

    pub fn as_parent(&self, role: BreedingRole) -> Parent {
        Parent {
            name: self.name.clone(),
            genotype: self.genotype.clone(),
            role,
        }
    }
}

/// The offspring distribution of one mating, with the route probability and provenance shared
/// by every member.
#[derive(Debug, Clone)]
pub struct Brood {
    pub id: usize,
    pub generation: usize,
    pub female: Parent,
    pub male: Parent,
    pub route_probability: f64,
    pub provenance: Provenance,
    pub offspring: Vec<Offspring>,
}

impl Brood {
    /// Records this mating as a step selecting `genotype` at `frequency`.
    pub fn step(&self, genotype: Genotype, frequency: f64, intermediate: Option<String>) -> CrossStep {
        CrossStep {
            generation: self.generation,
            female: self.female.clone(),
            male: self.male.clone(),
            offspring: genotype,
            frequency,
            intermediate,
        }
    }

    /// Offspring in distribution order, paired with their index in the brood.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &Offspring)> + Clone + '_ {
        self.offspring.iter().enumerate()
    }
}
