//! Viability and eligibility rules.
//!
//! Marker detection is substring based: an allele carries a marker when the marker name occurs
//! anywhere in its label, so composite labels such as `w_FM7` or `CyO,Cy` keep the semantics of
//! the markers they embed.

use crate::error::{CrossError, Inadmissibility, Result};
use crate::genotype::{Allele, Genotype};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DROSOPHILA_LETHAL: [&str; 6] = ["Sp", "CyO", "TM6B", "TM3", "MKRS", "Pin"];
pub const DROSOPHILA_BALANCERS: [&str; 5] = ["FM7", "CyO", "TM6B", "TM3", "MKRS"];

/// The lethality and balancer markers a lab works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    /// Markers that kill the fly when carried on both alleles of one chromosome.
    pub lethal: Vec<String>,
    /// Rearrangements that suppress recombination when heterozygous.
    pub balancers: Vec<String>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            lethal: DROSOPHILA_LETHAL.iter().map(|m| m.to_string()).collect(),
            balancers: DROSOPHILA_BALANCERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl MarkerSet {
    /// The default Drosophila marker set, shared by the free functions of this module.
    pub fn drosophila() -> &'static MarkerSet {
        static DROSOPHILA: OnceLock<MarkerSet> = OnceLock::new();
        DROSOPHILA.get_or_init(MarkerSet::default)
    }

    pub fn is_lethal(&self, x: &Genotype) -> bool {
        homozygous_marker(x, &self.lethal)
    }

    pub fn has_balancer(&self, allele: &Allele) -> bool {
        self.balancers.iter().any(|m| allele.contains_marker(m))
    }

    pub fn has_homozygous_balancer(&self, x: &Genotype) -> bool {
        homozygous_marker(x, &self.balancers)
    }

    pub fn admissibility(&self, x: &Genotype) -> std::result::Result<(), Inadmissibility> {
        if self.is_lethal(x) {
            return Err(Inadmissibility::Lethal);
        }
        if self.has_homozygous_balancer(x) {
            return Err(Inadmissibility::HomozygousBalancer);
        }
        Ok(())
    }

    /// Admission check for anything used as a stock, parent or target. `context` names the
    /// genotype's role in the error.
    pub fn validate_stock_genotype(&self, x: &Genotype, context: &str) -> Result<()> {
        self.admissibility(x)
            .map_err(|reason| CrossError::Inadmissible {
                context: context.to_owned(),
                genotype: x.to_string(),
                reason,
            })
    }

    /// Every autosome must be homozygous or carry a balancer on at least one allele.
    /// Any genotype may take the male role.
    pub fn allowed_as_female_parent(&self, x: &Genotype) -> bool {
        x.iter()
            .filter(|(c, _)| c.is_autosome())
            .all(|(_, (a1, a2))| a1 == a2 || self.has_balancer(a1) || self.has_balancer(a2))
    }
}

fn homozygous_marker(x: &Genotype, markers: &[String]) -> bool {
    x.iter().any(|(_, (a1, a2))| {
        markers
            .iter()
            .any(|m| a1.contains_marker(m) && a2.contains_marker(m))
    })
}

pub fn is_lethal(x: &Genotype) -> bool {
    MarkerSet::drosophila().is_lethal(x)
}

pub fn has_balancer(allele: &Allele) -> bool {
    MarkerSet::drosophila().has_balancer(allele)
}

pub fn has_homozygous_balancer(x: &Genotype) -> bool {
    MarkerSet::drosophila().has_homozygous_balancer(x)
}

pub fn validate_stock_genotype(x: &Genotype, context: &str) -> Result<()> {
    MarkerSet::drosophila().validate_stock_genotype(x, context)
}

pub fn allowed_as_female_parent(x: &Genotype) -> bool {
    MarkerSet::drosophila().allowed_as_female_parent(x)
}
