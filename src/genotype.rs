use crate::error::{CrossError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Chromosome identifiers. The declaration order is the processing order used everywhere a
/// genotype is walked: the sex chromosome first, then the autosomes lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Chromosome {
    X,
    Two,
    Three,
    Four,
}

impl Chromosome {
    pub const AUTOSOMES: [Chromosome; 3] = [Chromosome::Two, Chromosome::Three, Chromosome::Four];

    pub fn is_autosome(self) -> bool {
        self != Chromosome::X
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Chromosome::X => "X",
            Chromosome::Two => "2",
            Chromosome::Three => "3",
            Chromosome::Four => "4",
        }
    }
}

impl FromStr for Chromosome {
    type Err = CrossError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "X" => Ok(Chromosome::X),
            "2" => Ok(Chromosome::Two),
            "3" => Ok(Chromosome::Three),
            "4" => Ok(Chromosome::Four),
            _ => Err(CrossError::UnknownChromosome(s.to_owned())),
        }
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque allele token such as `CyO`, `w1118` or `+`.
///
/// Markers are detected by substring containment, so a composite label like `w_FM7` carries
/// the `FM7` balancer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Allele(String);

impl Allele {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains_marker(&self, marker: &str) -> bool {
        self.0.contains(marker)
    }
}

impl From<&str> for Allele {
    fn from(value: &str) -> Self {
        Allele::new(value)
    }
}

impl From<String> for Allele {
    fn from(value: String) -> Self {
        Allele(value)
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type AllelePair = (Allele, Allele);

/// A diploid genotype: every chromosome present carries exactly two alleles.
///
/// `PartialEq` is positional, which keeps text round trips exact. Biological identity ignores
/// the order inside each pair and goes through [`Genotype::key`] / [`Genotype::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Genotype {
    chromosomes: BTreeMap<Chromosome, AllelePair>,
}

impl Genotype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Chromosome, (A, A))>,
        A: Into<Allele>,
    {
        Self {
            chromosomes: pairs
                .into_iter()
                .map(|(c, (a1, a2))| (c, (a1.into(), a2.into())))
                .collect(),
        }
    }

    /// Returns a copy with `chrom` set to `a1/a2`.
    pub fn with(mut self, chrom: Chromosome, a1: impl Into<Allele>, a2: impl Into<Allele>) -> Self {
        self.chromosomes.insert(chrom, (a1.into(), a2.into()));
        self
    }

    /// Builds the child of two gametes, female allele first. Chromosomes missing from either
    /// gamete are dropped; callers check chromosome sets beforehand.
    pub fn from_gametes(female: &Gamete, male: &Gamete) -> Self {
        Self {
            chromosomes: female
                .iter()
                .filter_map(|(c, a)| male.get(c).map(|b| (c, (a.clone(), b.clone()))))
                .collect(),
        }
    }

    pub fn get(&self, chrom: Chromosome) -> Option<&AllelePair> {
        self.chromosomes.get(&chrom)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Chromosome, &AllelePair)> + '_ {
        self.chromosomes.iter().map(|(c, pair)| (*c, pair))
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = Chromosome> + '_ {
        self.chromosomes.keys().copied()
    }

    pub fn same_chromosomes(&self, other: &Genotype) -> bool {
        self.chromosomes().eq(other.chromosomes())
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Whether every chromosome present is an autosome, i.e. the genotype has a text form.
    pub fn is_autosomal(&self) -> bool {
        self.chromosomes().all(Chromosome::is_autosome)
    }

    /// The text form accepted by [`FromStr`]. Genotypes carrying the sex chromosome have none.
    pub fn to_text(&self) -> Result<String> {
        match self.chromosomes().find(|c| !c.is_autosome()) {
            Some(c) => Err(CrossError::UnknownChromosome(c.to_string())),
            None => Ok(self.to_string()),
        }
    }

    pub fn is_homozygous_at(&self, chrom: Chromosome) -> bool {
        self.get(chrom).map_or(false, |(a1, a2)| a1 == a2)
    }

    pub fn n_heterozygous(&self) -> usize {
        self.chromosomes.values().filter(|(a1, a2)| a1 != a2).count()
    }

    pub fn key(&self) -> GenotypeKey {
        GenotypeKey(
            self.chromosomes
                .iter()
                .map(|(c, (a1, a2))| {
                    if a1 <= a2 {
                        (*c, a1.clone(), a2.clone())
                    } else {
                        (*c, a2.clone(), a1.clone())
                    }
                })
                .collect(),
        )
    }

    /// Unordered-pair equality per chromosome over identical chromosome sets.
    pub fn matches(&self, other: &Genotype) -> bool {
        self.same_chromosomes(other)
            && self
                .chromosomes
                .iter()
                .zip(other.chromosomes.values())
                .all(|((_, (a1, a2)), (b1, b2))| {
                    (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
                })
    }

    fn chromosome_list(&self) -> String {
        self.chromosomes().map(Chromosome::as_str).join(",")
    }
}

pub(crate) fn describe_chromosomes(x: &Genotype) -> String {
    format!("{{{}}}", x.chromosome_list())
}

/// Canonical form of a [`Genotype`]: each pair sorted, so `CyO/+` and `+/CyO` share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenotypeKey(Vec<(Chromosome, Allele, Allele)>);

impl FromStr for Genotype {
    type Err = CrossError;

    /// Parses whitespace separated `chromosome:allele1/allele2` entries over the autosomes.
    fn from_str(s: &str) -> Result<Self> {
        let mut chromosomes = BTreeMap::new();
        for entry in s.split_whitespace() {
            let (chrom, alleles) = entry
                .split_once(':')
                .ok_or_else(|| CrossError::format(entry, "expected `chromosome:allele1/allele2`"))?;
            let chrom: Chromosome = chrom.parse()?;
            if !chrom.is_autosome() {
                return Err(CrossError::UnknownChromosome(chrom.to_string()));
            }
            let (a1, a2) = alleles
                .split_once('/')
                .ok_or_else(|| CrossError::format(entry, "expected `allele1/allele2`"))?;
            if a2.contains('/') {
                return Err(CrossError::format(entry, "expected exactly two alleles"));
            }
            if a1.is_empty() || a2.is_empty() {
                return Err(CrossError::format(entry, "empty allele"));
            }
            if chromosomes
                .insert(chrom, (Allele::from(a1), Allele::from(a2)))
                .is_some()
            {
                return Err(CrossError::format(entry, "chromosome listed twice"));
            }
        }
        if chromosomes.is_empty() {
            return Err(CrossError::format(s, "no chromosome entries"));
        }
        Ok(Genotype { chromosomes })
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.chromosomes
                .iter()
                .format_with(" ", |(c, (a1, a2)), g| g(&format_args!("{}:{}/{}", c, a1, a2)))
        )
    }
}

impl TryFrom<String> for Genotype {
    type Error = CrossError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for Genotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let text = self.to_text().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

/// A haploid gamete: one allele per chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Gamete(BTreeMap<Chromosome, Allele>);

impl Gamete {
    pub fn with(&self, chrom: Chromosome, allele: Allele) -> Self {
        let mut g = self.clone();
        g.0.insert(chrom, allele);
        g
    }

    pub fn get(&self, chrom: Chromosome) -> Option<&Allele> {
        self.0.get(&chrom)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Chromosome, &Allele)> + '_ {
        self.0.iter().map(|(c, a)| (*c, a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named, owned stock as supplied by the stock collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub name: String,
    pub genotype: Genotype,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub notes: String,
}

impl Stock {
    pub fn new(name: impl Into<String>, genotype: Genotype) -> Self {
        Self {
            name: name.into(),
            genotype,
            owner: String::new(),
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::instance_generators::random_genotype;
    use rand::prelude::*;

    #[test]
    fn parse_test() {
        let x: Genotype = "2:CyO/+ 3:TM6B/+ 4:+/+".parse().unwrap();
        assert_eq!(3, x.len());
        assert_eq!(
            Some(&(Allele::from("CyO"), Allele::from("+"))),
            x.get(Chromosome::Two)
        );
        assert!(x.is_homozygous_at(Chromosome::Four));
        assert_eq!(2, x.n_heterozygous());
    }

    #[test]
    fn format_sorts_chromosomes_test() {
        let x: Genotype = "4:+/+ 2:a/b 3:c/c".parse().unwrap();
        assert_eq!("2:a/b 3:c/c 4:+/+", x.to_string());
    }

    #[test]
    fn parse_errors_test() {
        macro_rules! format_err {
            ($s:expr) => {
                assert!(
                    matches!($s.parse::<Genotype>(), Err(CrossError::Format { .. })),
                    "{} should be a format error",
                    $s
                )
            };
        }
        format_err!("2CyO/+");
        format_err!("2:CyO+");
        format_err!("2:/+");
        format_err!("2:CyO/");
        format_err!("2:a/b/c");
        format_err!("2:a/b 2:c/d");
        format_err!("   ");

        assert!(matches!(
            "2:CyO/+ 5:+/+".parse::<Genotype>(),
            Err(CrossError::UnknownChromosome(c)) if c == "5"
        ));
        assert!(matches!(
            "X:w/w 2:+/+".parse::<Genotype>(),
            Err(CrossError::UnknownChromosome(c)) if c == "X"
        ));
    }

    #[test]
    fn round_trip_random_test() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let x = random_genotype(&mut rng, &Chromosome::AUTOSOMES, &["+", "CyO", "w_FM7", "Sb"]);
            let s = x.to_string();
            let y: Genotype = s.parse().unwrap();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn unordered_equality_test() {
        let x: Genotype = "2:CyO/+ 3:+/+".parse().unwrap();
        let y: Genotype = "2:+/CyO 3:+/+".parse().unwrap();
        let z: Genotype = "2:CyO/CyO 3:+/+".parse().unwrap();
        assert_ne!(x, y);
        assert!(x.matches(&y));
        assert_eq!(x.key(), y.key());
        assert!(!x.matches(&z));
        assert_ne!(x.key(), z.key());

        let w: Genotype = "2:CyO/+".parse().unwrap();
        assert!(!x.matches(&w));
    }

    #[test]
    fn sex_chromosome_sorts_first_test() {
        let x = Genotype::new()
            .with(Chromosome::Three, "+", "+")
            .with(Chromosome::X, "w", "w")
            .with(Chromosome::Two, "CyO", "+");
        assert_eq!(
            vec![Chromosome::X, Chromosome::Two, Chromosome::Three],
            x.chromosomes().collect::<Vec<_>>()
        );
        assert_eq!("X:w/w 2:CyO/+ 3:+/+", x.to_string());
    }

    #[test]
    fn from_gametes_test() {
        let gf = Gamete::default()
            .with(Chromosome::Two, "CyO".into())
            .with(Chromosome::Three, "+".into());
        let gm = Gamete::default()
            .with(Chromosome::Two, "+".into())
            .with(Chromosome::Three, "TM3".into());
        let z = Genotype::from_gametes(&gf, &gm);
        assert_eq!("2:CyO/+ 3:+/TM3", z.to_string());
    }

    #[test]
    fn serde_as_text_test() {
        let stock = Stock::new("BL-1", "2:CyO/+ 3:+/+".parse().unwrap());
        let s = serde_json::to_string(&stock).unwrap();
        assert!(s.contains("\"2:CyO/+ 3:+/+\""));
        let back: Stock = serde_json::from_str(&s).unwrap();
        assert_eq!(stock, back);
    }

    #[test]
    fn sex_chromosome_has_no_text_form_test() {
        let x: Genotype = "2:+/+".parse().unwrap();
        assert!(x.is_autosomal());
        assert_eq!("2:+/+", x.to_text().unwrap());

        let y = x.with(Chromosome::X, "w", "+");
        assert!(!y.is_autosomal());
        assert!(matches!(
            y.to_text(),
            Err(CrossError::UnknownChromosome(c)) if c == "X"
        ));
        assert!(serde_json::to_string(&Stock::new("S", y)).is_err());
    }

    #[test]
    fn from_pairs_test() {
        let x = Genotype::from_pairs([
            (Chromosome::Three, ("TM3", "+")),
            (Chromosome::Two, ("+", "+")),
        ]);
        assert_eq!("2:+/+ 3:TM3/+", x.to_string());
    }
}
