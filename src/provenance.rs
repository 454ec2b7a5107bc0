//! Cross history shared between virtual stocks.
//!
//! A [`Provenance`] is a persistent list of [`CrossStep`]s: pushing a step allocates one link and
//! shares everything older with the parent history, so thousands of states descending from the
//! same few crosses hold one copy of that history.

use crate::abstract_stocks::Parent;
use crate::genotype::Genotype;
use serde::Serialize;
use std::rc::Rc;

/// One mating in a plan, with the offspring selected from it.
#[derive(Debug, Clone, Serialize)]
pub struct CrossStep {
    pub generation: usize,
    pub female: Parent,
    pub male: Parent,
    pub offspring: Genotype,
    pub frequency: f64,
    /// Name of the sibling pick this step produces, if it is not the final cross.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<String>,
}

impl PartialEq for CrossStep {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.female.same_as(&other.female)
            && self.male.same_as(&other.male)
            && self.offspring.matches(&other.offspring)
            && self.frequency == other.frequency
            && self.intermediate == other.intermediate
    }
}

#[derive(Debug)]
struct Link {
    step: CrossStep,
    prev: Option<Rc<Link>>,
}

/// Ordered cross history, oldest step first.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    head: Option<Rc<Link>>,
    len: usize,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A new history with `step` appended; `self` is left untouched.
    pub fn push(&self, step: CrossStep) -> Self {
        Self {
            head: Some(Rc::new(Link {
                step,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn extend<I: IntoIterator<Item = CrossStep>>(&self, steps: I) -> Self {
        steps.into_iter().fold(self.clone(), |p, step| p.push(step))
    }

    pub fn latest(&self) -> Option<&CrossStep> {
        self.head.as_deref().map(|link| &link.step)
    }

    /// Steps newest first.
    pub fn iter_rev(&self) -> ProvenanceIter<'_> {
        ProvenanceIter {
            link: self.head.as_deref(),
        }
    }

    /// Steps oldest first.
    pub fn to_vec(&self) -> Vec<CrossStep> {
        let mut steps: Vec<CrossStep> = self.iter_rev().cloned().collect();
        steps.reverse();
        steps
    }

    pub fn ptr_eq(&self, other: &Provenance) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Combines the histories of two parents: the longest common prefix once, then the rest of
    /// `self`, then the rest of `other`. A history that is a prefix of the other contributes
    /// nothing extra.
    pub fn merge(&self, other: &Provenance) -> Provenance {
        if self.ptr_eq(other) {
            return self.clone();
        }
        let a = self.links();
        let b = other.links();
        let shared = a
            .iter()
            .zip(b.iter())
            .take_while(|(x, y)| std::ptr::eq(**x, **y) || x.step == y.step)
            .count();
        if shared == a.len() {
            return other.clone();
        }
        self.extend(b[shared..].iter().map(|link| link.step.clone()))
    }

    /// Links oldest first.
    fn links(&self) -> Vec<&Link> {
        let mut links = Vec::with_capacity(self.len);
        let mut cur = self.head.as_deref();
        while let Some(link) = cur {
            links.push(link);
            cur = link.prev.as_deref();
        }
        links.reverse();
        links
    }
}

impl PartialEq for Provenance {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter_rev().zip(other.iter_rev()).all(|(a, b)| a == b)
    }
}

pub struct ProvenanceIter<'a> {
    link: Option<&'a Link>,
}

impl<'a> Iterator for ProvenanceIter<'a> {
    type Item = &'a CrossStep;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.link?;
        self.link = link.prev.as_deref();
        Some(&link.step)
    }
}

impl Serialize for Provenance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}
