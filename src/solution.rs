use crate::genotype::Genotype;
use crate::provenance::{CrossStep, Provenance};
use crate::rules::MarkerSet;
use serde::Serialize;
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 80;

/// A complete sequence of crosses from the initial stocks to the target genotype.
#[derive(Debug, Clone, Serialize)]
pub struct BreedingPlan {
    /// In the order the crosses must be performed.
    pub steps: Vec<CrossStep>,
    pub total_generations: usize,
    pub probability: f64,
    pub target: Genotype,
}

impl BreedingPlan {
    pub fn new(
        provenance: &Provenance,
        total_generations: usize,
        probability: f64,
        target: Genotype,
    ) -> Self {
        Self {
            steps: provenance.to_vec(),
            total_generations,
            probability,
            target,
        }
    }

    pub fn crossings(&self) -> usize {
        self.steps.len()
    }

    /// Fewer generations wins; on equal generations a strictly higher probability wins.
    pub fn is_better_than(&self, other: &BreedingPlan) -> bool {
        self.total_generations < other.total_generations
            || (self.total_generations == other.total_generations
                && self.probability > other.probability)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable plan, one block per cross, with female-role eligibility under `markers`.
    pub fn render(&self, markers: &MarkerSet) -> String {
        self.display(markers).to_string()
    }

    /// [`Display`](fmt::Display) adapter rendering against `markers`.
    pub fn display<'a>(&'a self, markers: &'a MarkerSet) -> RenderedPlan<'a> {
        RenderedPlan {
            plan: self,
            markers,
        }
    }

    fn write_to(&self, out: &mut impl Write, markers: &MarkerSet) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let yes_no = |b: bool| if b { "YES" } else { "NO" };
        writeln!(out, "{}", heavy)?;
        writeln!(out, "BREEDING PLAN TO REACH TARGET GENOTYPE")?;
        writeln!(out, "{}", heavy)?;
        writeln!(out, "Target: {}", self.target)?;
        writeln!(out, "Total generations: {}", self.total_generations)?;
        writeln!(out, "Overall success probability: {:.2}%", self.probability * 100.0)?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "CROSS {} (generation {})", i + 1, step.generation)?;
            for parent in [&step.female, &step.male] {
                writeln!(out, "  Parent: {}", parent.name)?;
                writeln!(out, "    Role: {}", parent.role)?;
                writeln!(out, "    Genotype: {}", parent.genotype)?;
                writeln!(
                    out,
                    "    Female-role eligible: {}",
                    yes_no(markers.allowed_as_female_parent(&parent.genotype))
                )?;
            }
            writeln!(
                out,
                "  Scheme: {} ({}-role) x {} ({}-role)",
                step.female.name,
                step.female.role.symbol(),
                step.male.name,
                step.male.role.symbol()
            )?;
            match &step.intermediate {
                Some(name) => {
                    writeln!(out, "  Select as virtual stock `{}`:", name)?;
                    writeln!(out, "    Genotype: {}", step.offspring)?;
                    writeln!(out, "    Frequency: ~{:.2}%", step.frequency * 100.0)?;
                    writeln!(
                        out,
                        "    Female-role eligible later: {}",
                        if markers.allowed_as_female_parent(&step.offspring) {
                            "YES"
                        } else {
                            "NO (male-role only)"
                        }
                    )?;
                }
                None => {
                    writeln!(out, "  Offspring (target):")?;
                    writeln!(out, "    Genotype: {}", step.offspring)?;
                    writeln!(out, "    Success frequency in this cross: ~{:.2}%", step.frequency * 100.0)?;
                }
            }
        }
        write!(out, "{}", heavy)
    }
}

pub struct RenderedPlan<'a> {
    plan: &'a BreedingPlan,
    markers: &'a MarkerSet,
}

impl fmt::Display for RenderedPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.plan.write_to(f, self.markers)
    }
}

impl fmt::Display for BreedingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(MarkerSet::drosophila()).fmt(f)
    }
}

/// Replaces `best` with `candidate` when there is no best yet or `candidate` is better.
/// Returns whether the replacement happened.
pub fn update_best(best: &mut Option<BreedingPlan>, candidate: BreedingPlan) -> bool {
    match best {
        Some(b) if !candidate.is_better_than(b) => false,
        _ => {
            *best = Some(candidate);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstract_stocks::{BreedingRole, Parent};

    fn plan(total_generations: usize, probability: f64) -> BreedingPlan {
        BreedingPlan {
            steps: vec![],
            total_generations,
            probability,
            target: "2:+/+".parse().unwrap(),
        }
    }

    fn two_step_plan() -> BreedingPlan {
        let parent = |name: &str, s: &str, role| Parent {
            name: name.to_owned(),
            genotype: s.parse().unwrap(),
            role,
        };
        let first = CrossStep {
            generation: 1,
            female: parent("A", "2:CyO/+ 3:+/+", BreedingRole::Female),
            male: parent("B", "2:+/+ 3:TM3/b", BreedingRole::Male),
            offspring: "2:CyO/+ 3:+/TM3".parse().unwrap(),
            frequency: 0.25,
            intermediate: Some("F1_A_x_B_F_0".to_owned()),
        };
        let last = CrossStep {
            generation: 2,
            female: parent("F1_A_x_B_F_0", "2:CyO/+ 3:+/TM3", BreedingRole::Female),
            male: parent("B", "2:+/+ 3:TM3/b", BreedingRole::Male),
            offspring: "2:+/+ 3:TM3/+".parse().unwrap(),
            frequency: 0.125,
            intermediate: None,
        };
        let provenance = Provenance::new().push(first).push(last);
        BreedingPlan::new(&provenance, 2, 0.25 * 0.125, "2:+/+ 3:TM3/+".parse().unwrap())
    }

    #[test]
    fn ordering_test() {
        assert!(plan(1, 0.1).is_better_than(&plan(2, 0.9)));
        assert!(plan(2, 0.5).is_better_than(&plan(2, 0.25)));
        assert!(!plan(2, 0.5).is_better_than(&plan(2, 0.5)));
        assert!(!plan(3, 1.0).is_better_than(&plan(2, 0.01)));
    }

    #[test]
    fn update_best_test() {
        let mut best = None;
        assert!(update_best(&mut best, plan(2, 0.25)));
        assert!(!update_best(&mut best, plan(2, 0.25)));
        assert!(!update_best(&mut best, plan(3, 0.9)));
        assert!(update_best(&mut best, plan(2, 0.5)));
        assert!(update_best(&mut best, plan(1, 0.01)));
        let best = best.unwrap();
        assert_eq!(1, best.total_generations);
        assert_eq!(0.01, best.probability);
    }

    #[test]
    fn plan_from_provenance_test() {
        let p = two_step_plan();
        assert_eq!(2, p.crossings());
        assert_eq!("A", p.steps[0].female.name);
        assert_eq!(None, p.steps[1].intermediate);
    }

    #[test]
    fn render_test() {
        let text = two_step_plan().to_string();
        assert!(text.contains("Total generations: 2"));
        assert!(text.contains("Overall success probability: 3.1"));
        assert!(text.contains("CROSS 1 (generation 1)"));
        assert!(text.contains("Select as virtual stock `F1_A_x_B_F_0`"));
        assert!(text.contains("Scheme: F1_A_x_B_F_0 (F-role) x B (M-role)"));
        assert!(text.contains("Offspring (target):"));
        // `2:+/+ 3:TM3/b` is heterozygous without a balancer
        assert!(text.contains("Female-role eligible: NO"));
        assert!(!text.contains("CROSS 3"));
    }

    #[test]
    fn render_with_markers_test() {
        let plan = two_step_plan();
        assert_eq!(plan.to_string(), plan.render(MarkerSet::drosophila()));
        let markers = MarkerSet {
            lethal: vec![],
            balancers: vec!["CyO".to_owned(), "TM3".to_owned(), "b".to_owned()],
        };
        let text = plan.render(&markers);
        assert_eq!(text, plan.display(&markers).to_string());
        assert!(!text.contains(": NO"));
    }

    #[test]
    fn json_test() {
        let json = two_step_plan().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(2, v["total_generations"]);
        assert_eq!("F", v["steps"][0]["female"]["role"]);
        assert_eq!("F1_A_x_B_F_0", v["steps"][0]["intermediate"]);
        assert!(v["steps"][1].get("intermediate").is_none());
        assert_eq!("2:+/+ 3:TM3/+", v["target"]);
    }
}
