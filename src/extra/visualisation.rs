use std::io;
use svg::node::element::{Group, Rectangle, Text};
use svg::Document;

use crate::genotype::{Allele, Chromosome, Genotype};
use crate::rules::MarkerSet;
use crate::solution::BreedingPlan;

pub const CELL_WIDTH: usize = 70;
pub const CELL_HEIGHT: usize = 18;
const ROW_HEIGHT: usize = 3 * CELL_HEIGHT;
const FONT_SIZE: usize = 11;

pub trait Draw {
    /// Returns (width, height) of the viewBox needed to contain self.
    fn view_box_size(&self) -> Option<(usize, usize)>;

    fn draw(&self) -> Group;

    fn draw_to_file(&self, s: &str) -> io::Result<()> {
        let out = match self.view_box_size() {
            None => Document::new().add(self.draw()),
            Some((w, h)) => Document::new()
                .set("viewBox", (0, 0, w, h))
                .add(self.draw()),
        };
        svg::save(s, &out)
    }
}

fn allele_colour(allele: &Allele, markers: &MarkerSet) -> &'static str {
    if allele.as_str() == "+" {
        "white"
    } else if markers.has_balancer(allele) {
        "orange"
    } else if markers.lethal.iter().any(|m| allele.contains_marker(m)) {
        "tomato"
    } else {
        "lightblue"
    }
}

fn label(content: String, x: usize, y: usize) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("font-size", FONT_SIZE)
        .set("font-family", "monospace")
        .set("text-anchor", "middle")
}

fn draw_allele(chrom: Chromosome, allele: &Allele, markers: &MarkerSet, offset: (usize, usize)) -> Group {
    Group::new()
        .add(
            Rectangle::new()
                .set("width", CELL_WIDTH)
                .set("height", CELL_HEIGHT)
                .set("x", offset.0)
                .set("y", offset.1)
                .set("stroke", "black")
                .set("fill", allele_colour(allele, markers)),
        )
        .add(label(
            format!("{}:{}", chrom, allele),
            offset.0 + CELL_WIDTH / 2,
            offset.1 + CELL_HEIGHT - 5,
        ))
}

/// One column per chromosome, the two homologues stacked.
pub fn draw_genotype(x: &Genotype, markers: &MarkerSet, offset: (usize, usize)) -> Group {
    x.iter()
        .enumerate()
        .fold(Group::new(), |g, (i, (c, (a1, a2)))| {
            let px = offset.0 + i * CELL_WIDTH;
            g.add(draw_allele(c, a1, markers, (px, offset.1)))
                .add(draw_allele(c, a2, markers, (px, offset.1 + CELL_HEIGHT)))
        })
}

fn plan_columns(plan: &BreedingPlan) -> usize {
    plan.steps
        .iter()
        .flat_map(|s| [s.female.genotype.len(), s.male.genotype.len(), s.offspring.len()])
        .max()
        .unwrap_or(plan.target.len())
        + 1
}

/// One row per cross: female parent, male parent, selected offspring.
pub fn draw_plan(plan: &BreedingPlan, markers: &MarkerSet) -> Group {
    let column = plan_columns(plan) * CELL_WIDTH;
    plan.steps
        .iter()
        .enumerate()
        .fold(Group::new(), |g, (i, step)| {
            let y = i * ROW_HEIGHT + CELL_HEIGHT / 2;
            g.add(draw_genotype(&step.female.genotype, markers, (0, y)))
                .add(draw_genotype(&step.male.genotype, markers, (column, y)))
                .add(draw_genotype(&step.offspring, markers, (2 * column, y)))
                .add(label(
                    "x".to_owned(),
                    column - CELL_WIDTH / 2,
                    y + CELL_HEIGHT + FONT_SIZE / 2,
                ))
                .add(label(
                    format!("{:.1}%", step.frequency * 100.0),
                    2 * column - CELL_WIDTH / 2,
                    y + CELL_HEIGHT + FONT_SIZE / 2,
                ))
        })
}

impl Draw for Genotype {
    fn view_box_size(&self) -> Option<(usize, usize)> {
        Some((self.len() * CELL_WIDTH, 2 * CELL_HEIGHT))
    }

    fn draw(&self) -> Group {
        draw_genotype(self, MarkerSet::drosophila(), (0, 0))
    }
}

impl Draw for BreedingPlan {
    fn view_box_size(&self) -> Option<(usize, usize)> {
        Some((
            3 * plan_columns(self) * CELL_WIDTH,
            self.steps.len().max(1) * ROW_HEIGHT,
        ))
    }

    fn draw(&self) -> Group {
        draw_plan(self, MarkerSet::drosophila())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::Stock;
    use crate::solvers::beam_search::breeding_program;

    #[test]
    fn colour_test() {
        let markers = MarkerSet::default();
        assert_eq!("white", allele_colour(&Allele::from("+"), &markers));
        assert_eq!("orange", allele_colour(&Allele::from("CyO"), &markers));
        assert_eq!("tomato", allele_colour(&Allele::from("Sp"), &markers));
        assert_eq!("lightblue", allele_colour(&Allele::from("w1118"), &markers));
    }

    #[test]
    fn genotype_view_box_test() {
        let x: Genotype = "2:CyO/+ 3:TM3/+".parse().unwrap();
        assert_eq!(Some((2 * CELL_WIDTH, 2 * CELL_HEIGHT)), x.view_box_size());
    }

    #[test]
    fn draw_plan_to_file_test() {
        let stocks = vec![
            Stock::new("A", "2:CyO/+ 3:+/+".parse().unwrap()),
            Stock::new("B", "2:+/+ 3:TM3/+".parse().unwrap()),
        ];
        let plan = breeding_program(&stocks, &"2:CyO/+ 3:TM3/+".parse().unwrap(), 1)
            .unwrap()
            .unwrap();
        assert_eq!(Some((3 * 3 * CELL_WIDTH, ROW_HEIGHT)), plan.view_box_size());

        let path = std::env::temp_dir().join(format!("flycross_plan_{}.svg", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        plan.draw_to_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(contents.contains("<svg"));
        assert!(contents.contains("viewBox"));
        assert!(contents.contains("2:CyO"));
        assert!(contents.contains("25.0%"));
    }
}
