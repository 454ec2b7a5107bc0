//! Generation-bounded beam search for a breeding plan.
//!
//! Each generation crosses every pair drawn from the initial stocks and the virtual stocks of the
//! previous generation, checks every brood for the target, and seeds the next generation with the
//! most probable offspring. Sibling crosses between two offspring of one brood from the previous
//! generation are tried as well. Only the widest `state_width` states and `brood_width` broods
//! survive a generation, so the search is a heuristic: a plan that would need a pruned state is
//! never found.

use crate::abstract_stocks::{BreedingRole, BreedingState, Brood, GameteModel, Parent};
use crate::cross::{CrossEngine, Offspring};
use crate::error::{CrossError, Result};
use crate::genotype::{Genotype, GenotypeKey, Stock};
use crate::provenance::CrossStep;
use crate::rules::MarkerSet;
use crate::solution::{update_best, BreedingPlan};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Search widths and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Virtual stocks kept per generation.
    pub state_width: usize,
    /// Broods kept per generation for sibling crosses.
    pub brood_width: usize,
    /// Offspring classes of one brood turned into virtual stocks.
    pub offspring_cap: usize,
    /// Sibling candidates per role within one brood.
    pub sibling_cap: usize,
    /// Wall-clock limit; the best plan found so far is returned when it fires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_width: 30,
            brood_width: 50,
            offspring_cap: 20,
            sibling_cap: 20,
            time_limit_secs: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("state_width", self.state_width),
            ("brood_width", self.brood_width),
            ("offspring_cap", self.offspring_cap),
            ("sibling_cap", self.sibling_cap),
        ] {
            if value == 0 {
                return Err(CrossError::Configuration(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Output {
    generations: usize,
    broods_created: usize,
    states_kept: usize,
    candidate_plans: usize,
    timed_out: bool,
}

impl Output {
    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn broods_created(&self) -> usize {
        self.broods_created
    }

    /// Virtual stocks surviving pruning, summed over generations.
    pub fn states_kept(&self) -> usize {
        self.states_kept
    }

    pub fn candidate_plans(&self) -> usize {
        self.candidate_plans
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

/// Finds the best plan reaching `target` within `max_generations` crosses using the default
/// widths and Drosophila markers. `Ok(None)` when no plan exists within the bound.
pub fn breeding_program(
    stocks: &[Stock],
    target: &Genotype,
    max_generations: usize,
) -> Result<Option<BreedingPlan>> {
    breeding_program_with(
        stocks,
        target,
        max_generations,
        &Config::default(),
        MarkerSet::drosophila(),
    )
    .map(|(plan, _)| plan)
}

pub fn breeding_program_with(
    stocks: &[Stock],
    target: &Genotype,
    max_generations: usize,
    config: &Config,
    markers: &MarkerSet,
) -> Result<(Option<BreedingPlan>, Output)> {
    breeding_program_with_engine(
        stocks,
        target,
        max_generations,
        config,
        &CrossEngine::new(markers),
    )
}

pub fn breeding_program_with_engine<K: GameteModel>(
    stocks: &[Stock],
    target: &Genotype,
    max_generations: usize,
    config: &Config,
    engine: &CrossEngine<'_, K>,
) -> Result<(Option<BreedingPlan>, Output)> {
    if max_generations == 0 {
        return Err(CrossError::Configuration(
            "max_generations must be at least 1".to_owned(),
        ));
    }
    config.validate()?;
    let markers = engine.markers();
    markers.validate_stock_genotype(target, "target genotype")?;
    for stock in stocks {
        markers.validate_stock_genotype(&stock.genotype, &format!("input stock '{}'", stock.name))?;
    }

    let mut search = Search::new(engine, config, target, max_generations);
    let best = search.run(stocks)?;
    Ok((best, search.output))
}

struct Search<'a, K: GameteModel> {
    engine: &'a CrossEngine<'a, K>,
    config: &'a Config,
    target: &'a Genotype,
    max_generations: usize,
    deadline: Option<Instant>,
    brood_counter: usize,
    output: Output,
}

impl<'a, K: GameteModel> Search<'a, K> {
    fn new(
        engine: &'a CrossEngine<'a, K>,
        config: &'a Config,
        target: &'a Genotype,
        max_generations: usize,
    ) -> Self {
        Self {
            engine,
            config,
            target,
            max_generations,
            deadline: config
                .time_limit_secs
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
            brood_counter: 0,
            output: Output::default(),
        }
    }

    fn markers(&self) -> &'a MarkerSet {
        self.engine.markers()
    }

    fn out_of_time(&mut self) -> bool {
        if self.output.timed_out {
            return true;
        }
        if self.deadline.map_or(false, |d| Instant::now() >= d) {
            warn!("time limit reached, returning the best plan found so far");
            self.output.timed_out = true;
        }
        self.output.timed_out
    }

    fn run(&mut self, stocks: &[Stock]) -> Result<Option<BreedingPlan>> {
        let initial: Vec<BreedingState> = stocks.iter().map(BreedingState::from_stock).collect();
        let mut previous_states: Vec<BreedingState> = vec![];
        let mut previous_broods: Vec<Brood> = vec![];
        let mut best: Option<BreedingPlan> = None;

        for generation in 1..=self.max_generations {
            self.output.generations = generation;
            let pool: Vec<&BreedingState> = initial.iter().chain(previous_states.iter()).collect();
            let mut next_states: Vec<BreedingState> = vec![];
            let mut broods: Vec<Brood> = vec![];
            let mut plans: Vec<BreedingPlan> = vec![];

            'pairs: for (i, &s1) in pool.iter().enumerate() {
                for &s2 in &pool[i..] {
                    if self.out_of_time() {
                        break 'pairs;
                    }
                    if !s1.genotype.same_chromosomes(&s2.genotype) {
                        continue;
                    }
                    for (female, male) in orientations(self.markers(), s1, s2) {
                        let offspring = self
                            .engine
                            .summarize_offspring(&female.genotype, &male.genotype)?;
                        if offspring.is_empty() {
                            continue;
                        }
                        let brood = self.new_brood(generation, female, male, offspring);
                        plans.extend(self.target_plan(&brood));
                        if generation < self.max_generations {
                            next_states.extend(self.expand(&brood));
                        }
                        broods.push(brood);
                    }
                }
            }

            for brood in &previous_broods {
                if self.out_of_time() {
                    break;
                }
                plans.extend(self.sibling_plans(brood, generation)?);
            }

            let n_broods = broods.len();
            let n_states = next_states.len();
            let next_states = prune_states(next_states, self.config.state_width);
            prune_broods(&mut broods, self.config.brood_width);
            debug!(
                "generation {}: pruned {} states to {} and {} broods to {}",
                generation,
                n_states,
                next_states.len(),
                n_broods,
                broods.len()
            );
            self.output.states_kept += next_states.len();

            for plan in plans {
                self.output.candidate_plans += 1;
                debug!(
                    "candidate plan: {} crosses, generation {}, probability {:.6}",
                    plan.crossings(),
                    plan.total_generations,
                    plan.probability
                );
                update_best(&mut best, plan);
            }

            info!(
                "generation {}: pool {}, broods {}, states kept {}, best {}",
                generation,
                pool.len(),
                n_broods,
                next_states.len(),
                best.as_ref().map_or("none".to_owned(), |p| format!(
                    "{:.6} at generation {}",
                    p.probability, p.total_generations
                ))
            );

            if self.output.timed_out {
                break;
            }
            previous_states = next_states;
            previous_broods = broods;
        }
        Ok(best)
    }

    fn new_brood(
        &mut self,
        generation: usize,
        female: &BreedingState,
        male: &BreedingState,
        offspring: Vec<Offspring>,
    ) -> Brood {
        let id = self.brood_counter;
        self.brood_counter += 1;
        self.output.broods_created += 1;
        Brood {
            id,
            generation,
            female: female.as_parent(BreedingRole::Female),
            male: male.as_parent(BreedingRole::Male),
            route_probability: female.route_probability * male.route_probability,
            provenance: female.provenance.merge(&male.provenance),
            offspring,
        }
    }

    /// The plan finishing with this brood, if it contains the target.
    fn target_plan(&self, brood: &Brood) -> Option<BreedingPlan> {
        let hit = brood
            .offspring
            .iter()
            .find(|o| o.genotype.matches(self.target))?;
        let last = brood.step(self.target.clone(), hit.frequency, None);
        Some(BreedingPlan::new(
            &brood.provenance.push(last),
            brood.generation,
            brood.route_probability * hit.frequency,
            self.target.clone(),
        ))
    }

    /// Virtual stocks for the next generation: a male-role state for each of the most frequent
    /// viable offspring classes, plus a female-role state where the genotype allows it.
    fn expand(&self, brood: &Brood) -> Vec<BreedingState> {
        let markers = self.markers();
        let mut states = vec![];
        for (j, o) in brood.ranked().take(self.config.offspring_cap) {
            if markers.is_lethal(&o.genotype) {
                continue;
            }
            let mut roles = vec![BreedingRole::Male];
            if markers.allowed_as_female_parent(&o.genotype) {
                roles.push(BreedingRole::Female);
            }
            for role in roles {
                let name = format!(
                    "F{}_{}_x_{}_{}_{}",
                    brood.generation,
                    brood.female.name,
                    brood.male.name,
                    role.symbol(),
                    j
                );
                let step = brood.step(o.genotype.clone(), o.frequency, Some(name.clone()));
                states.push(BreedingState {
                    name,
                    genotype: o.genotype.clone(),
                    role,
                    route_probability: brood.route_probability * o.frequency,
                    provenance: brood.provenance.push(step),
                });
            }
        }
        states
    }

    /// Plans crossing two distinct offspring classes of `brood`, finishing at `generation`.
    fn sibling_plans(&self, brood: &Brood, generation: usize) -> Result<Vec<BreedingPlan>> {
        let markers = self.markers();
        let viable: Vec<(usize, &Offspring)> = brood
            .ranked()
            .filter(|(_, o)| !markers.is_lethal(&o.genotype))
            .collect();
        let females: Vec<(usize, &Offspring)> = viable
            .iter()
            .copied()
            .filter(|(_, o)| markers.allowed_as_female_parent(&o.genotype))
            .take(self.config.sibling_cap)
            .collect();
        let males: Vec<(usize, &Offspring)> =
            viable.iter().copied().take(self.config.sibling_cap).collect();

        let mut plans = vec![];
        for &(fi, f) in &females {
            for &(mi, m) in &males {
                if fi == mi {
                    continue;
                }
                let dist = self.engine.summarize_offspring(&f.genotype, &m.genotype)?;
                let Some(child) = dist.iter().find(|c| c.genotype.matches(self.target)) else {
                    continue;
                };
                let female_name = format!("F{}_brood_{}_sibF_{}", brood.generation, brood.id, fi);
                let male_name = format!("F{}_brood_{}_sibM_{}", brood.generation, brood.id, mi);
                let last = CrossStep {
                    generation,
                    female: Parent {
                        name: female_name.clone(),
                        genotype: f.genotype.clone(),
                        role: BreedingRole::Female,
                    },
                    male: Parent {
                        name: male_name.clone(),
                        genotype: m.genotype.clone(),
                        role: BreedingRole::Male,
                    },
                    offspring: self.target.clone(),
                    frequency: child.frequency,
                    intermediate: None,
                };
                let provenance = brood
                    .provenance
                    .push(brood.step(f.genotype.clone(), f.frequency, Some(female_name)))
                    .push(brood.step(m.genotype.clone(), m.frequency, Some(male_name)))
                    .push(last);
                plans.push(BreedingPlan::new(
                    &provenance,
                    generation,
                    brood.route_probability * f.frequency * m.frequency * child.frequency,
                    self.target.clone(),
                ));
            }
        }
        Ok(plans)
    }
}

/// Valid (female, male) assignments for a pair; a state paired with itself yields one at most.
fn orientations<'s>(
    markers: &MarkerSet,
    s1: &'s BreedingState,
    s2: &'s BreedingState,
) -> Vec<(&'s BreedingState, &'s BreedingState)> {
    let mut pairs = Vec::with_capacity(2);
    if markers.allowed_as_female_parent(&s1.genotype) {
        pairs.push((s1, s2));
    }
    if !std::ptr::eq(s1, s2) && markers.allowed_as_female_parent(&s2.genotype) {
        pairs.push((s2, s1));
    }
    pairs
}

/// Collapses states with the same canonical genotype and role, keeping the most probable, then
/// keeps the `width` most probable overall. Ties keep their earlier position.
fn prune_states(states: Vec<BreedingState>, width: usize) -> Vec<BreedingState> {
    let mut index: HashMap<(GenotypeKey, BreedingRole), usize> = HashMap::new();
    let mut kept: Vec<BreedingState> = vec![];
    for s in states {
        match index.entry((s.genotype.key(), s.role)) {
            Entry::Occupied(e) => {
                let k = &mut kept[*e.get()];
                if s.route_probability > k.route_probability {
                    *k = s;
                }
            }
            Entry::Vacant(e) => {
                e.insert(kept.len());
                kept.push(s);
            }
        }
    }
    kept.sort_by(|a, b| b.route_probability.total_cmp(&a.route_probability));
    kept.truncate(width);
    kept
}

fn prune_broods(broods: &mut Vec<Brood>, width: usize) {
    broods.sort_by(|a, b| b.route_probability.total_cmp(&a.route_probability));
    broods.truncate(width);
}
