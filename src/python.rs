use crate::cross::summarize_offspring;
use crate::genotype::{Genotype, Stock};
use crate::rules::MarkerSet;
use crate::solvers::beam_search::{breeding_program_with, Config};
use crate::CrossError;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// (generation, female name, female genotype, male name, male genotype, offspring genotype,
/// frequency, virtual stock name)
type PyCrossStep = (
    usize,
    String,
    String,
    String,
    String,
    String,
    f64,
    Option<String>,
);

type PyBreedingPlan = PyResult<Option<(Vec<PyCrossStep>, usize, f64)>>;

fn to_py_err(e: CrossError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse(s: &str) -> PyResult<Genotype> {
    s.parse().map_err(to_py_err)
}

/// Finds a plan from `stocks`, given as `(name, genotype)` pairs, to `target`.
/// `timeout` in seconds bounds the search; the best plan found by then is returned.
#[pyfunction]
#[pyo3(signature = (stocks, target, max_generations, timeout=None))]
fn plan(
    py: Python<'_>,
    stocks: Vec<(String, String)>,
    target: &str,
    max_generations: usize,
    timeout: Option<u64>,
) -> PyBreedingPlan {
    let stocks = stocks
        .iter()
        .map(|(name, s)| Ok(Stock::new(name.clone(), parse(s)?)))
        .collect::<PyResult<Vec<_>>>()?;
    let target = parse(target)?;
    let config = Config {
        time_limit_secs: timeout,
        ..Config::default()
    };
    let (res, _) = py
        .allow_threads(|| {
            breeding_program_with(
                &stocks,
                &target,
                max_generations,
                &config,
                MarkerSet::drosophila(),
            )
        })
        .map_err(to_py_err)?;
    Ok(res.map(|plan| {
        let steps = plan
            .steps
            .iter()
            .map(|s| {
                (
                    s.generation,
                    s.female.name.clone(),
                    s.female.genotype.to_string(),
                    s.male.name.clone(),
                    s.male.genotype.to_string(),
                    s.offspring.to_string(),
                    s.frequency,
                    s.intermediate.clone(),
                )
            })
            .collect();
        (steps, plan.total_generations, plan.probability)
    }))
}

/// Offspring distribution of `female` x `male` as `(genotype, frequency)` pairs.
#[pyfunction]
fn offspring(female: &str, male: &str) -> PyResult<Vec<(String, f64)>> {
    let dist = summarize_offspring(&parse(female)?, &parse(male)?).map_err(to_py_err)?;
    Ok(dist
        .into_iter()
        .map(|o| (o.genotype.to_string(), o.frequency))
        .collect())
}

#[pymodule]
#[pyo3(name = "flycross")]
fn flycross_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(plan, m)?)?;
    m.add_function(wrap_pyfunction!(offspring, m)?)?;
    Ok(())
}
