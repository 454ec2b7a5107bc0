//! flycross - command line entry point.
//!
//! Plans Drosophila crosses from a stock collection to a target genotype.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flycross::config::PlannerConfig;
use flycross::cross::CrossEngine;
use flycross::extra::stocks::StockCollection;
use flycross::extra::visualisation::draw_plan;
use flycross::genotype::{Genotype, Stock};
use flycross::rules::MarkerSet;
use flycross::solvers::beam_search::breeding_program_with;
use log::{info, warn};
use std::path::PathBuf;
use svg::Document;

#[derive(Parser)]
#[command(name = "flycross")]
#[command(version)]
#[command(about = "Plans Drosophila crosses from lab stocks to a target genotype")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a crossing plan
    Plan {
        /// Stock collection (TOML)
        #[arg(short, long)]
        stocks: Option<PathBuf>,

        /// Stocks to start from; every stock in the collection when neither this nor
        /// --genotype is given
        #[arg(short, long = "use", value_name = "NAME", num_args = 1.., requires = "stocks")]
        use_stocks: Vec<String>,

        /// Extra parents typed as genotypes, named "Custom Stock 1", "Custom Stock 2", ...
        #[arg(short, long = "genotype", value_name = "TEXT")]
        genotypes: Vec<String>,

        /// Target genotype, e.g. "2:CyO/+ 3:TM3/+"
        #[arg(short, long)]
        target: String,

        /// Maximum number of generations, overrides the configuration file
        #[arg(short, long)]
        max_generations: Option<usize>,

        /// Planner configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Also draw the plan to this SVG file
        #[arg(long = "svg", value_name = "FILE")]
        svg_file: Option<PathBuf>,
    },

    /// Print the offspring distribution of one cross
    Cross {
        #[arg(short, long)]
        female: String,

        #[arg(short, long)]
        male: String,

        /// Planner configuration (TOML), for its marker set
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List a stock collection
    Stocks {
        #[arg(short, long)]
        stocks: PathBuf,

        /// Planner configuration (TOML), for its marker set
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Add a stock to a collection, creating the file if needed
    AddStock {
        #[arg(short, long)]
        stocks: PathBuf,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        genotype: String,

        #[arg(short, long, default_value = "")]
        owner: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Planner configuration (TOML), for its marker set
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration file
    InitConfig {
        #[arg(short, long, default_value = "flycross.toml")]
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PlannerConfig> {
    match path {
        None => Ok(PlannerConfig::default()),
        Some(p) => PlannerConfig::load_from_file(p)
            .with_context(|| format!("loading configuration {}", p.display())),
    }
}

/// The `F-role` column of the stock listing.
fn female_role_column(markers: &MarkerSet, genotype: &Genotype) -> String {
    match markers.admissibility(genotype) {
        Err(reason) => format!("({})", reason),
        Ok(()) if markers.allowed_as_female_parent(genotype) => "yes".to_owned(),
        Ok(()) => "no".to_owned(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            stocks,
            use_stocks,
            genotypes,
            target,
            max_generations,
            config,
            json,
            svg_file,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(n) = max_generations {
                config.max_generations = n;
            }
            config.validate()?;

            let mut selected = match &stocks {
                None => vec![],
                Some(path) => {
                    let collection = StockCollection::load_from_file(path)
                        .with_context(|| format!("loading stocks {}", path.display()))?;
                    if use_stocks.is_empty() && genotypes.is_empty() {
                        collection.as_slice().to_vec()
                    } else {
                        collection.select(use_stocks.as_slice())?
                    }
                }
            };
            for (i, text) in genotypes.iter().enumerate() {
                let genotype: Genotype = text
                    .parse()
                    .with_context(|| format!("parsing parent genotype `{}`", text))?;
                let mut custom = Stock::new(format!("Custom Stock {}", i + 1), genotype);
                custom.owner = "manual".to_owned();
                selected.push(custom);
            }
            if selected.is_empty() {
                bail!("no stocks to plan from");
            }
            let target: Genotype = target.parse().context("parsing target genotype")?;
            info!(
                "planning from {} stocks to {} within {} generations",
                selected.len(),
                target,
                config.max_generations
            );

            let (plan, output) = breeding_program_with(
                &selected,
                &target,
                config.max_generations,
                &config.search,
                &config.markers,
            )?;
            info!(
                "{} broods, {} candidate plans{}",
                output.broods_created(),
                output.candidate_plans(),
                if output.timed_out() { ", time limit reached" } else { "" }
            );

            match plan {
                None => println!(
                    "No breeding plan found within {} generations.",
                    config.max_generations
                ),
                Some(plan) => {
                    if json {
                        println!("{}", plan.to_json()?);
                    } else {
                        println!("{}", plan.render(&config.markers));
                    }
                    if let Some(path) = svg_file {
                        let doc = Document::new().add(draw_plan(&plan, &config.markers));
                        svg::save(&path, &doc)
                            .with_context(|| format!("writing {}", path.display()))?;
                        info!("plan drawn to {}", path.display());
                    }
                }
            }
        }

        Commands::Cross {
            female,
            male,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let female: Genotype = female.parse().context("parsing female genotype")?;
            let male: Genotype = male.parse().context("parsing male genotype")?;
            let markers = &config.markers;
            markers.validate_stock_genotype(&female, "female parent")?;
            markers.validate_stock_genotype(&male, "male parent")?;
            if !markers.allowed_as_female_parent(&female) {
                warn!("{} is not eligible for the female role", female);
            }

            let dist = CrossEngine::new(markers).summarize_offspring(&female, &male)?;
            if dist.is_empty() {
                println!("No viable offspring.");
            }
            for o in dist {
                println!("{:>8.2}%  {}", o.frequency * 100.0, o.genotype);
            }
        }

        Commands::Stocks { stocks, config } => {
            let config = load_config(config.as_ref())?;
            let collection = StockCollection::load_from_file(&stocks)
                .with_context(|| format!("loading stocks {}", stocks.display()))?;
            let markers = &config.markers;
            println!(
                "{:<20} {:<6} {:<36} {:<30}",
                "Stock Name", "F-role", "Genotype", "Notes"
            );
            println!("{}", "-".repeat(94));
            for s in collection.iter() {
                let eligible = female_role_column(markers, &s.genotype);
                println!(
                    "{:<20} {:<6} {:<36} {:<30}",
                    s.name,
                    eligible,
                    s.genotype.to_string(),
                    s.notes
                );
            }
        }

        Commands::AddStock {
            stocks,
            name,
            genotype,
            owner,
            notes,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let name = name.trim();
            if name.is_empty() {
                bail!("stock name is empty");
            }
            let mut collection = if stocks.exists() {
                StockCollection::load_from_file(&stocks)
                    .with_context(|| format!("loading stocks {}", stocks.display()))?
            } else {
                StockCollection::new()
            };
            let genotype: Genotype = genotype.parse().context("parsing stock genotype")?;
            let mut stock = Stock::new(name, genotype);
            stock.owner = owner;
            stock.notes = notes;
            collection.add(stock, &config.markers)?;
            collection
                .save_to_file(&stocks)
                .with_context(|| format!("writing {}", stocks.display()))?;
            println!("Added `{}` to {} ({} stocks)", name, stocks.display(), collection.len());
        }

        Commands::InitConfig { output } => {
            PlannerConfig::default()
                .save_to_file(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}
