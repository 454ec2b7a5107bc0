//! Named stock collections stored as TOML:
//!
//! ```toml
//! [[stock]]
//! name = "BL-3703"
//! genotype = "2:CyO/+ 3:+/+"
//! owner = "bench 2"
//! notes = "Curly balancer"
//! ```
//!
//! Loading parses every genotype and rejects duplicate names. Admission rules are not applied
//! on load; a collection may record stocks the planner will refuse. [`StockCollection::add`]
//! checks them for stocks entered by hand.

use crate::error::{CrossError, Result};
use crate::genotype::{Genotype, Stock};
use crate::rules::MarkerSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StockFile {
    #[serde(default)]
    stock: Vec<StockRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StockRecord {
    name: String,
    genotype: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    notes: String,
}

impl StockRecord {
    fn parse(self) -> Result<Stock> {
        let genotype: Genotype = self.genotype.parse().map_err(|e| CrossError::Format {
            entry: self.genotype.clone(),
            reason: format!("in stock `{}`: {}", self.name, e),
        })?;
        Ok(Stock {
            name: self.name,
            genotype,
            owner: self.owner,
            notes: self.notes,
        })
    }
}

impl TryFrom<&Stock> for StockRecord {
    type Error = CrossError;

    fn try_from(s: &Stock) -> Result<Self> {
        Ok(Self {
            name: s.name.clone(),
            genotype: s.genotype.to_text()?,
            owner: s.owner.clone(),
            notes: s.notes.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StockCollection {
    stocks: Vec<Stock>,
}

impl StockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stocks(stocks: Vec<Stock>) -> Result<Self> {
        let mut collection = Self::new();
        for stock in stocks {
            collection.insert(stock)?;
        }
        Ok(collection)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: StockFile = toml::from_str(contents)?;
        let stocks = file
            .stock
            .into_iter()
            .map(StockRecord::parse)
            .collect::<Result<Vec<_>>>()?;
        Self::from_stocks(stocks)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let file = StockFile {
            stock: self
                .stocks
                .iter()
                .map(StockRecord::try_from)
                .collect::<Result<Vec<_>>>()?,
        };
        toml::to_string_pretty(&file)
            .map_err(|e| CrossError::Configuration(format!("Failed to serialize stocks: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Adds a stock; names are unique ignoring case. The genotype must have a text form so the
    /// collection can be saved.
    pub fn insert(&mut self, stock: Stock) -> Result<()> {
        if self.position(&stock.name).is_some() {
            return Err(CrossError::DuplicateStock(stock.name));
        }
        if let Err(e) = stock.genotype.to_text() {
            return Err(CrossError::Format {
                entry: stock.genotype.to_string(),
                reason: format!("in stock `{}`: {}", stock.name, e),
            });
        }
        self.stocks.push(stock);
        Ok(())
    }

    /// Adds a new stock after checking it is neither lethal nor homozygous for a balancer.
    pub fn add(&mut self, stock: Stock, markers: &MarkerSet) -> Result<()> {
        markers.validate_stock_genotype(&stock.genotype, &format!("new stock '{}'", stock.name))?;
        self.insert(stock)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Result<&Stock> {
        self.position(name)
            .map(|i| &self.stocks[i])
            .ok_or_else(|| CrossError::StockNotFound {
                name: name.to_owned(),
                available: self.names().join(", "),
            })
    }

    /// The named stocks in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Stock>> {
        names.iter().map(|n| self.get(n.as_ref()).cloned()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stocks.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stock> + '_ {
        self.stocks.iter()
    }

    pub fn as_slice(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.stocks
            .iter()
            .position(|s| s.name.to_lowercase() == name)
    }
}
