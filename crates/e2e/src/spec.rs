//! Declarative YAML case catalog

use erpqa_common::{Quantity, StockKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// One catalog file: cases plus the suites that group them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub cases: Vec<CaseSpec>,

    #[serde(default)]
    pub suites: BTreeMap<String, SuiteSpec>,
}

/// A single test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    /// Unique name for this case
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering cases
    #[serde(default)]
    pub tags: Vec<String>,

    /// Count the case as skipped instead of running it
    #[serde(default)]
    pub skip: bool,

    /// What the case verifies
    pub check: CaseCheck,
}

/// What a case verifies against the ERP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseCheck {
    /// Receive `delta` units and wait for the stock to grow by exactly that
    Receiving {
        entity: StockKey,
        delta: Quantity,
        /// Poll profile name; default profile when absent
        #[serde(default)]
        poll: Option<String>,
    },

    /// A single read returns a non-negative quantity
    StockReadable { entity: StockKey },

    /// Wait until the stock equals a fixed value
    StockEquals {
        entity: StockKey,
        expected: Quantity,
        #[serde(default)]
        poll: Option<String>,
    },

    /// The ERP health endpoint answers
    Reachable,
}

impl CaseCheck {
    pub fn label(&self) -> String {
        match self {
            CaseCheck::Receiving { entity, delta, .. } => format!("receiving:{}+{}", entity, delta),
            CaseCheck::StockReadable { entity } => format!("stock_readable:{}", entity),
            CaseCheck::StockEquals { entity, expected, .. } => {
                format!("stock_equals:{}={}", entity, expected)
            }
            CaseCheck::Reachable => "reachable".to_string(),
        }
    }
}

/// A named suite: its own cases plus other suites pulled in first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteSpec {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub cases: Vec<String>,
}

impl CatalogFile {
    /// Parse a catalog from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a catalog from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every catalog file under a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<(String, Self)>> {
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let catalog = Self::from_file(entry.path())?;
            files.push((entry.path().display().to_string(), catalog));
        }

        Ok(files)
    }
}
