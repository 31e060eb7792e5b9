//! Suite dispatch: map a suite name to the ordered list of cases it runs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};
use crate::spec::{CaseCheck, CaseSpec, CatalogFile, SuiteSpec};

/// Name of the built-in health case
pub const REACHABLE_CASE: &str = "erp-reachable";

/// Name of the built-in suite
pub const SMOKE_SUITE: &str = "smoke";

/// All known cases and suites
#[derive(Debug, Clone, Default)]
pub struct SuiteCatalog {
    cases: BTreeMap<String, CaseSpec>,
    suites: BTreeMap<String, SuiteSpec>,
}

impl SuiteCatalog {
    /// Catalog with only the built-in smoke suite
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        catalog.cases.insert(
            REACHABLE_CASE.to_string(),
            CaseSpec {
                name: REACHABLE_CASE.to_string(),
                description: "ERP health endpoint answers".to_string(),
                tags: vec!["smoke".to_string()],
                skip: false,
                check: CaseCheck::Reachable,
            },
        );
        catalog.suites.insert(
            SMOKE_SUITE.to_string(),
            SuiteSpec {
                description: "Basic reachability".to_string(),
                include: vec![],
                cases: vec![REACHABLE_CASE.to_string()],
            },
        );
        catalog
    }

    /// Built-ins overlaid with every catalog file under `dir`
    pub fn load_dir(dir: &Path) -> E2eResult<Self> {
        if !dir.exists() {
            warn!("Case directory {} does not exist; using built-in cases only", dir.display());
            return Ok(Self::builtin());
        }

        let files = CatalogFile::load_all(dir)?;
        let catalog = Self::from_files(files)?;
        info!(
            "Loaded {} case(s) and {} suite(s) from {}",
            catalog.cases.len(),
            catalog.suites.len(),
            dir.display()
        );
        Ok(catalog)
    }

    /// Merge catalog files over the built-ins.
    ///
    /// A file may redefine a built-in name; two files may not define the same one.
    pub fn from_files(files: Vec<(String, CatalogFile)>) -> E2eResult<Self> {
        let mut catalog = Self::builtin();
        let mut case_origin: HashMap<String, String> = HashMap::new();
        let mut suite_origin: HashMap<String, String> = HashMap::new();

        for (origin, file) in files {
            for case in file.cases {
                if let Some(previous) = case_origin.insert(case.name.clone(), origin.clone()) {
                    return Err(E2eError::SpecParse(format!(
                        "case '{}' defined in both {} and {}",
                        case.name, previous, origin
                    )));
                }
                catalog.cases.insert(case.name.clone(), case);
            }

            for (name, suite) in file.suites {
                if let Some(previous) = suite_origin.insert(name.clone(), origin.clone()) {
                    return Err(E2eError::SpecParse(format!(
                        "suite '{}' defined in both {} and {}",
                        name, previous, origin
                    )));
                }
                catalog.suites.insert(name, suite);
            }
        }

        catalog.validate()?;
        Ok(catalog)
    }

    /// Resolve every suite so dangling names and cycles surface at load time
    pub fn validate(&self) -> E2eResult<()> {
        for name in self.suites.keys() {
            self.resolve(name)?;
        }
        Ok(())
    }

    pub fn case(&self, name: &str) -> E2eResult<&CaseSpec> {
        self.cases
            .get(name)
            .ok_or_else(|| E2eError::CaseNotFound(name.to_string()))
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.keys().map(String::as_str)
    }

    pub fn suite(&self, name: &str) -> Option<&SuiteSpec> {
        self.suites.get(name)
    }

    /// Cases of `suite` in run order: included suites first (depth-first, in
    /// declaration order), then the suite's own cases. Each case appears once.
    pub fn resolve(&self, suite: &str) -> E2eResult<Vec<&CaseSpec>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = Vec::new();
        self.collect(suite, &mut stack, &mut seen, &mut out)?;
        Ok(out)
    }

    fn collect<'a>(
        &'a self,
        suite: &str,
        stack: &mut Vec<String>,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a CaseSpec>,
    ) -> E2eResult<()> {
        if stack.iter().any(|s| s == suite) {
            stack.push(suite.to_string());
            return Err(E2eError::SuiteCycle(stack.join(" -> ")));
        }

        let spec = self
            .suites
            .get(suite)
            .ok_or_else(|| E2eError::SuiteNotFound(suite.to_string()))?;

        stack.push(suite.to_string());
        for included in &spec.include {
            self.collect(included, stack, seen, out)?;
        }
        for name in &spec.cases {
            let case = self.case(name)?;
            if seen.insert(case.name.as_str()) {
                out.push(case);
            }
        }
        stack.pop();

        Ok(())
    }
}
