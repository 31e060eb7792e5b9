//! Main test runner that resolves suites and executes their cases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::scenario::{wait_for_quantity, ReceivingScenario};
use crate::spec::{CaseCheck, CaseSpec};
use crate::stock::{QuantityReader, Receiver};
use crate::suite::SuiteCatalog;
use crate::target::ErpTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub check: String,
    pub status: CaseStatus,
    pub duration_ms: u64,
    pub detail: Option<String>,
    pub error: Option<String>,
}

/// Result of running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    /// Wrap one case result, as when a case is run by name
    pub fn single(result: TestResult) -> Self {
        let count = |status: CaseStatus| usize::from(result.status == status);
        Self {
            suite: result.name.clone(),
            started_at: Utc::now(),
            total: 1,
            passed: count(CaseStatus::Passed),
            failed: count(CaseStatus::Failed),
            skipped: count(CaseStatus::Skipped),
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code: 0 when nothing failed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Runs catalog cases against a stock backend
pub struct TestRunner<B> {
    config: HarnessConfig,
    catalog: SuiteCatalog,
    backend: B,

    /// ERP health endpoint (None in dry runs)
    target: Option<ErpTarget>,

    target_checked: bool,
}

impl<B> TestRunner<B>
where
    B: QuantityReader + Receiver,
{
    pub fn new(config: HarnessConfig, catalog: SuiteCatalog, backend: B) -> Self {
        Self {
            config,
            catalog,
            backend,
            target: None,
            target_checked: false,
        }
    }

    pub fn with_target(mut self, target: ErpTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SuiteCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Wait for the ERP once per runner, if configured to
    pub async fn ensure_target(&mut self) -> E2eResult<()> {
        if self.target_checked || !self.config.wait_for_target {
            return Ok(());
        }

        if let Some(target) = &self.target {
            target.wait_until_healthy(&self.config.target.health).await?;
        }
        self.target_checked = true;
        Ok(())
    }

    /// Run every case of a suite
    pub async fn run_suite(&mut self, suite: &str) -> E2eResult<TestSuiteResult> {
        let cases: Vec<CaseSpec> = self.catalog.resolve(suite)?.into_iter().cloned().collect();
        self.run_cases(suite, &cases).await
    }

    /// Run the cases of a suite that carry `tag`
    pub async fn run_tagged(&mut self, suite: &str, tag: &str) -> E2eResult<TestSuiteResult> {
        let cases: Vec<CaseSpec> = self
            .catalog
            .resolve(suite)?
            .into_iter()
            .filter(|c| c.tags.iter().any(|t| t == tag))
            .cloned()
            .collect();
        self.run_cases(&format!("{}[{}]", suite, tag), &cases).await
    }

    /// Run a specific case by name
    pub async fn run_case(&mut self, name: &str) -> E2eResult<TestResult> {
        let case = self.catalog.case(name)?.clone();
        self.ensure_target().await?;
        Ok(self.run_one(&case).await)
    }

    /// Run a list of cases; a failing case never stops the rest
    pub async fn run_cases(
        &mut self,
        label: &str,
        cases: &[CaseSpec],
    ) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.ensure_target().await?;

        info!("Running {} case(s) from '{}'...", cases.len(), label);

        let mut results = Vec::with_capacity(cases.len());
        let (mut passed, mut failed, mut skipped) = (0, 0, 0);

        for case in cases {
            let result = self.run_one(case).await;
            match result.status {
                CaseStatus::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                }
                CaseStatus::Failed => {
                    failed += 1;
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                CaseStatus::Skipped => {
                    skipped += 1;
                    info!("- {} (skipped)", result.name);
                }
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            suite: label.to_string(),
            started_at,
            total: cases.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    async fn run_one(&self, case: &CaseSpec) -> TestResult {
        let check = case.check.label();

        if case.skip {
            return TestResult {
                name: case.name.clone(),
                check,
                status: CaseStatus::Skipped,
                duration_ms: 0,
                detail: None,
                error: None,
            };
        }

        debug!("Running case: {} ({})", case.name, check);
        let start = Instant::now();
        let outcome = self.execute(case).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(detail) => TestResult {
                name: case.name.clone(),
                check,
                status: CaseStatus::Passed,
                duration_ms,
                detail,
                error: None,
            },
            Err(e) => TestResult {
                name: case.name.clone(),
                check,
                status: CaseStatus::Failed,
                duration_ms,
                detail: None,
                error: Some(e.to_string()),
            },
        }
    }

    async fn execute(&self, case: &CaseSpec) -> E2eResult<Option<String>> {
        match &case.check {
            CaseCheck::Receiving { entity, delta, poll } => {
                let scenario = ReceivingScenario {
                    name: case.name.clone(),
                    key: entity.clone(),
                    delta: delta.clone(),
                    poll: self.config.poll_profile(poll.as_deref())?,
                };
                let outcome = scenario.run(&self.backend, &self.backend).await?;
                Ok(Some(outcome.summary()))
            }
            CaseCheck::StockReadable { entity } => {
                let quantity = self.backend.read_quantity(entity).await?;
                if quantity.is_negative() {
                    return Err(E2eError::AssertionFailed(format!(
                        "stock of {} is negative: {}",
                        entity, quantity
                    )));
                }
                Ok(Some(format!("{} = {}", entity, quantity)))
            }
            CaseCheck::StockEquals {
                entity,
                expected,
                poll,
            } => {
                let poll = self.config.poll_profile(poll.as_deref())?;
                let converged = wait_for_quantity(&self.backend, entity, expected, &poll).await?;
                Ok(Some(format!(
                    "{} = {} after {} attempt(s)",
                    entity, converged.value, converged.attempts
                )))
            }
            CaseCheck::Reachable => match &self.target {
                Some(target) => {
                    let probes = target.wait_until_healthy(&self.config.target.health).await?;
                    Ok(Some(format!("{} healthy after {} probe(s)", target.base_url(), probes)))
                }
                None => {
                    warn!("{}: no ERP target attached, nothing to probe", case.name);
                    Ok(Some("no ERP target attached".to_string()))
                }
            },
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
