//! ERP QA E2E harness
//!
//! Runs declarative stock test cases against an ERP instance:
//! - Loads cases and suites from YAML catalog files
//! - Resolves a configured suite name to an ordered case list
//! - Drives receiving scenarios and waits for stock to converge
//! - Writes JSON results
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner<B: QuantityReader + Receiver>                   │
//! │    ├── ensure_target() -> ErpTarget::wait_until_healthy()   │
//! │    ├── run_suite(name) -> SuiteCatalog::resolve(name)       │
//! │    └── execute(case)                                        │
//! │          ├── receiving      -> ReceivingScenario::run()     │
//! │          ├── stock_readable -> read once, assert >= 0       │
//! │          ├── stock_equals   -> wait_for_quantity()          │
//! │          └── reachable      -> health probe                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CatalogFile (YAML)                                         │
//! │    ├── cases:  [{ name, tags, skip, check }]                │
//! │    └── suites: { name: { include: [..], cases: [..] } }     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod runner;
pub mod scenario;
pub mod spec;
pub mod stock;
pub mod suite;
pub mod target;

pub use client::StockClient;
pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use runner::{CaseStatus, TestResult, TestRunner, TestSuiteResult};
pub use scenario::{ReceivingScenario, ScenarioOutcome};
pub use spec::{CaseCheck, CaseSpec, CatalogFile};
pub use stock::{InMemoryStock, QuantityReader, Receiver, ScriptedReader};
pub use suite::SuiteCatalog;
pub use target::ErpTarget;
