//! Stock read/write seams
//!
//! Scenarios only talk to the ERP through these two traits. [`StockClient`]
//! implements them over HTTP; the in-process implementations here back unit
//! tests and dry runs.
//!
//! [`StockClient`]: crate::client::StockClient

use async_trait::async_trait;
use erpqa_common::{Quantity, StockKey};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::error::{E2eError, E2eResult};

/// Reads the current stock quantity for an entity
#[async_trait]
pub trait QuantityReader: Send + Sync {
    async fn read_quantity(&self, key: &StockKey) -> E2eResult<Quantity>;
}

/// Records incoming stock for an entity
#[async_trait]
pub trait Receiver: Send + Sync {
    async fn receive(&self, key: &StockKey, delta: &Quantity) -> E2eResult<()>;
}

/// Plays back a fixed sequence of quantities, repeating the last one.
///
/// Receipts are recorded but never change what is read.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    state: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<Quantity>,
    last: Option<Quantity>,
    calls: usize,
    receipts: Vec<(StockKey, Quantity)>,
}

impl ScriptedReader {
    pub fn new<I, Q>(values: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<Quantity>,
    {
        Self {
            state: Mutex::new(ScriptState {
                script: values.into_iter().map(Into::into).collect(),
                ..Default::default()
            }),
        }
    }

    /// Number of reads served so far
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn receipts(&self) -> Vec<(StockKey, Quantity)> {
        self.state.lock().receipts.clone()
    }
}

#[async_trait]
impl QuantityReader for ScriptedReader {
    async fn read_quantity(&self, _key: &StockKey) -> E2eResult<Quantity> {
        let mut state = self.state.lock();
        state.calls += 1;

        if let Some(next) = state.script.pop_front() {
            state.last = Some(next);
        }
        state
            .last
            .clone()
            .ok_or_else(|| {
                E2eError::UnexpectedResponse("scripted reader has no values".to_string())
            })
    }
}

#[async_trait]
impl Receiver for ScriptedReader {
    async fn receive(&self, key: &StockKey, delta: &Quantity) -> E2eResult<()> {
        self.state.lock().receipts.push((key.clone(), delta.clone()));
        Ok(())
    }
}

/// Stock ledger kept in memory; receipts apply immediately.
///
/// Unknown entities read as zero.
#[derive(Debug, Default)]
pub struct InMemoryStock {
    levels: Mutex<HashMap<StockKey, Quantity>>,
}

impl InMemoryStock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(self, key: StockKey, quantity: impl Into<Quantity>) -> Self {
        self.levels.lock().insert(key, quantity.into());
        self
    }
}

#[async_trait]
impl QuantityReader for InMemoryStock {
    async fn read_quantity(&self, key: &StockKey) -> E2eResult<Quantity> {
        Ok(self
            .levels
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(Quantity::zero))
    }
}

#[async_trait]
impl Receiver for InMemoryStock {
    async fn receive(&self, key: &StockKey, delta: &Quantity) -> E2eResult<()> {
        let mut levels = self.levels.lock();
        let current = levels.remove(key).unwrap_or_else(Quantity::zero);
        levels.insert(key.clone(), current + delta.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpqa_common::EntityKind;

    fn bolt() -> StockKey {
        StockKey::new("Bolt M8", EntityKind::Part)
    }

    #[tokio::test]
    async fn test_scripted_reader_repeats_last_value() {
        let reader = ScriptedReader::new([1, 2]);

        assert_eq!(reader.read_quantity(&bolt()).await.unwrap(), Quantity::from(1));
        assert_eq!(reader.read_quantity(&bolt()).await.unwrap(), Quantity::from(2));
        assert_eq!(reader.read_quantity(&bolt()).await.unwrap(), Quantity::from(2));
        assert_eq!(reader.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_is_an_error() {
        let reader = ScriptedReader::new(Vec::<i64>::new());
        assert!(reader.read_quantity(&bolt()).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_reader_records_receipts() {
        let reader = ScriptedReader::new([0]);
        reader.receive(&bolt(), &Quantity::from(9)).await.unwrap();
        assert_eq!(reader.receipts(), vec![(bolt(), Quantity::from(9))]);
    }

    #[tokio::test]
    async fn test_in_memory_stock_applies_receipts() {
        let stock = InMemoryStock::new().with_level(bolt(), 10);

        stock.receive(&bolt(), &Quantity::from(9)).await.unwrap();

        assert_eq!(stock.read_quantity(&bolt()).await.unwrap(), Quantity::from(19));
        let unknown = StockKey::new("Nut M8", EntityKind::Part);
        assert_eq!(stock.read_quantity(&unknown).await.unwrap(), Quantity::zero());
    }
}
