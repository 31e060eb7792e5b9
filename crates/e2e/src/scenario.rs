//! Receiving scenario: write stock, then wait for the read side to catch up

use erpqa_common::{expected_after, poll_until_eq, Converged, PollConfig, Quantity, StockKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::stock::{QuantityReader, Receiver};

/// Poll `reader` until the stock of `key` equals `target`.
///
/// Timeouts become [`E2eError::Convergence`]; reader errors propagate as-is.
pub async fn wait_for_quantity<R>(
    reader: &R,
    key: &StockKey,
    target: &Quantity,
    poll: &PollConfig,
) -> E2eResult<Converged<Quantity>>
where
    R: QuantityReader + ?Sized,
{
    let read = move || async move { reader.read_quantity(key).await };
    Ok(poll_until_eq(read, target, poll).await?)
}

/// Receive `delta` units of `key` and expect the stock to grow by exactly that.
#[derive(Debug, Clone)]
pub struct ReceivingScenario {
    pub name: String,
    pub key: StockKey,
    pub delta: Quantity,
    pub poll: PollConfig,
}

/// What a receiving scenario observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub before: Quantity,
    pub delta: Quantity,
    pub expected: Quantity,
    pub observed: Quantity,
    pub attempts: usize,
    pub elapsed_ms: u64,
}

impl ScenarioOutcome {
    pub fn summary(&self) -> String {
        format!(
            "before {}, received {}, after {} (expected {}) in {} ms",
            self.before, self.delta, self.observed, self.expected, self.elapsed_ms
        )
    }
}

impl ReceivingScenario {
    pub async fn run<R, W>(&self, reader: &R, receiver: &W) -> E2eResult<ScenarioOutcome>
    where
        R: QuantityReader + ?Sized,
        W: Receiver + ?Sized,
    {
        if self.delta.is_negative() || self.delta == Quantity::zero() {
            return Err(E2eError::Config(format!(
                "{}: receiving delta must be positive, got {}",
                self.name, self.delta
            )));
        }

        let before = reader.read_quantity(&self.key).await?;
        receiver.receive(&self.key, &self.delta).await?;

        let expected = expected_after(&before, &self.delta);
        let converged = wait_for_quantity(reader, &self.key, &expected, &self.poll).await?;

        if converged.value != expected {
            return Err(E2eError::AssertionFailed(format!(
                "{}: stock of {} is {}, expected {} + {}",
                self.name, self.key, converged.value, before, self.delta
            )));
        }

        info!(
            "{}: stock of {} went from {} to {} after receiving {}",
            self.name, self.key, before, converged.value, self.delta
        );

        Ok(ScenarioOutcome {
            before,
            delta: self.delta.clone(),
            expected,
            observed: converged.value,
            attempts: converged.attempts,
            elapsed_ms: converged.elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::ScriptedReader;
    use erpqa_common::EntityKind;
    use std::time::Duration;

    fn scenario(delta: i64) -> ReceivingScenario {
        ReceivingScenario {
            name: "receive-bolts".to_string(),
            key: StockKey::new("Bolt M8", EntityKind::Part),
            delta: Quantity::from(delta),
            poll: PollConfig::new(Duration::from_millis(1000), Duration::from_millis(10)),
        }
    }

    #[tokio::test]
    async fn test_receiving_converges_on_before_plus_delta() {
        let reader = ScriptedReader::new([10, 10, 19]);

        let outcome = scenario(9).run(&reader, &reader).await.unwrap();

        assert_eq!(outcome.before, Quantity::from(10));
        assert_eq!(outcome.expected, Quantity::from(19));
        assert_eq!(outcome.observed, outcome.before.clone() + outcome.delta.clone());
        assert_eq!(outcome.observed, outcome.expected);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(reader.calls(), 3);
        assert_eq!(
            reader.receipts(),
            vec![(StockKey::new("Bolt M8", EntityKind::Part), Quantity::from(9))]
        );
    }

    #[tokio::test]
    async fn test_observed_matches_expected_across_decimal_scale() {
        let reader = ScriptedReader::new([
            "10".parse::<Quantity>().unwrap(),
            "19.00".parse::<Quantity>().unwrap(),
        ]);

        let outcome = scenario(9).run(&reader, &reader).await.unwrap();

        assert_eq!(outcome.expected, Quantity::from(19));
        assert_eq!(outcome.observed.to_string(), "19.00");
        assert_eq!(outcome.observed, outcome.expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiving_timeout_carries_last_observed() {
        let reader = ScriptedReader::new([10, 10, 12]);

        let err = scenario(9).run(&reader, &reader).await.unwrap_err();

        match err {
            E2eError::Convergence(timeout) => {
                assert_eq!(timeout.target, Quantity::from(19));
                assert_eq!(timeout.last_observed, Quantity::from(12));
            }
            other => panic!("expected convergence timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_positive_delta_is_rejected_before_any_write() {
        let reader = ScriptedReader::new([10]);

        let err = scenario(0).run(&reader, &reader).await.unwrap_err();

        assert!(matches!(err, E2eError::Config(_)));
        assert!(reader.receipts().is_empty());
        assert_eq!(reader.calls(), 0);
    }

    #[test]
    fn test_outcome_summary() {
        let outcome = ScenarioOutcome {
            before: Quantity::from(10),
            delta: Quantity::from(9),
            expected: Quantity::from(19),
            observed: Quantity::from(19),
            attempts: 2,
            elapsed_ms: 12,
        };
        assert_eq!(
            outcome.summary(),
            "before 10, received 9, after 19 (expected 19) in 12 ms"
        );
    }
}
