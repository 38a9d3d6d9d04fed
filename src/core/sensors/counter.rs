use super::{
    error::SensorResult,
    traits::SensorAdapter,
    types::{Reading, Sample, SensorKind},
};

const START: u64 = 500;
const STEP: u64 = 100;

/// Synthetic sensor for stations without hardware: every read yields the
/// previous value plus 100, starting from 600.
#[derive(Debug, Clone)]
pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self { value: START }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorAdapter for Counter {
    fn kind(&self) -> SensorKind {
        SensorKind::Counter
    }

    async fn read(&mut self) -> SensorResult<Sample> {
        self.value = self.value.saturating_add(STEP);
        Ok(Sample::Ready(Reading::Counter(self.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_steps_by_hundred() {
        let mut counter = Counter::new();
        let mut values = Vec::new();
        for _ in 0..3 {
            if let Sample::Ready(Reading::Counter(v)) = counter.read().await.unwrap() {
                values.push(v);
            }
        }
        assert_eq!(values, vec![600, 700, 800]);
    }
}
