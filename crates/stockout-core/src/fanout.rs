//! Data-parallel map over independent units of work.

use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

/// Result of one unit: its key plus the value or a failure message.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome<K, T> {
    pub key: K,
    pub result: Result<T, String>,
}

impl<K, T> UnitOutcome<K, T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unit panicked".to_string()
    }
}

/// Runs `work` for every unit on the current rayon pool.
///
/// Outcomes come back in input order. An error or panic in one unit is
/// reported in its own outcome and never affects the others.
pub fn fan_out<K, T, E, F>(units: Vec<K>, work: F) -> Vec<UnitOutcome<K, T>>
where
    K: Send,
    T: Send,
    E: Display,
    F: Fn(&K) -> Result<T, E> + Sync,
{
    units
        .into_par_iter()
        .map(|key| {
            let result = match catch_unwind(AssertUnwindSafe(|| work(&key))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(err.to_string()),
                Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
            };
            UnitOutcome { key, result }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_isolates_failures() {
        let outcomes = fan_out(vec![1, 2, 3, 4], |n: &i32| -> Result<i32, String> {
            match n {
                2 => Err("two".to_string()),
                3 => panic!("three"),
                _ => Ok(n * 10),
            }
        });
        let keys: Vec<i32> = outcomes.iter().map(|o| o.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
        assert_eq!(outcomes[0].result, Ok(10));
        assert_eq!(outcomes[1].result, Err("two".to_string()));
        assert!(outcomes[2].result.as_ref().unwrap_err().contains("three"));
        assert_eq!(outcomes[3].result, Ok(40));
    }
}
