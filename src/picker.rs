use crate::config::ConfigError;
use crate::rng::RandomSource;

/// Weighted selection over a fixed item list.
///
/// Keeps a cumulative weight table and binary-searches it per pick.
///
/// ```
/// use slot_rs::picker::WeightedPicker;
///
/// let picker = WeightedPicker::new(vec![("a", 1.0), ("b", 0.0), ("c", 3.0)]).unwrap();
/// assert_eq!(*picker.pick_with(0.0), "a");
/// assert_eq!(*picker.pick_with(0.5), "c");
/// ```
#[derive(Debug, Clone)]
pub struct WeightedPicker<T> {
    items: Vec<T>,
    cumulative: Vec<f64>,
    total: f64,
    last_positive: usize,
}

impl<T> WeightedPicker<T> {
    pub fn new(entries: Vec<(T, f64)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptySymbolTable);
        }
        let mut items = Vec::with_capacity(entries.len());
        let mut cumulative = Vec::with_capacity(entries.len());
        let mut total = 0.0;
        let mut last_positive = None;
        for (i, (item, weight)) in entries.into_iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    symbol: format!("#{i}"),
                    weight: weight.to_string(),
                });
            }
            if weight > 0.0 {
                last_positive = Some(i);
            }
            total += weight;
            cumulative.push(total);
            items.push(item);
        }
        let Some(last_positive) = last_positive else {
            return Err(ConfigError::ZeroTotalWeight);
        };
        Ok(Self { items, cumulative, total, last_positive })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Select using a caller-supplied sample `u` in `[0, 1)`.
    pub fn pick_with(&self, u: f64) -> &T {
        let x = u * self.total;
        let idx = self.cumulative.partition_point(|&c| c <= x);
        &self.items[idx.min(self.last_positive)]
    }

    /// Select using one draw from `rng`.
    pub fn pick(&self, rng: &mut dyn RandomSource) -> &T {
        self.pick_with(rng.uniform())
    }
}
