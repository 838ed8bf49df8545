//! Hyperparameter configurations and search spaces

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric view; integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// An immutable mapping from parameter name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, ParamValue>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail if the configuration names a parameter outside `known`
    pub fn check_known(&self, learner: &str, known: &[&str]) -> Result<()> {
        match self.0.keys().find(|k| !known.contains(&k.as_str())) {
            Some(unknown) => Err(PipelineError::config(format!(
                "unknown parameter '{}' for {} (expected one of {:?})",
                unknown, learner, known
            ))),
            None => Ok(()),
        }
    }

    /// Float parameter with a default
    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64> {
        match self.0.get(name) {
            None => Ok(default),
            Some(v) => v.as_f64().ok_or_else(|| {
                PipelineError::config(format!("parameter '{}' must be numeric, got {}", name, v))
            }),
        }
    }

    /// Non-negative integer parameter with a default
    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize> {
        match self.0.get(name) {
            None => Ok(default),
            Some(v) => v.as_usize().ok_or_else(|| {
                PipelineError::config(format!(
                    "parameter '{}' must be a non-negative integer, got {}",
                    name, v
                ))
            }),
        }
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(defaults)");
        }
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Distribution a random search samples one parameter from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Distribution {
    Choice { values: Vec<ParamValue> },
    Uniform { low: f64, high: f64 },
    LogUniform { low: f64, high: f64 },
    IntRange { low: i64, high: i64 },
}

impl Distribution {
    fn validate(&self, name: &str) -> Result<()> {
        let ok = match self {
            Distribution::Choice { values } => !values.is_empty(),
            Distribution::Uniform { low, high } => finite_span(*low, *high),
            Distribution::LogUniform { low, high } => *low > 0.0 && finite_span(*low, *high),
            Distribution::IntRange { low, high } => low <= high,
        };
        if ok {
            Ok(())
        } else {
            Err(PipelineError::config(format!(
                "invalid distribution for parameter '{}': {:?}",
                name, self
            )))
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> ParamValue {
        match self {
            Distribution::Choice { values } => values[rng.gen_range(0..values.len())].clone(),
            Distribution::Uniform { low, high } => ParamValue::Float(rng.gen_range(*low..*high)),
            Distribution::LogUniform { low, high } => {
                ParamValue::Float(rng.gen_range(low.ln()..high.ln()).exp())
            }
            Distribution::IntRange { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
        }
    }
}

/// `low < high` with both bounds and their difference finite
fn finite_span(low: f64, high: f64) -> bool {
    low.is_finite() && high.is_finite() && (high - low).is_finite() && low < high
}

/// Set of configurations a search evaluates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SearchSpace {
    /// Explicit configurations, evaluated in the given order
    List { configurations: Vec<Configuration> },
    /// Cartesian product; parameters in name order, last one varies fastest
    Grid {
        parameters: BTreeMap<String, Vec<ParamValue>>,
    },
    /// `n_samples` seeded draws from per-parameter distributions
    Random {
        parameters: BTreeMap<String, Distribution>,
        n_samples: usize,
        seed: u64,
    },
}

impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace::List {
            configurations: vec![Configuration::new()],
        }
    }
}

impl SearchSpace {
    pub fn list(configurations: Vec<Configuration>) -> Self {
        SearchSpace::List { configurations }
    }

    pub fn grid<K, V, I>(parameters: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, Vec<V>)>,
    {
        SearchSpace::Grid {
            parameters: parameters
                .into_iter()
                .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Enumerate the configurations in declaration order
    pub fn configurations(&self) -> Result<Vec<Configuration>> {
        match self {
            SearchSpace::List { configurations } => Ok(configurations.clone()),
            SearchSpace::Grid { parameters } => {
                if parameters.is_empty() {
                    return Ok(Vec::new());
                }
                let mut configs = vec![BTreeMap::new()];
                for (name, values) in parameters {
                    configs = configs
                        .into_iter()
                        .flat_map(|partial: BTreeMap<String, ParamValue>| {
                            values.iter().map(move |v| {
                                let mut next = partial.clone();
                                next.insert(name.clone(), v.clone());
                                next
                            })
                        })
                        .collect();
                }
                Ok(configs.into_iter().map(Configuration).collect())
            }
            SearchSpace::Random {
                parameters,
                n_samples,
                seed,
            } => {
                for (name, dist) in parameters {
                    dist.validate(name)?;
                }
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                Ok((0..*n_samples)
                    .map(|_| {
                        Configuration(
                            parameters
                                .iter()
                                .map(|(name, dist)| (name.clone(), dist.sample(&mut rng)))
                                .collect(),
                        )
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_order_last_param_fastest() {
        let space = SearchSpace::grid([("a", vec![1, 2]), ("b", vec![10, 20, 30])]);
        let configs = space.configurations().unwrap();
        assert_eq!(configs.len(), 6);
        assert_eq!(configs[0].get("a"), Some(&ParamValue::Int(1)));
        assert_eq!(configs[1].get("b"), Some(&ParamValue::Int(20)));
        assert_eq!(configs[3].get("a"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn test_empty_grid_yields_nothing() {
        let space = SearchSpace::Grid {
            parameters: BTreeMap::new(),
        };
        assert!(space.configurations().unwrap().is_empty());
        let space = SearchSpace::grid([("k", Vec::<i64>::new())]);
        assert!(space.configurations().unwrap().is_empty());
    }

    #[test]
    fn test_random_search_is_seeded() {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "lr".to_string(),
            Distribution::LogUniform {
                low: 1e-3,
                high: 1.0,
            },
        );
        parameters.insert("k".to_string(), Distribution::IntRange { low: 1, high: 9 });
        let space = SearchSpace::Random {
            parameters,
            n_samples: 4,
            seed: 21,
        };
        let a = space.configurations().unwrap();
        assert_eq!(a, space.configurations().unwrap());
        assert_eq!(a.len(), 4);
        for c in &a {
            let lr = c.f64_or("lr", 0.0).unwrap();
            assert!(lr > 0.0 && lr <= 1.0);
            let k = c.usize_or("k", 0).unwrap();
            assert!((1..=9).contains(&k));
        }
    }

    #[test]
    fn test_invalid_distribution() {
        let mut parameters = BTreeMap::new();
        parameters.insert("x".to_string(), Distribution::Uniform { low: 2.0, high: 1.0 });
        let space = SearchSpace::Random {
            parameters,
            n_samples: 1,
            seed: 0,
        };
        assert!(space.configurations().is_err());
    }

    #[test]
    fn test_distribution_rejects_unbounded_ranges() {
        for dist in [
            Distribution::Uniform { low: -1e308, high: 1e308 },
            Distribution::Uniform { low: 0.0, high: f64::INFINITY },
            Distribution::Uniform { low: f64::NAN, high: 1.0 },
            Distribution::LogUniform { low: 1e-3, high: f64::INFINITY },
        ] {
            let space = SearchSpace::Random {
                parameters: BTreeMap::from([("x".to_string(), dist)]),
                n_samples: 2,
                seed: 0,
            };
            assert!(matches!(
                space.configurations(),
                Err(PipelineError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_param_accessors() {
        let c = Configuration::new().with("k", 3).with("lr", 0.5).with("name", "x");
        assert_eq!(c.usize_or("k", 1).unwrap(), 3);
        assert_eq!(c.f64_or("k", 1.0).unwrap(), 3.0);
        assert!(c.usize_or("lr", 1).is_err());
        assert!(c.f64_or("name", 1.0).is_err());
        assert_eq!(c.f64_or("missing", 2.5).unwrap(), 2.5);
        assert!(c.check_known("test", &["k", "lr"]).is_err());
        assert_eq!(c.to_string(), "k=3, lr=0.5, name=x");
        assert_eq!(ParamValue::Bool(true).as_bool(), Some(true));
        assert_eq!(c.get("name").and_then(ParamValue::as_bool), None);
    }

    #[test]
    fn test_untagged_json_values() {
        let c: Configuration = serde_json::from_str(r#"{"k": 3, "lr": 0.1, "fast": true}"#).unwrap();
        assert_eq!(c.get("k"), Some(&ParamValue::Int(3)));
        assert_eq!(c.get("lr"), Some(&ParamValue::Float(0.1)));
        assert_eq!(c.get("fast"), Some(&ParamValue::Bool(true)));
    }
}
