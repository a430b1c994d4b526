//! Random data generation configuration.

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Configuration for [`Generator`](crate::Generator).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Probability that a nullable column yields NULL.
    pub null_probability: f64,

    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Upper bound on generated string lengths, in characters.
    pub max_string_length: u16,

    /// Upper bound on generated binary lengths, in bytes.
    pub max_binary_length: u16,

    /// Earliest generated date.
    pub min_date: NaiveDate,

    /// Latest generated date.
    pub max_date: NaiveDate,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            null_probability: 0.1,
            seed: None,
            max_string_length: 50,
            max_binary_length: 64,
            min_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
            max_date: NaiveDate::from_ymd_opt(2079, 6, 6).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration string.
    ///
    /// The format follows ADO.NET connection strings: `key=value` pairs
    /// separated by `;`, keys case-insensitive.
    ///
    /// ```
    /// use sql_testkit::GeneratorConfig;
    ///
    /// let config = GeneratorConfig::from_config_string(
    ///     "NullProbability=0.25;Seed=42;MaxStringLength=20",
    /// )?;
    /// assert_eq!(config.seed, Some(42));
    /// # Ok::<(), sql_testkit::Error>(())
    /// ```
    pub fn from_config_string(config_str: &str) -> Result<Self> {
        let mut config = Self::default();

        for part in config_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "nullprobability" | "null probability" => {
                    config.null_probability = value.parse().map_err(|_| {
                        Error::Config(format!("invalid null probability: {value}"))
                    })?;
                }
                "seed" => {
                    config.seed = Some(
                        value
                            .parse()
                            .map_err(|_| Error::Config(format!("invalid seed: {value}")))?,
                    );
                }
                "maxstringlength" | "max string length" => {
                    config.max_string_length = parse_length(value)?;
                }
                "maxbinarylength" | "max binary length" => {
                    config.max_binary_length = parse_length(value)?;
                }
                "mindate" | "min date" => {
                    config.min_date = parse_date(value)?;
                }
                "maxdate" | "max date" => {
                    config.max_date = parse_date(value)?;
                }
                _ => {
                    return Err(Error::Config(format!("unknown key: {key}")));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the NULL probability.
    #[must_use]
    pub fn null_probability(mut self, probability: f64) -> Self {
        self.null_probability = probability;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the maximum string length.
    #[must_use]
    pub fn max_string_length(mut self, length: u16) -> Self {
        self.max_string_length = length;
        self
    }

    /// Set the maximum binary length.
    #[must_use]
    pub fn max_binary_length(mut self, length: u16) -> Self {
        self.max_binary_length = length;
        self
    }

    /// Set the generated date range.
    #[must_use]
    pub fn date_range(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.min_date = min;
        self.max_date = max;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.null_probability) {
            return Err(Error::Config(format!(
                "null probability must be between 0 and 1, got {}",
                self.null_probability
            )));
        }
        if self.max_string_length == 0 || self.max_binary_length == 0 {
            return Err(Error::Config("maximum lengths must be positive".into()));
        }
        if self.min_date > self.max_date {
            return Err(Error::Config(format!(
                "min date {} is after max date {}",
                self.min_date, self.max_date
            )));
        }
        Ok(())
    }
}

fn parse_length(value: &str) -> Result<u16> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid length: {value}")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::Config(format!("invalid date: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert!((config.null_probability - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_string_length, 50);
        assert_eq!(config.max_binary_length, 64);
        assert_eq!(config.min_date, NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        assert_eq!(config.max_date, NaiveDate::from_ymd_opt(2079, 6, 6).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_string_parsing() {
        let config = GeneratorConfig::from_config_string(
            "nullprobability=0.25; SEED=42;Max String Length=20;MinDate=2000-01-01;",
        )
        .unwrap();

        assert!((config.null_probability - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_string_length, 20);
        assert_eq!(config.min_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn test_config_string_errors() {
        for input in [
            "Seed",
            "Seed=abc",
            "Colour=blue",
            "NullProbability=1.5",
            "MaxBinaryLength=0",
            "MinDate=2020-01-01;MaxDate=2019-12-31",
            "MaxDate=June",
        ] {
            let err = GeneratorConfig::from_config_string(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "input: {input}");
        }
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::new()
            .seed(7)
            .null_probability(0.0)
            .max_string_length(5)
            .max_binary_length(3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_string_length, 5);
        assert!(config.validate().is_ok());
    }
}
