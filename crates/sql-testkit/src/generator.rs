//! Random values for synthetic records.

use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use testkit_types::{SqlType, SqlValue};

use crate::config::GeneratorConfig;
use crate::error::Result;

/// Largest number of digits a decimal mantissa can hold.
const MAX_DECIMAL_DIGITS: u8 = 28;

const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// Characters mixed into NVARCHAR data so that non-ASCII text gets exercised.
const WIDE_CHARS: &[char] = &['é', 'ß', 'Ω', 'ж', '中', '€'];

/// Random value source for [`ColumnDefinition::random_value`](crate::ColumnDefinition::random_value).
///
/// Every value produced for a type passes that type's coercion unchanged,
/// so random records never fail validation.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Generator {
    /// Create a generator, seeding from entropy unless the config has a seed.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tracing::debug!(seed = ?config.seed, "generator created");
        Ok(Self { config, rng })
    }

    /// Create a deterministic generator with default settings.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        let config = GeneratorConfig::default().seed(seed);
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce a value for a column of type `sql_type`.
    ///
    /// Nullable columns yield NULL with the configured probability.
    pub fn value_for(&mut self, sql_type: SqlType, nullable: bool) -> SqlValue {
        if nullable && self.rng.gen_bool(self.config.null_probability) {
            return SqlValue::Null;
        }

        match sql_type {
            SqlType::Bit => SqlValue::Bool(self.rng.r#gen()),
            SqlType::TinyInt => SqlValue::TinyInt(self.rng.r#gen()),
            SqlType::SmallInt => SqlValue::SmallInt(self.rng.r#gen()),
            SqlType::Int => SqlValue::Int(self.rng.r#gen()),
            SqlType::BigInt => SqlValue::BigInt(self.rng.r#gen()),
            SqlType::Real => SqlValue::Float(self.rng.gen_range(-1.0e6..1.0e6)),
            SqlType::Float => SqlValue::Double(self.rng.gen_range(-1.0e12..1.0e12)),
            SqlType::Decimal { precision, scale } => {
                SqlValue::Decimal(self.decimal(precision, scale))
            }
            SqlType::NVarChar { max_length } => {
                let len = self.string_length(max_length);
                SqlValue::String(self.wide_text(len))
            }
            SqlType::VarChar { max_length } => {
                let len = self.string_length(max_length);
                SqlValue::String(self.ascii_text(len))
            }
            SqlType::Xml => {
                let len = self.string_length(self.config.max_string_length);
                SqlValue::Xml(format!("<value>{}</value>", self.ascii_text(len)))
            }
            SqlType::VarBinary { max_length } => {
                let limit = self.config.max_binary_length.min(max_length);
                let mut data = vec![0u8; self.rng.gen_range(0..=usize::from(limit))];
                self.rng.fill(&mut data[..]);
                SqlValue::Binary(Bytes::from(data))
            }
            SqlType::UniqueIdentifier => {
                SqlValue::Uuid(uuid::Builder::from_random_bytes(self.rng.r#gen()).into_uuid())
            }
            SqlType::Date => SqlValue::Date(self.date()),
            SqlType::Time { scale } => SqlValue::Time(self.time(scale)),
            SqlType::DateTime2 { scale } => SqlValue::DateTime(self.datetime(scale)),
            SqlType::DateTimeOffset { scale } => {
                SqlValue::DateTimeOffset(self.datetime_offset(scale))
            }
        }
    }

    fn string_length(&mut self, max_length: u16) -> usize {
        let limit = self.config.max_string_length.min(max_length);
        self.rng.gen_range(0..=usize::from(limit))
    }

    fn ascii_text(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn wide_text(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                if self.rng.gen_bool(0.1) {
                    WIDE_CHARS[self.rng.gen_range(0..WIDE_CHARS.len())]
                } else {
                    char::from(self.rng.sample(Alphanumeric))
                }
            })
            .collect()
    }

    fn decimal(&mut self, precision: u8, scale: u8) -> Decimal {
        let fraction_digits = scale.min(MAX_DECIMAL_DIGITS);
        let integer_digits = precision
            .saturating_sub(scale)
            .min(MAX_DECIMAL_DIGITS - fraction_digits);
        let bound = 10i128.pow(u32::from(integer_digits + fraction_digits)) - 1;
        let mantissa = self.rng.gen_range(-bound..=bound);
        Decimal::try_from_i128_with_scale(mantissa, u32::from(fraction_digits))
            .unwrap_or(Decimal::ZERO)
    }

    fn date(&mut self) -> NaiveDate {
        let span = (self.config.max_date - self.config.min_date).num_days();
        let offset = self.rng.gen_range(0..=span);
        self.config
            .min_date
            .checked_add_signed(Duration::days(offset))
            .unwrap_or(self.config.min_date)
    }

    fn time(&mut self, scale: u8) -> NaiveTime {
        let nanos = self.rng.gen_range(0..NANOS_PER_DAY);
        let unit = 10u64.pow(9 - u32::from(scale.min(9)));
        let fraction = (nanos % 1_000_000_000) / unit * unit;
        let secs = nanos / 1_000_000_000;
        u32::try_from(secs)
            .ok()
            .zip(u32::try_from(fraction).ok())
            .and_then(|(secs, nano)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nano))
            .unwrap_or(NaiveTime::MIN)
    }

    fn datetime(&mut self, scale: u8) -> NaiveDateTime {
        let date = self.date();
        date.and_time(self.time(scale))
    }

    fn datetime_offset(&mut self, scale: u8) -> DateTime<FixedOffset> {
        let utc = self.datetime(scale);
        let minutes = self.rng.gen_range(-14 * 60..=14 * 60);
        let offset = FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix());
        DateTime::from_naive_utc_and_offset(utc, offset)
    }
}
