use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::BoxError;
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRange {
    Past,
    Future,
    #[default]
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalGenerator {
    pub kind: TemporalKind,
    pub range: TemporalRange,
    pub days: i64,
    /// Reference day; today when absent.
    pub anchor: Option<NaiveDate>,
}

impl TemporalGenerator {
    pub fn new(kind: TemporalKind, days: i64) -> Self {
        Self { kind, range: TemporalRange::Any, days: days.max(1), anchor: None }
    }

    pub fn range(mut self, range: TemporalRange) -> Self {
        self.range = range;
        self
    }

    pub fn anchored_at(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

impl Generator for TemporalGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Temporal
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        let anchor = self.anchor.unwrap_or_else(|| Local::now().date_naive());
        let offset = match self.range {
            TemporalRange::Past => -random.int_range(1, self.days),
            TemporalRange::Future => random.int_range(1, self.days),
            TemporalRange::Any => random.int_range(-self.days, self.days),
        };
        let date = anchor
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| format!("date offset of {offset} days from {anchor} is out of range"))?;
        Ok(match self.kind {
            TemporalKind::Date => Value::Date(date),
            TemporalKind::DateTime => {
                let secs = random.int_range(0, 86_399) as u32;
                let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
                    .ok_or("seconds past midnight out of range")?;
                Value::DateTime(date.and_time(time))
            }
        })
    }

    fn target(&self) -> Option<TargetClass> {
        Some(match self.kind {
            TemporalKind::Date => TargetClass::Date,
            TemporalKind::DateTime => TargetClass::DateTime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_and_future_relative_to_anchor() {
        let anchor = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let mut r = Random::new(5);
        let past = TemporalGenerator::new(TemporalKind::Date, 30)
            .range(TemporalRange::Past)
            .anchored_at(anchor);
        let future = past.clone().range(TemporalRange::Future);
        for _ in 0..20 {
            let Value::Date(p) = past.generate(&mut r).unwrap() else { panic!("date") };
            let Value::Date(f) = future.generate(&mut r).unwrap() else { panic!("date") };
            assert!(p < anchor && f > anchor);
        }
    }

    #[test]
    fn datetime_kind_produces_datetime() {
        let mut r = Random::new(5);
        let g = TemporalGenerator::new(TemporalKind::DateTime, 10);
        assert!(matches!(g.generate(&mut r).unwrap(), Value::DateTime(_)));
    }
}
