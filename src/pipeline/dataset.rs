//! In-memory multi-route dataset supplied by the caller.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One raw observation of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub period: NaiveDate,
    pub origin: String,
    pub destination: String,
    /// Values in the order of [`RouteDataset::columns`]; missing values are `NaN`.
    pub values: Vec<f64>,
}

impl RawRecord {
    pub fn new(
        period: NaiveDate,
        origin: impl Into<String>,
        destination: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            period,
            origin: origin.into(),
            destination: destination.into(),
            values,
        }
    }

    pub fn is_route(&self, origin: &str, destination: &str) -> bool {
        self.origin == origin && self.destination == destination
    }
}

/// Historical records of every route, sharing one column layout.
///
/// Read-only once built, so it can be shared across route workers.
/// Deserialized datasets go through the same record validation as
/// [`RouteDataset::from_records`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetParts")]
pub struct RouteDataset {
    columns: Vec<String>,
    records: Vec<RawRecord>,
}

/// Unvalidated serialized form of a [`RouteDataset`].
#[derive(Deserialize)]
struct DatasetParts {
    columns: Vec<String>,
    records: Vec<RawRecord>,
}

impl TryFrom<DatasetParts> for RouteDataset {
    type Error = ForecastError;

    fn try_from(parts: DatasetParts) -> Result<Self> {
        Self::from_records(parts.columns, parts.records)
    }
}

impl RouteDataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Build a dataset, validating every record against the column layout.
    pub fn from_records(columns: Vec<String>, records: Vec<RawRecord>) -> Result<Self> {
        let mut dataset = Self::new(columns);
        for record in records {
            dataset.push(record)?;
        }
        Ok(dataset)
    }

    pub fn push(&mut self, record: RawRecord) -> Result<()> {
        if record.values.len() != self.columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.columns.len(),
                got: record.values.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct `(origin, destination)` pairs in sorted order.
    pub fn routes(&self) -> Vec<(String, String)> {
        self.records
            .iter()
            .map(|r| (r.origin.clone(), r.destination.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn route_records<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
    ) -> impl Iterator<Item = &'a RawRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.is_route(origin, destination))
    }
}
