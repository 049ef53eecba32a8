//! Row conversion pipeline
//!
//! Converts one raw CSV record at a time into a typed row according to a
//! fixed, positional column mapping. The converter is a stateless per-row
//! function: nothing is shared between rows, so a failure on one row cannot
//! affect the next.
//!
//! Timestamps are parsed against a fixed priority list of formats. When no
//! format matches, the behavior is governed by an explicit [`TimestampPolicy`]
//! rather than an implicit fallback: the compatibility default substitutes
//! the current date at midnight and records a diagnostic, but callers can opt
//! into rejecting the row or failing the run.

use crate::types::{DataType, Value};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

/// Timestamp formats attempted in priority order; first success wins.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.6f", "%Y-%m-%d %H:%M:%S"];

/// Declared (name, type, nullability, position) tuple for one output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Declared data type
    pub data_type: DataType,
    /// Whether an absent source field maps to null
    pub nullable: bool,
    /// Source field position in the raw record
    pub index: usize,
}

/// One raw record: ordered optional text fields, in file order.
///
/// `None` marks an absent field (e.g. omitted at end of line); `Some("")` is
/// a present-but-empty field.
pub type RawRow = Vec<Option<String>>;

/// Typed values aligned 1:1 with the column specs
pub type TypedRow = Vec<Value>;

/// Row-level conversion failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Field content is not a valid UUID string
    #[error("malformed UUID in column `{field}`: `{value}`")]
    MalformedUuid { field: String, value: String },

    /// Non-nullable column with no source value
    #[error("missing value for non-nullable column `{field}`")]
    MissingField { field: String },

    /// No configured timestamp format matched, under a rejecting policy
    #[error("unparseable timestamp in column `{field}`: `{value}`")]
    UnparseableTimestamp { field: String, value: String },
}

/// What to do when no timestamp format matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Substitute the current date at midnight and record a diagnostic.
    /// Compatibility default; rows are never dropped for a bad timestamp.
    #[default]
    SubstituteNow,
    /// Fail the row; it is skipped and the run continues
    RejectRow,
    /// Fail the row; the caller is expected to abort the run
    FailRun,
}

/// Diagnostic recorded when a timestamp value was recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Column the value came from
    pub field: String,
    /// The unparsed input
    pub value: String,
    /// What was substituted
    pub note: String,
}

/// A successfully converted row plus any field-level diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub row: TypedRow,
    pub diagnostics: Vec<Diagnostic>,
}

/// Stateless per-row converter driven by a fixed column mapping
#[derive(Debug, Clone)]
pub struct RowConverter {
    specs: Vec<ColumnSpec>,
    policy: TimestampPolicy,
    fallback: NaiveDateTime,
}

impl RowConverter {
    /// Create a converter for the given column specs and timestamp policy.
    ///
    /// The fallback value defaults to today's local date at midnight.
    pub fn new(specs: Vec<ColumnSpec>, policy: TimestampPolicy) -> Self {
        let today = Local::now().date_naive();
        Self {
            specs,
            policy,
            fallback: today.and_time(NaiveTime::default()),
        }
    }

    /// Pin the date used by the substitute-now fallback
    pub fn with_fallback_date(mut self, date: NaiveDate) -> Self {
        self.fallback = date.and_time(NaiveTime::default());
        self
    }

    /// The column specs driving this converter
    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    /// Convert one raw record into a typed row.
    ///
    /// The record must carry at least as many fields as there are specs;
    /// extra fields are ignored, missing trailing fields read as absent.
    pub fn convert(&self, raw: &RawRow) -> Result<Conversion, RowError> {
        let mut row = Vec::with_capacity(self.specs.len());
        let mut diagnostics = Vec::new();
        for spec in &self.specs {
            let field = raw.get(spec.index).and_then(|f| f.as_deref());
            row.push(self.convert_field(spec, field, &mut diagnostics)?);
        }
        Ok(Conversion { row, diagnostics })
    }

    fn convert_field(
        &self,
        spec: &ColumnSpec,
        field: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Value, RowError> {
        match spec.data_type {
            // A present empty field is a value for text columns; only an
            // absent field is the null marker.
            DataType::Text => match field {
                Some(s) => Ok(Value::Text(s.to_owned())),
                None => self.null_or_missing(spec),
            },
            // An empty string can never be a UUID or timestamp, so it is
            // treated as absent rather than as a parse failure.
            DataType::Uuid => match field {
                Some(s) if !s.is_empty() => Uuid::parse_str(s)
                    .map(Value::Uuid)
                    .map_err(|_| RowError::MalformedUuid {
                        field: spec.name.clone(),
                        value: s.to_owned(),
                    }),
                _ => self.null_or_missing(spec),
            },
            DataType::Timestamp => match field {
                Some(s) if !s.is_empty() => self.convert_timestamp(spec, s, diagnostics),
                _ => self.null_or_missing(spec),
            },
        }
    }

    fn null_or_missing(&self, spec: &ColumnSpec) -> Result<Value, RowError> {
        if spec.nullable {
            Ok(Value::Null)
        } else {
            Err(RowError::MissingField {
                field: spec.name.clone(),
            })
        }
    }

    fn convert_timestamp(
        &self,
        spec: &ColumnSpec,
        value: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Value, RowError> {
        if let Some(parsed) = parse_timestamp(value) {
            return Ok(Value::Timestamp(parsed.and_utc().timestamp_micros()));
        }
        match self.policy {
            TimestampPolicy::SubstituteNow => {
                log::warn!(
                    "unparseable timestamp `{}` in column `{}`, substituting {}",
                    value,
                    spec.name,
                    self.fallback.date()
                );
                diagnostics.push(Diagnostic {
                    field: spec.name.clone(),
                    value: value.to_owned(),
                    note: format!("substituted {}", self.fallback.date()),
                });
                Ok(Value::Timestamp(self.fallback.and_utc().timestamp_micros()))
            }
            TimestampPolicy::RejectRow | TimestampPolicy::FailRun => {
                Err(RowError::UnparseableTimestamp {
                    field: spec.name.clone(),
                    value: value.to_owned(),
                })
            }
        }
    }
}

/// Attempt the configured formats in priority order; `None` if no match.
///
/// Each call applies the format strings fresh; there is no shared parser
/// state.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec {
                name: "id".to_string(),
                data_type: DataType::Uuid,
                nullable: false,
                index: 0,
            },
            ColumnSpec {
                name: "status".to_string(),
                data_type: DataType::Text,
                nullable: true,
                index: 1,
            },
            ColumnSpec {
                name: "change_date".to_string(),
                data_type: DataType::Timestamp,
                nullable: true,
                index: 2,
            },
            ColumnSpec {
                name: "location_id".to_string(),
                data_type: DataType::Uuid,
                nullable: true,
                index: 3,
            },
        ]
    }

    fn raw(fields: &[Option<&str>]) -> RawRow {
        fields.iter().map(|f| f.map(str::to_owned)).collect()
    }

    fn converter(policy: TimestampPolicy) -> RowConverter {
        RowConverter::new(specs(), policy)
            .with_fallback_date(NaiveDate::from_ymd_opt(2021, 3, 1).unwrap())
    }

    #[test]
    fn test_valid_row_converts_fully_typed() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let result = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                Some("CREATED"),
                Some("2021-02-06 05:31:24.088902"),
                Some("7f1cfe6e-0e5c-4b8a-b2ff-bdc1ce5dcbbc"),
            ]))
            .unwrap();
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.row.len(), 4);
        assert_eq!(
            result.row[0].as_uuid().unwrap().to_string(),
            "3fb171d8-66a7-4a9e-9627-3d0309c7a628"
        );
        assert_eq!(result.row[1].as_str(), Some("CREATED"));
        // microsecond-precision format is first in priority order
        let expected = NaiveDateTime::parse_from_str(
            "2021-02-06 05:31:24.088902",
            "%Y-%m-%d %H:%M:%S%.6f",
        )
        .unwrap();
        assert_eq!(
            result.row[2].as_timestamp_micros(),
            Some(expected.and_utc().timestamp_micros())
        );
    }

    #[test]
    fn test_seconds_precision_format() {
        let parsed = parse_timestamp("2021-02-06 05:31:24").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2021, 2, 6)
                .unwrap()
                .and_hms_opt(5, 31, 24)
                .unwrap()
        );
    }

    #[test]
    fn test_absent_nullable_fields_become_null() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let result = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                None,
                None,
                None,
            ]))
            .unwrap();
        assert!(result.row[1].is_null());
        assert!(result.row[2].is_null());
        assert!(result.row[3].is_null());
    }

    #[test]
    fn test_empty_uuid_field_is_null_not_parse_error() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let result = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                Some("CREATED"),
                Some("2021-02-06 05:31:24"),
                Some(""),
            ]))
            .unwrap();
        assert!(result.row[3].is_null());
    }

    #[test]
    fn test_empty_text_is_preserved_distinct_from_null() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let result = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                Some(""),
                None,
                None,
            ]))
            .unwrap();
        assert_eq!(result.row[1], Value::Text(String::new()));
    }

    #[test]
    fn test_malformed_uuid_fails_row() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let err = conv
            .convert(&raw(&[Some("not-a-uuid"), None, None, None]))
            .unwrap_err();
        assert_eq!(
            err,
            RowError::MalformedUuid {
                field: "id".to_string(),
                value: "not-a-uuid".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_non_nullable_field_fails_row() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let err = conv.convert(&raw(&[None, None, None, None])).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingField {
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_timestamp_fallback_substitutes_pinned_date() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let result = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                Some("CREATED"),
                Some("not-a-date"),
                None,
            ]))
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 3, 1)
            .unwrap()
            .and_time(NaiveTime::default())
            .and_utc()
            .timestamp_micros();
        assert_eq!(result.row[2].as_timestamp_micros(), Some(expected));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].field, "change_date");
        assert_eq!(result.diagnostics[0].value, "not-a-date");
    }

    #[test]
    fn test_reject_row_policy_fails_on_bad_timestamp() {
        let conv = converter(TimestampPolicy::RejectRow);
        let err = conv
            .convert(&raw(&[
                Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
                Some("CREATED"),
                Some("not-a-date"),
                None,
            ]))
            .unwrap_err();
        assert!(matches!(err, RowError::UnparseableTimestamp { .. }));
    }

    #[test]
    fn test_row_independence() {
        // a malformed UUID in row N does not affect row N+1
        let conv = converter(TimestampPolicy::SubstituteNow);
        let bad = raw(&[Some("oops"), None, None, None]);
        let good = raw(&[
            Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
            Some("DELIVERED"),
            Some("2021-02-06 05:31:24"),
            None,
        ]);
        assert!(conv.convert(&bad).is_err());
        let result = conv.convert(&good).unwrap();
        assert_eq!(result.row[1].as_str(), Some("DELIVERED"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let conv = converter(TimestampPolicy::SubstituteNow);
        let mut fields = raw(&[
            Some("3fb171d8-66a7-4a9e-9627-3d0309c7a628"),
            Some("CREATED"),
            Some("2021-02-06 05:31:24"),
            None,
        ]);
        fields.push(Some("trailing junk".to_owned()));
        let result = conv.convert(&fields).unwrap();
        assert_eq!(result.row.len(), 4);
    }
}
