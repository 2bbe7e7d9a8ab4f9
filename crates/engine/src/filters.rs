//! Predicate stage builder for the list operations.
//!
//! Each entity exposes a fixed list filter (see the record modules) whose
//! optional fields map one-to-one onto stages. `None` means "no filter";
//! `Some("")` or `Some(0)` is a real search for the empty string or zero.
//! Every populated field appends one `Match` stage (three for name joins:
//! `Lookup`, `Unwind`, `Match`), all implicitly ANDed, and every pipeline ends
//! with the soft-delete exclusion.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    document::{DELETED_AT_FIELD, ID_FIELD, parse_timestamp, timestamp_value},
    pipeline::{Condition, Filter, Lookup, Pipeline, Stage, Unwind},
};

/// A list request that knows which collection it filters and how.
pub trait ListFilter {
    const COLLECTION: &'static str;

    /// Builds the filter pipeline. `now` anchors relative windows such as
    /// "created during the last month".
    fn pipeline(&self, now: DateTime<Utc>) -> Pipeline;
}

#[derive(Debug, Default)]
pub struct StageBuilder {
    pipeline: Pipeline,
}

impl StageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_match(&mut self, field: &str, condition: Condition) {
        self.pipeline
            .push(Stage::Match(Filter::new().and(field, condition)));
    }

    pub fn equals<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.push_match(field, Condition::Eq(value.into()));
        }
        self
    }

    pub fn contains(mut self, field: &str, needle: Option<&str>) -> Self {
        if let Some(needle) = needle {
            self.push_match(field, Condition::Contains(needle.to_string()));
        }
        self
    }

    pub fn at_least(mut self, field: &str, threshold: Option<i64>) -> Self {
        if let Some(threshold) = threshold {
            self.push_match(field, Condition::Gte(Value::from(threshold)));
        }
        self
    }

    pub fn since(mut self, field: &str, from: Option<DateTime<Utc>>) -> Self {
        if let Some(from) = from {
            self.push_match(field, Condition::Gte(timestamp_value(from)));
        }
        self
    }

    /// `[from, to)` on a timestamp field. Both bounds must be present and
    /// parseable, otherwise the filter is skipped entirely.
    pub fn date_range(mut self, field: &str, from: Option<&str>, to: Option<&str>) -> Self {
        match (from, to) {
            (None, None) => {}
            (Some(from), Some(to)) => match (parse_timestamp(from), parse_timestamp(to)) {
                (Some(from), Some(to)) => self.push_match(
                    field,
                    Condition::Range {
                        gte: timestamp_value(from),
                        lt: timestamp_value(to),
                    },
                ),
                _ => tracing::warn!(field, from, to, "skipping unparseable date range filter"),
            },
            (from, to) => {
                tracing::warn!(field, ?from, ?to, "skipping date range filter with a missing bound")
            }
        }
        self
    }

    /// Joins `from` on `local_field -> _id`, keeps the first-level match and
    /// filters on the joined document's `name`.
    pub fn joined_name(
        mut self,
        from: &str,
        local_field: &str,
        as_field: &str,
        needle: Option<&str>,
    ) -> Self {
        let Some(needle) = needle else {
            return self;
        };
        self.pipeline.push(Stage::Lookup(Lookup {
            from: from.to_string(),
            local_field: local_field.to_string(),
            foreign_field: ID_FIELD.to_string(),
            as_field: as_field.to_string(),
            active_only: true,
        }));
        self.pipeline.push(Stage::Unwind(Unwind {
            path: as_field.to_string(),
            preserve_empty: false,
        }));
        self.push_match(
            &format!("{as_field}.name"),
            Condition::Contains(needle.to_string()),
        );
        self
    }

    /// Terminates the pipeline with the soft-delete exclusion.
    pub fn build(mut self) -> Pipeline {
        self.push_match(DELETED_AT_FIELD, Condition::IsNull);
        self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deletion_stage() -> Stage {
        Stage::Match(Filter::new().active())
    }

    #[test]
    fn empty_request_yields_only_the_deletion_stage() {
        let pipeline = StageBuilder::new()
            .equals::<&str>("user_id", None)
            .contains("name", None)
            .at_least("balance_minor", None)
            .date_range("date", None, None)
            .joined_name("categories", "category_id", "category", None)
            .build();
        assert_eq!(pipeline.stages(), &[deletion_stage()]);
    }

    #[test]
    fn empty_string_is_a_real_search() {
        let pipeline = StageBuilder::new().equals("type", Some("")).build();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline.stages()[0],
            Stage::Match(Filter::new().eq("type", ""))
        );
    }

    #[test]
    fn partial_or_malformed_ranges_are_skipped() {
        let partial = StageBuilder::new()
            .date_range("date", Some("2024-01-01"), None)
            .build();
        assert_eq!(partial.stages(), &[deletion_stage()]);

        let malformed = StageBuilder::new()
            .date_range("date", Some("2024-01-01"), Some("not a date"))
            .build();
        assert_eq!(malformed.stages(), &[deletion_stage()]);

        let full = StageBuilder::new()
            .date_range("date", Some("2024-01-01"), Some("2024-02-01 00:00:00"))
            .build();
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn name_join_appends_three_stages() {
        let pipeline = StageBuilder::new()
            .joined_name("categories", "category_id", "category", Some("food"))
            .build();
        assert_eq!(pipeline.len(), 4);
        assert!(matches!(pipeline.stages()[0], Stage::Lookup(_)));
        assert!(matches!(pipeline.stages()[1], Stage::Unwind(_)));
        assert_eq!(
            pipeline.explain()[2]["$match"]["category.name"]["$regex"],
            json!(".*food.*")
        );
    }

    #[test]
    fn building_twice_is_structurally_identical() {
        let build = || {
            StageBuilder::new()
                .equals("user_id", Some("u1"))
                .contains("name", Some("sav"))
                .at_least("balance_minor", Some(0))
                .build()
        };
        assert_eq!(build(), build());
    }
}
