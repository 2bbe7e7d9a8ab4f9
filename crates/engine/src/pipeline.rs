//! Aggregation stage vocabulary.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s executed by a
//! [`DocumentStore`](crate::DocumentStore) against one collection. The
//! vocabulary is the small subset of a MongoDB-style aggregation language that
//! the list filters and the reports need, nothing more.

use std::fmt;

use serde_json::{Value, json};

use crate::document::DELETED_AT_FIELD;

/// A single predicate on one field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(Value),
    /// Field missing or `null`.
    IsNull,
    /// Case-insensitive substring match on a string field.
    Contains(String),
    Gte(Value),
    Lt(Value),
    /// `gte <= field < lt`.
    Range { gte: Value, lt: Value },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub condition: Condition,
}

/// Conjunction of predicates. An empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            condition,
        });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and(field, Condition::Eq(value.into()))
    }

    /// Shorthand for the soft-delete exclusion.
    pub fn active(self) -> Self {
        self.and(DELETED_AT_FIELD, Condition::IsNull)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn explain(&self) -> Value {
        let mut out = serde_json::Map::new();
        for predicate in &self.predicates {
            let rendered = match &predicate.condition {
                Condition::Eq(value) => value.clone(),
                Condition::IsNull => Value::Null,
                Condition::Contains(needle) => {
                    json!({"$regex": format!(".*{needle}.*"), "$options": "i"})
                }
                Condition::Gte(value) => json!({"$gte": value}),
                Condition::Lt(value) => json!({"$lt": value}),
                Condition::Range { gte, lt } => json!({"$gte": gte, "$lt": lt}),
            };
            out.insert(predicate.field.clone(), rendered);
        }
        Value::Object(out)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GroupKey {
    /// Every document lands in one group.
    Null,
    Field(String),
    /// `YYYY-MM` of a timestamp field.
    YearMonth(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Accumulator {
    /// Sum of the numeric values at the path; missing values count as 0.
    Sum(String),
    /// Value at the path in the first document of the group.
    First(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub accumulators: Vec<(String, Accumulator)>,
}

impl Group {
    pub fn by(key: GroupKey) -> Self {
        Self {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn sum(mut self, output: impl Into<String>, path: impl Into<String>) -> Self {
        self.accumulators
            .push((output.into(), Accumulator::Sum(path.into())));
        self
    }

    pub fn first(mut self, output: impl Into<String>, path: impl Into<String>) -> Self {
        self.accumulators
            .push((output.into(), Accumulator::First(path.into())));
        self
    }
}

/// Left outer join: documents of `from` whose `foreign_field` equals this
/// document's `local_field` are collected into the array `as_field`.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookup {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    /// Only join documents that are not soft-deleted.
    pub active_only: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Unwind {
    pub path: String,
    /// Keep documents whose array is missing or empty (left join semantics).
    pub preserve_empty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Match(Filter),
    Lookup(Lookup),
    Unwind(Unwind),
    Group(Group),
    Sort(Vec<(String, SortOrder)>),
    /// Emits a single `{name: n}` document, or nothing when `n == 0`.
    Count(String),
    Skip(u64),
    Limit(u64),
}

impl Stage {
    fn explain(&self) -> Value {
        match self {
            Stage::Match(filter) => json!({"$match": filter.explain()}),
            Stage::Lookup(lookup) => json!({"$lookup": {
                "from": lookup.from,
                "localField": lookup.local_field,
                "foreignField": lookup.foreign_field,
                "as": lookup.as_field,
                "activeOnly": lookup.active_only,
            }}),
            Stage::Unwind(unwind) => json!({"$unwind": {
                "path": format!("${}", unwind.path),
                "preserveNullAndEmptyArrays": unwind.preserve_empty,
            }}),
            Stage::Group(group) => {
                let id = match &group.key {
                    GroupKey::Null => Value::Null,
                    GroupKey::Field(field) => json!(format!("${field}")),
                    GroupKey::YearMonth(field) => json!({"$dateToString": {
                        "format": "%Y-%m",
                        "date": format!("${field}"),
                    }}),
                };
                let mut body = serde_json::Map::new();
                body.insert("_id".to_string(), id);
                for (output, acc) in &group.accumulators {
                    let rendered = match acc {
                        Accumulator::Sum(path) => json!({"$sum": format!("${path}")}),
                        Accumulator::First(path) => json!({"$first": format!("${path}")}),
                    };
                    body.insert(output.clone(), rendered);
                }
                json!({"$group": body})
            }
            Stage::Sort(keys) => {
                let body: serde_json::Map<String, Value> = keys
                    .iter()
                    .map(|(field, order)| {
                        let dir = match order {
                            SortOrder::Asc => 1,
                            SortOrder::Desc => -1,
                        };
                        (field.clone(), json!(dir))
                    })
                    .collect();
                json!({"$sort": body})
            }
            Stage::Count(name) => json!({"$count": name}),
            Stage::Skip(n) => json!({"$skip": n}),
            Stage::Limit(n) => json!({"$limit": n}),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Collections referenced by `Lookup` stages, in order, without duplicates.
    pub fn lookup_sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for stage in &self.stages {
            if let Stage::Lookup(lookup) = stage
                && !out.contains(&lookup.from.as_str())
            {
                out.push(lookup.from.as_str());
            }
        }
        out
    }

    /// MongoDB-style rendering, used for debug logs.
    pub fn explain(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::explain).collect())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Self { stages }
    }
}
