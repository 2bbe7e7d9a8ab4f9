//! In-process pipeline evaluator shared by the stores.

use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value;

use crate::{
    document::{
        Document, add_numbers, compare_values, get_path, is_active, remove_path, set_path,
        values_equal,
    },
    pipeline::{
        Accumulator, Condition, Filter, Group, GroupKey, Lookup, Pipeline, SortOrder, Stage,
        Unwind,
    },
};

pub(crate) fn matches(doc: &Document, filter: &Filter) -> bool {
    filter.predicates().iter().all(|predicate| {
        let value = get_path(doc, &predicate.field);
        match &predicate.condition {
            Condition::Eq(expected) => values_equal(value, Some(expected)),
            Condition::IsNull => value.is_none_or(Value::is_null),
            Condition::Contains(needle) => value
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Condition::Gte(bound) => value
                .and_then(|v| compare_values(v, bound))
                .is_some_and(Ordering::is_ge),
            Condition::Lt(bound) => value
                .and_then(|v| compare_values(v, bound))
                .is_some_and(Ordering::is_lt),
            Condition::Range { gte, lt } => value.is_some_and(|v| {
                compare_values(v, gte).is_some_and(Ordering::is_ge)
                    && compare_values(v, lt).is_some_and(Ordering::is_lt)
            }),
        }
    })
}

/// Runs pipelines over a base collection. `sources` holds every collection a
/// `Lookup` stage may reference.
pub(crate) struct Evaluator<'a> {
    sources: &'a HashMap<String, Vec<Document>>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(sources: &'a HashMap<String, Vec<Document>>) -> Self {
        Self { sources }
    }

    pub(crate) fn run(&self, mut docs: Vec<Document>, pipeline: &Pipeline) -> Vec<Document> {
        for stage in pipeline.stages() {
            docs = match stage {
                Stage::Match(filter) => docs.into_iter().filter(|d| matches(d, filter)).collect(),
                Stage::Lookup(lookup) => self.lookup(docs, lookup),
                Stage::Unwind(unwind) => unwind_docs(docs, unwind),
                Stage::Group(group) => group_docs(docs, group),
                Stage::Sort(keys) => {
                    docs.sort_by(|a, b| compare_docs(a, b, keys));
                    docs
                }
                Stage::Count(name) => {
                    if docs.is_empty() {
                        Vec::new()
                    } else {
                        let mut out = Document::new();
                        out.insert(name.clone(), Value::from(docs.len() as u64));
                        vec![out]
                    }
                }
                Stage::Skip(n) => docs.into_iter().skip(*n as usize).collect(),
                Stage::Limit(n) => docs.into_iter().take(*n as usize).collect(),
            };
        }
        docs
    }

    fn lookup(&self, docs: Vec<Document>, lookup: &Lookup) -> Vec<Document> {
        let foreign: &[Document] = self
            .sources
            .get(&lookup.from)
            .map(Vec::as_slice)
            .unwrap_or_default();

        docs.into_iter()
            .map(|mut doc| {
                let local = get_path(&doc, &lookup.local_field).filter(|v| !v.is_null());
                let joined: Vec<Value> = match local {
                    None => Vec::new(),
                    Some(local) => foreign
                        .iter()
                        .filter(|f| !lookup.active_only || is_active(f))
                        .filter(|f| values_equal(get_path(f, &lookup.foreign_field), Some(local)))
                        .map(|f| Value::Object(f.clone()))
                        .collect(),
                };
                set_path(&mut doc, &lookup.as_field, Value::Array(joined));
                doc
            })
            .collect()
    }
}

fn unwind_docs(docs: Vec<Document>, unwind: &Unwind) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for mut doc in docs {
        match remove_path(&mut doc, &unwind.path) {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut copy = doc.clone();
                    set_path(&mut copy, &unwind.path, item);
                    out.push(copy);
                }
            }
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if unwind.preserve_empty {
                    out.push(doc);
                }
            }
            Some(scalar) => {
                set_path(&mut doc, &unwind.path, scalar);
                out.push(doc);
            }
        }
    }
    out
}

fn group_key(doc: &Document, key: &GroupKey) -> Value {
    match key {
        GroupKey::Null => Value::Null,
        GroupKey::Field(field) => get_path(doc, field).cloned().unwrap_or(Value::Null),
        GroupKey::YearMonth(field) => get_path(doc, field)
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| Value::String(dt.with_timezone(&chrono::Utc).format("%Y-%m").to_string()))
            .unwrap_or(Value::Null),
    }
}

fn group_docs(docs: Vec<Document>, group: &Group) -> Vec<Document> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Document> = Vec::new();

    for doc in docs {
        let key = group_key(&doc, &group.key);
        let slot = *index.entry(key.to_string()).or_insert_with(|| {
            let mut fresh = Document::new();
            fresh.insert("_id".to_string(), key.clone());
            for (output, acc) in &group.accumulators {
                let initial = match acc {
                    Accumulator::Sum(_) => Value::from(0),
                    Accumulator::First(path) => get_path(&doc, path).cloned().unwrap_or(Value::Null),
                };
                fresh.insert(output.clone(), initial);
            }
            out.push(fresh);
            out.len() - 1
        });

        let target = &mut out[slot];
        for (output, acc) in &group.accumulators {
            if let Accumulator::Sum(path) = acc
                && let Some(value) = get_path(&doc, path).filter(|v| v.is_number())
            {
                let current = target.get(output).cloned().unwrap_or(Value::from(0));
                target.insert(output.clone(), add_numbers(&current, value));
            }
        }
    }
    out
}

fn compare_docs(a: &Document, b: &Document, keys: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in keys {
        let left = get_path(a, field).filter(|v| !v.is_null());
        let right = get_path(b, field).filter(|v| !v.is_null());
        let ord = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(l), Some(r)) => compare_values(l, r).unwrap_or(Ordering::Equal),
        };
        let ord = match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
