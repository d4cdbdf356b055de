use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operator of a single label filter. Unknown wire values fall back to
/// `Equals` (B5) rather than rejecting the watch object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum LabelOp {
    In,
    NotIn,
    Equals,
    DoubleEquals,
    NotEquals,
    GreaterThan,
    LessThan,
    Exists,
    DoesNotExist,
    #[serde(other)]
    Unknown,
}

impl Default for LabelOp {
    fn default() -> Self {
        LabelOp::Equals
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelFilter {
    pub key: String,
    #[serde(default)]
    pub op: LabelOp,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A compiled, AND-composed predicate over a label map. Built once per
/// reconcile pass by `compile`, then applied to every candidate object or
/// namespace.
pub struct Selector {
    filters: Vec<LabelFilter>,
}

impl Selector {
    /// An empty filter list yields a match-all selector.
    pub fn compile(filters: &[LabelFilter]) -> Selector {
        Selector {
            filters: filters.to_vec(),
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.filters.iter().all(|f| matches_one(f, labels))
    }
}

fn matches_one(filter: &LabelFilter, labels: &BTreeMap<String, String>) -> bool {
    let value = labels.get(&filter.key);
    match effective_op(&filter.op) {
        LabelOp::Exists => value.is_some(),
        LabelOp::DoesNotExist => value.is_none(),
        LabelOp::NotIn => match value {
            Some(v) => !filter.values.iter().any(|x| x == v),
            None => true,
        },
        LabelOp::In => match value {
            Some(v) => filter.values.iter().any(|x| x == v),
            None => false,
        },
        LabelOp::NotEquals => match value {
            Some(v) => filter.values.first().is_none_or(|x| x != v),
            None => true,
        },
        // Equals, DoubleEquals, GreaterThan, LessThan and the Unknown
        // fallback all reduce to simple equality against the first value;
        // ordering comparators on label values have no defined semantics
        // in this system and are treated the same as equality.
        _ => match value {
            Some(v) => filter.values.first().is_some_and(|x| x == v),
            None => false,
        },
    }
}

fn effective_op(op: &LabelOp) -> &LabelOp {
    match op {
        LabelOp::Unknown => &LabelOp::Equals,
        other => other,
    }
}
