//! Scope resolver (C7).
//!
//! Grounded on `shared_controller_functions.go`'s `SetupNamespaceSlice`:
//! expand the `namespaces` list (literal names and the `*` wildcard)
//! against the namespace label selector, deduplicating while preserving
//! first-seen order.

use crate::store::{NamespaceInfo, ObjectStore, StoreError};
use crate::types::Selector;

pub const WILDCARD: &str = "*";

pub async fn effective_namespaces(
    store: &dyn ObjectStore,
    namespaces: &[String],
    namespace_selector: &Selector,
) -> Result<Vec<String>, StoreError> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for entry in namespaces {
        if entry == WILDCARD {
            let all = store.list_namespaces().await?;
            for ns in matching(&all, namespace_selector) {
                push_if_new(&mut out, &mut seen, ns.name);
            }
        } else {
            push_if_new(&mut out, &mut seen, entry.clone());
        }
    }
    Ok(out)
}

fn matching(namespaces: &[NamespaceInfo], selector: &Selector) -> Vec<NamespaceInfo> {
    namespaces
        .iter()
        .filter(|ns| selector.matches(&ns.labels))
        .cloned()
        .collect()
}

fn push_if_new(out: &mut Vec<String>, seen: &mut std::collections::HashSet<String>, name: String) {
    if seen.insert(name.clone()) {
        out.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::FakeObjectStore;
    use crate::types::{LabelFilter, LabelOp};
    use std::collections::BTreeMap;

    fn ns(name: &str, tier: &str) -> NamespaceInfo {
        let mut labels = BTreeMap::new();
        labels.insert("tier".to_string(), tier.to_string());
        NamespaceInfo {
            name: name.to_string(),
            labels,
        }
    }

    #[tokio::test]
    async fn empty_namespaces_yields_empty_scope() {
        let fake = FakeObjectStore::new();
        let sel = Selector::compile(&[]);
        let out = effective_namespaces(&fake, &[], &sel).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn wildcard_with_label_selector_filters_to_matching_namespaces() {
        let mut fake = FakeObjectStore::new();
        fake.namespaces = vec![ns("prod", "prod"), ns("stage", "stage"), ns("dev", "dev")];
        let sel = Selector::compile(&[LabelFilter {
            key: "tier".into(),
            op: LabelOp::In,
            values: vec!["prod".into(), "stage".into()],
        }]);
        let out = effective_namespaces(&fake, &["*".to_string()], &sel)
            .await
            .unwrap();
        assert_eq!(out, vec!["prod".to_string(), "stage".to_string()]);
    }

    #[tokio::test]
    async fn literal_names_dedup_preserving_first_seen_order() {
        let fake = FakeObjectStore::new();
        let sel = Selector::compile(&[]);
        let out = effective_namespaces(
            &fake,
            &["b".to_string(), "a".to_string(), "b".to_string()],
            &sel,
        )
        .await
        .unwrap();
        assert_eq!(out, vec!["b".to_string(), "a".to_string()]);
    }
}
