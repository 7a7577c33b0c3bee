//! Proptest generators for property-based testing.

use std::future::Future;

use certcascade_store::StoreError;
use proptest::prelude::*;

use crate::fixtures::TreeFixture;

/// A signing tree with optional regeneration faults.
///
/// Node `0` is the root; `parents[i - 1]` signs node `i`, and is always a
/// lower index, so the tree is acyclic by construction.
#[derive(Debug, Clone)]
pub struct TreeSpec {
    pub parents: Vec<usize>,
    /// Fault injected into `regenerate` for each node, root included.
    pub faults: Vec<Option<StoreError>>,
}

impl TreeSpec {
    pub fn node_count(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn name(index: usize) -> String {
        if index == 0 {
            "root".to_string()
        } else {
            format!("cert-{}", index)
        }
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        index.checked_sub(1).map(|i| self.parents[i])
    }

    /// Indices from `index` up to the root, `index` first.
    pub fn path_to_root(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut current = index;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Load the tree and its faults into a fresh memory store.
    pub fn install(&self) -> TreeFixture {
        let fixture = TreeFixture::new(&Self::name(0));
        for (i, parent) in self.parents.iter().enumerate() {
            fixture.sign(&Self::name(*parent), &Self::name(i + 1));
        }
        for (i, fault) in self.faults.iter().enumerate() {
            if let Some(error) = fault {
                fixture.store.fail_regenerate(&Self::name(i), error.clone());
            }
        }
        fixture
    }
}

/// A fault that may be injected into a regeneration.
pub fn regenerate_fault() -> impl Strategy<Value = Option<StoreError>> {
    prop_oneof![
        6 => Just(None),
        1 => Just(Some(StoreError::Network("injected".into()))),
        1 => Just(Some(StoreError::PermissionDenied("injected".into()))),
        1 => Just(Some(StoreError::Validation("injected".into()))),
    ]
}

/// Random trees of `1..=max_nodes` nodes; faults only if `faulty`.
pub fn tree_spec(max_nodes: usize, faulty: bool) -> impl Strategy<Value = TreeSpec> {
    (1..=max_nodes.max(1)).prop_flat_map(move |count| {
        let parents: Vec<_> = (1..count).map(|i| 0..i).collect();
        let faults = if faulty {
            prop::collection::vec(regenerate_fault(), count).boxed()
        } else {
            Just(vec![None; count]).boxed()
        };
        (parents, faults).prop_map(|(parents, faults)| TreeSpec { parents, faults })
    })
}

/// A fault-free tree plus one extra edge `(from, to)` where `to` is on the
/// path from the root to `from`, itself included.
pub fn tree_with_back_edge(max_nodes: usize) -> impl Strategy<Value = (TreeSpec, usize, usize)> {
    tree_spec(max_nodes, false)
        .prop_flat_map(|spec| {
            let count = spec.node_count();
            (Just(spec), 0..count)
        })
        .prop_flat_map(|(spec, from)| {
            let path = spec.path_to_root(from);
            (Just(spec), Just(from), prop::sample::select(path))
        })
}

/// Drive a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime")
        .block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_parents_precede_children(spec in tree_spec(24, true)) {
            prop_assert_eq!(spec.faults.len(), spec.node_count());
            for (i, parent) in spec.parents.iter().enumerate() {
                prop_assert!(*parent <= i);
            }
        }

        #[test]
        fn back_edge_targets_path((spec, from, to) in tree_with_back_edge(16)) {
            prop_assert!(spec.path_to_root(from).contains(&to));
        }
    }

    #[test]
    fn test_path_to_root() {
        let spec = TreeSpec {
            parents: vec![0, 1, 1],
            faults: vec![None; 4],
        };
        assert_eq!(spec.path_to_root(3), vec![3, 1, 0]);
        assert_eq!(spec.path_to_root(0), vec![0]);
    }
}
