//! Per-container frequency profiles used to rank destination containers.

use std::collections::HashMap;

use crate::grouping::GroupKey;
use crate::model::{CategoryNames, Container};
use crate::signature::ItemSignature;

/// Counts of tokens, groups and size families among the items of one container.
#[derive(Clone, Debug, Default)]
pub struct ContainerProfile {
    tokens: HashMap<String, u32>,
    groups: HashMap<GroupKey, u32>,
    size_families: HashMap<String, u32>,
}

impl ContainerProfile {
    fn record(&mut self, group: GroupKey, signature: &ItemSignature) {
        *self.groups.entry(group).or_default() += 1;
        for token in &signature.tokens {
            *self.tokens.entry(token.clone()).or_default() += 1;
        }
        if let Some(size) = &signature.size {
            *self.size_families.entry(size.family()).or_default() += 1;
        }
    }

    pub fn token_count(&self, token: &str) -> u32 {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    pub fn group_count(&self, group: &GroupKey) -> u32 {
        self.groups.get(group).copied().unwrap_or(0)
    }

    pub fn size_family_count(&self, family: &str) -> u32 {
        self.size_families.get(family).copied().unwrap_or(0)
    }

    /// Every item records exactly one group.
    #[cfg(test)]
    pub fn item_count(&self) -> u32 {
        self.groups.values().sum()
    }
}

/// Profiles of every container, built once from the original layout.
#[derive(Clone, Debug, Default)]
pub struct InventoryProfile {
    containers: HashMap<String, ContainerProfile>,
}

impl InventoryProfile {
    /// Walks every item of every container.
    ///
    /// Always covers the whole inventory, even for a single-container run, so
    /// affinity to the rest of the inventory stays visible.
    pub fn build(containers: &[Container], categories: &CategoryNames) -> Self {
        let containers = containers
            .iter()
            .map(|container| {
                let mut profile = ContainerProfile::default();
                for (_, _, item) in container.items_with_layer() {
                    let signature = ItemSignature::of(item, categories);
                    let group = GroupKey::for_item(item.category_id.as_deref(), &signature);
                    profile.record(group, &signature);
                }
                (container.id.clone(), profile)
            })
            .collect();

        Self { containers }
    }

    pub fn container(&self, id: &str) -> Option<&ContainerProfile> {
        self.containers.get(id)
    }
}
