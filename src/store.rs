//! Access to the persisted inventory.
//!
//! The planner itself never touches storage; [`crate::apply::apply_plan`]
//! writes a plan back through the [`InventoryStore`] trait, and the binary
//! backs that trait with a JSON snapshot held in a [`MemoryStore`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Container, Inventory, Item};

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    #[error("layer '{layer}' not found in container '{container}'")]
    LayerNotFound { container: String, layer: String },
    #[error("item '{0}' not found")]
    ItemNotFound(String),
    #[error("could not access snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// New position of one item.
///
/// The footprint is carried along so a rotated placement can swap width and depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub container_id: String,
    pub layer_id: String,
    pub x_grid: u32,
    pub y_grid: u32,
    pub width_units: u32,
    pub depth_units: u32,
}

/// Data access needed to read an inventory and apply a plan.
pub trait InventoryStore {
    fn list_containers(&self) -> Result<Vec<Container>, StoreError>;

    fn get_container(&self, id: &str) -> Result<Container, StoreError>;

    /// Moves an item to a new layer and cell, possibly across containers.
    fn update_item_position(&mut self, item_id: &str, update: &PositionUpdate) -> Result<Item, StoreError>;
}

/// Store backed by an in-memory [`Inventory`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inventory: Inventory,
}

impl MemoryStore {
    pub fn new(inventory: Inventory) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn into_inventory(self) -> Inventory {
        self.inventory
    }

    /// Removes an item from wherever it sits.
    fn take_item(&mut self, item_id: &str) -> Option<Item> {
        for container in &mut self.inventory.containers {
            for layer in &mut container.layers {
                if let Some(idx) = layer.items.iter().position(|item| item.id == item_id) {
                    return Some(layer.items.remove(idx));
                }
            }
        }
        None
    }
}

impl InventoryStore for MemoryStore {
    fn list_containers(&self) -> Result<Vec<Container>, StoreError> {
        Ok(self.inventory.containers.clone())
    }

    fn get_container(&self, id: &str) -> Result<Container, StoreError> {
        self.inventory
            .container(id)
            .cloned()
            .ok_or_else(|| StoreError::ContainerNotFound(id.to_owned()))
    }

    fn update_item_position(&mut self, item_id: &str, update: &PositionUpdate) -> Result<Item, StoreError> {
        // Resolve the target before removing anything so a failed update leaves the store intact.
        let container = self
            .inventory
            .containers
            .iter()
            .position(|c| c.id == update.container_id)
            .ok_or_else(|| StoreError::ContainerNotFound(update.container_id.clone()))?;
        let layer = self.inventory.containers[container]
            .layers
            .iter()
            .position(|l| l.id == update.layer_id)
            .ok_or_else(|| StoreError::LayerNotFound {
                container: update.container_id.clone(),
                layer: update.layer_id.clone(),
            })?;
        let mut item = self
            .take_item(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.to_owned()))?;
        item.x_grid = update.x_grid;
        item.y_grid = update.y_grid;
        item.width_units = update.width_units;
        item.depth_units = update.depth_units;

        self.inventory.containers[container].layers[layer]
            .items
            .push(item.clone());
        Ok(item)
    }
}

/// Reads a JSON snapshot.
pub fn load_inventory(path: impl AsRef<Path>) -> Result<Inventory, StoreError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Writes a JSON snapshot, pretty-printed.
pub fn save_inventory(path: impl AsRef<Path>, inventory: &Inventory) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(inventory)?;
    fs::write(path, json)?;
    Ok(())
}
