//! Data model of the inventory snapshot.
//!
//! This module defines the structures the planner reads:
//! - `Item`: a storage bin with its footprint, height and content
//! - `Layer`: one z-ordered slice of a container holding items
//! - `Container`: a drawer with a fixed footprint and stacked layers
//! - `Inventory`: all containers plus the category catalogue
//!
//! Field names follow the JSON snapshot format; `bin_id`, `layer_id` and
//! `drawer_id` are accepted as aliases for the respective `id` fields.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Dimensional, Extent, GridPos};

/// Title used when an item has none.
pub const UNTITLED: &str = "Untitled";

/// Validation error for snapshot data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid dimension: {field} of {entity} must be positive")]
    InvalidDimension { entity: String, field: &'static str },
    #[error("container '{container}' has no layers")]
    NoLayers { container: String },
    #[error("container '{container}' has two layers with z-index {z_index}")]
    DuplicateLayerIndex { container: String, z_index: i32 },
    #[error("item id '{item}' appears more than once")]
    DuplicateItem { item: String },
    #[error("container id '{container}' appears more than once")]
    DuplicateContainer { container: String },
}

fn validate_units(value: u32, entity: impl FnOnce() -> String, field: &'static str) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidDimension {
            entity: entity(),
            field,
        });
    }
    Ok(())
}

fn default_height() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Free-text description of what an item holds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// A storage bin sitting in one layer of a container.
///
/// # Fields
/// * `x_grid`, `y_grid` - Cell of the bin's lowest corner on its start layer
/// * `width_units`, `depth_units` - Footprint in grid cells
/// * `height_units` - Number of consecutive layers the bin spans (at least 1)
/// * `can_place_on_top` - Whether other bins may rest on top of this one
/// * `can_rotate` - Whether the planner may swap width and depth
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(alias = "bin_id")]
    pub id: String,
    pub x_grid: u32,
    pub y_grid: u32,
    pub width_units: u32,
    pub depth_units: u32,
    #[serde(default = "default_height")]
    pub height_units: u32,
    #[serde(default)]
    pub content: ItemContent,
    #[serde(default = "default_true")]
    pub can_place_on_top: bool,
    #[serde(default)]
    pub can_rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl Item {
    /// Creates a plain 1-layer item with default flags.
    ///
    /// # Examples
    /// ```
    /// use drawer_tidy::model::Item;
    ///
    /// let item = Item::new("b1", "Screws", 2, 1).at(3, 0);
    /// assert_eq!(item.x_grid, 3);
    /// assert!(item.can_place_on_top);
    /// assert!(!item.can_rotate);
    /// ```
    pub fn new(id: impl Into<String>, title: impl Into<String>, width: u32, depth: u32) -> Self {
        Self {
            id: id.into(),
            x_grid: 0,
            y_grid: 0,
            width_units: width,
            depth_units: depth,
            height_units: 1,
            content: ItemContent {
                title: title.into(),
                ..ItemContent::default()
            },
            can_place_on_top: true,
            can_rotate: false,
            category_id: None,
        }
    }

    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.x_grid = x;
        self.y_grid = y;
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height_units = height;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.content.description = Some(description.into());
        self
    }

    pub fn with_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content.items = parts.into_iter().map(Into::into).collect();
        self
    }

    pub fn not_stackable(mut self) -> Self {
        self.can_place_on_top = false;
        self
    }

    pub fn rotatable(mut self) -> Self {
        self.can_rotate = true;
        self
    }

    /// Display title, falling back to [`UNTITLED`].
    pub fn title(&self) -> &str {
        let title = self.content.title.trim();
        if title.is_empty() { UNTITLED } else { title }
    }

    /// Number of layers the item spans; a missing or zero height counts as one.
    #[inline]
    pub fn layer_span(&self) -> u32 {
        self.height_units.max(1)
    }

    /// Text mined for tokens and size signatures.
    ///
    /// Joins title, description, content list and the category name if known.
    pub fn search_text(&self, category_name: Option<&str>) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3 + self.content.items.len());
        parts.push(&self.content.title);
        if let Some(description) = &self.content.description {
            parts.push(description);
        }
        parts.extend(self.content.items.iter().map(String::as_str));
        if let Some(name) = category_name {
            parts.push(name);
        }
        parts.join(" ")
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let entity = || format!("item '{}'", self.id);
        validate_units(self.width_units, entity, "width_units")?;
        validate_units(self.depth_units, entity, "depth_units")?;
        Ok(())
    }
}

impl Dimensional for Item {
    fn extent(&self) -> Extent {
        Extent::new(self.width_units, self.depth_units, self.layer_span())
    }
}

/// One horizontal slice of a container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(alias = "layer_id")]
    pub id: String,
    pub z_index: i32,
    #[serde(default, alias = "bins")]
    pub items: Vec<Item>,
}

impl Layer {
    pub fn new(id: impl Into<String>, z_index: i32) -> Self {
        Self {
            id: id.into(),
            z_index,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }
}

/// A drawer: a fixed `width × depth` grid repeated over stacked layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(alias = "drawer_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub width_units: u32,
    pub depth_units: u32,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Container {
    pub fn new(id: impl Into<String>, name: impl Into<String>, width: u32, depth: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width_units: width,
            depth_units: depth,
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Total stacking height.
    #[inline]
    pub fn layer_count(&self) -> u32 {
        u32::try_from(self.layers.len()).unwrap_or(u32::MAX)
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Layers ordered bottom-up by z-index.
    ///
    /// The position in this list is the layer index used by plans.
    pub fn sorted_layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.iter().collect();
        layers.sort_by_key(|layer| layer.z_index);
        layers
    }

    /// Every item with the index of its layer in [`Container::sorted_layers`].
    pub fn items_with_layer(&self) -> impl Iterator<Item = (u32, &Layer, &Item)> {
        self.sorted_layers()
            .into_iter()
            .zip(0u32..)
            .flat_map(|(layer, index)| layer.items.iter().map(move |item| (index, layer, item)))
    }

    pub fn item_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.items.len()).sum()
    }

    /// Rejects zero-sized footprints, containers without layers and duplicated z-indices.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let entity = || format!("container '{}'", self.id);
        validate_units(self.width_units, entity, "width_units")?;
        validate_units(self.depth_units, entity, "depth_units")?;
        if self.layers.is_empty() {
            return Err(ValidationError::NoLayers {
                container: self.id.clone(),
            });
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.z_index) {
                return Err(ValidationError::DuplicateLayerIndex {
                    container: self.id.clone(),
                    z_index: layer.z_index,
                });
            }
            for item in &layer.items {
                item.validate()?;
            }
        }
        Ok(())
    }
}

/// A named category items may be filed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
        }
    }
}

/// Category id → category name lookup.
pub type CategoryNames = HashMap<String, String>;

/// Snapshot of the whole inventory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default, alias = "drawers")]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Inventory {
    pub fn new(containers: Vec<Container>, categories: Vec<Category>) -> Self {
        Self {
            containers,
            categories,
        }
    }

    pub fn category_names(&self) -> CategoryNames {
        self.categories
            .iter()
            .map(|category| (category.id.clone(), category.name.clone()))
            .collect()
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|container| container.id == id)
    }

    pub fn item_count(&self) -> usize {
        self.containers.iter().map(Container::item_count).sum()
    }

    /// An item with its container and its layer index and start cell.
    pub fn locate(&self, item_id: &str) -> Option<(&Container, &Item, GridPos)> {
        self.containers.iter().find_map(|container| {
            container
                .items_with_layer()
                .find(|(_, _, item)| item.id == item_id)
                .map(|(index, _, item)| (container, item, GridPos::new(item.x_grid, item.y_grid, index)))
        })
    }

    /// Validates every container and checks that ids are unique.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_containers(&self.containers)
    }
}

/// Validates a list of containers as one inventory.
pub fn validate_containers(containers: &[Container]) -> Result<(), ValidationError> {
    let mut container_ids = HashSet::new();
    let mut item_ids = HashSet::new();
    for container in containers {
        if !container_ids.insert(container.id.as_str()) {
            return Err(ValidationError::DuplicateContainer {
                container: container.id.clone(),
            });
        }
        container.validate()?;
        for layer in &container.layers {
            for item in &layer.items {
                if !item_ids.insert(item.id.as_str()) {
                    return Err(ValidationError::DuplicateItem {
                        item: item.id.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawer() -> Container {
        Container::new("d1", "Drawer", 4, 4)
            .with_layer(Layer::new("top", 1).with_items(vec![Item::new("b2", "Nuts", 1, 1)]))
            .with_layer(Layer::new("bottom", 0).with_items(vec![Item::new("b1", "Bolts", 2, 2)]))
    }

    #[test]
    fn layers_are_indexed_by_z_order() {
        let container = drawer();
        let indexed: Vec<_> = container
            .items_with_layer()
            .map(|(index, layer, item)| (index, layer.id.as_str(), item.id.as_str()))
            .collect();

        assert_eq!(indexed, vec![(0, "bottom", "b1"), (1, "top", "b2")]);
    }

    #[test]
    fn deserializes_snapshot_with_defaults_and_aliases() {
        let json = r#"{
            "drawers": [{
                "drawer_id": "d1",
                "name": "Workshop",
                "width_units": 5,
                "depth_units": 3,
                "layers": [{
                    "layer_id": "l0",
                    "z_index": 0,
                    "bins": [{
                        "bin_id": "b1",
                        "x_grid": 1,
                        "y_grid": 2,
                        "width_units": 1,
                        "depth_units": 1,
                        "content": { "title": "Resistors" }
                    }]
                }]
            }]
        }"#;

        let inventory: Inventory = serde_json::from_str(json).expect("valid snapshot");
        let item = &inventory.containers[0].layers[0].items[0];

        assert_eq!(item.id, "b1");
        assert_eq!(item.height_units, 1);
        assert!(item.can_place_on_top);
        assert!(!item.can_rotate);
        assert_eq!(item.category_id, None);
        assert!(inventory.validate().is_ok());
    }

    #[test]
    fn missing_title_falls_back() {
        let item = Item::new("b1", "   ", 1, 1);
        assert_eq!(item.title(), UNTITLED);
    }

    #[test]
    fn zero_height_spans_one_layer() {
        let item = Item::new("b1", "Tape", 1, 1).with_height(0);
        assert_eq!(item.layer_span(), 1);
        assert_eq!(item.extent(), Extent::new(1, 1, 1));
    }

    #[test]
    fn search_text_joins_all_fields() {
        let item = Item::new("b1", "Vis", 1, 1)
            .with_description("inox")
            .with_parts(["M3x10", "rondelles"]);

        assert_eq!(item.search_text(Some("Visserie")), "Vis inox M3x10 rondelles Visserie");
        assert_eq!(item.search_text(None), "Vis inox M3x10 rondelles");
    }

    #[test]
    fn rejects_container_without_layers() {
        let container = Container::new("d1", "Empty", 3, 3);
        assert_eq!(
            container.validate(),
            Err(ValidationError::NoLayers {
                container: "d1".to_string()
            })
        );
    }

    #[test]
    fn rejects_zero_dimensions() {
        let container = Container::new("d1", "Flat", 0, 3).with_layer(Layer::new("l0", 0));
        assert!(matches!(
            container.validate(),
            Err(ValidationError::InvalidDimension { field: "width_units", .. })
        ));

        let with_bad_item = Container::new("d2", "Ok", 3, 3)
            .with_layer(Layer::new("l0", 0).with_items(vec![Item::new("b", "x", 1, 0)]));
        assert!(matches!(
            with_bad_item.validate(),
            Err(ValidationError::InvalidDimension { field: "depth_units", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids_and_layers() {
        let duplicate_layer = Container::new("d1", "Twice", 3, 3)
            .with_layer(Layer::new("a", 0))
            .with_layer(Layer::new("b", 0));
        assert!(matches!(
            duplicate_layer.validate(),
            Err(ValidationError::DuplicateLayerIndex { z_index: 0, .. })
        ));

        let inventory = Inventory::new(
            vec![
                Container::new("d1", "A", 3, 3)
                    .with_layer(Layer::new("a", 0).with_items(vec![Item::new("b1", "x", 1, 1)])),
                Container::new("d2", "B", 3, 3)
                    .with_layer(Layer::new("b", 0).with_items(vec![Item::new("b1", "y", 1, 1)])),
            ],
            Vec::new(),
        );
        assert_eq!(
            inventory.validate(),
            Err(ValidationError::DuplicateItem {
                item: "b1".to_string()
            })
        );
    }

    #[test]
    fn locate_reports_layer_index() {
        let inventory = Inventory::new(vec![drawer()], Vec::new());
        let (container, item, pos) = inventory.locate("b2").expect("item exists");
        assert_eq!(container.id, "d1");
        assert_eq!(item.id, "b2");
        assert_eq!(pos, GridPos::new(0, 0, 1));
        assert!(inventory.locate("missing").is_none());
    }
}
