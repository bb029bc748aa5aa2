//! Occupancy, support and group anchors of one container during a planning run.
//!
//! The state starts empty and is filled only through [`ContainerState::commit`],
//! so it always describes the *new* layout being built, never the original one.

use std::collections::HashMap;

use crate::grouping::GroupKey;
use crate::model::Container;
use crate::types::{Extent, GridPos};

/// Identity of a layer at a given layer index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSlot {
    pub id: String,
    pub z_index: i32,
}

/// Running centroid of the committed members of one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub count: u32,
}

impl Anchor {
    fn first(pos: GridPos) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            count: 1,
        }
    }

    /// Adds one member, keeping each axis at the rounded mean.
    fn absorb(&mut self, pos: GridPos) {
        let next = self.count + 1;
        self.x = rounded_mean(self.x, self.count, pos.x, next);
        self.y = rounded_mean(self.y, self.count, pos.y, next);
        self.z = rounded_mean(self.z, self.count, pos.z, next);
        self.count = next;
    }

    pub fn position(&self) -> GridPos {
        GridPos::new(self.x, self.y, self.z)
    }
}

fn rounded_mean(mean: u32, count: u32, value: u32, next: u32) -> u32 {
    let total = u64::from(mean) * u64::from(count) + u64::from(value);
    let next = u64::from(next);
    // Half rounds up.
    u32::try_from((2 * total + next) / (2 * next)).unwrap_or(u32::MAX)
}

/// Spatial bookkeeping of one container, indexed `[layer][x][y]`.
#[derive(Clone, Debug)]
pub struct ContainerState {
    container_id: String,
    container_name: String,
    width: u32,
    depth: u32,
    layers: Vec<LayerSlot>,
    occupied: Vec<bool>,
    load_bearing: Vec<bool>,
    anchors: HashMap<GroupKey, Anchor>,
    size_families: HashMap<String, u32>,
    committed: u32,
}

impl ContainerState {
    /// Creates an empty state with the container's layers in z order.
    pub fn new(container: &Container) -> Self {
        let layers: Vec<LayerSlot> = container
            .sorted_layers()
            .into_iter()
            .map(|layer| LayerSlot {
                id: layer.id.clone(),
                z_index: layer.z_index,
            })
            .collect();
        let cells = layers.len() * container.width_units as usize * container.depth_units as usize;

        Self {
            container_id: container.id.clone(),
            container_name: container.display_name().to_owned(),
            width: container.width_units,
            depth: container.depth_units,
            layers,
            occupied: vec![false; cells],
            load_bearing: vec![false; cells],
            anchors: HashMap::new(),
            size_families: HashMap::new(),
            committed: 0,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn layer_count(&self) -> u32 {
        u32::try_from(self.layers.len()).unwrap_or(u32::MAX)
    }

    pub fn layer(&self, index: u32) -> Option<&LayerSlot> {
        self.layers.get(index as usize)
    }

    /// Number of items committed so far.
    pub fn committed(&self) -> u32 {
        self.committed
    }

    pub fn anchor(&self, group: &GroupKey) -> Option<&Anchor> {
        self.anchors.get(group)
    }

    /// Members of `group` committed so far.
    pub fn group_count(&self, group: &GroupKey) -> u32 {
        self.anchor(group).map_or(0, |anchor| anchor.count)
    }

    /// Items of a size family committed so far.
    pub fn size_family_count(&self, family: &str) -> u32 {
        self.size_families.get(family).copied().unwrap_or(0)
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (z as usize * self.width as usize + x as usize) * self.depth as usize + y as usize
    }

    #[cfg(test)]
    pub fn is_occupied(&self, cell: GridPos) -> bool {
        self.in_bounds(cell) && self.occupied[self.index(cell.x, cell.y, cell.z)]
    }

    #[cfg(test)]
    pub fn is_load_bearing(&self, cell: GridPos) -> bool {
        self.in_bounds(cell) && self.load_bearing[self.index(cell.x, cell.y, cell.z)]
    }

    #[cfg(test)]
    fn in_bounds(&self, cell: GridPos) -> bool {
        cell.x < self.width && cell.y < self.depth && cell.z < self.layer_count()
    }

    /// Checks whether a block fits at `(x, y, z)` without collision and with full support.
    ///
    /// Rejects negative coordinates, blocks leaving the footprint or the layer
    /// stack, and any occupied cell in the vertical span. Above layer 0 every
    /// covered cell of the layer just below must be load-bearing.
    pub fn can_place_at(&self, extent: Extent, x: i64, y: i64, z: i64) -> bool {
        let (Ok(x), Ok(y), Ok(z)) = (u32::try_from(x), u32::try_from(y), u32::try_from(z)) else {
            return false;
        };
        let height = extent.height.max(1);

        if u64::from(x) + u64::from(extent.width) > u64::from(self.width)
            || u64::from(y) + u64::from(extent.depth) > u64::from(self.depth)
            || u64::from(z) + u64::from(height) > u64::from(self.layer_count())
        {
            return false;
        }

        for zz in z..z + height {
            for xx in x..x + extent.width {
                for yy in y..y + extent.depth {
                    if self.occupied[self.index(xx, yy, zz)] {
                        return false;
                    }
                }
            }
        }

        if z > 0 {
            for xx in x..x + extent.width {
                for yy in y..y + extent.depth {
                    if !self.load_bearing[self.index(xx, yy, z - 1)] {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Records a placement validated by [`ContainerState::can_place_at`].
    ///
    /// Marks the whole span occupied, marks the top layer of the block
    /// load-bearing only if the item itself can carry weight, and pulls the
    /// group anchor towards the new position.
    pub fn commit(
        &mut self,
        extent: Extent,
        pos: GridPos,
        carries_load: bool,
        group: &GroupKey,
        size_family: Option<&str>,
    ) {
        let height = extent.height.max(1);
        let top = pos.z + height - 1;

        for zz in pos.z..pos.z + height {
            for xx in pos.x..pos.x + extent.width {
                for yy in pos.y..pos.y + extent.depth {
                    let idx = self.index(xx, yy, zz);
                    self.occupied[idx] = true;
                    if zz == top {
                        self.load_bearing[idx] = carries_load;
                    }
                }
            }
        }

        match self.anchors.get_mut(group) {
            Some(anchor) => anchor.absorb(pos),
            None => {
                self.anchors.insert(group.clone(), Anchor::first(pos));
            }
        }
        if let Some(family) = size_family {
            *self.size_families.entry(family.to_owned()).or_default() += 1;
        }
        self.committed += 1;
    }
}
