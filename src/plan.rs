//! The reorganization plan and the pieces it is assembled from.
//!
//! A plan is a pure value: every item of the scope ends up either as a
//! [`Placement`] (with a [`PlanMove`] when its position changed) or as an
//! [`UnplacedItem`] explaining why no position was found.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geometry::{intersects, overlap_area_xy};
use crate::grouping::GroupKey;
use crate::model::Item;
use crate::signature::SizeSignature;
use crate::spatial::ContainerState;
use crate::types::{CellBox, Extent, GridPos};

/// Which part of the inventory a run reorganizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanScope {
    /// Only the container with this id.
    Container(String),
    /// Every container.
    Global,
}

impl fmt::Display for PlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanScope::Container(id) => write!(f, "container {id}"),
            PlanScope::Global => f.write_str("whole inventory"),
        }
    }
}

/// How freely items may move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Items may change container and layer.
    #[default]
    Reoptimize,
    /// Items stay in their container and on their layer; only x/y change.
    PreserveLayers,
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanMode::Reoptimize => f.write_str("re-optimize"),
            PlanMode::PreserveLayers => f.write_str("preserve layers"),
        }
    }
}

/// A position inside the inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub container_id: String,
    pub container_name: String,
    pub layer_id: String,
    pub layer_index: u32,
    pub x: u32,
    pub y: u32,
}

impl Location {
    pub fn grid_pos(&self) -> GridPos {
        GridPos::new(self.x, self.y, self.layer_index)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / layer {} ({}, {})",
            self.container_name,
            self.layer_index + 1,
            self.x,
            self.y
        )
    }
}

/// Footprint actually used by a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Orientation {
    pub width_units: u32,
    pub depth_units: u32,
    pub rotated: bool,
}

/// Final position of one item, changed or not.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub item_id: String,
    pub title: String,
    pub from: Location,
    pub to: Location,
    pub orientation: Orientation,
    pub height_units: u32,
    pub changed: bool,
    pub reason: String,
}

impl Placement {
    /// Cells the item occupies in its new position.
    pub fn cell_box(&self) -> CellBox {
        CellBox::new(
            self.to.grid_pos(),
            Extent::new(
                self.orientation.width_units,
                self.orientation.depth_units,
                self.height_units,
            ),
        )
    }
}

/// A placement that differs from the current layout and must be applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanMove {
    pub item_id: String,
    pub title: String,
    pub from: Location,
    pub to: Location,
    pub rotated: bool,
    pub width_units: u32,
    pub depth_units: u32,
    pub reason: String,
}

impl From<&Placement> for PlanMove {
    fn from(placement: &Placement) -> Self {
        Self {
            item_id: placement.item_id.clone(),
            title: placement.title.clone(),
            from: placement.from.clone(),
            to: placement.to.clone(),
            rotated: placement.orientation.rotated,
            width_units: placement.orientation.width_units,
            depth_units: placement.orientation.depth_units,
            reason: placement.reason.clone(),
        }
    }
}

/// Why an item could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No container in scope is large enough, even rotated.
    DimensionsIncompatible,
    /// Some containers are large enough, but none has free, supported space left.
    InsufficientSpace,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::DimensionsIncompatible => "dimensions_incompatible",
            UnplacedReason::InsufficientSpace => "insufficient_space",
        }
    }
}

impl fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnplacedReason::DimensionsIncompatible => {
                f.write_str("Dimensions incompatible with the available containers and layers")
            }
            UnplacedReason::InsufficientSpace => {
                f.write_str("Not enough free space while respecting vertical support")
            }
        }
    }
}

/// Item left out of the new layout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnplacedItem {
    pub item_id: String,
    pub title: String,
    pub reason: UnplacedReason,
    pub reason_text: String,
}

/// Per-container counts of the plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    pub container_id: String,
    pub container_name: String,
    pub placed: usize,
    pub moved_in: usize,
    pub moved_out: usize,
}

/// Result of one planning run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReorganizationPlan {
    pub scope: PlanScope,
    pub mode: PlanMode,
    pub generated_at: DateTime<Utc>,
    pub total_items: usize,
    pub unchanged: usize,
    pub moves: Vec<PlanMove>,
    pub placements: Vec<Placement>,
    pub unplaced: Vec<UnplacedItem>,
    pub container_summaries: Vec<ContainerSummary>,
}

impl ReorganizationPlan {
    /// An empty plan for a scope without items.
    pub fn empty(scope: PlanScope, mode: PlanMode, generated_at: DateTime<Utc>) -> Self {
        Self {
            scope,
            mode,
            generated_at,
            total_items: 0,
            unchanged: 0,
            moves: Vec::new(),
            placements: Vec::new(),
            unplaced: Vec::new(),
            container_summaries: Vec::new(),
        }
    }

    /// True when applying the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    pub fn placement(&self, item_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.item_id == item_id)
    }

    /// Pairs of item ids whose new positions share a cell in the same container.
    ///
    /// Always empty for plans produced by the planner; callers can use it as a
    /// sanity check before applying a plan that was edited or deserialized.
    pub fn overlapping_placements(&self) -> Vec<(String, String)> {
        let mut by_container: HashMap<&str, Vec<&Placement>> = HashMap::new();
        for placement in &self.placements {
            by_container
                .entry(placement.to.container_id.as_str())
                .or_default()
                .push(placement);
        }

        let mut overlaps = Vec::new();
        for placements in by_container.values() {
            for (i, a) in placements.iter().enumerate() {
                for b in &placements[i + 1..] {
                    if intersects(&a.cell_box(), &b.cell_box()) {
                        overlaps.push((a.item_id.clone(), b.item_id.clone()));
                    }
                }
            }
        }
        overlaps.sort();
        overlaps
    }

    /// Ids of placements above layer 0 whose footprint is not fully covered by
    /// load-bearing placements ending on the layer just below.
    ///
    /// `carries_load` tells whether the item with a given id may be stacked on.
    /// Assumes the plan is free of overlaps.
    pub fn unsupported_placements(&self, carries_load: impl Fn(&str) -> bool) -> Vec<String> {
        let mut unsupported: Vec<String> = self
            .placements
            .iter()
            .filter(|placement| placement.to.layer_index > 0)
            .filter(|placement| {
                let cells = placement.cell_box();
                let supported: u64 = self
                    .placements
                    .iter()
                    .filter(|below| {
                        below.to.container_id == placement.to.container_id
                            && below.cell_box().top_layer() + 1 == placement.to.layer_index
                            && carries_load(&below.item_id)
                    })
                    .map(|below| overlap_area_xy(&cells, &below.cell_box()))
                    .sum();
                supported < cells.extent.footprint_area()
            })
            .map(|placement| placement.item_id.clone())
            .collect();
        unsupported.sort();
        unsupported
    }
}

/// Why an item landed where it did, before rendering to text.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementReason {
    /// Item cannot carry weight and was pushed to an upper layer.
    TopLayer { layer_index: u32 },
    SizeFamily {
        signature: SizeSignature,
        neighbours: u32,
    },
    Category {
        name: Option<String>,
        neighbours: u32,
    },
    Keyword { tokens: Vec<String> },
    SpatialCoherence,
}

impl PlacementReason {
    /// Classifies a placement; neighbour counts are read before the item is committed.
    pub fn classify(
        carries_load: bool,
        layer_index: u32,
        group: &GroupKey,
        size: Option<&SizeSignature>,
        tokens: &[String],
        category_name: Option<&str>,
        destination: &ContainerState,
    ) -> Self {
        if !carries_load && layer_index > 0 {
            return PlacementReason::TopLayer { layer_index };
        }
        if let Some(signature) = size {
            return PlacementReason::SizeFamily {
                signature: *signature,
                neighbours: destination.size_family_count(&signature.family()),
            };
        }
        match group {
            GroupKey::Category(_) => PlacementReason::Category {
                name: category_name.map(str::to_owned),
                neighbours: destination.group_count(group),
            },
            GroupKey::Keyword(_) => PlacementReason::Keyword {
                tokens: tokens.iter().take(3).cloned().collect(),
            },
            GroupKey::Size(_) | GroupKey::Misc => PlacementReason::SpatialCoherence,
        }
    }

    /// Renders the reason, with a rotation note when the footprint was turned.
    pub fn describe(&self, rotated: bool) -> String {
        let mut text = self.to_string();
        if rotated {
            text.push_str(", rotated 90°");
        }
        text
    }
}

impl fmt::Display for PlacementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementReason::TopLayer { layer_index } => write!(
                f,
                "Cannot bear load: kept on layer {} so nothing rests on it",
                layer_index + 1
            ),
            PlacementReason::SizeFamily {
                signature,
                neighbours: 0,
            } => write!(f, "Size {signature}: starts the {} cluster", signature.family()),
            PlacementReason::SizeFamily {
                signature,
                neighbours,
            } => write!(
                f,
                "Size {signature}: next to {neighbours} item(s) of family {}",
                signature.family()
            ),
            PlacementReason::Category {
                name: Some(name),
                neighbours,
            } => write!(f, "Category grouping: {name} ({neighbours} already here)"),
            PlacementReason::Category {
                name: None,
                neighbours,
            } => write!(f, "Category grouping ({neighbours} already here)"),
            PlacementReason::Keyword { tokens } => {
                write!(f, "Content similarity: {}", tokens.join(", "))
            }
            PlacementReason::SpatialCoherence => {
                f.write_str("Space optimization: compact reading-order position")
            }
        }
    }
}

/// Collects per-item outcomes in processing order and builds the final plan.
#[derive(Debug, Default)]
pub struct PlanAssembler {
    placements: Vec<Placement>,
    unplaced: Vec<UnplacedItem>,
}

impl PlanAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_placement(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    pub fn record_unplaced(&mut self, item: &Item, reason: UnplacedReason) {
        self.unplaced.push(UnplacedItem {
            item_id: item.id.clone(),
            title: item.title().to_owned(),
            reason,
            reason_text: reason.to_string(),
        });
    }

    /// Derives moves, the unchanged count and one summary per target container.
    pub fn finish(
        self,
        scope: PlanScope,
        mode: PlanMode,
        generated_at: DateTime<Utc>,
        targets: &[ContainerState],
    ) -> ReorganizationPlan {
        let Self {
            placements,
            unplaced,
        } = self;

        let moves: Vec<PlanMove> = placements
            .iter()
            .filter(|p| p.changed)
            .map(PlanMove::from)
            .collect();
        let unchanged = placements.len() - moves.len();

        let container_summaries = targets
            .iter()
            .map(|state| {
                let id = state.container_id();
                ContainerSummary {
                    container_id: id.to_owned(),
                    container_name: state.container_name().to_owned(),
                    placed: placements.iter().filter(|p| p.to.container_id == id).count(),
                    moved_in: moves
                        .iter()
                        .filter(|m| m.to.container_id == id && m.from.container_id != id)
                        .count(),
                    moved_out: moves
                        .iter()
                        .filter(|m| m.from.container_id == id && m.to.container_id != id)
                        .count(),
                }
            })
            .collect();

        ReorganizationPlan {
            scope,
            mode,
            generated_at,
            total_items: placements.len() + unplaced.len(),
            unchanged,
            moves,
            placements,
            unplaced,
            container_summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Layer};
    use crate::signature::extract_size_signature;
    use chrono::TimeZone;

    fn location(container: &str, layer: u32, x: u32, y: u32) -> Location {
        Location {
            container_id: container.to_string(),
            container_name: container.to_uppercase(),
            layer_id: format!("{container}-l{layer}"),
            layer_index: layer,
            x,
            y,
        }
    }

    fn placement(id: &str, from: Location, to: Location, width: u32) -> Placement {
        let changed = from != to;
        Placement {
            item_id: id.to_string(),
            title: id.to_string(),
            from,
            to,
            orientation: Orientation {
                width_units: width,
                depth_units: 1,
                rotated: false,
            },
            height_units: 1,
            changed,
            reason: "test".to_string(),
        }
    }

    fn target(id: &str) -> ContainerState {
        ContainerState::new(&Container::new(id, id.to_uppercase(), 4, 4).with_layer(Layer::new("l0", 0)))
    }

    #[test]
    fn finish_counts_moves_and_summaries() {
        let mut assembler = PlanAssembler::new();
        assembler.record_placement(placement("a", location("d1", 0, 0, 0), location("d1", 0, 0, 0), 1));
        assembler.record_placement(placement("b", location("d1", 0, 3, 3), location("d2", 0, 0, 0), 1));
        assembler.record_placement(placement("c", location("d2", 0, 1, 0), location("d2", 0, 1, 1), 1));
        assembler.record_unplaced(&Item::new("d", "", 9, 9), UnplacedReason::DimensionsIncompatible);

        let generated_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let plan = assembler.finish(
            PlanScope::Global,
            PlanMode::Reoptimize,
            generated_at,
            &[target("d1"), target("d2")],
        );

        assert_eq!(plan.total_items, 4);
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.move_count(), 2);
        assert_eq!(plan.unplaced[0].title, "Untitled");
        assert_eq!(plan.unplaced[0].reason.code(), "dimensions_incompatible");

        let d1 = &plan.container_summaries[0];
        assert_eq!((d1.placed, d1.moved_in, d1.moved_out), (1, 0, 1));
        let d2 = &plan.container_summaries[1];
        assert_eq!((d2.placed, d2.moved_in, d2.moved_out), (2, 1, 0));
    }

    #[test]
    fn detects_overlapping_placements() {
        let mut plan = ReorganizationPlan::empty(PlanScope::Global, PlanMode::Reoptimize, Utc::now());
        plan.placements = vec![
            placement("a", location("d1", 0, 0, 0), location("d1", 0, 0, 0), 2),
            placement("b", location("d1", 0, 1, 0), location("d1", 0, 1, 0), 1),
            placement("c", location("d2", 0, 0, 0), location("d2", 0, 0, 0), 2),
            placement("d", location("d1", 0, 0, 0), location("d1", 1, 0, 0), 2),
        ];

        assert_eq!(plan.overlapping_placements(), vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn detects_unsupported_placements() {
        let mut plan = ReorganizationPlan::empty(PlanScope::Global, PlanMode::Reoptimize, Utc::now());
        plan.placements = vec![
            placement("base", location("d1", 0, 0, 0), location("d1", 0, 0, 0), 2),
            placement("fragile", location("d1", 0, 2, 0), location("d1", 0, 2, 0), 1),
            placement("on-base", location("d1", 0, 0, 0), location("d1", 1, 0, 0), 2),
            placement("half", location("d1", 0, 0, 0), location("d1", 1, 2, 0), 2),
            placement("floating", location("d2", 0, 0, 0), location("d2", 1, 0, 0), 1),
        ];

        let unsupported = plan.unsupported_placements(|id| id != "fragile");
        assert_eq!(unsupported, vec!["floating".to_string(), "half".to_string()]);
    }

    #[test]
    fn reason_precedence() {
        let state = target("d1");
        let size = extract_size_signature("M3x10");
        let tokens = vec!["vis".to_string(), "inox".to_string(), "tete".to_string(), "plate".to_string()];
        let category = GroupKey::Category("c1".into());

        let top = PlacementReason::classify(false, 1, &category, size.as_ref(), &tokens, Some("Visserie"), &state);
        assert_eq!(top, PlacementReason::TopLayer { layer_index: 1 });

        let sized = PlacementReason::classify(true, 0, &category, size.as_ref(), &tokens, Some("Visserie"), &state);
        assert_eq!(sized.describe(false), "Size M3x10: starts the M3 cluster");

        let by_category = PlacementReason::classify(true, 0, &category, None, &tokens, Some("Visserie"), &state);
        assert_eq!(by_category.describe(true), "Category grouping: Visserie (0 already here), rotated 90°");

        let keyword = GroupKey::Keyword("vis".into());
        let by_keyword = PlacementReason::classify(true, 0, &keyword, None, &tokens, None, &state);
        assert_eq!(by_keyword.to_string(), "Content similarity: vis, inox, tete");

        let misc = PlacementReason::classify(false, 0, &GroupKey::Misc, None, &[], None, &state);
        assert_eq!(misc, PlacementReason::SpatialCoherence);
    }
}
