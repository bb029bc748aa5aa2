//! Reorganization planner.
//!
//! A single-pass greedy heuristic that computes a new position for every item
//! of the scope while honouring:
//! - collision freedom on the cell grid
//! - vertical support (nothing rests on items that cannot bear load)
//! - optional 90° rotation for items that allow it
//! - clustering of related items around their group anchor
//!
//! The run has two phases. Profiling reads the original layout once; placing
//! then walks the items in priority order and commits each winner into the
//! spatial state of its destination container. Committed items are never
//! revisited.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geometry::weighted_manhattan;
use crate::grouping::GroupKey;
use crate::model::{CategoryNames, Container, Inventory, Item, ValidationError, validate_containers};
use crate::plan::{
    Location, Orientation, Placement, PlacementReason, PlanAssembler, PlanMode, PlanScope,
    ReorganizationPlan, UnplacedReason,
};
use crate::profile::InventoryProfile;
use crate::signature::{ItemSignature, SizeSignature};
use crate::spatial::ContainerState;
use crate::types::{Dimensional, Extent, GridPos};

/// Weights of the placement and container-ranking scores.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Multiplier of the vertical cost; dominates every other term.
    pub vertical_weight: u64,
    /// Multiplier of the distance to the group anchor.
    pub anchor_weight: u64,
    /// How much more a layer of distance to the anchor counts than a cell.
    pub anchor_vertical_factor: u64,
    /// Flat penalty for a rotated orientation.
    pub rotation_penalty: u64,
    /// Ranking weight per same-group item already in a container.
    pub group_rank_weight: f64,
    /// Ranking weight per same-size-family item already in a container.
    pub size_rank_weight: f64,
    /// Ranking bonus for the item's current container.
    pub origin_bonus: f64,
}

impl PlannerConfig {
    pub const DEFAULT_VERTICAL_WEIGHT: u64 = 100_000;
    pub const DEFAULT_ANCHOR_WEIGHT: u64 = 15;
    pub const DEFAULT_ANCHOR_VERTICAL_FACTOR: u64 = 4;
    pub const DEFAULT_ROTATION_PENALTY: u64 = 8;
    pub const DEFAULT_GROUP_RANK_WEIGHT: f64 = 6.0;
    pub const DEFAULT_SIZE_RANK_WEIGHT: f64 = 3.0;
    pub const DEFAULT_ORIGIN_BONUS: f64 = 0.5;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            vertical_weight: Self::DEFAULT_VERTICAL_WEIGHT,
            anchor_weight: Self::DEFAULT_ANCHOR_WEIGHT,
            anchor_vertical_factor: Self::DEFAULT_ANCHOR_VERTICAL_FACTOR,
            rotation_penalty: Self::DEFAULT_ROTATION_PENALTY,
            group_rank_weight: Self::DEFAULT_GROUP_RANK_WEIGHT,
            size_rank_weight: Self::DEFAULT_SIZE_RANK_WEIGHT,
            origin_bonus: Self::DEFAULT_ORIGIN_BONUS,
        }
    }
}

/// Builder for [`PlannerConfig`].
#[derive(Clone, Debug, Default)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    pub fn vertical_weight(mut self, weight: u64) -> Self {
        self.config.vertical_weight = weight;
        self
    }

    pub fn anchor_weight(mut self, weight: u64) -> Self {
        self.config.anchor_weight = weight;
        self
    }

    pub fn anchor_vertical_factor(mut self, factor: u64) -> Self {
        self.config.anchor_vertical_factor = factor;
        self
    }

    pub fn rotation_penalty(mut self, penalty: u64) -> Self {
        self.config.rotation_penalty = penalty;
        self
    }

    pub fn group_rank_weight(mut self, weight: f64) -> Self {
        self.config.group_rank_weight = weight;
        self
    }

    pub fn size_rank_weight(mut self, weight: f64) -> Self {
        self.config.size_rank_weight = weight;
        self
    }

    pub fn origin_bonus(mut self, bonus: f64) -> Self {
        self.config.origin_bonus = bonus;
        self
    }

    pub fn build(self) -> PlannerConfig {
        self.config
    }
}

/// Scope, mode and timestamp of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanOptions {
    pub scope: PlanScope,
    pub mode: PlanMode,
    pub generated_at: DateTime<Utc>,
}

impl PlanOptions {
    /// Options stamped with the current time.
    pub fn new(scope: PlanScope, mode: PlanMode) -> Self {
        Self {
            scope,
            mode,
            generated_at: Utc::now(),
        }
    }

    /// Fixes the timestamp, which makes repeated runs byte-identical.
    pub fn at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Input the planner refuses to work with.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid inventory: {0}")]
    InvalidInventory(#[from] ValidationError),
}

/// Where an item sits before the run.
#[derive(Clone, Copy, Debug)]
struct Origin<'a> {
    container: &'a Container,
    layer_id: &'a str,
    layer_index: u32,
    x: u32,
    y: u32,
}

impl Origin<'_> {
    fn location(&self) -> Location {
        Location {
            container_id: self.container.id.clone(),
            container_name: self.container.display_name().to_owned(),
            layer_id: self.layer_id.to_owned(),
            layer_index: self.layer_index,
            x: self.x,
            y: self.y,
        }
    }
}

/// An item with everything the placement loop needs precomputed.
#[derive(Clone, Debug)]
struct FlatItem<'a> {
    item: &'a Item,
    group: GroupKey,
    group_size: u32,
    signature: ItemSignature,
    origin: Origin<'a>,
    extent: Extent,
}

impl FlatItem<'_> {
    #[inline]
    fn carries_load(&self) -> bool {
        self.item.can_place_on_top
    }

    #[inline]
    fn rotatable(&self) -> bool {
        self.item.can_rotate
    }

    fn size(&self) -> Option<&SizeSignature> {
        self.signature.size.as_ref()
    }
}

/// Best position found inside one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    pos: GridPos,
    extent: Extent,
    rotated: bool,
    score: u64,
}

/// Plans a whole inventory with default weights.
///
/// # Parameters
/// * `inventory` - Snapshot of containers and categories
/// * `options` - Scope, mode and timestamp
pub fn generate_plan(
    inventory: &Inventory,
    options: &PlanOptions,
) -> Result<ReorganizationPlan, PlanError> {
    generate_plan_with_config(
        &inventory.containers,
        &inventory.category_names(),
        options,
        &PlannerConfig::default(),
    )
}

/// Plans with custom weights.
///
/// Validates the input, profiles every container, then places the in-scope
/// items one by one. Items that find no position become unplaced entries;
/// only malformed input is an error. A scope naming a container that does
/// not exist yields an empty plan.
pub fn generate_plan_with_config(
    containers: &[Container],
    categories: &CategoryNames,
    options: &PlanOptions,
    config: &PlannerConfig,
) -> Result<ReorganizationPlan, PlanError> {
    validate_containers(containers)?;

    let targets: Vec<&Container> = match &options.scope {
        PlanScope::Global => containers.iter().collect(),
        PlanScope::Container(id) => {
            let found: Vec<&Container> = containers.iter().filter(|c| &c.id == id).collect();
            if found.is_empty() {
                warn!("⚠️ Container '{}' not found, nothing to plan", id);
            }
            found
        }
    };

    if targets.is_empty() {
        return Ok(ReorganizationPlan::empty(
            options.scope.clone(),
            options.mode,
            options.generated_at,
        ));
    }

    let profile = InventoryProfile::build(containers, categories);
    let items = order_by_priority(flatten_items(&targets, categories));
    let mut states: Vec<ContainerState> = targets.iter().map(|c| ContainerState::new(c)).collect();
    let mut assembler = PlanAssembler::new();

    debug!(
        items = items.len(),
        containers = states.len(),
        scope = %options.scope,
        mode = %options.mode,
        "planning started"
    );

    for flat in &items {
        let ranked = rank_containers(flat, &states, &profile, options.mode, config);
        if ranked.is_empty() {
            debug!(item = %flat.item.id, "no container large enough");
            assembler.record_unplaced(flat.item, UnplacedReason::DimensionsIncompatible);
            continue;
        }

        let found = ranked.iter().find_map(|&idx| {
            find_placement(flat, &states[idx], options.mode, config).map(|c| (idx, c))
        });

        let Some((idx, candidate)) = found else {
            debug!(item = %flat.item.id, tried = ranked.len(), "no free supported space");
            assembler.record_unplaced(flat.item, UnplacedReason::InsufficientSpace);
            continue;
        };

        let state = &mut states[idx];
        let placement = build_placement(flat, state, &candidate, categories);
        let family = flat.size().map(SizeSignature::family);
        state.commit(
            candidate.extent,
            candidate.pos,
            flat.carries_load(),
            &flat.group,
            family.as_deref(),
        );

        debug!(
            item = %flat.item.id,
            group = %flat.group,
            container = %state.container_id(),
            x = candidate.pos.x,
            y = candidate.pos.y,
            z = candidate.pos.z,
            rotated = candidate.rotated,
            changed = placement.changed,
            "item placed"
        );
        assembler.record_placement(placement);
    }

    for state in &states {
        debug!(container = %state.container_id(), placed = state.committed(), "container filled");
    }

    let plan = assembler.finish(
        options.scope.clone(),
        options.mode,
        options.generated_at,
        &states,
    );
    info!(
        "📦 Plan ready: {} items, {} moves, {} unchanged, {} unplaced",
        plan.total_items,
        plan.move_count(),
        plan.unchanged,
        plan.unplaced_count()
    );
    Ok(plan)
}

/// Collects every item of the target containers with its origin and signature.
fn flatten_items<'a>(targets: &[&'a Container], categories: &CategoryNames) -> Vec<FlatItem<'a>> {
    let mut items: Vec<FlatItem<'a>> = Vec::new();
    for &container in targets {
        for (layer_index, layer, item) in container.items_with_layer() {
            let signature = ItemSignature::of(item, categories);
            let group = GroupKey::for_item(item.category_id.as_deref(), &signature);
            items.push(FlatItem {
                item,
                group,
                group_size: 0,
                signature,
                origin: Origin {
                    container,
                    layer_id: &layer.id,
                    layer_index,
                    x: item.x_grid,
                    y: item.y_grid,
                },
                extent: item.extent(),
            });
        }
    }

    let mut frequency: HashMap<GroupKey, u32> = HashMap::new();
    for flat in &items {
        *frequency.entry(flat.group.clone()).or_default() += 1;
    }
    for flat in &mut items {
        flat.group_size = frequency.get(&flat.group).copied().unwrap_or(0);
    }
    items
}

/// Sorts items so the most constrained and most clustered go first.
fn order_by_priority(mut items: Vec<FlatItem<'_>>) -> Vec<FlatItem<'_>> {
    items.sort_by(compare_priority);
    items
}

/// Total order on flattened items, highest priority first:
/// 1. items that cannot bear load (they claim upper space before others stack)
/// 2. larger groups
/// 3. group key, keeping equally sized groups contiguous
/// 4. within a group, sized items by ascending diameter then length, unsized last
/// 5. larger volume
/// 6. item id
fn compare_priority(a: &FlatItem<'_>, b: &FlatItem<'_>) -> Ordering {
    a.carries_load()
        .cmp(&b.carries_load())
        .then_with(|| b.group_size.cmp(&a.group_size))
        .then_with(|| a.group.cmp(&b.group))
        .then_with(|| match (a.size(), b.size()) {
            (Some(sa), Some(sb)) => sa.cmp_size(sb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.item.volume().cmp(&a.item.volume()))
        .then_with(|| a.item.id.cmp(&b.item.id))
}

/// Whether the item's block fits a container at all, ignoring occupancy.
fn is_eligible(flat: &FlatItem<'_>, state: &ContainerState, mode: PlanMode) -> bool {
    if mode == PlanMode::PreserveLayers && state.container_id() != flat.origin.container.id {
        return false;
    }
    let outer = Extent::new(state.width(), state.depth(), state.layer_count());
    flat.extent.fits_within(&outer) || (flat.rotatable() && flat.extent.rotated().fits_within(&outer))
}

/// Affinity of an item for a container, from the original layout.
fn affinity_score(
    flat: &FlatItem<'_>,
    state: &ContainerState,
    profile: &InventoryProfile,
    config: &PlannerConfig,
) -> f64 {
    let mut score = 0.0;
    if let Some(container) = profile.container(state.container_id()) {
        score += f64::from(container.group_count(&flat.group)) * config.group_rank_weight;
        score += flat
            .signature
            .tokens
            .iter()
            .map(|token| f64::from(container.token_count(token)).ln_1p())
            .sum::<f64>();
        if let Some(size) = flat.size() {
            score += f64::from(container.size_family_count(&size.family())) * config.size_rank_weight;
        }
    }
    if state.container_id() == flat.origin.container.id {
        score += config.origin_bonus;
    }
    score
}

/// Indices of eligible containers, best affinity first.
///
/// The sort is stable, so equally scored containers keep inventory order.
fn rank_containers(
    flat: &FlatItem<'_>,
    states: &[ContainerState],
    profile: &InventoryProfile,
    mode: PlanMode,
    config: &PlannerConfig,
) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = states
        .iter()
        .enumerate()
        .filter(|(_, state)| is_eligible(flat, state, mode))
        .map(|(idx, state)| (idx, affinity_score(flat, state, profile, config)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(idx, _)| idx).collect()
}

/// Start layers to try, in preference order.
///
/// Items that cannot bear load start from the top so nothing has to rest on
/// them; the others build up from the floor. In layer-preserving mode only the
/// original layer is tried, clamped into the feasible range.
fn candidate_layers(flat: &FlatItem<'_>, max_start: u32, mode: PlanMode) -> Vec<u32> {
    if mode == PlanMode::PreserveLayers {
        return vec![flat.origin.layer_index.min(max_start)];
    }
    if flat.carries_load() {
        (0..=max_start).collect()
    } else {
        (0..=max_start).rev().collect()
    }
}

/// Searches one container for the best position of an item.
///
/// Sweeps orientation × layer × y × x and keeps the lowest score. Scores
/// saturate, so oversized weights can tie but never wrap. Returns `None` when
/// no position passes [`ContainerState::can_place_at`].
fn find_placement(
    flat: &FlatItem<'_>,
    state: &ContainerState,
    mode: PlanMode,
    config: &PlannerConfig,
) -> Option<Candidate> {
    let height = flat.extent.height.max(1);
    let max_start = state.layer_count().checked_sub(height)?;

    let mut orientations = vec![(flat.extent, false)];
    if flat.rotatable() && !flat.extent.is_square() {
        orientations.push((flat.extent.rotated(), true));
    }
    let layers = candidate_layers(flat, max_start, mode);
    let anchor = state.anchor(&flat.group).map(|a| a.position());

    let mut best: Option<Candidate> = None;
    for &(extent, rotated) in &orientations {
        if !extent.fits_footprint(state.width(), state.depth()) {
            continue;
        }
        for &z in &layers {
            let vertical_cost = if flat.carries_load() { z } else { max_start - z };
            for y in 0..=state.depth() - extent.depth {
                for x in 0..=state.width() - extent.width {
                    if !state.can_place_at(extent, i64::from(x), i64::from(y), i64::from(z)) {
                        continue;
                    }

                    let pos = GridPos::new(x, y, z);
                    let mut score = u64::from(vertical_cost)
                        .saturating_mul(config.vertical_weight)
                        .saturating_add(u64::from(y) * u64::from(state.width()) + u64::from(x));
                    if let Some(anchor) = anchor {
                        score = score.saturating_add(
                            weighted_manhattan(anchor, pos, config.anchor_vertical_factor)
                                .saturating_mul(config.anchor_weight),
                        );
                    }
                    if rotated {
                        score = score.saturating_add(config.rotation_penalty);
                    }

                    update_best(
                        &mut best,
                        Candidate {
                            pos,
                            extent,
                            rotated,
                            score,
                        },
                    );
                }
            }
        }
    }

    best
}

/// Keeps the first candidate among equal scores.
fn update_best(best: &mut Option<Candidate>, candidate: Candidate) {
    match best {
        Some(current) if current.score <= candidate.score => {}
        _ => *best = Some(candidate),
    }
}

/// Builds the placement record; must run before the candidate is committed so
/// neighbour counts exclude the item itself.
fn build_placement(
    flat: &FlatItem<'_>,
    state: &ContainerState,
    candidate: &Candidate,
    categories: &CategoryNames,
) -> Placement {
    let from = flat.origin.location();
    let layer_id = state
        .layer(candidate.pos.z)
        .map(|layer| layer.id.clone())
        .unwrap_or_default();
    let to = Location {
        container_id: state.container_id().to_owned(),
        container_name: state.container_name().to_owned(),
        layer_id,
        layer_index: candidate.pos.z,
        x: candidate.pos.x,
        y: candidate.pos.y,
    };

    let category_name = flat
        .group
        .category_id()
        .and_then(|id| categories.get(id))
        .map(String::as_str);
    let reason = PlacementReason::classify(
        flat.carries_load(),
        candidate.pos.z,
        &flat.group,
        flat.size(),
        &flat.signature.tokens,
        category_name,
        state,
    );

    let changed = from.container_id != to.container_id
        || from.layer_id != to.layer_id
        || from.x != to.x
        || from.y != to.y
        || candidate.rotated;

    Placement {
        item_id: flat.item.id.clone(),
        title: flat.item.title().to_owned(),
        from,
        to,
        orientation: Orientation {
            width_units: candidate.extent.width,
            depth_units: candidate.extent.depth,
            rotated: candidate.rotated,
        },
        height_units: flat.extent.height,
        changed,
        reason: reason.describe(candidate.rotated),
    }
}
