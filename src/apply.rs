//! Writes a plan back to a store, one move at a time.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::plan::{PlanMove, ReorganizationPlan};
use crate::store::{InventoryStore, PositionUpdate};

/// Number of failed titles named in [`ApplyReport::summary`].
const LISTED_FAILURES: usize = 3;

/// A move the store rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub item_id: String,
    pub title: String,
    pub error: String,
}

/// Outcome of applying a plan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub attempted: usize,
    pub applied: usize,
    pub failed: Vec<FailedMove>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line outcome for the console.
    ///
    /// # Examples
    /// ```
    /// use drawer_tidy::apply::ApplyReport;
    ///
    /// assert_eq!(ApplyReport::default().summary(), "Nothing to apply.");
    /// ```
    pub fn summary(&self) -> String {
        if self.attempted == 0 {
            return "Nothing to apply.".to_string();
        }
        if self.failed.is_empty() {
            return format!("Reorganization applied: {} move(s).", self.applied);
        }

        let titles: Vec<&str> = self
            .failed
            .iter()
            .take(LISTED_FAILURES)
            .map(|failure| failure.title.as_str())
            .collect();
        let ellipsis = if self.failed.len() > LISTED_FAILURES { "…" } else { "" };
        format!(
            "Partial reorganization: {} item(s) not updated ({}{}).",
            self.failed.len(),
            titles.join(", "),
            ellipsis
        )
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

fn position_update(mv: &PlanMove) -> PositionUpdate {
    PositionUpdate {
        container_id: mv.to.container_id.clone(),
        layer_id: mv.to.layer_id.clone(),
        x_grid: mv.to.x,
        y_grid: mv.to.y,
        width_units: mv.width_units,
        depth_units: mv.depth_units,
    }
}

/// Applies every move of `plan` in order.
///
/// A rejected move is recorded and skipped; the remaining moves still run.
pub fn apply_plan<S: InventoryStore + ?Sized>(store: &mut S, plan: &ReorganizationPlan) -> ApplyReport {
    let mut report = ApplyReport {
        attempted: plan.moves.len(),
        ..ApplyReport::default()
    };

    for mv in &plan.moves {
        match store.update_item_position(&mv.item_id, &position_update(mv)) {
            Ok(_) => {
                debug!(item = %mv.item_id, to = %mv.to, "move applied");
                report.applied += 1;
            }
            Err(err) => {
                warn!("⚠️ Could not move '{}': {}", mv.title, err);
                report.failed.push(FailedMove {
                    item_id: mv.item_id.clone(),
                    title: mv.title.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Inventory, Item, Layer};
    use crate::plan::{Location, PlanMode, PlanScope};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn location(container: &str, layer: &str, x: u32) -> Location {
        Location {
            container_id: container.to_string(),
            container_name: container.to_string(),
            layer_id: layer.to_string(),
            layer_index: 0,
            x,
            y: 0,
        }
    }

    fn mv(id: &str, to_layer: &str, x: u32) -> PlanMove {
        PlanMove {
            item_id: id.to_string(),
            title: format!("Bin {id}"),
            from: location("d1", "l0", 0),
            to: location("d1", to_layer, x),
            rotated: false,
            width_units: 1,
            depth_units: 1,
            reason: String::new(),
        }
    }

    fn plan(moves: Vec<PlanMove>) -> ReorganizationPlan {
        let mut plan = ReorganizationPlan::empty(PlanScope::Global, PlanMode::Reoptimize, Utc::now());
        plan.moves = moves;
        plan
    }

    fn store() -> MemoryStore {
        let items = ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(x, id)| Item::new(*id, *id, 1, 1).at(x as u32, 0))
            .collect();
        MemoryStore::new(Inventory::new(
            vec![Container::new("d1", "Drawer", 6, 1).with_layer(Layer::new("l0", 0).with_items(items))],
            Vec::new(),
        ))
    }

    #[test]
    fn applies_all_moves() {
        let mut store = store();
        let report = apply_plan(&mut store, &plan(vec![mv("a", "l0", 5)]));

        assert!(report.is_success());
        assert_eq!(report.summary(), "Reorganization applied: 1 move(s).");
        let (_, _, pos) = store.inventory().locate("a").expect("still there");
        assert_eq!(pos.x, 5);
    }

    #[test]
    fn failures_are_skipped_and_listed() {
        let mut store = store();
        let moves = vec![
            mv("a", "missing", 5),
            mv("b", "missing", 5),
            mv("c", "l0", 5),
            mv("d", "missing", 5),
            mv("e", "missing", 5),
        ];
        let report = apply_plan(&mut store, &plan(moves));

        assert_eq!(report.attempted, 5);
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed.len(), 4);
        assert_eq!(
            report.summary(),
            "Partial reorganization: 4 item(s) not updated (Bin a, Bin b, Bin d…)."
        );
    }

    #[test]
    fn empty_plan_has_nothing_to_apply() {
        let report = apply_plan(&mut store(), &plan(Vec::new()));
        assert_eq!(report.to_string(), "Nothing to apply.");
    }
}
