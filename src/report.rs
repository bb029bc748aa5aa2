//! Human-readable rendering of a plan for the console.

use std::fmt;

use crate::plan::ReorganizationPlan;

/// Headline for a plan, or `None` when there is something to do.
pub fn status_message(plan: &ReorganizationPlan) -> Option<&'static str> {
    if plan.total_items == 0 {
        Some("No items to reorganize in this scope.")
    } else if plan.is_noop() {
        Some("The current layout is already organized under the given constraints.")
    } else {
        None
    }
}

/// Renders header, moves, unplaced items and per-container counts.
pub fn render_plan(plan: &ReorganizationPlan) -> String {
    PlanReport(plan).to_string()
}

/// Console view of a plan.
pub struct PlanReport<'a>(pub &'a ReorganizationPlan);

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.0;
        writeln!(f, "📋 Reorganization plan ({}, {})", plan.scope, plan.mode)?;
        writeln!(f, "   generated {}", plan.generated_at.to_rfc3339())?;
        writeln!(
            f,
            "   {} item(s): {} move(s), {} unchanged, {} unplaced",
            plan.total_items,
            plan.move_count(),
            plan.unchanged,
            plan.unplaced_count()
        )?;

        if let Some(message) = status_message(plan) {
            writeln!(f)?;
            writeln!(f, "✅ {message}")?;
            if plan.total_items == 0 {
                return Ok(());
            }
        }

        if !plan.moves.is_empty() {
            writeln!(f)?;
            writeln!(f, "Moves:")?;
            for (idx, mv) in plan.moves.iter().enumerate() {
                writeln!(f, "{:>4}. {}: {} → {}", idx + 1, mv.title, mv.from, mv.to)?;
                writeln!(f, "      {}", mv.reason)?;
            }
        }

        if !plan.unplaced.is_empty() {
            writeln!(f)?;
            writeln!(f, "⚠️ Unplaced:")?;
            for item in &plan.unplaced {
                writeln!(f, "   - {} [{}]: {}", item.title, item.reason.code(), item.reason_text)?;
            }
        }

        if !plan.container_summaries.is_empty() {
            writeln!(f)?;
            writeln!(f, "{:<24} {:>7} {:>7} {:>7}", "Container", "placed", "in", "out")?;
            for summary in &plan.container_summaries {
                writeln!(
                    f,
                    "{:<24} {:>7} {:>7} {:>7}",
                    summary.container_name, summary.placed, summary.moved_in, summary.moved_out
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ContainerSummary, Location, PlanMode, PlanMove, PlanScope, UnplacedItem, UnplacedReason};
    use chrono::{TimeZone, Utc};

    fn plan() -> ReorganizationPlan {
        ReorganizationPlan::empty(
            PlanScope::Global,
            PlanMode::Reoptimize,
            Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap(),
        )
    }

    fn location(x: u32) -> Location {
        Location {
            container_id: "d1".into(),
            container_name: "Workbench".into(),
            layer_id: "l0".into(),
            layer_index: 0,
            x,
            y: 1,
        }
    }

    #[test]
    fn empty_scope_message() {
        let text = render_plan(&plan());
        assert!(text.contains("whole inventory, re-optimize"));
        assert!(text.contains("2026-05-04T08:30:00+00:00"));
        assert!(text.contains("No items to reorganize"));
        assert!(!text.contains("Moves:"));
    }

    #[test]
    fn already_organized_message() {
        let mut plan = plan();
        plan.total_items = 2;
        plan.unchanged = 2;
        assert!(render_plan(&plan).contains("already organized"));
    }

    #[test]
    fn zero_moves_with_unplaced_items_is_still_organized() {
        let mut plan = plan();
        plan.total_items = 2;
        plan.unchanged = 1;
        plan.unplaced.push(UnplacedItem {
            item_id: "b2".into(),
            title: "Caisse".into(),
            reason: UnplacedReason::DimensionsIncompatible,
            reason_text: UnplacedReason::DimensionsIncompatible.to_string(),
        });

        let text = format!("{}", PlanReport(&plan));
        assert!(text.contains("already organized"));
        assert!(text.contains("Caisse [dimensions_incompatible]"));
        assert_eq!(text, render_plan(&plan));
    }

    #[test]
    fn lists_moves_unplaced_and_summaries() {
        let mut plan = plan();
        plan.total_items = 2;
        plan.moves.push(PlanMove {
            item_id: "b1".into(),
            title: "Vis M3x10".into(),
            from: location(3),
            to: location(0),
            rotated: false,
            width_units: 1,
            depth_units: 1,
            reason: "Size M3x10: starts the M3 cluster".into(),
        });
        plan.unplaced.push(UnplacedItem {
            item_id: "b2".into(),
            title: "Caisse".into(),
            reason: UnplacedReason::InsufficientSpace,
            reason_text: UnplacedReason::InsufficientSpace.to_string(),
        });
        plan.container_summaries.push(ContainerSummary {
            container_id: "d1".into(),
            container_name: "Workbench".into(),
            placed: 1,
            moved_in: 0,
            moved_out: 0,
        });

        let text = render_plan(&plan);
        assert!(status_message(&plan).is_none());
        assert!(text.contains("1. Vis M3x10: Workbench / layer 1 (3, 1) → Workbench / layer 1 (0, 1)"));
        assert!(text.contains("Size M3x10: starts the M3 cluster"));
        assert!(text.contains("Caisse [insufficient_space]"));
        assert!(text.contains("Workbench"));
    }
}
