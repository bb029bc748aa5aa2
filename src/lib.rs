//! drawer_tidy - reorganization planner for drawers of stacked storage bins.
//!
//! Reads an inventory snapshot, groups related bins by category, size
//! signature or keyword, and computes a collision-free, vertically supported
//! layout that clusters each group.
//!
//! # Example
//!
//! ```rust
//! use drawer_tidy::model::{Container, Inventory, Item, Layer};
//! use drawer_tidy::plan::{PlanMode, PlanScope};
//! use drawer_tidy::planner::{generate_plan, PlanOptions};
//!
//! let drawer = Container::new("d1", "Workbench", 4, 2)
//!     .with_layer(Layer::new("l0", 0).with_items(vec![Item::new("b1", "Vis M3x10", 1, 1).at(3, 1)]));
//! let inventory = Inventory::new(vec![drawer], Vec::new());
//!
//! let plan = generate_plan(&inventory, &PlanOptions::new(PlanScope::Global, PlanMode::Reoptimize)).unwrap();
//! assert_eq!(plan.move_count(), 1);
//! assert_eq!((plan.moves[0].to.x, plan.moves[0].to.y), (0, 0));
//! ```

pub mod apply;
pub mod config;
pub mod geometry;
pub mod grouping;
pub mod model;
pub mod plan;
pub mod planner;
pub mod profile;
pub mod report;
pub mod signature;
pub mod spatial;
pub mod store;
pub mod types;

pub use plan::{PlanMode, PlanScope, ReorganizationPlan};
pub use planner::{PlanError, PlanOptions, PlannerConfig, generate_plan, generate_plan_with_config};
