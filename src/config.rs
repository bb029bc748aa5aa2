use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::plan::{PlanMode, PlanScope};
use crate::planner::PlannerConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub run: RunConfig,
    pub planner: PlannerSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            run: RunConfig::from_env(),
            planner: PlannerSettings::from_env(),
        }
    }
}

/// What a single run reads, plans and writes.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    snapshot_path: PathBuf,
    plan_output: Option<PathBuf>,
    scope: PlanScope,
    mode: PlanMode,
    apply: bool,
}

impl RunConfig {
    const DEFAULT_SNAPSHOT: &'static str = "inventory.json";
    const SNAPSHOT_VAR: &'static str = "DRAWER_TIDY_SNAPSHOT";
    const PLAN_OUTPUT_VAR: &'static str = "DRAWER_TIDY_PLAN_OUTPUT";
    const SCOPE_VAR: &'static str = "DRAWER_TIDY_SCOPE";
    const MODE_VAR: &'static str = "DRAWER_TIDY_MODE";
    const APPLY_VAR: &'static str = "DRAWER_TIDY_APPLY";

    fn from_env() -> Self {
        let snapshot_path = env_string(Self::SNAPSHOT_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_SNAPSHOT));
        let plan_output = env_string(Self::PLAN_OUTPUT_VAR).map(PathBuf::from);
        let scope = env_string(Self::SCOPE_VAR)
            .map(|raw| parse_scope(&raw))
            .unwrap_or(PlanScope::Global);
        let mode = env_string(Self::MODE_VAR)
            .and_then(|raw| parse_mode(&raw, Self::MODE_VAR))
            .unwrap_or_default();
        let apply = env_string(Self::APPLY_VAR)
            .and_then(|raw| parse_bool(&raw, Self::APPLY_VAR))
            .unwrap_or(false);

        Self {
            snapshot_path,
            plan_output,
            scope,
            mode,
            apply,
        }
    }

    /// JSON snapshot the inventory is loaded from and saved back to.
    pub fn snapshot_path(&self) -> &PathBuf {
        &self.snapshot_path
    }

    /// Optional file receiving the plan as JSON.
    pub fn plan_output(&self) -> Option<&PathBuf> {
        self.plan_output.as_ref()
    }

    pub fn scope(&self) -> &PlanScope {
        &self.scope
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    /// Whether the plan is written back to the snapshot.
    pub fn apply(&self) -> bool {
        self.apply
    }
}

/// Weights of the planner scores.
#[derive(Clone, Debug)]
pub struct PlannerSettings {
    planner: PlannerConfig,
}

impl PlannerSettings {
    const VERTICAL_WEIGHT_VAR: &'static str = "DRAWER_TIDY_WEIGHT_VERTICAL";
    const ANCHOR_WEIGHT_VAR: &'static str = "DRAWER_TIDY_WEIGHT_ANCHOR";
    const ANCHOR_VERTICAL_FACTOR_VAR: &'static str = "DRAWER_TIDY_WEIGHT_ANCHOR_VERTICAL";
    const ROTATION_PENALTY_VAR: &'static str = "DRAWER_TIDY_WEIGHT_ROTATION";
    const GROUP_RANK_VAR: &'static str = "DRAWER_TIDY_WEIGHT_GROUP_RANK";
    const SIZE_RANK_VAR: &'static str = "DRAWER_TIDY_WEIGHT_SIZE_RANK";
    const ORIGIN_BONUS_VAR: &'static str = "DRAWER_TIDY_WEIGHT_ORIGIN_BONUS";

    fn from_env() -> Self {
        let vertical_weight = load_u64_with_warning(
            Self::VERTICAL_WEIGHT_VAR,
            PlannerConfig::DEFAULT_VERTICAL_WEIGHT,
            |value| value > 0,
            "must be greater than 0",
            "Adjusted vertical weight may let layer choice lose against clustering",
        );

        let anchor_weight = load_u64_with_warning(
            Self::ANCHOR_WEIGHT_VAR,
            PlannerConfig::DEFAULT_ANCHOR_WEIGHT,
            |_| true,
            "",
            "Adjusted anchor weight changes how tightly groups cluster",
        );

        let anchor_vertical_factor = load_u64_with_warning(
            Self::ANCHOR_VERTICAL_FACTOR_VAR,
            PlannerConfig::DEFAULT_ANCHOR_VERTICAL_FACTOR,
            |value| value > 0,
            "must be greater than 0",
            "Adjusted vertical anchor factor may spread groups across layers",
        );

        let rotation_penalty = load_u64_with_warning(
            Self::ROTATION_PENALTY_VAR,
            PlannerConfig::DEFAULT_ROTATION_PENALTY,
            |_| true,
            "",
            "Adjusted rotation penalty may rotate items without need",
        );

        let group_rank_weight = load_f64_with_warning(
            Self::GROUP_RANK_VAR,
            PlannerConfig::DEFAULT_GROUP_RANK_WEIGHT,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted group ranking may move items away from their group",
        );

        let size_rank_weight = load_f64_with_warning(
            Self::SIZE_RANK_VAR,
            PlannerConfig::DEFAULT_SIZE_RANK_WEIGHT,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted size ranking may split size families",
        );

        let origin_bonus = load_f64_with_warning(
            Self::ORIGIN_BONUS_VAR,
            PlannerConfig::DEFAULT_ORIGIN_BONUS,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted origin bonus changes how often items leave their container",
        );

        let planner = PlannerConfig::builder()
            .vertical_weight(vertical_weight)
            .anchor_weight(anchor_weight)
            .anchor_vertical_factor(anchor_vertical_factor)
            .rotation_penalty(rotation_penalty)
            .group_rank_weight(group_rank_weight)
            .size_rank_weight(size_rank_weight)
            .origin_bonus(origin_bonus)
            .build();

        Self { planner }
    }

    /// Returns the configured PlannerConfig.
    pub fn planner_config(&self) -> PlannerConfig {
        self.planner
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

/// `global` (any case) selects the whole inventory; anything else is a container id.
fn parse_scope(raw: &str) -> PlanScope {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("global") {
        PlanScope::Global
    } else {
        PlanScope::Container(trimmed.to_owned())
    }
}

fn parse_mode(raw: &str, var_name: &str) -> Option<PlanMode> {
    match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "reoptimize" | "re-optimize" => Some(PlanMode::Reoptimize),
        "preserve-layers" | "preserve" => Some(PlanMode::PreserveLayers),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as plan mode. Using {}.",
                var_name,
                other,
                PlanMode::default()
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_u64_with_warning(
    var_name: &str,
    default: u64,
    validator: impl Fn(u64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> u64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if !validator(value) => {
                warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name, raw, invalid_hint, default
                );
                default
            }
            Ok(value) => {
                if value != default {
                    info!("⚠️ {} ({} = {}).", warning, var_name, value);
                }
                value
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as integer: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !value.is_finite() || !validator(value) {
                    warn!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        info!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
