//! Tunable layout constants.
//!
//! Every physical constant of the simulation lives in [`LayoutConfig`]. The
//! defaults reproduce the system map as it ships; hosts override any subset
//! by passing a partial object (JS) or JSON document (native).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LayoutError};

/// Seed used for initial placement when the host does not supply one.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Containment rectangle.
///
/// Nodes are kept inside `[margin, width - margin] x [margin, height - margin]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bounds {
    /// Canvas width (default: 800.0).
    pub width: f64,
    /// Canvas height (default: 600.0).
    pub height: f64,
    /// Inset from every edge (default: 60.0).
    pub margin: f64,
}

impl Bounds {
    pub fn min_x(&self) -> f64 {
        self.margin
    }

    pub fn max_x(&self) -> f64 {
        self.width - self.margin
    }

    pub fn min_y(&self) -> f64 {
        self.margin
    }

    pub fn max_y(&self) -> f64 {
        self.height - self.margin
    }

    /// Center of the canvas.
    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }

    /// Whether a point lies inside the containment rectangle (inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Clamp a point into the containment rectangle.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.min_x(), self.max_x()),
            y.clamp(self.min_y(), self.max_y()),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 60.0,
        }
    }
}

/// Configuration for the force simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Pairs closer than this repel (default: 120.0).
    pub repulsion_radius: f64,
    /// Repulsion coefficient `k_rep` (default: 0.1).
    pub repulsion_strength: f64,
    /// Edge length at which the spring stops pulling (default: 100.0).
    pub rest_length: f64,
    /// Spring coefficient `k_spring` (default: 0.01).
    pub spring_strength: f64,
    /// Pull coefficient toward the centering target (default: 0.002).
    pub centering_strength: f64,
    /// No centering pull while a node is within this distance of its
    /// target (default: 200.0).
    pub centering_radius: f64,
    /// Velocity retained per step (default: 0.85).
    pub damping: f64,
    /// Force integration step (default: 1.0).
    pub time_step: f64,
    /// Anneal weight at step zero (default: 0.3).
    pub base_weight: f64,
    /// Anneal weight floor (default: 0.001).
    pub min_weight: f64,
    /// Length of the annealing schedule (default: 300).
    pub max_steps: u32,
    /// Containment rectangle.
    pub bounds: Bounds,
    /// Fraction of velocity kept after a wall hit (default: 0.5).
    pub bounce: f64,
    /// Global centering target. `None` uses the bounds center.
    pub center: Option<[f64; 2]>,
    /// Optional per-category centering targets.
    pub category_anchors: HashMap<String, [f64; 2]>,
    /// PRNG seed for initial placement.
    pub seed: u64,
    /// Base spawn distance from the center (default: 100.0).
    pub spawn_radius: f64,
    /// Extra random spawn distance, uniform in `[0, spawn_jitter)` (default: 60.0).
    pub spawn_jitter: f64,
    /// Total width of the random angle jitter around a category's angle,
    /// in radians (default: 0.5).
    pub angle_jitter: f64,
    /// Distance a node is moved off an exactly coincident neighbour (default: 1.0).
    pub coincident_nudge: f64,
    /// Scheduler repaint cadence in advanced frames (default: 3).
    pub render_interval: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion_radius: 120.0,
            repulsion_strength: 0.1,
            rest_length: 100.0,
            spring_strength: 0.01,
            centering_strength: 0.002,
            centering_radius: 200.0,
            damping: 0.85,
            time_step: 1.0,
            base_weight: 0.3,
            min_weight: 0.001,
            max_steps: 300,
            bounds: Bounds::default(),
            bounce: 0.5,
            center: None,
            category_anchors: HashMap::new(),
            seed: DEFAULT_SEED,
            spawn_radius: 100.0,
            spawn_jitter: 60.0,
            angle_jitter: 0.5,
            coincident_nudge: 1.0,
            render_interval: 3,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The global centering target.
    pub fn center_point(&self) -> [f64; 2] {
        self.center.unwrap_or_else(|| self.bounds.center())
    }

    /// Centering target for a node of the given category.
    pub fn anchor_for(&self, category: &str) -> [f64; 2] {
        self.category_anchors
            .get(category)
            .copied()
            .unwrap_or_else(|| self.center_point())
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("repulsionRadius", self.repulsion_radius)?;
        non_negative("repulsionStrength", self.repulsion_strength)?;
        non_negative("restLength", self.rest_length)?;
        non_negative("springStrength", self.spring_strength)?;
        non_negative("centeringStrength", self.centering_strength)?;
        non_negative("centeringRadius", self.centering_radius)?;
        unit_interval("damping", self.damping)?;
        unit_interval("bounce", self.bounce)?;
        non_negative("timeStep", self.time_step)?;
        non_negative("baseWeight", self.base_weight)?;
        non_negative("minWeight", self.min_weight)?;
        if self.min_weight > self.base_weight {
            return Err(ConfigError::new(
                "minWeight",
                format!("{} exceeds baseWeight {}", self.min_weight, self.base_weight),
            ));
        }
        non_negative("spawnRadius", self.spawn_radius)?;
        non_negative("spawnJitter", self.spawn_jitter)?;
        non_negative("angleJitter", self.angle_jitter)?;
        non_negative("coincidentNudge", self.coincident_nudge)?;
        if self.render_interval == 0 {
            return Err(ConfigError::new("renderInterval", "must be at least 1"));
        }

        let b = &self.bounds;
        non_negative("bounds.margin", b.margin)?;
        if !b.width.is_finite() || b.width <= 2.0 * b.margin {
            return Err(ConfigError::new(
                "bounds.width",
                format!("{} leaves no interior with margin {}", b.width, b.margin),
            ));
        }
        if !b.height.is_finite() || b.height <= 2.0 * b.margin {
            return Err(ConfigError::new(
                "bounds.height",
                format!("{} leaves no interior with margin {}", b.height, b.margin),
            ));
        }

        if let Some([x, y]) = self.center {
            if !x.is_finite() || !y.is_finite() {
                return Err(ConfigError::new("center", "must be finite"));
            }
        }
        for (category, [x, y]) in &self.category_anchors {
            if !x.is_finite() || !y.is_finite() {
                return Err(ConfigError::new(
                    "categoryAnchors",
                    format!("anchor for `{category}` must be finite"),
                ));
            }
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::new(field, format!("{value} must be finite and >= 0")))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::new(field, format!("{value} must be within [0, 1]")))
    }
}
