//! Digit magnet: the `HHMM` digits of the clock as attractor outlines.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::source::{ShapeLoader, ShapePlacement};
use crate::api::error::ShapeError;
use crate::api::types::GroupKey;

/// Where each of the four digits is drawn; slot `i` becomes group `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitLayout {
    pub offsets: [Vec2; 4],
}

impl Default for DigitLayout {
    fn default() -> Self {
        Self {
            offsets: [
                Vec2::new(0.0, 0.0),
                Vec2::new(480.0, 0.0),
                Vec2::new(0.0, 480.0),
                Vec2::new(480.0, 480.0),
            ],
        }
    }
}

impl DigitLayout {
    pub fn placements(&self, digits: [u8; 4]) -> Vec<ShapePlacement> {
        digits
            .iter()
            .zip(self.offsets.iter())
            .enumerate()
            .map(|(slot, (digit, offset))| ShapePlacement {
                group: GroupKey(slot as u8),
                key: digit.to_string(),
                offset: *offset,
            })
            .collect()
    }
}

/// Tracks which digits have been requested so the magnet only reloads when
/// the displayed time changes.
#[derive(Debug, Clone, Default)]
pub struct DigitMagnet {
    layout: DigitLayout,
    requested: Option<[u8; 4]>,
}

impl DigitMagnet {
    pub fn new(layout: DigitLayout) -> Self {
        Self {
            layout,
            requested: None,
        }
    }

    pub fn layout(&self) -> &DigitLayout {
        &self.layout
    }

    pub fn needs_update(&self, digits: [u8; 4]) -> bool {
        self.requested != Some(digits)
    }

    /// Ask `loader` for `digits` unless they were already requested.
    /// Returns whether a load was queued.
    pub fn update(&mut self, loader: &mut ShapeLoader, digits: [u8; 4]) -> Result<bool, ShapeError> {
        if !self.needs_update(digits) {
            return Ok(false);
        }
        loader.request(self.layout.placements(digits))?;
        self.requested = Some(digits);
        log::debug!("digit magnet requested {:?}", digits);
        Ok(true)
    }

    /// Forget the last request so the next `update` reloads.
    pub fn reset(&mut self) {
        self.requested = None;
    }
}
