//! Shape-source collaborator and the background loader feeding attractor
//! rebuilds.
//!
//! Loading runs on a worker thread. Each request carries a generation
//! number; results from an older generation (superseded or cancelled
//! requests) are dropped on arrival, so only the latest load can reach the
//! attractor index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::ShapeError;
use crate::api::types::GroupKey;
use crate::systems::attractor::{AttractorPartitions, AttractorSet};

/// A closed outline; the last point connects back to the first.
pub type Polyline = Vec<Vec2>;

/// Produces the closed outlines for a shape key ("0".."9" for digits).
pub trait ShapeSource: Send + Sync {
    fn load_shape(&self, key: &str) -> Result<Vec<Polyline>, ShapeError>;
}

/// Shapes held in memory, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticShapes {
    shapes: HashMap<String, Vec<Polyline>>,
}

impl StaticShapes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"key": [[[x, y], ...], ...], ...}`.
    pub fn from_json(json: &str) -> Result<Self, ShapeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, outlines: Vec<Polyline>) {
        self.shapes.insert(key.into(), outlines);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl ShapeSource for StaticShapes {
    fn load_shape(&self, key: &str) -> Result<Vec<Polyline>, ShapeError> {
        let outlines = self
            .shapes
            .get(key)
            .ok_or_else(|| ShapeError::NotFound(key.to_string()))?;
        Ok(outlines.clone())
    }
}

/// One shape to place: load `key`, shift by `offset`, store under `group`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePlacement {
    pub group: GroupKey,
    pub key: String,
    pub offset: Vec2,
}

/// Load every placement and build the partitions. Fails as a whole if any
/// shape is missing or has no outline with at least two points.
pub fn load_partitions(
    source: &dyn ShapeSource,
    placements: &[ShapePlacement],
) -> Result<AttractorPartitions, ShapeError> {
    let mut partitions = AttractorPartitions::new();
    for placement in placements {
        let outlines = source.load_shape(&placement.key)?;
        let mut set = AttractorSet::new();
        for outline in outlines.iter().filter(|o| o.len() >= 2) {
            set.add_closed_polyline(outline, placement.offset);
        }
        if set.is_empty() {
            return Err(ShapeError::Empty(placement.key.clone()));
        }
        let group = partitions.group_mut(placement.group);
        for target in set.targets() {
            group.push(*target);
        }
    }
    Ok(partitions)
}

struct LoadRequest {
    generation: u64,
    placements: Vec<ShapePlacement>,
}

struct LoadResult {
    generation: u64,
    result: Result<AttractorPartitions, ShapeError>,
}

/// Handle to the background shape-loading thread.
pub struct ShapeLoader {
    requests: Sender<LoadRequest>,
    results: Receiver<LoadResult>,
    generation: u64,
    pending: bool,
}

impl ShapeLoader {
    /// Start the worker thread. It exits once the loader is dropped.
    pub fn spawn(source: Arc<dyn ShapeSource>) -> Self {
        let (requests, request_rx) = crossbeam_channel::unbounded::<LoadRequest>();
        let (result_tx, results) = crossbeam_channel::unbounded::<LoadResult>();

        std::thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                let result = load_partitions(source.as_ref(), &request.placements);
                let sent = result_tx.send(LoadResult {
                    generation: request.generation,
                    result,
                });
                if sent.is_err() {
                    break;
                }
            }
            log::debug!("shape loader thread exiting");
        });

        Self {
            requests,
            results,
            generation: 0,
            pending: false,
        }
    }

    /// Queue a load, superseding any load still in flight.
    /// Returns the generation of the new request.
    pub fn request(&mut self, placements: Vec<ShapePlacement>) -> Result<u64, ShapeError> {
        self.generation += 1;
        self.requests
            .send(LoadRequest {
                generation: self.generation,
                placements,
            })
            .map_err(|_| ShapeError::Disconnected)?;
        self.pending = true;
        Ok(self.generation)
    }

    /// Forget the in-flight load; its result will be discarded.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = false;
    }

    /// Non-blocking check for the current request's result.
    pub fn poll(&mut self) -> Option<Result<AttractorPartitions, ShapeError>> {
        if !self.pending {
            self.drain_stale();
            return None;
        }
        loop {
            match self.results.try_recv() {
                Ok(done) => {
                    if let Some(result) = self.accept(done) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.pending = false;
                    return Some(Err(ShapeError::Disconnected));
                }
            }
        }
    }

    /// Wait up to `timeout` for the current request's result.
    pub fn poll_blocking(&mut self, timeout: Duration) -> Option<Result<AttractorPartitions, ShapeError>> {
        if !self.pending {
            return None;
        }
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match self.results.recv_timeout(left) {
                Ok(done) => {
                    if let Some(result) = self.accept(done) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.pending = false;
                    return Some(Err(ShapeError::Disconnected));
                }
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn accept(&mut self, done: LoadResult) -> Option<Result<AttractorPartitions, ShapeError>> {
        if done.generation != self.generation {
            log::debug!("dropping stale shape load (generation {})", done.generation);
            return None;
        }
        self.pending = false;
        Some(done.result)
    }

    fn drain_stale(&mut self) {
        while let Ok(done) = self.results.try_recv() {
            log::debug!("dropping stale shape load (generation {})", done.generation);
        }
    }
}
