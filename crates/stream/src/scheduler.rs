use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};
use terrastream_common::{CameraView, Frustum};
use terrastream_mesh::GeneratorPool;

use crate::config::{ConfigError, StreamConfig};
use crate::lod::{LodBands, LodController};
use crate::node::{NodeHandle, subtree_len};
use crate::node_id::NodeId;
use crate::queue::PendingQueue;
use crate::stats::StreamStats;
use crate::visibility::calculate_visibility;

/// Drives the terrain around a moving camera.
///
/// Owns the sparse map of root-aligned nodes, the pending queue and the generator
/// pool. Single-threaded and frame-driven: call [`set_camera`](Self::set_camera) and
/// [`update`](Self::update) once per tick; neither blocks on a generator.
pub struct TerrainStreamer {
    config: StreamConfig,
    lod: LodController,
    roots: BTreeMap<NodeId, NodeHandle>,
    queue: PendingQueue,
    pool: GeneratorPool,
    last_coverage: Option<Vec3>,
    stats: StreamStats,
}

impl TerrainStreamer {
    pub fn new(config: StreamConfig, pool: GeneratorPool) -> Result<Self, ConfigError> {
        config.validate()?;
        if pool.is_empty() {
            return Err(ConfigError::NoGenerators);
        }

        let lod = LodController::new(
            LodBands::new(config.root_size, config.max_depth),
            config.distance_metric,
        );
        tracing::info!(
            max_depth = config.max_depth,
            visual_radius = config.visual_radius,
            generators = pool.len(),
            "terrain streamer ready"
        );

        Ok(Self {
            config,
            lod,
            roots: BTreeMap::new(),
            queue: PendingQueue::new(),
            pool,
            last_coverage: None,
            stats: StreamStats::default(),
        })
    }

    /// Camera pass: create roots around the camera if it moved, run the LOD pass over
    /// every resident tree, then evict roots beyond the eviction radius.
    pub fn set_camera(&mut self, camera: &CameraView) {
        let _span = tracing::info_span!("terrain_set_camera").entered();
        let start = Instant::now();
        self.stats = StreamStats::default();
        let position = camera.position;

        let threshold = self.config.coverage_move_threshold;
        if self
            .last_coverage
            .is_none_or(|last| last.distance_squared(position) > threshold)
        {
            self.last_coverage = Some(position);
            self.stats.coverage_ran = true;
            self.cover(position);
        }

        for node in self.roots.values() {
            self.lod
                .update_node(node, position, None, &mut self.queue, &mut self.stats);
        }

        let limit = self.config.eviction_radius();
        let mut evicted = 0;
        self.roots.retain(|id, node| {
            let distance = node.borrow().distance();
            let keep = distance <= limit;
            if !keep {
                tracing::debug!(%id, distance, "root evicted");
                evicted += 1;
            }
            keep
        });

        self.stats.roots_evicted = evicted;
        self.stats.resident_roots = self.roots.len();
        self.stats.pending = self.queue.len();
        self.stats.camera_time = start.elapsed();
    }

    /// Dispatch pass: poll generators, then hand the highest-priority pending nodes to
    /// free generators in index order.
    pub fn update(&mut self) {
        let _span = tracing::info_span!("terrain_update").entered();
        let start = Instant::now();

        if !self.queue.is_empty() {
            tracing::debug!(pending = self.queue.len(), "pending nodes");
        }
        self.stats.cancelled += self.queue.discard_cancelled();
        self.queue.sort_if_needed();
        self.stats.completed += self.pool.update_all();
        self.dispatch();

        self.stats.pending = self.queue.len();
        self.stats.busy_generators = self.pool.busy_count();
        self.stats.update_time = start.elapsed();
    }

    /// Refresh visibility flags of every resident tree. Returns the number of visible roots.
    pub fn calculate_visibility(&self, frustum: &Frustum) -> usize {
        self.roots
            .values()
            .filter(|node| calculate_visibility(node, frustum))
            .count()
    }

    /// One full tick: camera pass, visibility, dispatch.
    pub fn tick(&mut self, camera: &CameraView) {
        self.set_camera(camera);
        self.calculate_visibility(&camera.frustum);
        self.update();
    }

    /// Drop a root and its subtree. Any of its nodes still queued are discarded on the
    /// next dispatch pass.
    pub fn evict(&mut self, id: NodeId) -> bool {
        self.roots.remove(&id).is_some()
    }

    /// Look up a resident node by walking its encoded child path from the root cell.
    pub fn find(&self, id: NodeId) -> Option<NodeHandle> {
        let mut current = Rc::clone(self.roots.get(&id.root_id())?);
        for level in 1..=id.depth() {
            let next = {
                let node = current.borrow();
                Rc::clone(&node.children()?[id.octant_at(level)])
            };
            current = next;
        }
        Some(current)
    }

    pub fn roots(&self) -> impl Iterator<Item = &NodeHandle> {
        self.roots.values()
    }

    pub fn root_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.keys().copied()
    }

    pub fn contains_root(&self, id: NodeId) -> bool {
        self.roots.contains_key(&id)
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Total nodes across all resident trees.
    pub fn node_count(&self) -> usize {
        self.roots.values().map(subtree_len).sum()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn pool(&self) -> &GeneratorPool {
        &self.pool
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn lod(&self) -> &LodController {
        &self.lod
    }

    /// Statistics for the current tick.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn cover(&mut self, position: Vec3) {
        let root = self.config.root_size;
        let radius = self.config.visual_radius;
        let metric = self.lod.metric();
        let camera = Vec2::new(position.x, position.z);

        let cell_x = (position.x / root.x).floor() as i64;
        let cell_z = (position.z / root.z).floor() as i64;
        let reach_x = (radius / root.x).ceil() as i64 + 1;
        let reach_z = (radius / root.z).ceil() as i64 + 1;
        let [y_min, y_max] = self.config.vertical_cells;

        for x in cell_x - reach_x..=cell_x + reach_x {
            let Ok(x) = i16::try_from(x) else { continue };
            for z in cell_z - reach_z..=cell_z + reach_z {
                let Ok(z) = i16::try_from(z) else { continue };
                // Planar distance bounds every metric from below.
                let column = Vec2::new(
                    (f32::from(x) + 0.5) * root.x,
                    (f32::from(z) + 0.5) * root.z,
                );
                if column.distance_squared(camera) >= radius * radius {
                    continue;
                }
                for y in y_min..=y_max {
                    let id = NodeId::root(x, y, z);
                    // Same point and metric the eviction pass reads back from the node.
                    let center = self.lod.bands().bounds_of(id).center();
                    if metric.distance(position, center) >= radius {
                        continue;
                    }
                    if let Entry::Vacant(slot) = self.roots.entry(id) {
                        let node = self.lod.create_node(id, Weak::new());
                        self.queue.push(Rc::clone(&node));
                        slot.insert(node);
                        self.stats.roots_created += 1;
                        tracing::debug!(%id, x, y, z, "root created");
                    }
                }
            }
        }
    }

    fn dispatch(&mut self) {
        while let Some(front) = self.queue.front() {
            if PendingQueue::is_cancelled(front) {
                if let Some(node) = self.queue.pop_front() {
                    tracing::trace!(id = %node.borrow().id(), "discarding cancelled node");
                }
                self.stats.cancelled += 1;
                continue;
            }

            let Some(slot) = self.pool.next_ready() else {
                break;
            };
            let Some(node) = self.queue.pop_front() else {
                break;
            };

            let (id, geometry, request) = {
                let n = node.borrow();
                (n.id(), Arc::clone(n.geometry()), n.mesh_request())
            };
            match self.pool.dispatch(slot, &geometry, request) {
                Ok(()) => {
                    self.stats.dispatched += 1;
                    tracing::trace!(%id, slot, "dispatched");
                }
                Err(err) => {
                    tracing::warn!(%id, slot, %err, "dispatch failed; node stays queued");
                    self.queue.push_front(node);
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for TerrainStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainStreamer")
            .field("roots", &self.roots.len())
            .field("pending", &self.queue.len())
            .field("pool", &self.pool)
            .finish()
    }
}
