use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, TryRecvError};
use glam::Vec3;
use rayon::ThreadPool;

use crate::geometry::{Geometry, GeometryHandle, MeshData};

/// Spatial description of one node handed to a generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRequest {
    pub position: Vec3,
    pub size: Vec3,
    pub depth: u8,
}

/// The opaque isosurface pipeline: turns a node's volume into mesh data.
///
/// Must be deterministic and free of side effects per request.
pub trait MeshBuilder: Send + Sync + 'static {
    fn build(&self, request: &MeshRequest) -> MeshData;
}

impl<F> MeshBuilder for F
where
    F: Fn(&MeshRequest) -> MeshData + Send + Sync + 'static,
{
    fn build(&self, request: &MeshRequest) -> MeshData {
        self(request)
    }
}

/// Errors from the generator boundary.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("generator already has a job in flight")]
    Busy,
    #[error("generator index {index} out of range (pool has {len})")]
    NoSuchGenerator { index: usize, len: usize },
    #[error("failed to start mesh worker threads: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Ready/busy protocol of a single mesh generator.
pub trait MeshGenerator {
    /// True iff no job is in flight.
    fn is_ready(&self) -> bool;

    /// Start generating `request` into `geometry`. Returns immediately.
    fn process(&mut self, geometry: &GeometryHandle, request: MeshRequest) -> Result<(), MeshError>;

    /// Poll the in-flight job. Returns true if a job stored geometry during this call.
    /// A job whose geometry was dropped frees the slot but reports false.
    fn update(&mut self) -> bool;
}

struct Job {
    geometry: Weak<Geometry>,
    done: Receiver<MeshData>,
    request: MeshRequest,
}

/// Generator that runs its builder on a shared worker pool and reports completion
/// through a channel.
pub struct AsyncGenerator<B> {
    builder: Arc<B>,
    workers: Arc<ThreadPool>,
    job: Option<Job>,
}

impl<B: MeshBuilder> AsyncGenerator<B> {
    pub fn new(builder: Arc<B>, workers: Arc<ThreadPool>) -> Self {
        Self {
            builder,
            workers,
            job: None,
        }
    }
}

impl<B: MeshBuilder> MeshGenerator for AsyncGenerator<B> {
    fn is_ready(&self) -> bool {
        self.job.is_none()
    }

    fn process(&mut self, geometry: &GeometryHandle, request: MeshRequest) -> Result<(), MeshError> {
        if self.job.is_some() {
            return Err(MeshError::Busy);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let builder = Arc::clone(&self.builder);
        self.workers.spawn(move || {
            let mesh = builder.build(&request);
            // The receiver is gone only if the generator itself was dropped.
            let _ = tx.send(mesh);
        });

        self.job = Some(Job {
            geometry: Arc::downgrade(geometry),
            done: rx,
            request,
        });
        Ok(())
    }

    fn update(&mut self) -> bool {
        let Some(job) = self.job.take() else {
            return false;
        };

        match job.done.try_recv() {
            Ok(mesh) => finish(&job.geometry, mesh, &job.request),
            Err(TryRecvError::Empty) => {
                self.job = Some(job);
                false
            }
            Err(TryRecvError::Disconnected) => {
                tracing::warn!(
                    position = ?job.request.position,
                    depth = job.request.depth,
                    "mesh worker exited without a result; releasing generator"
                );
                false
            }
        }
    }
}

/// Generator that builds on the polling thread during the next `update`.
///
/// Keeps the one-tick latency of a real asynchronous generator while staying
/// deterministic, which makes it the generator of choice for tests and benchmarks.
pub struct InlineGenerator<B> {
    builder: Arc<B>,
    job: Option<(Weak<Geometry>, MeshRequest)>,
}

impl<B: MeshBuilder> InlineGenerator<B> {
    pub fn new(builder: Arc<B>) -> Self {
        Self { builder, job: None }
    }
}

impl<B: MeshBuilder> MeshGenerator for InlineGenerator<B> {
    fn is_ready(&self) -> bool {
        self.job.is_none()
    }

    fn process(&mut self, geometry: &GeometryHandle, request: MeshRequest) -> Result<(), MeshError> {
        if self.job.is_some() {
            return Err(MeshError::Busy);
        }
        self.job = Some((Arc::downgrade(geometry), request));
        Ok(())
    }

    fn update(&mut self) -> bool {
        let Some((geometry, request)) = self.job.take() else {
            return false;
        };
        // Skip the build entirely when the owner is already gone.
        if geometry.strong_count() == 0 {
            tracing::trace!(depth = request.depth, "skipping build for destroyed node");
            return false;
        }
        let mesh = self.builder.build(&request);
        finish(&geometry, mesh, &request)
    }
}

fn finish(geometry: &Weak<Geometry>, mesh: MeshData, request: &MeshRequest) -> bool {
    match geometry.upgrade() {
        Some(geometry) => {
            tracing::trace!(
                depth = request.depth,
                vertices = mesh.vertices.len(),
                indices = mesh.indices.len(),
                "mesh ready"
            );
            geometry.store(mesh);
            true
        }
        None => {
            tracing::trace!(depth = request.depth, "dropping mesh for destroyed node");
            false
        }
    }
}
