use std::sync::Arc;

use rayon::ThreadPool;

use crate::generator::{
    AsyncGenerator, InlineGenerator, MeshBuilder, MeshError, MeshGenerator, MeshRequest,
};
use crate::geometry::GeometryHandle;

/// Generator count of the default configuration.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Fixed-size set of mesh generators.
///
/// Bounds the number of generation jobs in flight. The pool is built explicitly and
/// handed to the scheduler; its lifetime is the owner's, not the process's.
pub struct GeneratorPool {
    generators: Vec<Box<dyn MeshGenerator>>,
}

impl GeneratorPool {
    pub fn new(generators: Vec<Box<dyn MeshGenerator>>) -> Self {
        Self { generators }
    }

    /// `count` asynchronous generators sharing one worker thread pool.
    pub fn with_async<B: MeshBuilder>(
        count: usize,
        builder: Arc<B>,
        workers: Arc<ThreadPool>,
    ) -> Self {
        let generators = (0..count)
            .map(|_| {
                Box::new(AsyncGenerator::new(Arc::clone(&builder), Arc::clone(&workers)))
                    as Box<dyn MeshGenerator>
            })
            .collect();
        Self::new(generators)
    }

    /// `count` generators that build on the polling thread.
    pub fn with_inline<B: MeshBuilder>(count: usize, builder: Arc<B>) -> Self {
        let generators = (0..count)
            .map(|_| Box::new(InlineGenerator::new(Arc::clone(&builder))) as Box<dyn MeshGenerator>)
            .collect();
        Self::new(generators)
    }

    /// Worker threads for [`AsyncGenerator`]s. A panicking build is logged and the
    /// affected generator releases its slot on the next poll.
    pub fn worker_threads(threads: usize) -> Result<Arc<ThreadPool>, MeshError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mesh-gen-{i}"))
            .panic_handler(|_| tracing::error!("mesh builder panicked"))
            .build()?;
        Ok(Arc::new(pool))
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Poll every generator. Returns the number of jobs that stored geometry.
    pub fn update_all(&mut self) -> usize {
        self.generators
            .iter_mut()
            .map(|g| g.update())
            .filter(|done| *done)
            .count()
    }

    /// Lowest-index generator with no job in flight.
    pub fn next_ready(&self) -> Option<usize> {
        self.generators.iter().position(|g| g.is_ready())
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.generators.get(index).is_some_and(|g| g.is_ready())
    }

    pub fn ready_count(&self) -> usize {
        self.generators.iter().filter(|g| g.is_ready()).count()
    }

    pub fn busy_count(&self) -> usize {
        self.len() - self.ready_count()
    }

    pub fn dispatch(
        &mut self,
        index: usize,
        geometry: &GeometryHandle,
        request: MeshRequest,
    ) -> Result<(), MeshError> {
        let len = self.generators.len();
        let generator = self
            .generators
            .get_mut(index)
            .ok_or(MeshError::NoSuchGenerator { index, len })?;
        generator.process(geometry, request)
    }
}

impl std::fmt::Debug for GeneratorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorPool")
            .field("len", &self.len())
            .field("busy", &self.busy_count())
            .finish()
    }
}
