//! Parallel route search with a per-step barrier.
//!
//! # Model
//!
//! A [`WorkerPool`] owns one router per worker.  [`WorkerPool::submit_batch`]
//! splits a step's requests into contiguous chunks, runs each chunk on its
//! own router inside a dedicated rayon pool, and returns only after every
//! chunk has finished.  Result `i` always answers request `i`.
//!
//! Routers are deterministic for a fixed cost view, so the results do not
//! depend on the worker count.  With zero workers the batch runs on the
//! calling thread using a single router.

use dt_core::{EdgeId, VehicleId};
use dt_spatial::{RoadNetwork, Route, Router};
use rayon::prelude::*;
use tracing::info;

use crate::cost::CostView;
use crate::{RerouteError, RerouteResult};

/// One route search, on behalf of `vehicle`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub vehicle:     VehicleId,
    pub origin:      EdgeId,
    pub destination: EdgeId,
}

/// `None` means no path exists under the batch's cost view.
pub type SearchResult = Option<Route>;

pub struct WorkerPool<R: Router> {
    /// One per worker; exactly one when running sequentially.
    routers: Vec<R>,
    threads: Option<rayon::ThreadPool>,
    batches: u64,
}

impl<R: Router + Clone> WorkerPool<R> {
    /// Build a pool of `worker_count` threads, each with its own clone of
    /// `prototype`.
    pub fn new(prototype: &R, worker_count: usize) -> RerouteResult<Self> {
        let threads = if worker_count == 0 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("reroute-{i}"))
                .build()
                .map_err(|e| RerouteError::Pool(e.to_string()))?;
            Some(pool)
        };
        let routers = (0..worker_count.max(1)).map(|_| prototype.clone()).collect();
        info!(workers = worker_count, "routing worker pool created");
        Ok(Self { routers, threads, batches: 0 })
    }
}

impl<R: Router> WorkerPool<R> {
    /// Number of threads; 0 for sequential execution.
    pub fn worker_count(&self) -> usize {
        if self.threads.is_some() { self.routers.len() } else { 0 }
    }

    /// Batches run so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Run every request against `view` and block until all are done.
    pub fn submit_batch(
        &mut self,
        network:  &RoadNetwork,
        view:     &CostView,
        requests: &[SearchRequest],
    ) -> Vec<SearchResult> {
        if requests.is_empty() {
            return Vec::new();
        }
        self.batches += 1;

        let Some(threads) = &self.threads else {
            return run_chunk(&mut self.routers[0], network, view, requests);
        };

        let chunk_len = requests.len().div_ceil(self.routers.len());
        let routers = &mut self.routers;
        let chunks: Vec<Vec<SearchResult>> = threads.install(|| {
            routers
                .par_iter_mut()
                .zip(requests.par_chunks(chunk_len))
                .map(|(router, chunk)| run_chunk(router, network, view, chunk))
                .collect()
        });
        chunks.into_iter().flatten().collect()
    }
}

fn run_chunk<R: Router>(
    router:   &mut R,
    network:  &RoadNetwork,
    view:     &CostView,
    requests: &[SearchRequest],
) -> Vec<SearchResult> {
    requests
        .iter()
        .map(|r| router.route(network, r.origin, r.destination, view))
        .collect()
}
