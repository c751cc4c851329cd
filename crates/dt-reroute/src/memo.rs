//! Pre-insertion route memo.
//!
//! Vehicles waiting to enter at the same edge for the same destination get
//! the same answer under a fixed cost table, so pre-insertion searches may
//! reuse it.  Entries are only valid for one table: the registry clears the
//! memo on every refresh.  There is no other eviction.

use dt_core::EdgeId;
use dt_spatial::Route;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct RouteMemo {
    routes: FxHashMap<(EdgeId, EdgeId), Route>,
    hits:   u64,
}

impl RouteMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached route for `origin → destination`, counting a hit if found.
    pub fn get(&mut self, origin: EdgeId, destination: EdgeId) -> Option<Route> {
        let route = self.routes.get(&(origin, destination)).cloned();
        if route.is_some() {
            self.hits += 1;
        }
        route
    }

    pub fn insert(&mut self, route: Route) {
        if let (Some(o), Some(d)) = (route.origin(), route.destination()) {
            self.routes.insert((o, d), route);
        }
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Lookups answered from the memo since creation.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
