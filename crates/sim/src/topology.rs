//! Fog node grid, nearest-node routing and per-step link budgets.

use fogsim_core::{CityConfig, NodeConfig, NodeId, Position, SimError, Task, TopologyConfig};
use fogsim_scheduler::SchedulingNode;

/// A scheduling node placed in the city, with its link usage for the current step.
#[derive(Debug)]
pub struct FogSite {
    pub position: Position,
    pub node: SchedulingNode,
    /// MB accepted onto the link during the current step.
    link_load: f64,
}

impl FogSite {
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn link_load(&self) -> f64 {
        self.link_load
    }

    /// Whether `task` fits in what is left of the step's link budget.
    ///
    /// The budget is `link_capacity * dt`; an unlimited link always fits.
    pub fn fits_link(&self, task: &Task, dt: f64) -> bool {
        match self.node.config().link_capacity {
            Some(capacity) => self.link_load + task.data_size <= capacity * dt,
            None => true,
        }
    }

    /// Charge `task` against the link. Only admitted tasks are charged.
    pub fn commit_link(&mut self, task: &Task) {
        if self.node.config().link_capacity.is_some() {
            self.link_load += task.data_size;
        }
    }

    pub fn reset_link(&mut self) {
        self.link_load = 0.0;
    }
}

/// Fog nodes laid out on a regular grid over the city.
#[derive(Debug)]
pub struct Topology {
    sites: Vec<FogSite>,
}

impl Topology {
    /// Build an `nodes_x × nodes_y` grid of identically configured nodes.
    ///
    /// Node `(ix, iy)` sits at `((ix+1)·W/(nx+1), (iy+1)·H/(ny+1))` and ids
    /// are assigned x-major.
    pub fn build_grid(
        topology: &TopologyConfig,
        city: &CityConfig,
        node: &NodeConfig,
    ) -> Result<Self, SimError> {
        let (nx, ny) = (topology.nodes_x, topology.nodes_y);
        if nx == 0 || ny == 0 {
            return Err(SimError::Config(format!(
                "fog grid must be at least 1x1, got {nx}x{ny}"
            )));
        }

        let mut sites = Vec::with_capacity(nx * ny);
        for ix in 0..nx {
            for iy in 0..ny {
                let position = Position::new(
                    (ix + 1) as f64 * city.width / (nx + 1) as f64,
                    (iy + 1) as f64 * city.height / (ny + 1) as f64,
                );
                let node = SchedulingNode::new(sites.len(), node.clone())?;
                sites.push(FogSite {
                    position,
                    node,
                    link_load: 0.0,
                });
            }
        }
        Ok(Self { sites })
    }

    /// Index of the node closest to `position`. The lowest id wins ties.
    pub fn nearest(&self, position: &Position) -> NodeId {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (id, site) in self.sites.iter().enumerate() {
            let d = site.position.distance(position);
            if d < best_distance {
                best = id;
                best_distance = d;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn site(&self, id: NodeId) -> Option<&FogSite> {
        self.sites.get(id)
    }

    pub fn site_mut(&mut self, id: NodeId) -> Option<&mut FogSite> {
        self.sites.get_mut(id)
    }

    pub fn sites(&self) -> &[FogSite] {
        &self.sites
    }

    pub fn sites_mut(&mut self) -> &mut [FogSite] {
        &mut self.sites
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SchedulingNode> {
        self.sites.iter().map(|s| &s.node)
    }

    pub fn reset_links(&mut self) {
        for site in &mut self.sites {
            site.reset_link();
        }
    }
}
