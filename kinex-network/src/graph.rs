//! Undirected kinship graph over person IDs.

use std::collections::{BTreeMap, HashMap, HashSet};

use kinex_core::{KinexError, Result, Summarizable};
use kinex_io::{Edge, Residence};
use kinex_stats::{correlation, descriptive};
use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;

/// People as nodes, kinship links as edges.
///
/// Parallel edges collapse into one and self-loops are dropped, so the
/// graph is simple.
#[derive(Debug, Clone, Default)]
pub struct KinshipGraph {
    graph: UnGraph<String, Option<String>>,
    index: HashMap<String, NodeIndex>,
}

/// Whole-network summary figures.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParams {
    pub nodes: usize,
    pub edges: usize,
    /// `2M / N`.
    pub average_degree: f64,
    pub average_clustering: f64,
    /// Pearson correlation of degrees at either end of each edge; `None`
    /// when every endpoint has the same degree.
    pub assortativity: Option<f64>,
    /// Connected-component sizes, largest first.
    pub component_sizes: Vec<usize>,
}

/// Size and kinship distances of one household in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdDistance {
    pub household: String,
    pub year: String,
    pub size: usize,
    pub median_distance: Option<f64>,
    /// Largest finite distance between two members.
    pub max_distance: Option<usize>,
    /// Members with no kinship path to anyone else in the household,
    /// including residents missing from the graph.
    pub unrelated: Vec<String>,
}

/// Pairwise kinship within one household.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HouseholdKinship {
    /// Distances of related member pairs.
    pub distances: Vec<usize>,
    /// Members related to no other member. Empty for one-person households.
    pub unrelated: Vec<String>,
}

impl HouseholdKinship {
    pub fn median(&self) -> Result<Option<f64>> {
        if self.distances.is_empty() {
            return Ok(None);
        }
        let values: Vec<f64> = self.distances.iter().map(|&d| d as f64).collect();
        descriptive::median(&values).map(Some)
    }

    pub fn max_distance(&self) -> Option<usize> {
        self.distances.iter().copied().max()
    }
}

impl Summarizable for NetworkParams {
    fn summary(&self) -> String {
        let r = self
            .assortativity
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"));
        format!(
            "{} nodes, {} edges, mean degree {:.4}, clustering {:.4}, assortativity {}, {} components",
            self.nodes,
            self.edges,
            self.average_degree,
            self.average_clustering,
            r,
            self.component_sizes.len()
        )
    }
}

impl KinshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a node list and an edge list. Edge endpoints
    /// missing from `nodes` are added.
    pub fn from_lists<S: AsRef<str>>(nodes: &[S], edges: &[Edge]) -> Self {
        let mut g = Self::new();
        for id in nodes {
            g.add_person(id.as_ref());
        }
        for edge in edges {
            g.add_link(&edge.source, &edge.target, edge.kind.clone());
        }
        g
    }

    /// Add a person if not already present.
    pub fn add_person(&mut self, id: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            return ix;
        }
        let ix = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), ix);
        ix
    }

    /// Link two people. Returns `false` for self-loops and repeated links.
    pub fn add_link(&mut self, a: &str, b: &str, kind: Option<String>) -> bool {
        let ia = self.add_person(a);
        let ib = self.add_person(b);
        if ia == ib {
            tracing::debug!(person = a, "ignoring self-loop");
            return false;
        }
        if self.graph.find_edge(ia, ib).is_some() {
            return false;
        }
        self.graph.add_edge(ia, ib, kind);
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn node(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| {
                KinexError::InvalidInput(format!("kinship graph: unknown person '{id}'"))
            })
    }

    fn degree_at(&self, ix: NodeIndex) -> usize {
        self.graph.neighbors(ix).count()
    }

    /// People grouped by their number of direct relatives, lowest degree
    /// first. IDs within a degree keep insertion order.
    pub fn degree_distribution(&self) -> BTreeMap<usize, Vec<String>> {
        let mut out: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for ix in self.graph.node_indices() {
            out.entry(self.degree_at(ix)).or_default().push(self.graph[ix].clone());
        }
        out
    }

    /// Kinship distances among the members of one household.
    pub fn household_kinship<S: AsRef<str>>(&self, members: &[S]) -> Result<HouseholdKinship> {
        let ixs = members.iter().map(|m| self.node(m.as_ref())).collect::<Result<Vec<_>>>()?;
        let mut related = vec![false; ixs.len()];
        let mut distances = Vec::new();
        for (k, &from) in ixs.iter().enumerate() {
            let costs = dijkstra(&self.graph, from, None, |_| 1usize);
            for (offset, to) in ixs[k + 1..].iter().enumerate() {
                if let Some(&d) = costs.get(to) {
                    distances.push(d);
                    related[k] = true;
                    related[k + 1 + offset] = true;
                }
            }
        }
        let unrelated = if ixs.len() < 2 {
            Vec::new()
        } else {
            members
                .iter()
                .zip(&related)
                .filter(|(_, &r)| !r)
                .map(|(m, _)| m.as_ref().to_string())
                .collect()
        };
        Ok(HouseholdKinship { distances, unrelated })
    }

    /// Median kinship distance over related pairs of `members`.
    ///
    /// `None` for households with fewer than two members or no related pair.
    pub fn household_median_distance<S: AsRef<str>>(&self, members: &[S]) -> Result<Option<f64>> {
        self.household_kinship(members)?.median()
    }

    /// [`household_kinship`](Self::household_kinship) for every household
    /// in every year of `residences`, ordered by year then household.
    /// Residents missing from the graph count towards size and are listed
    /// as unrelated.
    pub fn household_distances<S: AsRef<str>>(
        &self,
        residences: &[Residence],
        years: &[S],
    ) -> Result<Vec<HouseholdDistance>> {
        let mut out = Vec::new();
        for (k, year) in years.iter().enumerate() {
            let mut households: Vec<(&str, Vec<&str>)> = Vec::new();
            for r in residences {
                let Some(Some(hh)) = r.households.get(k) else {
                    continue;
                };
                match households.iter_mut().find(|(h, _)| *h == hh.as_str()) {
                    Some((_, members)) => members.push(r.id.as_str()),
                    None => households.push((hh.as_str(), vec![r.id.as_str()])),
                }
            }
            households.sort_by(|a, b| a.0.cmp(b.0));
            for (hh, members) in households {
                let size = members.len();
                let (linked, missing): (Vec<&str>, Vec<&str>) =
                    members.into_iter().partition(|m| self.contains(m));
                if !missing.is_empty() {
                    tracing::debug!(
                        household = hh,
                        year = year.as_ref(),
                        missing = missing.len(),
                        "residents outside the kinship graph"
                    );
                }
                let kinship = self.household_kinship(&linked)?;
                let mut unrelated = kinship.unrelated.clone();
                if size >= 2 {
                    if linked.len() == 1 {
                        unrelated.push(linked[0].to_string());
                    }
                    unrelated.extend(missing.iter().map(|m| m.to_string()));
                }
                out.push(HouseholdDistance {
                    household: hh.to_string(),
                    year: year.as_ref().to_string(),
                    size,
                    median_distance: kinship.median()?,
                    max_distance: kinship.max_distance(),
                    unrelated,
                });
            }
        }
        Ok(out)
    }

    /// Local clustering coefficient of one node: closed triangles over
    /// possible neighbour pairs, 0 below degree 2.
    fn clustering(&self, ix: NodeIndex) -> f64 {
        let neighbors: Vec<NodeIndex> = self.graph.neighbors(ix).collect();
        let k = neighbors.len();
        if k < 2 {
            return 0.0;
        }
        let set: HashSet<NodeIndex> = neighbors.iter().copied().collect();
        let mut links = 0usize;
        for &n in &neighbors {
            links += self.graph.neighbors(n).filter(|m| set.contains(m)).count();
        }
        // each neighbour pair was counted from both ends
        (links as f64 / 2.0) / (k * (k - 1) / 2) as f64
    }

    /// Whole-network summary.
    pub fn params(&self) -> Result<NetworkParams> {
        let n = self.node_count();
        if n == 0 {
            return Err(KinexError::InvalidInput("kinship graph: no people".into()));
        }
        let m = self.edge_count();

        let average_clustering =
            self.graph.node_indices().map(|ix| self.clustering(ix)).sum::<f64>() / n as f64;

        let degree = |ix: NodeIndex| self.degree_at(ix) as f64;
        let mut left = Vec::with_capacity(2 * m);
        let mut right = Vec::with_capacity(2 * m);
        for e in self.graph.raw_edges() {
            let (da, db) = (degree(e.source()), degree(e.target()));
            left.extend([da, db]);
            right.extend([db, da]);
        }
        let assortativity = if left.len() >= 2 && descriptive::variance(&left, 0)? > 0.0 {
            Some(correlation::pearson(&left, &right)?)
        } else {
            None
        };

        let mut components = UnionFind::<usize>::new(n);
        for e in self.graph.raw_edges() {
            components.union(e.source().index(), e.target().index());
        }
        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for label in components.into_labeling() {
            *sizes.entry(label).or_default() += 1;
        }
        let mut component_sizes: Vec<usize> = sizes.into_values().collect();
        component_sizes.sort_unstable_by(|a, b| b.cmp(a));

        Ok(NetworkParams {
            nodes: n,
            edges: m,
            average_degree: 2.0 * m as f64 / n as f64,
            average_clustering,
            assortativity,
            component_sizes,
        })
    }
}
