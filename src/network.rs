/*!

The place graph: an undirected, duplicate-free adjacency relation between places.

Places declare neighbors one-sidedly (a place may list a neighbor that does not list it back, or
list the same neighbor twice). A `PlaceGraph` turns those declarations into a symmetric relation,
stores it as one adjacency list per place indexed by `PlaceId`, and writes each list back into
its place so that `Place::neighbors()` and the graph always agree.

Self-loops are dropped: a place is always a movement candidate for agents already in it.

*/

use indexmap::IndexSet;

use crate::error::EpiError;
use crate::place::{Place, PlaceId};

/// The underlying storage type representing the adjacency list
pub type AdjacencyList = IndexSet<PlaceId>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlaceGraph {
    /// The backing storage vector for the adjacency lists, indexed by `PlaceId`.
    adjacency_lists: Vec<AdjacencyList>,
}

impl PlaceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the whole graph from each place's declared neighbors and
    /// writes the symmetric result back into every place. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::UnknownPlace`] if a place declares a neighbor that
    /// does not exist. Nothing is modified in that case.
    pub fn regraph(&mut self, places: &mut [Place]) -> Result<(), EpiError> {
        for place in places.iter() {
            check_declared(place, places.len())?;
        }

        let mut adjacency_lists = vec![AdjacencyList::new(); places.len()];
        for (index, place) in places.iter().enumerate() {
            let place_id = PlaceId(index);
            for &neighbor in place.neighbors() {
                if neighbor == place_id {
                    continue;
                }
                adjacency_lists[index].insert(neighbor);
                adjacency_lists[neighbor.0].insert(place_id);
            }
        }

        for (place, neighbors) in places.iter_mut().zip(&adjacency_lists) {
            place.set_neighbors(neighbors.clone());
        }
        self.adjacency_lists = adjacency_lists;
        Ok(())
    }

    /// Links a newly added place (the last one in `places`) using its declared
    /// neighbors, touching only the lists of the places it connects to.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::UnknownPlace`] if the place declares a neighbor that
    /// does not exist.
    pub fn insert_place(&mut self, places: &mut [Place], place_id: PlaceId) -> Result<(), EpiError> {
        let place = places.get(place_id.0).ok_or(EpiError::UnknownPlace(place_id))?;
        check_declared(place, places.len())?;

        if self.adjacency_lists.len() < places.len() {
            self.adjacency_lists
                .resize_with(places.len(), AdjacencyList::new);
        }

        let declared: Vec<PlaceId> = place.neighbors().iter().copied().collect();
        for neighbor in declared {
            if neighbor == place_id {
                continue;
            }
            self.adjacency_lists[place_id.0].insert(neighbor);
            self.adjacency_lists[neighbor.0].insert(place_id);
            places[neighbor.0].insert_neighbor(place_id);
        }
        places[place_id.0].set_neighbors(self.adjacency_lists[place_id.0].clone());
        Ok(())
    }

    /// Adds the undirected edge `a`–`b`. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if either place does not exist or `a == b`.
    pub fn connect(&mut self, places: &mut [Place], a: PlaceId, b: PlaceId) -> Result<bool, EpiError> {
        for place_id in [a, b] {
            if place_id.0 >= places.len() {
                return Err(EpiError::UnknownPlace(place_id));
            }
        }
        if a == b {
            return Err(EpiError::EpiError(format!(
                "cannot connect {a} to itself"
            )));
        }
        if self.adjacency_lists.len() < places.len() {
            self.adjacency_lists
                .resize_with(places.len(), AdjacencyList::new);
        }

        let added = self.adjacency_lists[a.0].insert(b);
        self.adjacency_lists[b.0].insert(a);
        places[a.0].insert_neighbor(b);
        places[b.0].insert_neighbor(a);
        Ok(added)
    }

    /// Returns an immutable reference to the adjacency list for the given place,
    /// or `None` if the place is not in the graph.
    #[must_use]
    pub fn neighbors(&self, place_id: PlaceId) -> Option<&AdjacencyList> {
        self.adjacency_lists.get(place_id.0)
    }

    #[must_use]
    pub fn degree(&self, place_id: PlaceId) -> usize {
        self.neighbors(place_id).map_or(0, IndexSet::len)
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency_lists.iter().map(IndexSet::len).sum::<usize>() / 2
    }

    /// True if every edge appears in both directions.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.adjacency_lists
            .iter()
            .enumerate()
            .all(|(index, neighbors)| {
                neighbors.iter().all(|neighbor| {
                    self.adjacency_lists
                        .get(neighbor.0)
                        .is_some_and(|back| back.contains(&PlaceId(index)))
                })
            })
    }

    /// True if each place's neighbor list is exactly its adjacency list.
    #[must_use]
    pub fn matches(&self, places: &[Place]) -> bool {
        self.adjacency_lists.len() == places.len()
            && places
                .iter()
                .zip(&self.adjacency_lists)
                .all(|(place, neighbors)| place.neighbors() == neighbors)
    }
}

fn check_declared(place: &Place, place_count: usize) -> Result<(), EpiError> {
    match place
        .neighbors()
        .iter()
        .find(|neighbor| neighbor.0 >= place_count)
    {
        Some(&unknown) => Err(EpiError::UnknownPlace(unknown)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(indexes: &[usize]) -> Vec<PlaceId> {
        indexes.iter().copied().map(PlaceId).collect()
    }

    fn declared(edges: &[&[usize]]) -> Vec<Place> {
        edges
            .iter()
            .enumerate()
            .map(|(index, neighbors)| Place::new(index.to_string()).with_neighbors(ids(neighbors)))
            .collect()
    }

    #[test]
    fn regraph_makes_declarations_symmetric() {
        let mut places = declared(&[&[1, 1, 2], &[], &[], &[2]]);
        let mut graph = PlaceGraph::new();
        graph.regraph(&mut places).unwrap();

        assert!(graph.is_symmetric());
        assert!(graph.matches(&places));
        assert_eq!(places[0].neighbors().len(), 2);
        assert!(places[1].neighbors().contains(&PlaceId(0)));
        assert!(places[2].neighbors().contains(&PlaceId(0)));
        assert!(places[2].neighbors().contains(&PlaceId(3)));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn regraph_is_idempotent() {
        let mut places = declared(&[&[3], &[0, 2], &[], &[1]]);
        let mut graph = PlaceGraph::new();
        graph.regraph(&mut places).unwrap();
        let first = graph.clone();
        let first_places = places.clone();

        graph.regraph(&mut places).unwrap();
        assert_eq!(graph, first);
        assert_eq!(places, first_places);
    }

    #[test]
    fn regraph_drops_self_loops() {
        let mut places = declared(&[&[0, 1], &[]]);
        let mut graph = PlaceGraph::new();
        graph.regraph(&mut places).unwrap();
        assert!(!places[0].neighbors().contains(&PlaceId(0)));
        assert_eq!(graph.degree(PlaceId(0)), 1);
    }

    #[test]
    fn regraph_rejects_unknown_neighbors() {
        let mut places = declared(&[&[5], &[]]);
        let mut graph = PlaceGraph::new();
        let result = graph.regraph(&mut places);
        assert!(matches!(result, Err(EpiError::UnknownPlace(PlaceId(5)))));
        assert_eq!(graph, PlaceGraph::new());
    }

    #[test]
    fn insert_place_updates_only_new_links() {
        let mut places = declared(&[&[1], &[]]);
        let mut graph = PlaceGraph::new();
        graph.regraph(&mut places).unwrap();

        places.push(Place::new("2").with_neighbors(ids(&[0, 0, 2])));
        graph.insert_place(&mut places, PlaceId(2)).unwrap();

        assert!(graph.is_symmetric());
        assert!(graph.matches(&places));
        assert_eq!(places[2].neighbors().len(), 1);
        assert!(places[0].neighbors().contains(&PlaceId(2)));
        assert_eq!(graph.degree(PlaceId(1)), 1);
    }

    #[test]
    fn incremental_and_full_builds_agree() {
        let mut incremental = Vec::new();
        let mut graph = PlaceGraph::new();
        let declarations: [&[usize]; 4] = [&[], &[0], &[0, 1], &[2]];
        for (index, neighbors) in declarations.iter().enumerate() {
            incremental.push(Place::new(index.to_string()).with_neighbors(ids(neighbors)));
            graph.insert_place(&mut incremental, PlaceId(index)).unwrap();
        }

        let mut rebuilt = incremental.clone();
        let mut full = PlaceGraph::new();
        full.regraph(&mut rebuilt).unwrap();

        assert_eq!(graph, full);
        assert_eq!(incremental, rebuilt);
    }

    #[test]
    fn connect_adds_both_directions_once() {
        let mut places = declared(&[&[], &[]]);
        let mut graph = PlaceGraph::new();
        graph.regraph(&mut places).unwrap();

        assert!(graph.connect(&mut places, PlaceId(0), PlaceId(1)).unwrap());
        assert!(!graph.connect(&mut places, PlaceId(1), PlaceId(0)).unwrap());
        assert!(graph.matches(&places));
        assert_eq!(graph.edge_count(), 1);

        assert!(graph.connect(&mut places, PlaceId(0), PlaceId(0)).is_err());
        assert!(matches!(
            graph.connect(&mut places, PlaceId(0), PlaceId(9)),
            Err(EpiError::UnknownPlace(PlaceId(9)))
        ));
    }
}
