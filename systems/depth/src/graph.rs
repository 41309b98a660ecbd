//! Directed "paint before" graph and its strongly connected components.

const UNVISITED: usize = usize::MAX;

/// Adjacency lists over densely numbered nodes.
#[derive(Clone, Debug, Default)]
pub(crate) struct OcclusionGraph {
    successors: Vec<Vec<usize>>,
    edges: usize,
}

impl OcclusionGraph {
    pub(crate) fn with_nodes(count: usize) -> Self {
        Self {
            successors: vec![Vec::new(); count],
            edges: 0,
        }
    }

    /// Records that `from` must be painted before `to`.
    pub(crate) fn add_edge(&mut self, from: usize, to: usize) {
        self.successors[from].push(to);
        self.edges += 1;
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges
    }

    /// Strongly connected components listed so that every edge between two
    /// different components points forward.
    ///
    /// Roots are visited from the highest node index down, which keeps nodes
    /// without any constraint between them in ascending index order.
    pub(crate) fn ordered_components(&mut self) -> Vec<Vec<usize>> {
        for successors in &mut self.successors {
            successors.sort_unstable();
            successors.dedup();
        }

        let mut components = self.tarjan();
        components.reverse();
        components
    }

    /// Iterative Tarjan. Components are emitted sinks first.
    fn tarjan(&self) -> Vec<Vec<usize>> {
        let count = self.successors.len();
        let mut index = vec![UNVISITED; count];
        let mut lowlink = vec![0; count];
        let mut on_stack = vec![false; count];
        let mut stack = Vec::new();
        let mut frames: Vec<(usize, usize)> = Vec::new();
        let mut counter = 0;
        let mut components = Vec::new();

        for root in (0..count).rev() {
            if index[root] != UNVISITED {
                continue;
            }

            index[root] = counter;
            lowlink[root] = counter;
            counter += 1;
            stack.push(root);
            on_stack[root] = true;
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let node = frame.0;
                if let Some(&next) = self.successors[node].get(frame.1) {
                    frame.1 += 1;
                    if index[next] == UNVISITED {
                        index[next] = counter;
                        lowlink[next] = counter;
                        counter += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        frames.push((next, 0));
                    } else if on_stack[next] {
                        lowlink[node] = lowlink[node].min(index[next]);
                    }
                    continue;
                }

                let _ = frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[node]);
                }

                if lowlink[node] == index[node] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack[member] = false;
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }

        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_ordered_along_edges() {
        let mut graph = OcclusionGraph::with_nodes(3);
        graph.add_edge(2, 1);
        graph.add_edge(1, 0);

        assert_eq!(graph.ordered_components(), vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn unconstrained_nodes_keep_index_order() {
        let mut graph = OcclusionGraph::with_nodes(4);

        assert_eq!(
            graph.ordered_components(),
            vec![vec![0], vec![1], vec![2], vec![3]]
        );
    }

    #[test]
    fn cycle_collapses_into_one_component() {
        let mut graph = OcclusionGraph::with_nodes(4);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 0);
        graph.add_edge(2, 3);

        let components = graph.ordered_components();

        assert_eq!(components.len(), 2);
        let mut cycle = components[0].clone();
        cycle.sort_unstable();
        assert_eq!(cycle, vec![0, 1, 2]);
        assert_eq!(components[1], vec![3]);
    }

    #[test]
    fn duplicate_edges_are_tolerated() {
        let mut graph = OcclusionGraph::with_nodes(2);
        graph.add_edge(1, 0);
        graph.add_edge(1, 0);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.ordered_components(), vec![vec![1], vec![0]]);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let count = 50_000;
        let mut graph = OcclusionGraph::with_nodes(count);
        for node in 0..count - 1 {
            graph.add_edge(node, node + 1);
        }

        let components = graph.ordered_components();

        assert_eq!(components.len(), count);
        assert_eq!(components[0], vec![0]);
        assert_eq!(components[count - 1], vec![count - 1]);
    }
}
