use devloop_model::image_target::ImageTarget;
use devloop_model::target::TargetId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::DfsPostOrder;
use petgraph::Graph;

/// A node of a dependency graph.
pub trait DependencyNode<T>
where
    T: PartialEq,
{
    fn id(&self) -> T;

    /// IDs of the nodes this node depends on.
    fn dependencies(&self) -> Vec<T>;
}

impl DependencyNode<TargetId> for ImageTarget {
    fn id(&self) -> TargetId {
        ImageTarget::id(self)
    }

    fn dependencies(&self) -> Vec<TargetId> {
        self.dependency_ids().to_vec()
    }
}

// Node `i` of the returned graph is `nodes[i]`, with an edge to each dependency that is among
// `nodes`. Dependencies on unknown IDs have no edge.
fn index_graph<T, I>(nodes: &[T]) -> Graph<(), ()>
where
    T: DependencyNode<I>,
    I: PartialEq,
{
    let mut graph = Graph::new();
    let ids = nodes.iter().map(DependencyNode::id).collect::<Vec<_>>();

    for _ in nodes {
        graph.add_node(());
    }

    for (index, node) in nodes.iter().enumerate() {
        for dependency in node.dependencies() {
            if let Some(dependency_index) = ids.iter().position(|id| *id == dependency) {
                graph.add_edge(NodeIndex::new(index), NodeIndex::new(dependency_index), ());
            }
        }
    }

    graph
}

/// IDs of all nodes that are part of a dependency cycle, in the order of `nodes`.
///
/// A node depending on itself is a cycle. Nodes that only depend on a cycle are not part of it.
pub fn dependency_cycles<T, I>(nodes: &[T]) -> Vec<I>
where
    T: DependencyNode<I>,
    I: PartialEq,
{
    let graph = index_graph(nodes);

    let mut cyclic = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => graph.contains_edge(*single, *single),
            _ => true,
        })
        .flatten()
        .map(NodeIndex::index)
        .collect::<Vec<_>>();

    cyclic.sort_unstable();
    cyclic.into_iter().map(|index| nodes[index].id()).collect()
}

/// Orders the nodes so that every node comes after all of its dependencies.
///
/// Apart from that, nodes keep their order. The order among the members of a cycle is
/// unspecified, see [`dependency_cycles`].
pub fn into_build_order<T, I>(nodes: Vec<T>) -> Vec<T>
where
    T: DependencyNode<I>,
    I: PartialEq,
{
    let graph = index_graph(&nodes);

    let mut order = Vec::with_capacity(nodes.len());
    let mut dfs = DfsPostOrder::empty(&graph);
    for index in graph.node_indices() {
        dfs.move_to(index);

        while let Some(visited) = dfs.next(&graph) {
            order.push(visited.index());
        }
    }

    let mut nodes = nodes.into_iter().map(Some).collect::<Vec<_>>();
    order
        .into_iter()
        .filter_map(|index| nodes[index].take())
        .collect()
}
