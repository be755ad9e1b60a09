use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Finds cycles in a directed graph. Every node that participates in a
/// detected cycle maps to that cycle, rotated to start at the node itself
/// (a self-loop yields a single-element cycle). Nodes outside any cycle are
/// absent from the result.
///
/// The traversal keeps an explicit stack instead of recursing, so
/// pathologically deep graphs cannot overflow the call stack. A back-edge to
/// a node still in progress closes a cycle: the suffix of the current path
/// from that node to the top.
pub fn find_cycles<N>(edges: &BTreeMap<N, Vec<N>>) -> HashMap<N, Vec<N>>
where
    N: Clone + Eq + Hash + Ord,
{
    let mut state: HashMap<&N, Visit> = HashMap::new();
    let mut cycles: HashMap<N, Vec<N>> = HashMap::new();

    for root in edges.keys() {
        if state.contains_key(root) {
            continue;
        }
        state.insert(root, Visit::InProgress);
        let mut stack: Vec<(&N, usize)> = vec![(root, 0)];
        let mut path: Vec<&N> = vec![root];

        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            let children = edges.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if *cursor >= children.len() {
                state.insert(node, Visit::Done);
                stack.pop();
                path.pop();
                continue;
            }
            let child = &children[*cursor];
            *cursor += 1;

            match state.get(child) {
                None => {
                    state.insert(child, Visit::InProgress);
                    stack.push((child, 0));
                    path.push(child);
                }
                Some(Visit::InProgress) => {
                    let start = path
                        .iter()
                        .position(|member| *member == child)
                        .expect("an in-progress node is always on the current path");
                    let cycle = &path[start..];
                    for (offset, member) in cycle.iter().enumerate() {
                        cycles.entry((*member).clone()).or_insert_with(|| {
                            cycle
                                .iter()
                                .cycle()
                                .skip(offset)
                                .take(cycle.len())
                                .map(|member| (*member).clone())
                                .collect()
                        });
                    }
                }
                Some(Visit::Done) => {}
            }
        }
    }

    cycles
}
