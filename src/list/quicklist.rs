//! Quicklist: an ordered sequence of [`Listpack`] nodes used as one
//! logical list.
//!
//! Most elements live in *packed* nodes, which amortize allocation and
//! keep small elements cache-local. An element whose encoded size would
//! leave no room for a node's own header and terminator gets a *plain*
//! node all to itself, so one oversized push can never force every
//! other element in the list through the same size ceiling.

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::list::entry;
use crate::list::listpack::Listpack;

enum Node {
    Packed(Listpack),
    Plain(Vec<u8>),
}

impl Node {
    fn len(&self) -> usize {
        match self {
            Node::Packed(lp) => lp.length(),
            Node::Plain(_) => 1,
        }
    }

    fn at_index(&self, i: isize) -> Option<Vec<u8>> {
        match self {
            Node::Packed(lp) => lp.at_index(i),
            Node::Plain(bytes) => {
                if i == 0 || i == -1 {
                    Some(bytes.clone())
                } else {
                    None
                }
            }
        }
    }
}

struct QuicklistState {
    nodes: VecDeque<Node>,
    size: usize,
}

pub struct Quicklist {
    state: RwLock<QuicklistState>,
    max_list_pack_size: usize,
}

fn is_oversized(max: usize, value: &[u8]) -> bool {
    entry::encoded_size(value) + 7 > max
}

impl Quicklist {
    pub fn new(max_list_pack_size: usize) -> Self {
        let mut nodes = VecDeque::new();
        nodes.push_back(Node::Packed(Listpack::new_empty(max_list_pack_size)));
        Quicklist {
            state: RwLock::new(QuicklistState { nodes, size: 0 }),
            max_list_pack_size,
        }
    }

    pub fn length(&self) -> usize {
        self.state.read().size
    }

    /// Appends `values` to the tail. Returns the new total length.
    pub fn rpush(&self, values: &[&[u8]]) -> usize {
        let mut state = self.state.write();
        for v in values {
            if is_oversized(self.max_list_pack_size, v) {
                if let Some(Node::Packed(lp)) = state.nodes.back() {
                    if lp.is_empty() {
                        state.nodes.pop_back();
                    }
                }
                state.nodes.push_back(Node::Plain(v.to_vec()));
            } else {
                loop {
                    let needs_new_node = match state.nodes.back() {
                        Some(Node::Packed(lp)) => lp.push_tail(v).is_err(),
                        _ => true,
                    };
                    if needs_new_node {
                        state
                            .nodes
                            .push_back(Node::Packed(Listpack::new_empty(self.max_list_pack_size)));
                        continue;
                    }
                    break;
                }
            }
            state.size += 1;
        }
        state.size
    }

    /// Prepends `values` to the head, one at a time, mirroring [`Self::rpush`].
    pub fn lpush(&self, values: &[&[u8]]) -> usize {
        let mut state = self.state.write();
        for v in values {
            if is_oversized(self.max_list_pack_size, v) {
                if let Some(Node::Packed(lp)) = state.nodes.front() {
                    if lp.is_empty() {
                        state.nodes.pop_front();
                    }
                }
                state.nodes.push_front(Node::Plain(v.to_vec()));
            } else {
                loop {
                    let needs_new_node = match state.nodes.front() {
                        Some(Node::Packed(lp)) => lp.push_head(v).is_err(),
                        _ => true,
                    };
                    if needs_new_node {
                        state
                            .nodes
                            .push_front(Node::Packed(Listpack::new_empty(self.max_list_pack_size)));
                        continue;
                    }
                    break;
                }
            }
            state.size += 1;
        }
        state.size
    }

    /// Pops up to `count` elements from the tail. Result order is the
    /// order elements were removed in (newest first).
    pub fn rpop(&self, count: usize) -> Vec<Vec<u8>> {
        let mut state = self.state.write();
        let mut result = Vec::with_capacity(count.min(state.size));
        while result.len() < count && state.size > 0 {
            match state.nodes.back() {
                Some(Node::Packed(lp)) if lp.is_empty() => {
                    if state.nodes.len() > 1 {
                        state.nodes.pop_back();
                    } else {
                        break;
                    }
                }
                Some(Node::Packed(lp)) => {
                    let popped = lp.pop_tail(1);
                    if popped.is_empty() {
                        break;
                    }
                    result.extend(popped);
                    state.size -= 1;
                }
                Some(Node::Plain(_)) => {
                    let bytes = match state.nodes.pop_back() {
                        Some(Node::Plain(b)) => b,
                        _ => unreachable!(),
                    };
                    result.push(bytes);
                    state.size -= 1;
                    if state.nodes.is_empty() {
                        state
                            .nodes
                            .push_back(Node::Packed(Listpack::new_empty(self.max_list_pack_size)));
                    }
                }
                None => break,
            }
        }
        result
    }

    /// Pops up to `count` elements from the head. Result order is the
    /// order elements were removed in (oldest first).
    pub fn lpop(&self, count: usize) -> Vec<Vec<u8>> {
        let mut state = self.state.write();
        let mut result = Vec::with_capacity(count.min(state.size));
        while result.len() < count && state.size > 0 {
            match state.nodes.front() {
                Some(Node::Packed(lp)) if lp.is_empty() => {
                    if state.nodes.len() > 1 {
                        state.nodes.pop_front();
                    } else {
                        break;
                    }
                }
                Some(Node::Packed(lp)) => {
                    let popped = lp.pop_head(1);
                    if popped.is_empty() {
                        break;
                    }
                    result.extend(popped);
                    state.size -= 1;
                }
                Some(Node::Plain(_)) => {
                    let bytes = match state.nodes.pop_front() {
                        Some(Node::Plain(b)) => b,
                        _ => unreachable!(),
                    };
                    result.push(bytes);
                    state.size -= 1;
                    if state.nodes.is_empty() {
                        state
                            .nodes
                            .push_front(Node::Packed(Listpack::new_empty(self.max_list_pack_size)));
                    }
                }
                None => break,
            }
        }
        result
    }

    /// Returns the element at logical index `i` (negative counts from the
    /// tail), or `None` if out of range.
    pub fn at_index(&self, i: isize) -> Option<Vec<u8>> {
        let state = self.state.read();
        if state.size == 0 {
            return None;
        }
        if i >= 0 {
            let mut remaining = i;
            for node in state.nodes.iter() {
                let len = node.len() as isize;
                if remaining < len {
                    return node.at_index(remaining);
                }
                remaining -= len;
            }
            None
        } else {
            let mut remaining = -i - 1;
            for node in state.nodes.iter().rev() {
                let len = node.len() as isize;
                if remaining < len {
                    return node.at_index(-(remaining + 1));
                }
                remaining -= len;
            }
            None
        }
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_invariant_under_mixed_ops() {
        let ql = Quicklist::new(1024);
        assert_eq!(ql.rpush(&[b"a", b"b", b"c"]), 3);
        assert_eq!(ql.lpush(&[b"x", b"y"]), 5);
        assert_eq!(ql.rpop(2).len(), 2);
        assert_eq!(ql.length(), 3);
        assert_eq!(ql.lpop(10).len(), 3);
        assert_eq!(ql.length(), 0);
    }

    #[test]
    fn rpush_lpop_order_matches_end_to_end_property() {
        let ql = Quicklist::new(1024);
        ql.rpush(&[b"a", b"b", b"c"]);
        assert_eq!(ql.length(), 3);
        assert_eq!(ql.rpop(1), vec![b"c".to_vec()]);
        assert_eq!(ql.length(), 2);
        assert_eq!(ql.rpop(5), vec![b"b".to_vec(), b"a".to_vec()]);
        assert_eq!(ql.length(), 0);
        assert_eq!(ql.rpop(1), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn lpush_then_rpop_three_times_yields_insertion_order() {
        let ql = Quicklist::new(1024);
        ql.lpush(&[b"a", b"b", b"c"]);
        assert_eq!(ql.rpop(1), vec![b"a".to_vec()]);
        assert_eq!(ql.rpop(1), vec![b"b".to_vec()]);
        assert_eq!(ql.rpop(1), vec![b"c".to_vec()]);
    }

    #[test]
    fn at_index_matches_end_to_end_property() {
        let ql = Quicklist::new(1024);
        ql.rpush(&[b"a", b"b", b"c"]);
        assert_eq!(ql.at_index(0), Some(b"a".to_vec()));
        assert_eq!(ql.at_index(-1), Some(b"c".to_vec()));
        assert_eq!(ql.at_index(10), None);
    }

    #[test]
    fn oversized_elements_get_dedicated_plain_nodes() {
        let ql = Quicklist::new(32);
        let big = vec![0u8; 64];
        ql.rpush(&[&big]);
        ql.rpush(&[&big]);
        assert_eq!(ql.length(), 2);
        assert_eq!(ql.node_count(), 2);
        assert_eq!(ql.at_index(0), Some(big.clone()));
        assert_eq!(ql.at_index(1), Some(big));
    }

    #[test]
    fn small_elements_share_packed_nodes() {
        let ql = Quicklist::new(1024);
        ql.rpush(&[b"a", b"b", b"c"]);
        assert_eq!(ql.node_count(), 1);
    }

    #[test]
    fn splits_into_new_packed_node_on_overflow() {
        let ql = Quicklist::new(64);
        for _ in 0..20 {
            ql.rpush(&[b"payload"]);
        }
        assert!(ql.node_count() > 1);
        assert_eq!(ql.length(), 20);
    }
}
