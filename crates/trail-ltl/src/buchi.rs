//! Tableau construction (Gerth, Peled, Vardi, Wolper) of a Büchi automaton
//! from a formula in negation normal form.
//!
//! States are labeled: a state's literals must hold on the letter read while
//! the run sits in it. A letter here is the single atom that is true, or
//! `None` when every atom is false.

use crate::formula::Nnf;
use ahash::AHashMap;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

type Fid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    True,
    False,
    Lit(u32, bool),
    And(Fid, Fid),
    Or(Fid, Fid),
    Next(Fid),
    Until(Fid, Fid),
    Release(Fid, Fid),
}

/// Hash-consed subformulas.
#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
    ids: AHashMap<Node, Fid>,
    atoms: Vec<String>,
}

impl Arena {
    fn intern(&mut self, node: Node) -> Fid {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }
        let id = self.nodes.len() as Fid;
        self.nodes.push(node);
        self.ids.insert(node, id);
        id
    }

    fn atom(&mut self, name: &str) -> u32 {
        match self.atoms.iter().position(|a| a == name) {
            Some(i) => i as u32,
            None => {
                self.atoms.push(name.to_string());
                (self.atoms.len() - 1) as u32
            }
        }
    }

    fn add(&mut self, f: &Nnf) -> Fid {
        let node = match f {
            Nnf::True => Node::True,
            Nnf::False => Node::False,
            Nnf::Lit { atom, positive } => Node::Lit(self.atom(atom), *positive),
            Nnf::And(l, r) => Node::And(self.add(l), self.add(r)),
            Nnf::Or(l, r) => Node::Or(self.add(l), self.add(r)),
            Nnf::Next(g) => Node::Next(self.add(g)),
            Nnf::Until(l, r) => Node::Until(self.add(l), self.add(r)),
            Nnf::Release(l, r) => Node::Release(self.add(l), self.add(r)),
        };
        self.intern(node)
    }
}

const INIT: usize = usize::MAX;

/// Tableau node still being expanded.
struct Pending {
    incoming: BTreeSet<usize>,
    new: BTreeSet<Fid>,
    old: BTreeSet<Fid>,
    next: BTreeSet<Fid>,
}

/// Fully expanded tableau node.
struct Closed {
    incoming: BTreeSet<usize>,
    old: BTreeSet<Fid>,
    next: BTreeSet<Fid>,
}

fn expand(arena: &Arena, root: Fid) -> Vec<Closed> {
    let mut closed: Vec<Closed> = Vec::new();
    let mut stack = vec![Pending {
        incoming: BTreeSet::from([INIT]),
        new: BTreeSet::from([root]),
        old: BTreeSet::new(),
        next: BTreeSet::new(),
    }];

    while let Some(mut node) = stack.pop() {
        let Some(eta) = node.new.pop_first() else {
            match closed
                .iter_mut()
                .find(|c| c.old == node.old && c.next == node.next)
            {
                Some(existing) => existing.incoming.extend(node.incoming),
                None => {
                    let idx = closed.len();
                    stack.push(Pending {
                        incoming: BTreeSet::from([idx]),
                        new: node.next.clone(),
                        old: BTreeSet::new(),
                        next: BTreeSet::new(),
                    });
                    closed.push(Closed {
                        incoming: node.incoming,
                        old: node.old,
                        next: node.next,
                    });
                }
            }
            continue;
        };

        let (new1, next1, new2) = match arena.nodes[eta as usize] {
            Node::False => continue,
            Node::True => {
                node.old.insert(eta);
                stack.push(node);
                continue;
            }
            Node::Lit(atom, positive) => {
                let contradicts = arena
                    .ids
                    .get(&Node::Lit(atom, !positive))
                    .is_some_and(|neg| node.old.contains(neg));
                if contradicts {
                    continue;
                }
                node.old.insert(eta);
                stack.push(node);
                continue;
            }
            Node::And(l, r) => {
                for part in [l, r] {
                    if !node.old.contains(&part) {
                        node.new.insert(part);
                    }
                }
                node.old.insert(eta);
                stack.push(node);
                continue;
            }
            Node::Next(g) => {
                node.old.insert(eta);
                node.next.insert(g);
                stack.push(node);
                continue;
            }
            Node::Or(l, r) => (vec![l], None, vec![r]),
            Node::Until(l, r) => (vec![l], Some(eta), vec![r]),
            Node::Release(l, r) => (vec![r], Some(eta), vec![l, r]),
        };

        node.old.insert(eta);
        let mut second = Pending {
            incoming: node.incoming.clone(),
            new: node.new.clone(),
            old: node.old.clone(),
            next: node.next.clone(),
        };
        second
            .new
            .extend(new2.into_iter().filter(|f| !node.old.contains(f)));
        node.new
            .extend(new1.into_iter().filter(|f| !node.old.contains(f)));
        node.next.extend(next1);
        stack.push(second);
        stack.push(node);
    }
    closed
}

/// One Büchi state.
#[derive(Debug, Clone)]
pub struct BuchiState {
    /// `(atom, positive)` pairs the current letter must satisfy.
    pub literals: Vec<(u32, bool)>,
    pub successors: Vec<u32>,
    pub accepting: bool,
}

/// Degeneralized Büchi automaton.
#[derive(Debug, Clone)]
pub struct Buchi {
    atoms: Vec<String>,
    states: Vec<BuchiState>,
    initial: Vec<u32>,
}

impl Buchi {
    pub fn from_nnf(formula: &Nnf) -> Self {
        let mut arena = Arena::default();
        let root = arena.add(formula);
        let closed = expand(&arena, root);

        let untils: Vec<(Fid, Fid)> = arena
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| match node {
                Node::Until(_, r) => Some((id as Fid, *r)),
                _ => None,
            })
            .collect();

        // Generalized acceptance: set i holds states that do not owe the
        // right operand of until i.
        let in_set = |q: usize, i: usize| {
            let (u, r) = untils[i];
            !closed[q].old.contains(&u) || closed[q].old.contains(&r)
        };

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); closed.len()];
        let mut initial = Vec::new();
        for (q, node) in closed.iter().enumerate() {
            for &from in &node.incoming {
                if from == INIT {
                    initial.push(q);
                } else {
                    successors[from].push(q);
                }
            }
        }

        // Degeneralize with a counter over the acceptance sets.
        let k = untils.len().max(1);
        let mut index: AHashMap<(usize, usize), u32> = AHashMap::new();
        let mut states: Vec<BuchiState> = Vec::new();
        let mut queue = VecDeque::new();
        let mut intern = |key: (usize, usize),
                          states: &mut Vec<BuchiState>,
                          queue: &mut VecDeque<(usize, usize)>| {
            *index.entry(key).or_insert_with(|| {
                let (q, c) = key;
                let literals = closed[q]
                    .old
                    .iter()
                    .filter_map(|&f| match arena.nodes[f as usize] {
                        Node::Lit(atom, positive) => Some((atom, positive)),
                        _ => None,
                    })
                    .collect();
                let accepting = c == 0 && (untils.is_empty() || in_set(q, 0));
                states.push(BuchiState {
                    literals,
                    successors: Vec::new(),
                    accepting,
                });
                queue.push_back(key);
                (states.len() - 1) as u32
            })
        };

        let initial: Vec<u32> = initial
            .into_iter()
            .map(|q| intern((q, 0), &mut states, &mut queue))
            .collect();
        while let Some((q, c)) = queue.pop_front() {
            let from = intern((q, c), &mut states, &mut queue);
            let c_next = if untils.is_empty() || !in_set(q, c) {
                c
            } else {
                (c + 1) % k
            };
            let targets: Vec<u32> = successors[q]
                .iter()
                .map(|&q2| intern((q2, c_next), &mut states, &mut queue))
                .collect();
            states[from as usize].successors = targets;
        }

        debug!(
            tableau = closed.len(),
            acceptance_sets = untils.len(),
            states = states.len(),
            "built Büchi automaton"
        );
        Self {
            atoms: arena.atoms,
            states,
            initial,
        }
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn atom_index(&self, name: &str) -> Option<u32> {
        self.atoms.iter().position(|a| a == name).map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn initial(&self) -> &[u32] {
        &self.initial
    }

    pub fn state(&self, id: u32) -> &BuchiState {
        &self.states[id as usize]
    }

    /// Whether `letter` satisfies the literals of `state`.
    pub fn consistent(&self, state: u32, letter: Option<u32>) -> bool {
        self.states[state as usize]
            .literals
            .iter()
            .all(|&(atom, positive)| (letter == Some(atom)) == positive)
    }

    /// States that start an accepting run reading `letter` forever.
    pub fn lasso_states(&self, letter: Option<u32>) -> Vec<bool> {
        let n = self.states.len();
        let ok: Vec<bool> = (0..n as u32).map(|q| self.consistent(q, letter)).collect();

        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (q, state) in self.states.iter().enumerate() {
            if !ok[q] {
                continue;
            }
            for &s in &state.successors {
                if ok[s as usize] {
                    preds[s as usize].push(q);
                }
            }
        }

        let mut good = vec![false; n];
        let mut queue = VecDeque::new();
        for f in 0..n {
            if ok[f] && self.states[f].accepting && self.on_cycle(f, &ok) {
                good[f] = true;
                queue.push_back(f);
            }
        }
        while let Some(q) = queue.pop_front() {
            for &p in &preds[q] {
                if !good[p] {
                    good[p] = true;
                    queue.push_back(p);
                }
            }
        }
        good
    }

    /// `start` reaches itself in one or more steps through `ok` states.
    fn on_cycle(&self, start: usize, ok: &[bool]) -> bool {
        let mut seen = vec![false; self.states.len()];
        let mut stack: Vec<usize> = self.states[start]
            .successors
            .iter()
            .map(|&s| s as usize)
            .collect();
        while let Some(q) = stack.pop() {
            if !ok[q] || seen[q] {
                continue;
            }
            if q == start {
                return true;
            }
            seen[q] = true;
            stack.extend(self.states[q].successors.iter().map(|&s| s as usize));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn buchi(source: &str) -> Buchi {
        Buchi::from_nnf(&Formula::parse(source).unwrap().to_nnf())
    }

    /// Accepts `word` followed by `tail` forever.
    fn accepts(b: &Buchi, word: &[&str], tail: Option<&str>) -> bool {
        let letter = |name: &str| b.atom_index(name);
        let good = b.lasso_states(tail.and_then(letter));
        let mut current: BTreeSet<u32> = b.initial().iter().copied().collect();
        for (i, w) in word.iter().enumerate() {
            let l = letter(w);
            let candidates: BTreeSet<u32> = if i == 0 {
                current.clone()
            } else {
                current
                    .iter()
                    .flat_map(|&q| b.state(q).successors.iter().copied())
                    .collect()
            };
            current = candidates
                .into_iter()
                .filter(|&q| b.consistent(q, l))
                .collect();
        }
        if word.is_empty() {
            return current.iter().any(|&q| good[q as usize]);
        }
        current
            .iter()
            .flat_map(|&q| b.state(q).successors.iter())
            .any(|&q| good[q as usize])
    }

    #[test]
    fn test_eventually() {
        let b = buchi("<>did(a)");
        assert!(accepts(&b, &["x", "a"], None));
        assert!(!accepts(&b, &["x", "x"], None));
        assert!(accepts(&b, &["x"], Some("a")));
    }

    #[test]
    fn test_always() {
        let b = buchi("[]!did(a)");
        assert!(accepts(&b, &["x", "b"], None));
        assert!(!accepts(&b, &["x", "a"], None));
        assert!(!accepts(&b, &[], Some("a")));
        assert!(accepts(&b, &[], None));
    }

    #[test]
    fn test_until_requires_right_side() {
        let b = buchi("did(a) U did(b)");
        assert!(accepts(&b, &["a", "a", "b"], None));
        assert!(!accepts(&b, &["a", "a"], None));
        assert!(!accepts(&b, &["x", "b"], None));
    }

    #[test]
    fn test_next() {
        let b = buchi("X did(a)");
        assert!(accepts(&b, &["b", "a"], None));
        assert!(!accepts(&b, &["a", "b"], None));
        assert!(!accepts(&b, &["b"], None));
    }

    #[test]
    fn test_negated_afby_recognizes_unanswered_a() {
        let b = Buchi::from_nnf(
            &Formula::parse("[](did(a) -> <>(did(b)))")
                .unwrap()
                .negate()
                .to_nnf(),
        );
        assert!(accepts(&b, &["a"], None));
        assert!(accepts(&b, &["a", "b", "a"], None));
        assert!(!accepts(&b, &["a", "b"], None));
        assert!(!accepts(&b, &[], None));
    }

    #[test]
    fn test_false_has_no_runs() {
        let b = buchi("false");
        assert!(b.initial().is_empty());
    }
}
