//! Structural rewriting over containers.
//!
//! Every operation here is pure: the receiver is untouched and the result is a new node. The
//! callbacks are partial functions in the usual sense: return `None` to say "not this one", or
//! `Some(replacement)` to act.

use crate::md_elem::MdElem;

impl MdElem {
    /// Rewrites this container's child list position by position.
    ///
    /// `f` is called with `(Some(child), index)` for each child, and finally once with
    /// `(None, len)` so it can append. A `Some(nodes)` return splices those nodes in place of the
    /// child; a `None` return keeps the child, unless `filter` is set, in which case unmatched
    /// children are dropped.
    ///
    /// Leaves come back unchanged.
    pub fn replace_in<F>(&self, filter: bool, mut f: F) -> MdElem
    where
        F: FnMut(Option<&MdElem>, usize) -> Option<Vec<MdElem>>,
    {
        let Some(children) = self.children() else {
            return self.clone();
        };
        let mut out = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            match f(Some(child), index) {
                Some(replacement) => out.extend(replacement),
                None if filter => {}
                None => out.push(child.clone()),
            }
        }
        if let Some(appended) = f(None, children.len()) {
            out.extend(appended);
        }
        self.with_children(out)
    }

    /// Splices the first child `f` matches.
    ///
    /// If no child matches and `if_not_found` is given, the fallback nodes are appended to the
    /// child list (or replace it wholesale when `replace` is set) and the search runs once more;
    /// matching on the freshly added fallback is allowed. If that still finds nothing, the
    /// fallback stays where it landed.
    pub fn flat_map_first_in<F>(&self, if_not_found: Option<Vec<MdElem>>, replace: bool, mut f: F) -> MdElem
    where
        F: FnMut(&MdElem) -> Option<Vec<MdElem>>,
    {
        let Some(children) = self.children() else {
            return self.clone();
        };
        if let Some(out) = splice_first(&children, &mut f) {
            return self.with_children(out);
        }
        let Some(fallback) = if_not_found else {
            return self.clone();
        };
        let retry: Vec<MdElem> = if replace {
            fallback
        } else {
            children.into_iter().chain(fallback).collect()
        };
        match splice_first(&retry, &mut f) {
            Some(out) => self.with_children(out),
            None => self.with_children(retry),
        }
    }

    /// [`MdElem::flat_map_first_in`], for transforms that produce a single node.
    pub fn map_first_in<F>(&self, if_not_found: Option<MdElem>, replace: bool, mut f: F) -> MdElem
    where
        F: FnMut(&MdElem) -> Option<MdElem>,
    {
        self.flat_map_first_in(if_not_found.map(|node| vec![node]), replace, |child| {
            f(child).map(|node| vec![node])
        })
    }

    /// Pre-order search: tests `self`, then each child's subtree in order. Returns the first
    /// `Some` that `f` produces.
    pub fn collect_first_recursive<T, F>(&self, f: F) -> Option<T>
    where
        F: Fn(&MdElem) -> Option<T>,
    {
        collect_first(self, &f)
    }

    /// Top-down rewrite: wherever `f` matches a child, the child is substituted and the rewrite
    /// stops there; otherwise the rewrite descends into that child.
    ///
    /// Table rows are reachable through their table (they're its children), but cells are plain
    /// strings and are never descended into.
    pub fn replace_recursively<F>(&self, f: F) -> MdElem
    where
        F: Fn(&MdElem) -> Option<MdElem>,
    {
        replace_walk(self, &f)
    }
}

fn splice_first<F>(children: &[MdElem], f: &mut F) -> Option<Vec<MdElem>>
where
    F: FnMut(&MdElem) -> Option<Vec<MdElem>>,
{
    for (i, child) in children.iter().enumerate() {
        if let Some(replacement) = f(child) {
            let mut out = children[..i].to_vec();
            out.extend(replacement);
            out.extend_from_slice(&children[i + 1..]);
            return Some(out);
        }
    }
    None
}

fn collect_first<T, F>(node: &MdElem, f: &F) -> Option<T>
where
    F: Fn(&MdElem) -> Option<T>,
{
    if let Some(found) = f(node) {
        return Some(found);
    }
    for child in node.children().unwrap_or_default().iter() {
        if let Some(found) = collect_first(child, f) {
            return Some(found);
        }
    }
    None
}

fn replace_walk<F>(node: &MdElem, f: &F) -> MdElem
where
    F: Fn(&MdElem) -> Option<MdElem>,
{
    let Some(children) = node.children() else {
        return node.clone();
    };
    let rewritten = children
        .iter()
        .map(|child| match f(child) {
            Some(replacement) => replacement,
            None => replace_walk(child, f),
        })
        .collect();
    node.with_children(rewritten)
}
