//! The physical resource tree, as published through `/proc/iomem` and
//! `/proc/ioports`.

use core::fmt;

bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ResourceFlags: u32 {
        const IO = 0x0000_0100;
        const MEM = 0x0000_0200;
        const BUSY = 0x8000_0000;
    }
}

/// A named physical range `[start, end]` (inclusive end).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: &'static str,
    pub start: u64,
    pub end: u64,
    pub flags: ResourceFlags,
}

impl Resource {
    #[must_use]
    pub const fn new(name: &'static str, start: u64, end: u64, flags: ResourceFlags) -> Self {
        Self {
            name,
            start,
            end,
            flags,
        }
    }

    /// Busy memory `[start, start + size)`; `size` must be nonzero.
    #[must_use]
    pub const fn busy_mem(name: &'static str, start: u64, size: u64) -> Self {
        Self::new(
            name,
            start,
            start + size - 1,
            ResourceFlags::MEM.union(ResourceFlags::BUSY),
        )
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    const fn same_range(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("resource conflicts with {with}")]
    Conflict { with: &'static str },
    #[error("resource lies outside its parent")]
    OutsideParent,
    #[error("resource table full")]
    TableFull,
}

/// Handle to a node of a [`ResourceTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

#[derive(Debug, Copy, Clone)]
struct Node {
    res: Resource,
    parent: Option<ResourceId>,
}

/// Arena of up to `N` resources under two roots: the full physical
/// address space and the 16-bit I/O port space.
#[derive(Debug, Clone)]
pub struct ResourceTree<const N: usize> {
    nodes: [Option<Node>; N],
    len: usize,
}

const IOMEM: ResourceId = ResourceId(0);
const IOPORT: ResourceId = ResourceId(1);

impl<const N: usize> Default for ResourceTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ResourceTree<N> {
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N >= 2, "room for both roots") };
        let mut nodes = [None; N];
        nodes[0] = Some(Node {
            res: Resource::new("PCI mem", 0, u64::MAX, ResourceFlags::MEM),
            parent: None,
        });
        nodes[1] = Some(Node {
            res: Resource::new("PCI IO", 0, 0xffff, ResourceFlags::IO),
            parent: None,
        });
        Self { nodes, len: 2 }
    }

    #[must_use]
    pub const fn iomem(&self) -> ResourceId {
        IOMEM
    }

    #[must_use]
    pub const fn ioport(&self) -> ResourceId {
        IOPORT
    }

    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.node(id).map(|n| &n.res)
    }

    #[must_use]
    pub fn parent(&self, id: ResourceId) -> Option<ResourceId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// First resource with the given name, in insertion order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ResourceId> {
        self.nodes[..self.len]
            .iter()
            .position(|n| n.is_some_and(|n| n.res.name == name))
            .map(ResourceId)
    }

    /// Direct children of `parent`, ascending by start address.
    #[must_use]
    pub const fn children(&self, parent: ResourceId) -> Children<'_, N> {
        Children {
            tree: self,
            parent,
            prev: None,
        }
    }

    fn node(&self, id: ResourceId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn push(&mut self, res: Resource, parent: ResourceId) -> Result<ResourceId, ResourceError> {
        let slot = self.nodes.get_mut(self.len).ok_or(ResourceError::TableFull)?;
        *slot = Some(Node {
            res,
            parent: Some(parent),
        });
        let id = ResourceId(self.len);
        self.len += 1;
        Ok(id)
    }

    /// Claims `res` directly under `parent`.
    ///
    /// # Errors
    /// `res` does not fit inside `parent`, overlaps a sibling, or the arena
    /// is full.
    pub fn request(&mut self, parent: ResourceId, res: Resource) -> Result<ResourceId, ResourceError> {
        let outer = self.get(parent).ok_or(ResourceError::OutsideParent)?;
        if !outer.contains(&res) {
            return Err(ResourceError::OutsideParent);
        }
        if let Some(sibling) = self
            .children(parent)
            .filter_map(|c| self.get(c))
            .find(|c| c.overlaps(&res))
        {
            return Err(ResourceError::Conflict { with: sibling.name });
        }
        self.push(res, parent)
    }

    /// Places `res` at the deepest level of `root` that fully contains it,
    /// adopting existing siblings that `res` fully contains.
    ///
    /// # Errors
    /// `res` partially overlaps an existing resource, duplicates one, lies
    /// outside `root`, or the arena is full.
    pub fn insert(&mut self, root: ResourceId, res: Resource) -> Result<ResourceId, ResourceError> {
        let mut parent = root;
        if !self.get(root).is_some_and(|r| r.contains(&res)) {
            return Err(ResourceError::OutsideParent);
        }

        'descend: loop {
            for child in self.children(parent) {
                let Some(existing) = self.get(child) else { continue };
                if !existing.overlaps(&res) || (res.contains(existing) && !res.same_range(existing)) {
                    continue;
                }
                if existing.contains(&res) && !existing.same_range(&res) {
                    parent = child;
                    continue 'descend;
                }
                return Err(ResourceError::Conflict { with: existing.name });
            }
            break;
        }

        let id = self.push(res, parent)?;
        for node in self.nodes[..self.len - 1].iter_mut().flatten() {
            if node.parent == Some(parent) && res.contains(&node.res) {
                node.parent = Some(id);
            }
        }
        Ok(id)
    }

    /// Renders the subtree below `root` one resource per line.
    #[must_use]
    pub const fn display(&self, root: ResourceId) -> ResourceTreeDisplay<'_, N> {
        ResourceTreeDisplay { tree: self, root }
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, parent: ResourceId, depth: usize) -> fmt::Result {
        for child in self.children(parent) {
            if let Some(r) = self.get(child) {
                writeln!(
                    f,
                    "{:indent$}{:08x}-{:08x} : {}",
                    "",
                    r.start,
                    r.end,
                    r.name,
                    indent = depth * 2
                )?;
                self.fmt_level(f, child, depth + 1)?;
            }
        }
        Ok(())
    }
}

/// Iterator over the children of a resource.
pub struct Children<'a, const N: usize> {
    tree: &'a ResourceTree<N>,
    parent: ResourceId,
    prev: Option<(u64, usize)>,
}

impl<const N: usize> Iterator for Children<'_, N> {
    type Item = ResourceId;

    fn next(&mut self) -> Option<ResourceId> {
        let next = self.tree.nodes[..self.tree.len]
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (i, n)))
            .filter(|(_, n)| n.parent == Some(self.parent))
            .map(|(i, n)| (n.res.start, i))
            .filter(|key| self.prev.is_none_or(|prev| *key > prev))
            .min()?;
        self.prev = Some(next);
        Some(ResourceId(next.1))
    }
}

pub struct ResourceTreeDisplay<'a, const N: usize> {
    tree: &'a ResourceTree<N>,
    root: ResourceId,
}

impl<const N: usize> fmt::Display for ResourceTreeDisplay<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_level(f, self.root, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAM: ResourceFlags = ResourceFlags::MEM.union(ResourceFlags::BUSY);

    #[test]
    fn request_rejects_sibling_overlap() {
        let mut t = ResourceTree::<8>::new();
        let root = t.iomem();
        t.request(root, Resource::new("System RAM", 0x4000_0000, 0x7fff_ffff, RAM))
            .unwrap();
        assert_eq!(
            t.request(root, Resource::new("other", 0x7000_0000, 0x8fff_ffff, RAM)),
            Err(ResourceError::Conflict { with: "System RAM" })
        );
    }

    #[test]
    fn request_must_fit_parent() {
        let mut t = ResourceTree::<8>::new();
        let ram = t
            .request(t.iomem(), Resource::new("System RAM", 0x1000, 0x1fff, RAM))
            .unwrap();
        assert_eq!(
            t.request(ram, Resource::new("Kernel code", 0x1800, 0x2fff, RAM)),
            Err(ResourceError::OutsideParent)
        );
        assert_eq!(
            t.request(t.ioport(), Resource::new("port", 0x1_0000, 0x1_0001, ResourceFlags::IO)),
            Err(ResourceError::OutsideParent)
        );
    }

    #[test]
    fn insert_descends_into_containing_resource() {
        let mut t = ResourceTree::<8>::new();
        let ram = t
            .request(t.iomem(), Resource::new("System RAM", 0x4000_0000, 0x7fff_ffff, RAM))
            .unwrap();
        let crash = t
            .insert(t.iomem(), Resource::new("Crash kernel", 0x7000_0000, 0x77ff_ffff, RAM))
            .unwrap();
        assert_eq!(t.parent(crash), Some(ram));
    }

    #[test]
    fn insert_adopts_contained_children() {
        let mut t = ResourceTree::<8>::new();
        let code = t
            .request(t.iomem(), Resource::new("Kernel code", 0x4000_8000, 0x4000_ffff, RAM))
            .unwrap();
        let ram = t
            .insert(t.iomem(), Resource::new("System RAM", 0x4000_0000, 0x4fff_ffff, RAM))
            .unwrap();
        assert_eq!(t.parent(code), Some(ram));
        assert_eq!(t.parent(ram), Some(t.iomem()));
    }

    #[test]
    fn insert_rejects_partial_overlap_and_duplicates() {
        let mut t = ResourceTree::<8>::new();
        let r = Resource::new("System RAM", 0x1000, 0x1fff, RAM);
        t.request(t.iomem(), r).unwrap();
        assert_eq!(
            t.insert(t.iomem(), Resource::new("x", 0x1800, 0x27ff, RAM)),
            Err(ResourceError::Conflict { with: "System RAM" })
        );
        assert_eq!(
            t.insert(t.iomem(), r),
            Err(ResourceError::Conflict { with: "System RAM" })
        );
    }

    #[test]
    fn table_full() {
        let mut t = ResourceTree::<3>::new();
        t.request(t.iomem(), Resource::new("a", 0, 0xfff, RAM)).unwrap();
        assert_eq!(
            t.request(t.iomem(), Resource::new("b", 0x1000, 0x1fff, RAM)),
            Err(ResourceError::TableFull)
        );
    }

    #[test]
    fn display_is_sorted_and_nested() {
        let mut t = ResourceTree::<8>::new();
        let hi = t
            .request(t.iomem(), Resource::new("System RAM", 0x8000_0000, 0x8fff_ffff, RAM))
            .unwrap();
        t.request(t.iomem(), Resource::new("System RAM", 0x4000_0000, 0x4fff_ffff, RAM))
            .unwrap();
        t.request(hi, Resource::new("Kernel code", 0x8000_8000, 0x8000_ffff, RAM))
            .unwrap();

        let text = t.display(t.iomem()).to_string();
        assert_eq!(
            text,
            "40000000-4fffffff : System RAM\n\
             80000000-8fffffff : System RAM\n  \
             80008000-8000ffff : Kernel code\n"
        );
    }
}
