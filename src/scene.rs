use crate::anchor::Anchor;
use crate::pose::Pose;
use crate::raycast::{ColliderSource, GeometricHit, Ray};
use crate::visual::{PlaneVisual, PointCloudVisual};
use std::fmt;

/// Generational handle to a node. Stale handles never resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}v{}", self.index, self.generation)
    }
}

pub enum NodeKind {
    Plane(PlaneVisual),
    Anchor(Anchor),
    PointCloud(PointCloudVisual),
}

pub struct SceneNode {
    pub name: String,
    pub transform: Pose,
    pub layer: u8,
    pub tag: String,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Pose::IDENTITY,
            layer: 0,
            tag: String::new(),
            kind,
        }
    }

    pub fn plane(&self) -> Option<&PlaneVisual> {
        match &self.kind {
            NodeKind::Plane(visual) => Some(visual),
            _ => None,
        }
    }

    pub fn plane_mut(&mut self) -> Option<&mut PlaneVisual> {
        match &mut self.kind {
            NodeKind::Plane(visual) => Some(visual),
            _ => None,
        }
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        match &self.kind {
            NodeKind::Anchor(anchor) => Some(anchor),
            _ => None,
        }
    }

    pub fn point_cloud(&self) -> Option<&PointCloudVisual> {
        match &self.kind {
            NodeKind::PointCloud(cloud) => Some(cloud),
            _ => None,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// The nodes this crate creates on behalf of the host: plane visuals, anchors
/// and the point cloud.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, node: SceneNode) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    /// Removes the node, returning it. `None` if the handle is stale.
    pub fn despawn(&mut self, id: NodeId) -> Option<SceneNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (NodeId::new(index as u32, slot.generation), node))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut SceneNode)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.node
                .as_mut()
                .map(|node| (NodeId::new(index as u32, generation), node))
        })
    }

    pub fn plane_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.plane().is_some())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn planes(&self) -> impl Iterator<Item = (NodeId, &PlaneVisual)> {
        self.iter()
            .filter_map(|(id, node)| node.plane().map(|visual| (id, visual)))
    }

    /// Collidable geometry on `layer`, for simulated raycasts.
    pub fn colliders_on(&self, layer: u8) -> LayerColliders<'_> {
        LayerColliders { scene: self, layer }
    }
}

pub struct LayerColliders<'a> {
    scene: &'a Scene,
    layer: u8,
}

impl ColliderSource for LayerColliders<'_> {
    fn raycast_colliders(&self, ray: &Ray) -> Option<GeometricHit> {
        let mut closest: Option<GeometricHit> = None;

        for (id, node) in self.scene.iter() {
            if node.layer != self.layer {
                continue;
            }
            let Some(visual) = node.plane() else {
                continue;
            };
            if !visual.collider_enabled() {
                continue;
            }

            for triangle in visual.mesh().triangles() {
                let world = triangle.map(|corner| node.transform.transform_point(corner));
                let Some(distance) = ray.intersect_triangle(world) else {
                    continue;
                };
                if closest.is_some_and(|hit| hit.distance <= distance) {
                    continue;
                }
                let mut normal = (world[1] - world[0])
                    .cross(world[2] - world[0])
                    .normalize_or_zero();
                if normal.dot(ray.direction) > 0.0 {
                    normal = -normal;
                }
                closest = Some(GeometricHit {
                    point: ray.at(distance),
                    normal,
                    distance,
                    node: id,
                    node_rotation: node.transform.rotation,
                    plane: visual.plane_id(),
                });
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorId;

    fn anchor_node(id: u64) -> SceneNode {
        let anchor = Anchor::placeholder(AnchorId(id), Pose::IDENTITY);
        SceneNode::new("Anchor", NodeKind::Anchor(anchor))
    }

    #[test]
    fn spawn_and_lookup() {
        let mut scene = Scene::new();
        let id = scene.spawn(anchor_node(1));
        assert!(scene.contains(id));
        assert_eq!(scene.get(id).and_then(|n| n.anchor()).map(|a| a.id()), Some(AnchorId(1)));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn stale_handles_do_not_resolve_after_reuse() {
        let mut scene = Scene::new();
        let first = scene.spawn(anchor_node(1));
        assert!(scene.despawn(first).is_some());

        let second = scene.spawn(anchor_node(2));
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(scene.get(first).is_none());
        assert!(scene.despawn(first).is_none());
        assert_eq!(scene.len(), 1);
    }
}
