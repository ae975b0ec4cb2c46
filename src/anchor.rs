use crate::plane::TrackableId;
use crate::pose::Pose;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

/// A world-fixed point content can be parented to.
///
/// The trackable binding is set at creation and never changes. Live anchors may
/// have their pose refined by the device; simulated anchors are disabled
/// placeholders that only exist to parent content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    id: AnchorId,
    trackable: Option<TrackableId>,
    pub pose: Pose,
    pub enabled: bool,
}

impl Anchor {
    pub fn new(id: AnchorId, trackable: Option<TrackableId>, pose: Pose) -> Self {
        Self {
            id,
            trackable,
            pose,
            enabled: true,
        }
    }

    pub fn placeholder(id: AnchorId, pose: Pose) -> Self {
        Self {
            id,
            trackable: None,
            pose,
            enabled: false,
        }
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn trackable(&self) -> Option<TrackableId> {
        self.trackable
    }
}
