//! Route markers derived from resolved anchors.
//!
//! Markers appear as anchors resolve. Once a batch settles, every marker
//! is turned to face the next resolved marker in route order; failed
//! anchors leave a gap that the chain skips over.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::anchors::{BatchHandle, NavigationBatch};
use crate::models::{Orientation, WorldPose};
use crate::rules::NavigationRules;
use crate::spatial::look_at_yaw_deg;

/// A marker as handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMarker {
    pub order_index: usize,
    pub waypoint_id: i64,
    pub pose: WorldPose,
    pub orientation: Orientation,
    pub is_destination: bool,
}

/// One link of the orientation chain, between consecutive resolved anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationEdge {
    pub from: usize,
    pub to: usize,
    pub yaw_deg: f64,
}

pub struct RouteRenderState {
    yaw_offset_deg: f64,
    markers: BTreeMap<usize, RouteMarker>,
    edges: Vec<OrientationEdge>,
    computed_for: Option<BatchHandle>,
    visible: bool,
}

impl RouteRenderState {
    pub fn new(rules: &NavigationRules) -> Self {
        Self {
            yaw_offset_deg: rules.marker_yaw_offset_deg,
            markers: BTreeMap::new(),
            edges: Vec::new(),
            computed_for: None,
            visible: true,
        }
    }

    /// Add the marker of a freshly resolved anchor, unrotated.
    pub fn place_marker(
        &mut self,
        order_index: usize,
        waypoint_id: i64,
        pose: WorldPose,
        is_destination: bool,
    ) {
        self.markers.insert(
            order_index,
            RouteMarker {
                order_index,
                waypoint_id,
                pose,
                orientation: Orientation::IDENTITY,
                is_destination,
            },
        );
    }

    /// Compute the orientation chain for a settled batch.
    ///
    /// Runs at most once per batch handle; returns false when the batch
    /// was already handled or is not settled.
    pub fn on_batch_settled(&mut self, batch: &NavigationBatch) -> bool {
        let handle = batch.handle();
        if self.computed_for == Some(handle) || !batch.is_settled() {
            return false;
        }

        let last_index = handle.len.checked_sub(1);
        for record in batch.records() {
            if let Some(pose) = record.world_pose() {
                self.markers
                    .entry(record.order_index)
                    .or_insert_with(|| RouteMarker {
                        order_index: record.order_index,
                        waypoint_id: record.waypoint_id,
                        pose: *pose,
                        orientation: Orientation::IDENTITY,
                        is_destination: Some(record.order_index) == last_index,
                    });
            }
        }

        let resolved: Vec<(usize, WorldPose)> = batch
            .records()
            .iter()
            .filter_map(|record| record.world_pose().map(|pose| (record.order_index, *pose)))
            .collect();

        self.edges = resolved
            .windows(2)
            .map(|pair| {
                let (from, from_pose) = pair[0];
                let (to, to_pose) = pair[1];
                OrientationEdge {
                    from,
                    to,
                    yaw_deg: look_at_yaw_deg(&from_pose, &to_pose),
                }
            })
            .collect();

        for edge in &self.edges {
            if let Some(marker) = self.markers.get_mut(&edge.from) {
                marker.orientation = Orientation::from_yaw(edge.yaw_deg + self.yaw_offset_deg);
            }
        }

        self.computed_for = Some(handle);
        tracing::info!(
            "Oriented {} markers of batch {} ({} of {} anchors resolved)",
            self.edges.len(),
            handle.generation,
            resolved.len(),
            handle.len
        );
        true
    }

    pub fn computed_for(&self) -> Option<BatchHandle> {
        self.computed_for
    }

    pub fn orientation_edges(&self) -> &[OrientationEdge] {
        &self.edges
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            tracing::debug!("Markers {}", if visible { "shown" } else { "hidden" });
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// All placed markers in order, regardless of visibility.
    pub fn markers(&self) -> impl Iterator<Item = &RouteMarker> {
        self.markers.values()
    }

    /// Markers to draw, in order. Empty while hidden.
    pub fn visible_anchors(&self) -> Vec<RouteMarker> {
        if !self.visible {
            return Vec::new();
        }
        self.markers.values().copied().collect()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.edges.clear();
        self.computed_for = None;
    }
}
