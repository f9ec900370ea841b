//! Map surface cleanup after a tracking session ends.
//!
//! The SDK's own removal is not reliable: some plugin builds lack `remove()`,
//! some leave the route layer behind, and a session abandoned without a
//! graceful stop leaves everything. After every teardown the map is scanned
//! and anything that looks like a tracking artifact is removed.
//!
//! What counts as a tracking artifact is decided by
//! [`is_tracking_artifact`] alone.

use std::fmt;

use crate::sdk::{MapSurface, SdkError};

/// Fixed layer id of the tracked route line.
pub const TRACKING_ROUTE_LAYER: &str = "tracking-route-layer";

/// Fixed source id of the tracked route geometry.
pub const TRACKING_ROUTE_SOURCE: &str = "tracking-route-source";

/// Token identifying tracking layers and sources.
pub const TRACKING_ID_TOKEN: &str = "tracking";

/// Whether a layer or source id belongs to a tracking visualization.
pub fn is_tracking_artifact(id: &str) -> bool {
    id == TRACKING_ROUTE_LAYER || id == TRACKING_ROUTE_SOURCE || id.contains(TRACKING_ID_TOKEN)
}

/// A non-fatal problem met during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    /// Layer or source id involved (empty for map-wide problems).
    pub target: String,
    pub reason: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.target.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.target, self.reason)
        }
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub layers_removed: Vec<String>,
    pub sources_removed: Vec<String>,
    pub warnings: Vec<CleanupWarning>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, target: &str, reason: impl Into<String>) {
        self.warnings.push(CleanupWarning {
            target: target.to_string(),
            reason: reason.into(),
        });
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} layers, {} sources ({} warnings)",
            self.layers_removed.len(),
            self.sources_removed.len(),
            self.warnings.len()
        )
    }
}

/// Remove every tracking layer and source from `map`.
///
/// Never fails: a missing map or style, or an id that is already gone, is
/// not an error, and any other removal failure becomes a warning in the
/// report. Layers go first so that their sources are no longer in use.
pub fn clean_map_surface(map: Option<&dyn MapSurface>) -> CleanupReport {
    let mut report = CleanupReport::default();
    let Some(map) = map else {
        tracing::debug!("No map attached, nothing to clean");
        return report;
    };

    if map.has_layer(TRACKING_ROUTE_LAYER) {
        remove_layer(map, TRACKING_ROUTE_LAYER, &mut report);
    }

    match map.style() {
        Some(style) => {
            for layer in style.layers.iter().filter(|l| is_tracking_artifact(&l.id)) {
                if layer.id != TRACKING_ROUTE_LAYER && map.has_layer(&layer.id) {
                    remove_layer(map, &layer.id, &mut report);
                }
            }

            if map.has_source(TRACKING_ROUTE_SOURCE) {
                remove_source(map, TRACKING_ROUTE_SOURCE, &mut report);
            }
            for source in style.sources.iter().filter(|s| is_tracking_artifact(s)) {
                if source != TRACKING_ROUTE_SOURCE && map.has_source(source) {
                    remove_source(map, source, &mut report);
                }
            }
        }
        None => {
            if map.has_source(TRACKING_ROUTE_SOURCE) {
                remove_source(map, TRACKING_ROUTE_SOURCE, &mut report);
            }
            report.warn("", "map style unavailable, skipped layer scan");
        }
    }

    for warning in &report.warnings {
        tracing::warn!(warning = %warning, "Map cleanup warning");
    }
    tracing::debug!(report = %report, "Cleaned tracking layers from map");
    report
}

fn remove_layer(map: &dyn MapSurface, id: &str, report: &mut CleanupReport) {
    match map.remove_layer(id) {
        Ok(()) => report.layers_removed.push(id.to_string()),
        Err(SdkError::Missing(_)) => {}
        Err(e) => report.warn(id, e.to_string()),
    }
}

fn remove_source(map: &dyn MapSurface, id: &str, report: &mut CleanupReport) {
    match map.remove_source(id) {
        Ok(()) => report.sources_removed.push(id.to_string()),
        Err(SdkError::Missing(_)) => {}
        Err(e) => report.warn(id, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::memory::InMemoryMap;
    use crate::sdk::LayerDescriptor;

    fn map_with_tracking() -> InMemoryMap {
        let map = InMemoryMap::new();
        map.add_source("basemap").unwrap();
        map.add_source(TRACKING_ROUTE_SOURCE).unwrap();
        map.add_layer(LayerDescriptor::new("roads").with_source("basemap"))
            .unwrap();
        map.add_layer(LayerDescriptor::new(TRACKING_ROUTE_LAYER).with_source(TRACKING_ROUTE_SOURCE))
            .unwrap();
        map.add_layer(LayerDescriptor::new("tracking-marker-0")).unwrap();
        map.add_layer(LayerDescriptor::new("live-tracking-connector"))
            .unwrap();
        map
    }

    #[test]
    fn test_predicate() {
        assert!(is_tracking_artifact(TRACKING_ROUTE_LAYER));
        assert!(is_tracking_artifact(TRACKING_ROUTE_SOURCE));
        assert!(is_tracking_artifact("tracking-marker-3"));
        assert!(is_tracking_artifact("live-tracking-connector"));
        assert!(!is_tracking_artifact("roads"));
        assert!(!is_tracking_artifact("Tracking"));
    }

    #[test]
    fn test_removes_all_tracking_artifacts() {
        let map = map_with_tracking();
        let report = clean_map_surface(Some(&map));

        assert!(report.is_clean());
        assert_eq!(report.layers_removed.len(), 3);
        assert_eq!(report.sources_removed, vec![TRACKING_ROUTE_SOURCE.to_string()]);
        assert_eq!(map.layer_ids(), vec!["roads".to_string()]);
        assert_eq!(map.source_ids(), vec!["basemap".to_string()]);
    }

    #[test]
    fn test_missing_map_is_noop() {
        let report = clean_map_surface(None);
        assert_eq!(report, CleanupReport::default());
    }

    #[test]
    fn test_clean_map_is_noop() {
        let map = InMemoryMap::new();
        map.add_layer(LayerDescriptor::new("roads")).unwrap();

        let report = clean_map_surface(Some(&map));
        assert_eq!(report, CleanupReport::default());
        assert_eq!(map.layer_ids().len(), 1);
    }

    #[test]
    fn test_failed_removal_becomes_warning() {
        let map = map_with_tracking();
        map.fail_removal_of("tracking-marker-0");

        let report = clean_map_surface(Some(&map));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].target, "tracking-marker-0");
        // Everything else still went
        assert!(!map.has_layer(TRACKING_ROUTE_LAYER));
        assert!(!map.has_source(TRACKING_ROUTE_SOURCE));
    }

    #[test]
    fn test_missing_style_still_removes_fixed_ids() {
        let map = InMemoryMap::new();
        map.add_source(TRACKING_ROUTE_SOURCE).unwrap();
        map.add_layer(LayerDescriptor::new(TRACKING_ROUTE_LAYER).with_source(TRACKING_ROUTE_SOURCE))
            .unwrap();
        map.set_style_loaded(false);

        let report = clean_map_surface(Some(&map));
        assert_eq!(report.layers_removed, vec![TRACKING_ROUTE_LAYER.to_string()]);
        assert_eq!(report.sources_removed, vec![TRACKING_ROUTE_SOURCE.to_string()]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_is_idempotent() {
        let map = map_with_tracking();
        clean_map_surface(Some(&map));
        let second = clean_map_surface(Some(&map));

        assert_eq!(second, CleanupReport::default());
    }
}
