//! Configuration settings for the styles inspector.
//!
//! This module defines the section display cap, the loading affordance delay,
//! copy/grid indentation, rebuild batching and completion filtering.
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use core::time::Duration;
use std::env;

/// Default number of top-level properties shown before "show all".
pub const DEFAULT_MAX_PROPERTIES: usize = 50;

/// Runtime configuration for the styles inspector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectorConfig {
    /// Top-level properties rendered per section before the "show N more" affordance
    pub max_properties: usize,
    /// Milliseconds before a pending rebuild shows the loading affordance
    pub loading_indicator_delay_ms: u64,
    /// Indentation unit used for copied text and grid rows
    pub indent: String,
    /// Sections built between cooperative yields during a rebuild
    pub idle_batch: usize,
    /// Whether SVG-only property names are offered for non-SVG elements
    pub svg_properties_for_html: bool,
}

impl InspectorConfig {
    /// Construct a new `InspectorConfig` with explicit values.
    ///
    /// # Arguments
    ///
    /// * `max_properties` - Section display cap (minimum 1)
    /// * `loading_indicator_delay_ms` - Loading affordance delay in milliseconds
    /// * `indent` - Indentation unit
    /// * `idle_batch` - Sections per cooperative batch (minimum 1)
    ///
    /// # Returns
    ///
    /// A new `InspectorConfig` instance with the specified settings
    #[inline]
    #[must_use]
    pub fn new(
        max_properties: usize,
        loading_indicator_delay_ms: u64,
        indent: String,
        idle_batch: usize,
    ) -> Self {
        Self {
            max_properties: max_properties.max(1),
            loading_indicator_delay_ms,
            indent,
            idle_batch: idle_batch.max(1),
            svg_properties_for_html: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CSS_INSPECTOR_MAX_PROPERTIES`: Section display cap (default: 50)
    /// - `CSS_INSPECTOR_LOADING_DELAY_MS`: Loading affordance delay (default: 200)
    /// - `CSS_INSPECTOR_INDENT`: Indentation unit (default: two spaces)
    /// - `CSS_INSPECTOR_IDLE_BATCH`: Sections per cooperative batch (default: 1)
    /// - `CSS_INSPECTOR_SVG_COMPLETIONS`: Set to "1" to offer SVG-only names everywhere
    ///
    /// # Returns
    ///
    /// A new `InspectorConfig` instance populated from environment variables
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let max_properties = env::var("CSS_INSPECTOR_MAX_PROPERTIES")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_PROPERTIES)
            .max(1);
        let loading_indicator_delay_ms = env::var("CSS_INSPECTOR_LOADING_DELAY_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(200);
        let indent = env::var("CSS_INSPECTOR_INDENT").unwrap_or_else(|_| "  ".to_owned());
        let idle_batch = env::var("CSS_INSPECTOR_IDLE_BATCH")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let svg_properties_for_html =
            env::var("CSS_INSPECTOR_SVG_COMPLETIONS").ok().as_deref() == Some("1");
        Self {
            max_properties,
            loading_indicator_delay_ms,
            indent,
            idle_batch,
            svg_properties_for_html,
        }
    }

    /// Get the loading affordance delay as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn loading_indicator_delay(&self) -> Duration {
        Duration::from_millis(self.loading_indicator_delay_ms)
    }
}

impl Default for InspectorConfig {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROPERTIES, 200, "  ".to_owned(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_minimums() {
        let config = InspectorConfig::new(0, 5, String::new(), 0);
        assert_eq!(config.max_properties, 1);
        assert_eq!(config.idle_batch, 1);
        assert_eq!(config.loading_indicator_delay(), Duration::from_millis(5));
        assert_eq!(InspectorConfig::default().max_properties, 50);
    }
}
