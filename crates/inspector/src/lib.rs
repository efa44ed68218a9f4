//! Styles pane engine: the matched-rule sections of a selected element,
//! their editable property rows, and the swatch popovers on row values.
//!
//! Everything talks to the style backend through [`CascadeModel`];
//! [`MemoryCascade`] is a self-contained implementation over parsed
//! style sheets. The host drives a [`PaneController`] with user input and
//! draws what it exposes.

#![forbid(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod icon_resolver;
pub mod idle;
pub mod memory;
pub mod metadata;
pub mod model;
pub mod pane;
pub mod popover;
pub mod prompt;
pub mod property;
pub mod renderer;
pub mod section;

pub use config::InspectorConfig;
pub use error::InspectorError;
pub use icon_resolver::{IconInfo, find_icon};
pub use memory::MemoryCascade;
pub use model::CascadeModel;
pub use pane::editing::{ApplyOutcome, KeyOutcome};
pub use pane::navigation::SectionKey;
pub use pane::{PaneController, PaneEvent, RuleLocation};
pub use popover::{AnyPopover, PopoverEditorController, PopoverHelper, PopoverKind};
pub use property::{PropertyNode, PropertyPath};
pub use section::{SectionId, SectionModel};
