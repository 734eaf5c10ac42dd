pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod layout;
pub mod reorder;

pub use catalog::{Capability, WidgetCatalog, WidgetDefinition, WidgetId};
pub use config::{EnablementMap, GridSlot, LayoutEntry, LayoutList, OrderList, GRID_COLUMNS};
pub use dashboard::{Dashboard, DashboardEvent, EventCallback, VisibleWidget};
pub use layout::{merge_layout, LayoutEngine};
pub use reorder::{move_before, DragReorderController, DragSession};
