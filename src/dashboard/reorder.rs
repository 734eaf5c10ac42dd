use crate::dashboard::catalog::WidgetId;
use crate::dashboard::config::OrderList;
use crate::preferences::{PersistHandle, PreferenceStore};

/// Transient pointer-drag state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    pub dragged_id: Option<WidgetId>,
    pub drag_over_id: Option<WidgetId>,
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        self.dragged_id.is_some()
    }

    fn clear(&mut self) {
        self.dragged_id = None;
        self.drag_over_id = None;
    }
}

/// Move `dragged` to the index `target` occupied before the move.
///
/// Returns `false` and leaves `order` untouched when the ids are equal or
/// either one is missing.
pub fn move_before(order: &mut OrderList, dragged: &str, target: &str) -> bool {
    if dragged == target {
        return false;
    }
    let (Some(from), Some(to)) = (
        order.iter().position(|id| id == dragged),
        order.iter().position(|id| id == target),
    ) else {
        return false;
    };
    let item = order.remove(from);
    order.insert(to, item);
    true
}

/// Linear widget ordering driven by drag-start / drag-enter / drop / drag-end.
pub struct DragReorderController {
    order: OrderList,
    session: DragSession,
    store: PreferenceStore,
}

impl DragReorderController {
    pub fn new(order: OrderList, store: PreferenceStore) -> Self {
        Self {
            order,
            session: DragSession::default(),
            store,
        }
    }

    pub fn order(&self) -> &[WidgetId] {
        &self.order
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn drag_start(&mut self, id: &str) {
        self.session.dragged_id = Some(WidgetId::from(id));
        self.session.drag_over_id = None;
    }

    pub fn drag_enter(&mut self, id: &str) {
        if self.session.is_dragging() {
            self.session.drag_over_id = Some(WidgetId::from(id));
        }
    }

    /// Finish a drag over `target`. Returns the handle of the remote write
    /// when the order changed.
    pub fn drop_on(&mut self, target: &str) -> Option<PersistHandle> {
        let dragged = self.session.dragged_id.clone()?;
        if dragged == target {
            // Dropping onto itself leaves the drag active until drag-end.
            return None;
        }
        let moved = move_before(&mut self.order, dragged.as_str(), target);
        self.session.clear();
        if !moved {
            tracing::debug!(dragged = %dragged, drop_target = target, "drop target not in widget order");
            return None;
        }
        Some(self.store.save_order(&self.order))
    }

    /// Cancelled drag: forget the session without touching the order.
    pub fn drag_end(&mut self) {
        self.session.clear();
    }

    /// Replace the order after a membership change or a remote update.
    pub fn replace_order(&mut self, order: OrderList) {
        self.order = order;
    }
}
