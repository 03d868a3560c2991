//! Navigation keys, keyboard and pointer input.

use serde_json::{json, Value};

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_point, CoordinateKind};
use super::DeviceActions;
use crate::correlator::ActionHandle;

/// Absolute coordinates go on the wire as integers, ratios as floats.
fn coordinate(kind: CoordinateKind, value: f64) -> Value {
    match kind {
        CoordinateKind::Ratio => json!(value),
        CoordinateKind::Coordinate => json!(value.round() as i64),
    }
}

impl DeviceActions {
    // ── Navigation keys ─────────────────────────────────────────────────────

    pub fn back(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::BACK)
    }

    pub fn home(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::HOME)
    }

    pub fn recent(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::RECENT)
    }

    pub fn power(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::POWER)
    }

    pub fn lockscreen(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::LOCKSCREEN)
    }

    /// Pull down the notification shade.
    pub fn notification(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::NOTIFICATION)
    }

    // ── Keyboard ────────────────────────────────────────────────────────────

    /// Replace the focused field's text with `content`.
    pub fn keyboard_input_text(&self, content: &str) -> Result<ActionHandle> {
        self.send(catalog::KEYBOARD_INPUT_TEXT, json!({ "content": content }))
    }

    /// Append `content` to the focused field.
    pub fn keyboard_append_text(&self, content: &str) -> Result<ActionHandle> {
        self.send(catalog::KEYBOARD_APPEND_TEXT, json!({ "content": content }))
    }

    pub fn keyboard_get_text(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::KEYBOARD_GET_TEXT)
    }

    pub fn keyboard_get_selection_text(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::KEYBOARD_GET_SELECTION_TEXT)
    }

    pub fn keyboard_get_selection(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::KEYBOARD_GET_SELECTION)
    }

    /// Select the character range `start..end` in the focused field.
    pub fn keyboard_set_selection(&self, start: u32, end: u32) -> Result<ActionHandle> {
        let spec = catalog::KEYBOARD_SET_SELECTION;
        if start > end {
            return Err(Error::invalid_argument(
                spec.id,
                format!("selection start {} is after end {}", start, end),
            ));
        }
        self.send(spec, json!({ "start": start, "end": end }))
    }

    pub fn keyboard_clear_text(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::KEYBOARD_CLEAR_TEXT)
    }

    pub fn keyboard_is_shown(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::KEYBOARD_IS_SHOWN)
    }

    // ── Pointer ─────────────────────────────────────────────────────────────

    /// Tap at `(x, y)`.
    pub fn mouse_click(&self, kind: CoordinateKind, x: f64, y: f64) -> Result<ActionHandle> {
        let spec = catalog::MOUSE_CLICK;
        require_point(spec.id, kind, x, y)?;
        self.send(
            spec,
            json!({
                "type": kind,
                "x": coordinate(kind, x),
                "y": coordinate(kind, y),
            }),
        )
    }

    /// Swipe from `from` to `to`.
    pub fn mouse_swipe(
        &self,
        kind: CoordinateKind,
        from: (f64, f64),
        to: (f64, f64),
    ) -> Result<ActionHandle> {
        let spec = catalog::MOUSE_SWIPE;
        require_point(spec.id, kind, from.0, from.1)?;
        require_point(spec.id, kind, to.0, to.1)?;
        self.send(
            spec,
            json!({
                "type": kind,
                "x1": coordinate(kind, from.0),
                "y1": coordinate(kind, from.1),
                "x2": coordinate(kind, to.0),
                "y2": coordinate(kind, to.1),
            }),
        )
    }

    pub fn scroll_forward(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::SCROLL_FORWARD)
    }

    pub fn scroll_backward(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::SCROLL_BACKWARD)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_mouse_click_coordinates() {
        let (actions, mut outbound) = subscribed_actions();

        actions
            .mouse_click(CoordinateKind::Coordinate, 150.0, 150.0)
            .unwrap();
        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"type": "COORDINATE", "x": 150, "y": 150})
        );

        actions.mouse_click(CoordinateKind::Ratio, 0.5, 0.25).unwrap();
        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"type": "RATIO", "x": 0.5, "y": 0.25})
        );
    }

    #[tokio::test]
    async fn test_mouse_click_out_of_range_ratio() {
        let (actions, mut outbound) = subscribed_actions();
        let err = actions
            .mouse_click(CoordinateKind::Ratio, 2.0, 0.5)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mouse_swipe_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions
            .mouse_swipe(CoordinateKind::Ratio, (0.5, 0.8), (0.5, 0.2))
            .unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "mouse_swipe");
        assert_eq!(
            payload["args"],
            json!({"type": "RATIO", "x1": 0.5, "y1": 0.8, "x2": 0.5, "y2": 0.2})
        );
    }

    #[tokio::test]
    async fn test_keyboard_set_selection_order() {
        let (actions, mut outbound) = subscribed_actions();
        assert!(actions.keyboard_set_selection(5, 2).is_err());

        actions.keyboard_set_selection(2, 5).unwrap();
        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({"start": 2, "end": 5})
        );
    }

    #[tokio::test]
    async fn test_keyboard_text_payload() {
        let (actions, mut outbound) = subscribed_actions();
        actions.keyboard_input_text("hello").unwrap();

        let payload = next_payload(&mut outbound);
        assert_eq!(payload["action_id"], "keyboard_input_text");
        assert_eq!(payload["args"], json!({"content": "hello"}));
    }
}
