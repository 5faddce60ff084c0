use uuid::Uuid;

use super::bar::{Geometry, GestureState};
use super::task::NodeId;

/// What a drag does to its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    Move,
    ResizeLeft,
    ResizeRight,
    /// Drawing a new range on a row that has no dates.
    Create,
}

/// A single pointer drag on a bar.
///
/// `origin` is what the bar looked like before the gesture and is the
/// rollback target; `base` is the geometry pointer deltas apply to. They
/// differ only for `Create`, whose base is the slot under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub id: Uuid,
    pub node: NodeId,
    pub move_type: MoveType,
    pub origin: Geometry,
    pub origin_invalid: bool,
    pub base: Geometry,
    pub origin_pointer: f64,
    pub current: Geometry,
    pub state: GestureState,
    moved: bool,
}

impl DragSession {
    pub fn new(
        node: NodeId,
        move_type: MoveType,
        origin: Geometry,
        origin_invalid: bool,
        base: Geometry,
        pointer_x: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            node,
            move_type,
            origin,
            origin_invalid,
            base,
            origin_pointer: pointer_x,
            current: base,
            state: GestureState::Start,
            moved: false,
        }
    }

    /// Candidate geometry for the pointer at `pointer_x`. Pure arithmetic on
    /// the captured base; nothing else is consulted. A pointer still resting
    /// where it was pressed leaves the session untouched.
    pub fn drag_to(&mut self, pointer_x: f64, min_width: f64) -> Geometry {
        let delta = pointer_x - self.origin_pointer;
        if !self.moved && delta == 0.0 {
            return self.current;
        }
        let base = self.base;
        let min_width = min_width.max(0.0);
        self.current = match self.move_type {
            MoveType::Move => Geometry::new((base.left + delta).max(0.0), base.width),
            MoveType::ResizeLeft => {
                let right = base.right();
                let left = (base.left + delta).min(right - min_width).max(0.0);
                Geometry::new(left, (right - left).max(min_width))
            }
            MoveType::ResizeRight => Geometry::new(base.left, (base.width + delta).max(min_width)),
            MoveType::Create => {
                if delta >= 0.0 {
                    Geometry::new(base.left, (base.width + delta).max(min_width))
                } else {
                    let right = base.right();
                    let left = (base.left + delta).max(0.0);
                    Geometry::new(left, (right - left).max(min_width))
                }
            }
        };
        self.state = GestureState::Moving;
        self.moved = true;
        self.current
    }

    /// Whether the pointer has moved since the session started. Stays true
    /// after `finish`.
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn finish(&mut self) {
        self.state = GestureState::End;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(move_type: MoveType) -> DragSession {
        let g = Geometry::new(100.0, 60.0);
        DragSession::new(NodeId(0), move_type, g, false, g, 500.0)
    }

    #[test]
    fn move_shifts_and_clamps_left() {
        let mut s = session(MoveType::Move);
        assert_eq!(s.state, GestureState::Start);
        assert_eq!(s.drag_to(530.0, 30.0), Geometry::new(130.0, 60.0));
        assert_eq!(s.state, GestureState::Moving);
        assert_eq!(s.drag_to(0.0, 30.0), Geometry::new(0.0, 60.0));
    }

    #[test]
    fn resize_pins_the_other_edge() {
        let mut left = session(MoveType::ResizeLeft);
        let g = left.drag_to(480.0, 30.0);
        assert_eq!(g, Geometry::new(80.0, 80.0));
        let g = left.drag_to(560.0, 30.0);
        assert_eq!(g, Geometry::new(130.0, 30.0));
        assert_eq!(g.right(), 160.0);

        let mut right = session(MoveType::ResizeRight);
        assert_eq!(right.drag_to(540.0, 30.0), Geometry::new(100.0, 100.0));
        assert_eq!(right.drag_to(300.0, 30.0), Geometry::new(100.0, 30.0));
    }

    #[test]
    fn create_grows_from_the_slot() {
        let slot = Geometry::new(100.0, 30.0);
        let mut s = DragSession::new(NodeId(3), MoveType::Create, Geometry::default(), true, slot, 110.0);
        assert_eq!(s.drag_to(170.0, 30.0), Geometry::new(100.0, 90.0));
        assert_eq!(s.drag_to(50.0, 30.0), Geometry::new(40.0, 90.0));
        assert_eq!(s.origin, Geometry::default());
        assert!(s.origin_invalid);
        s.finish();
        assert_eq!(s.state, GestureState::End);
        assert!(s.moved());
    }

    #[test]
    fn resting_pointer_is_not_a_move() {
        let mut s = session(MoveType::Move);
        assert_eq!(s.drag_to(500.0, 30.0), Geometry::new(100.0, 60.0));
        assert_eq!(s.state, GestureState::Start);
        assert!(!s.moved());

        s.drag_to(510.0, 30.0);
        s.drag_to(500.0, 30.0);
        s.finish();
        assert_eq!(s.state, GestureState::End);
        assert!(s.moved());
    }
}
