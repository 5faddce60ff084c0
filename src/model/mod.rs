pub mod axis;
pub mod bar;
pub mod calendar;
pub mod column;
pub mod gesture;
pub mod scrollbar;
pub mod sight;
pub mod task;
pub mod timeline;
pub mod tree;
pub mod viewport;
pub mod window;

pub use axis::AxisBucket;
pub use bar::{Bar, Geometry, GestureState};
pub use calendar::Calendar;
pub use column::Column;
pub use gesture::{DragSession, MoveType};
pub use scrollbar::{Thumb, ThumbDrag};
pub use sight::{Sight, Unit};
pub use task::{DateKeys, NodeId, Record, TaskNode};
pub use timeline::{BarSide, Timeline};
pub use tree::TaskTree;
pub use viewport::Viewport;
pub use window::RowWindow;
