mod position;

pub use position::{Position, PositionGroup, Segment};
