mod notation;
mod row;

pub use notation::convert_notation;
pub use row::{bell_index, lead_count, Row, BELLS};
