mod control_block;
mod object_table;

pub use control_block::ImageBuffer;
pub use object_table::{DATA_CAPACITY, ObjectTable, TABLE_HEADER_SIZE};
