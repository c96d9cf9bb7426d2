//! Nearest-neighbour index port.

pub mod box_index;
pub mod index;
