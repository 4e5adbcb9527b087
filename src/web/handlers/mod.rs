pub mod predict;
pub mod system;
