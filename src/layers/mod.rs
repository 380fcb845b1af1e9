pub mod base;
pub mod image;
pub mod marker;
