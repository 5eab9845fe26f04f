pub mod result;
pub mod review;
pub mod selection;
