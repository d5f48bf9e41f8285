pub mod catalog;
pub mod rental;
