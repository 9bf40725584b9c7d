pub mod a001_car;
pub mod a002_review;
pub mod common;
