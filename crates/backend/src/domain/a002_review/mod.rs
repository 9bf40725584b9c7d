pub mod rating;
pub mod repository;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod fakes;
