//! Parameter storage and pretrained weight files

pub mod parameter_store;
pub mod weight_loader;

pub use parameter_store::ParameterStore;
pub use weight_loader::{loader, LoadConfig, LoadResult, WeightFormat, WeightLoader};
