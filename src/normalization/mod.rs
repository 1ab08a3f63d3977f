pub mod products;

pub use products::normalize;
