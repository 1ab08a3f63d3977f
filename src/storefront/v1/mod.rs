pub mod provider;

pub use provider::StoreFetcherV1;
