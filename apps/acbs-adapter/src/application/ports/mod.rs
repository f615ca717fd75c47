//! Ports (driven interfaces) consumed by the adapter facade.

mod token_provider_port;

pub use token_provider_port::TokenProvider;
