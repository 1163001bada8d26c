pub mod fixtures;
pub mod helpers;
pub mod mock_gateway;

pub use helpers::*;
pub use mock_gateway::{MockGateway, Reply};
