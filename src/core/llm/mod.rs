mod gateway;
mod providers;

pub use gateway::{create_gateway, AiGateway};
