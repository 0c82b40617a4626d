#[macro_use]
extern crate lazy_static;

pub mod api;
pub mod client;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod sensor;

pub use api::{Error, FetchResult, LoginResult};
pub use client::Eg4Client;
