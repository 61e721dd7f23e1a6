mod adapter;
mod error;
pub mod models;
pub mod pages;
mod request;
mod resolver;
mod server;
pub(crate) mod utils;

pub use adapter::{DispatchOptions, HandlerAdapter};
pub use error::BadRequest;
pub use request::{IncomingRequest, read_body};
pub use resolver::ArgumentResolver;
pub use server::{App, AxumRoutes, build_app, run};
