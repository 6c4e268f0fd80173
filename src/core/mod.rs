pub mod error;
pub mod model;
pub mod schemas;
pub mod store;
pub mod time;
