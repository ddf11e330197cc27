pub mod accounts;
pub mod clients;
pub mod clock;
pub mod config;
pub mod controller;
pub mod duration;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;

pub use error::{Error, ErrorKind, Result};
