pub mod client;
pub mod config;
pub mod display;
pub mod error;

pub use client::{AdvisorApi, AdvisorClient, FarmDataApi};
pub use error::{Error, Result};
