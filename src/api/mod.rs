//! REST API client and wire types for the asset management backend.

mod client;
mod error;
mod params;
pub mod types;

pub use client::ApiClient;
pub use error::{
  ApiError, ErrorDetails, HTTP_ERROR, INVALID_RESPONSE, NETWORK_ERROR, VALIDATION_ERROR,
};
pub use params::{ParamValue, ParamsError, QueryParams};
