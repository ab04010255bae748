pub use api_response::*;
pub use requests::*;
pub use transfer_errors::*;

pub mod api_response;
pub mod requests;
pub mod transfer_errors;
