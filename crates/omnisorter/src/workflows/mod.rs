pub mod notion;
pub mod request;
