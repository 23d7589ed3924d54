//! Record store access for submitted requests and the customer/project
//! master data, backed by the Notion REST API.

mod client;
pub mod gateway;
pub mod properties;

pub use client::NotionClient;
pub use gateway::{DatabaseSummary, GatewayError, PageRef, RecordGateway};
pub use properties::MasterRecord;
