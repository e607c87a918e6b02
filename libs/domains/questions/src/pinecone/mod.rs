//! Pinecone REST client.
//!
//! Control-plane calls (list/create/describe index) go to the controller URL.
//! Record calls go to the index host, discovered through `describe_index` on
//! first use unless `PINECONE_INDEX_HOST` pins it.

mod client;
mod config;

pub use client::PineconeStore;
pub use config::{DEFAULT_API_VERSION, DEFAULT_CONTROLLER_URL, PineconeConfig};
