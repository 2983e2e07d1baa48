//! Generation layer: prompt construction, schema-constrained REST calls to the
//! generative-text service, response validation, and the background worker task
//! that serialises requests and reports results back over the event bus.

pub mod client;
pub mod types;
pub mod worker;
