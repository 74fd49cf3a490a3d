//! JSON-RPC 2.0 bridge to the hosting web page.
pub mod web_rpc;
