//! Value types for one HTTP exchange.
//!
//! * [`http_req::HttpReq`] normalizes the server, query, post and cookie data of a request, real or
//!   synthesized from a URI with [`req_builder::ReqBuilder`].
//! * [`http_res::HttpRes`] accumulates status, headers, version and body and emits a raw HTTP/1.x
//!   response.
#![cfg_attr(coverage, feature(coverage_attribute))]

pub mod http_req;
pub mod http_res;
pub mod req_builder;
pub mod req_parser;
pub mod settings;
mod utils;
