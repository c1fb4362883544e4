//! # idp-mcp
//!
//! Intelligent document processing over the Model Context Protocol.
//!
//! The crate has two halves:
//!
//! - A tool server ([`mcp`]) exposing document extraction, templated
//!   section summaries, rubric-based risk identification, and action
//!   checklists, plus the configuration behind them as resources. Tool
//!   semantics live in [`service::IdpService`] over explicit
//!   [`documents::DocumentStore`] and [`config::ConfigStore`] handles.
//! - A chat client ([`agent`]) that lets an LLM call those tools in a loop
//!   while keeping the conversation history consistent: every function call
//!   the model makes is answered by exactly one result, in order, before the
//!   model is called again.
//!
//! ## Example
//!
//! ```no_run
//! use idp_mcp::config::ConfigStore;
//! use idp_mcp::documents::DocumentStore;
//! use idp_mcp::service::IdpService;
//!
//! # fn main() -> idp_mcp::Result<()> {
//! let service = IdpService::new(DocumentStore::open("data")?, ConfigStore::new("configs"));
//! let report = service.identify_risks("sample_loan.txt", "loan_risk_v1");
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod mcp;
pub mod service;

pub use error::{Error, Result};
