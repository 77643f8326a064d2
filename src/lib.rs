//! Terminal chat client for a document question-answering service.
//!
//! Questions are posted to a remote answering endpoint; answers come back with
//! page citations, which are grouped per document for display.

pub mod citations;
pub mod client;
pub mod config;
pub mod controller;
pub mod storage;
pub mod ui;
