#![doc = "mdfixture-core: core logic library for mdfixture."]

//! This crate generates synthetic markdown documents with controlled keyword
//! placement and exports them as markdown, converted documents (PDF, DOCX,
//! HTML...), page screenshots or MIME email messages.
//!
//! # Usage
//! Build a [`compose::DocumentComposer`] from a [`random::RandomContentProvider`],
//! generate a document from block requests, then hand it to an
//! [`export::ExportPipeline`].

pub mod blocks;
pub mod compose;
pub mod config;
pub mod contract;
pub mod error;
pub mod export;
pub mod random;
pub mod synthesise;
