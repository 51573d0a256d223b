//! flood-recon: reconciles an elevation certificate against a flood
//! insurance application and evaluates the underwriting rule battery.
//!
//! The engine is a pure function of (documents, reference tables, oracle
//! answers) to a [`Report`]: it parses no PDFs, names no model, and stores
//! no files. See [`engine::ReconciliationEngine`] for the entry point.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod normalize;
pub mod oracle;
pub mod reference;
pub mod report;
pub mod rules;
pub mod telemetry;

pub use document::Document;
pub use engine::ReconciliationEngine;
pub use report::{Report, ReportSummary};
pub use rules::{RuleCheck, RuleResult, RuleStatus};
