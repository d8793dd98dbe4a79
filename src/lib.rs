//! Task Interview — a guided business-analysis interview driven by an LLM.
//!
//! A session collects a company profile, lets the user pick an analysis task,
//! asks a short generated questionnaire, and produces a final analysis with a
//! bounded number of follow-up exchanges.

pub mod cli;
pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
pub mod session;
