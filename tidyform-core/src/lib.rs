//! Tidyform Core
//!
//! Canonicalizing formatter engine for HCL infrastructure configuration

pub mod formatter;
pub mod rules;
pub mod syntax;
