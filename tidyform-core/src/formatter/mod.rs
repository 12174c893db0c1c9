//! Canonical formatter for HCL configuration files
//!
//! Produces the same layout as `terraform fmt`, plus a fixed ordering of
//! attributes and nested blocks inside every block body.
//! Preserves comments, heredoc content and the order of top-level blocks.
//!
//! # Example
//!
//! ```
//! use tidyform_core::formatter::format;
//!
//! let source = "resource \"aws_instance\" \"web\" {\nami=\"${var.ami}\"\ncount=2\n}\n";
//! let formatted = format(source, "main.tf");
//!
//! assert_eq!(
//!     formatted,
//!     "resource \"aws_instance\" \"web\" {\n  count = 2\n\n  ami = var.ami\n}\n"
//! );
//! ```

mod expr;
mod format;
mod layout;
mod lexical;
mod structure;

pub use expr::{canonicalize_type, unwrap_interpolation};
pub use format::{FormatOutcome, format, format_checked, needs_format, validate};
