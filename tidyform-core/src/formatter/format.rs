//! Formatting pipeline

use crate::syntax::{SyntaxError, lex, parse};

use super::layout::layout;
use super::lexical;
use super::structure::normalize_file;

/// Result of formatting a source that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub formatted: String,
    /// Whether `formatted` differs from the input
    pub changed: bool,
}

/// Format a configuration file
///
/// Never fails: when the source cannot be tokenized, or the lexically
/// normalized text no longer parses, the source is returned unchanged.
/// `filename` is only used for diagnostics.
pub fn format(source: &str, filename: &str) -> String {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            log::warn!("{}: not formatted: {}", filename, e);
            return source.to_string();
        }
    };

    let normalized = lexical::normalize(&tokens);
    log::debug!("{}: lexical pass done ({} tokens)", filename, tokens.len());

    let file = match parse(&normalized) {
        Ok(file) => file,
        Err(e) => {
            log::warn!("{}: not formatted, normalized text failed to parse: {}", filename, e);
            return source.to_string();
        }
    };

    let file = normalize_file(file);
    log::debug!("{}: structural pass done", filename);

    layout(file.into_tokens(), line_ending(source))
}

/// The terminator of the source's first line, `\n` when there is none
fn line_ending(source: &str) -> &'static str {
    match source.find('\n') {
        Some(i) if source[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Check that the source is syntactically valid
pub fn validate(source: &str, filename: &str) -> Result<(), SyntaxError> {
    parse(source).map(|_| ()).inspect_err(|e| {
        log::debug!("{}: {}", filename, e);
    })
}

/// Validate, then format
pub fn format_checked(source: &str, filename: &str) -> Result<FormatOutcome, SyntaxError> {
    validate(source, filename)?;
    let formatted = format(source, filename);
    let changed = formatted != source;
    Ok(FormatOutcome { formatted, changed })
}

/// Check if a file needs formatting
pub fn needs_format(source: &str, filename: &str) -> Result<bool, SyntaxError> {
    format_checked(source, filename).map(|outcome| outcome.changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(source: &str) -> String {
        format(source, "test.tf")
    }

    #[test]
    fn test_collapses_blank_lines_between_blocks() {
        let input = "resource \"a\" \"b\" {\n}\n\n\n\nresource \"c\" \"d\" {\n}\n";
        assert_eq!(
            fmt(input),
            "resource \"a\" \"b\" {\n}\n\nresource \"c\" \"d\" {\n}\n"
        );
    }

    #[test]
    fn test_rewrites_slash_comment() {
        assert_eq!(fmt("// hello\nx = 1\n"), "# hello\nx = 1\n");
    }

    #[test]
    fn test_orders_resource_attributes() {
        let input = r#"resource "aws_instance" "web" {
  instance_type = "t3.micro"
  ami           = "ami-123"
  count         = 2
}
"#;
        let expected = r#"resource "aws_instance" "web" {
  count = 2

  ami           = "ami-123"
  instance_type = "t3.micro"
}
"#;
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_orders_module_source_first() {
        let input = "module \"vpc\" {\n  version = \"1.0\"\n  name = \"main\"\n  source = \"./vpc\"\n}\n";
        let expected = "module \"vpc\" {\n  source  = \"./vpc\"\n  version = \"1.0\"\n\n  name = \"main\"\n}\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_unwraps_lone_interpolation() {
        let input = "x = \"${var.foo}\"\ny = \"${var.foo}-${var.bar}\"\n";
        assert_eq!(fmt(input), "x = var.foo\ny = \"${var.foo}-${var.bar}\"\n");
    }

    #[test]
    fn test_upgrades_variable_types() {
        let input = "variable \"a\" {\n  type = list\n}\n\nvariable \"b\" {\n  type = \"list\"\n}\n\nvariable \"c\" {\n  type = \"string\"\n}\n";
        let expected = "variable \"a\" {\n  type = list(any)\n}\n\nvariable \"b\" {\n  type = list(string)\n}\n\nvariable \"c\" {\n  type = string\n}\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_full_file() {
        let input = r#"# Network
variable "cidr" {
  type = "string"
  default = "10.0.0.0/16"
  description = "CIDR"
}
resource "aws_vpc" "main" {
  tags = {
    Name = "${var.name}"
  }
  cidr_block = "${var.cidr}"
  count = 1
  lifecycle {
    create_before_destroy = true
  }
  // legacy
  enable_dns = true
}
"#;
        let expected = r#"# Network
variable "cidr" {
  default     = "10.0.0.0/16"
  description = "CIDR"
  type        = string
}

resource "aws_vpc" "main" {
  count = 1

  cidr_block = var.cidr

  # legacy
  enable_dns = true
  tags       = {
    Name = "${var.name}"
  }

  lifecycle {
    create_before_destroy = true
  }
}
"#;
        let formatted = fmt(input);
        assert_eq!(formatted, expected);
        assert_eq!(fmt(&formatted), formatted);
    }

    #[test]
    fn test_idempotent_with_dangling_comments() {
        let input = "resource \"a\" \"b\" {\n  # one\n\n  # two\n\n  zone = 1\n  ami = 2\n}\n";
        let once = fmt(input);
        assert_eq!(fmt(&once), once);
        assert!(once.find("# two").unwrap() < once.find("zone = 1").unwrap());
    }

    #[test]
    fn test_top_level_order_preserved() {
        let input = "variable \"z\" {\n}\n\noutput \"a\" {\n  value = 1\n}\n\nlocals {\n  b = 2\n}\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_heredoc_preserved() {
        let input = "resource \"a\" \"b\" {\n  user_data = <<-EOT\n      #!/bin/bash\n\n\n      echo hi   \n  EOT\n}\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_fallback_returns_source() {
        assert_eq!(fmt("a = \n"), "a = \n");
        assert_eq!(fmt("x = \"abc\n"), "x = \"abc\n");
    }

    #[test]
    fn test_validate_reports_position() {
        let err = validate("a {\n  b =\n}\n", "bad.tf").unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(validate("a = 1\n", "ok.tf").is_ok());
    }

    #[test]
    fn test_format_checked() {
        let outcome = format_checked("a=1\n", "a.tf").unwrap();
        assert_eq!(outcome.formatted, "a = 1\n");
        assert!(outcome.changed);

        let outcome = format_checked("a = 1\n", "a.tf").unwrap();
        assert!(!outcome.changed);

        assert!(format_checked("a {\n", "a.tf").is_err());
    }

    #[test]
    fn test_duplicate_attribute_is_rejected_not_dropped() {
        let input = "resource \"a\" \"b\" {\n  ami = 1\n  ami = 2\n}\n";
        let err = format_checked(input, "dup.tf").unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_keeps_crlf_line_endings() {
        assert_eq!(
            fmt("a \"x\" {\r\n  z = 1\r\n  b = 2\r\n}\r\n"),
            "a \"x\" {\r\n  b = 2\r\n  z = 1\r\n}\r\n"
        );
        assert_eq!(
            fmt("resource \"a\" \"b\" {\r\n  ami = 1\r\n  count = 2\r\n}\r\nx = 1"),
            "resource \"a\" \"b\" {\r\n  count = 2\r\n\r\n  ami = 1\r\n}\r\n\r\nx = 1\r\n"
        );
    }

    #[test]
    fn test_needs_format() {
        assert!(needs_format("a   = 1\n", "a.tf").unwrap());
        assert!(!needs_format("a = 1\n", "a.tf").unwrap());
    }
}
