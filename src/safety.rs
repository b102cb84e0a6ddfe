//! Deny-list checks applied to user input and built commands.
//!
//! These are string filters, not a shell parser. They catch the obvious
//! injection shapes (command substitution, chaining, redirection) but cannot
//! rule out every shell metacharacter encoding. Keep user-controlled text out
//! of commands wherever possible and treat a pass here as a minimum bar.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Characters removed by [`sanitize`].
const STRIPPED_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '{', '}', '[', ']', '\'', '"', '\\',
];

/// Substrings that make a command unsafe to hand to a shell.
const DANGEROUS_PATTERNS: &[&str] = &["$(", "`", "&&", "||", ";", "|", ">", "<", "rm -rf"];

pub const MAX_PACKAGE_NAME_LEN: usize = 256;

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._@/-]+$").expect("package name pattern is valid")
});

/// Why an operation was refused before execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("invalid package name '{0}'")]
    InvalidPackageName(String),
    #[error("refusing to run unsafe command: {0}")]
    UnsafeCommand(String),
}

/// Remove shell metacharacters from `input`. Never rejects.
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// Non-empty, at most 256 bytes, only ASCII alphanumerics and `- _ . @ /`.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_PACKAGE_NAME_LEN && PACKAGE_NAME.is_match(name)
}

/// Non-empty and free of every deny-listed pattern.
pub fn is_valid_command(command: &str) -> bool {
    !command.is_empty() && !contains_dangerous_chars(command)
}

pub fn contains_dangerous_chars(input: &str) -> bool {
    DANGEROUS_PATTERNS
        .iter()
        .any(|pattern| input.contains(pattern))
}

/// Backslash-escape whitespace, backslashes and quotes for use as a single
/// POSIX shell word.
pub fn escape_shell(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\'' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Sanitize `name` and require the result to be a valid package name.
pub fn check_package_name(name: &str) -> Result<String, Rejection> {
    let cleaned = sanitize(name);
    if is_valid_package_name(&cleaned) {
        Ok(cleaned)
    } else {
        Err(Rejection::InvalidPackageName(name.to_string()))
    }
}

pub fn check_command(command: &str) -> Result<(), Rejection> {
    if is_valid_command(command) {
        Ok(())
    } else {
        Err(Rejection::UnsafeCommand(command.to_string()))
    }
}
