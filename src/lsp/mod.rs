//! LSP protocol feature implementations.
//!
//! This module provides implementations for LSP features:
//! - Hover documentation for catalog functions
//! - Completion of function and macro names

mod completion;
mod hover;

pub use completion::completion_at_position;
pub use hover::{format_overload_docs, hover_at_position};
