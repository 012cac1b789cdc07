pub mod commands;
pub mod context;
pub mod logging;
pub mod repl;

pub use context::CliContext;
pub use repl::readline;

/// Render an error with its source chain on one line
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
