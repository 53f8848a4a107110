use std::{error::Error, fmt};

use console::style;
use once_cell::sync::Lazy;

static STYLED_CAUSED_BY: Lazy<String> = Lazy::new(|| format!("{}", style("Caused by:").dim()));

// NOTE: We indent using 4 spaces instead of tabs since
// these errors are most likely to be displayed in a terminal
// or some kind of live output - and tabs don't work well there
const CAUSE_INDENT: &str = "    ";

/**
    Error components collected from an error and its chain of sources.

    Bundling errors nest once per level of the require graph, so
    each cause is displayed one indentation level deeper than the
    error that wrapped it, in the following format:

    ```plaintext
    failed to bundle resolved module 'a'
    Caused by:
        failed to bundle resolved module 'b'
        Caused by:
            could not resolve module 'c' required by 'b' at 1:1
    ```
*/
#[derive(Debug, Default, Clone)]
pub struct ErrorComponents {
    messages: Vec<String>,
}

impl ErrorComponents {
    /**
        Returns the error messages, outermost error first.
    */
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /**
        Returns the innermost error message, which is
        usually the most specific one, if any exist.
    */
    #[must_use]
    pub fn root_cause(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /**
        Returns `true` if the error was caused by at least one other error.
    */
    #[must_use]
    pub fn has_causes(&self) -> bool {
        self.messages.len() > 1
    }
}

impl fmt::Display for ErrorComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, message) in self.messages.iter().enumerate() {
            if depth > 0 {
                let indent = CAUSE_INDENT.repeat(depth - 1);
                writeln!(f, "{indent}{}", *STYLED_CAUSED_BY)?;
            }
            let indent = CAUSE_INDENT.repeat(depth);
            for line in message.lines() {
                writeln!(f, "{indent}{line}")?;
            }
        }
        Ok(())
    }
}

impl From<&(dyn Error + 'static)> for ErrorComponents {
    fn from(error: &(dyn Error + 'static)) -> Self {
        let mut messages = Vec::new();
        let mut current = Some(error);
        while let Some(error) = current {
            let message = error.to_string();
            // Some wrappers repeat the message of their source verbatim,
            // showing it twice in a row would only be noise for the user
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = error.source();
        }
        ErrorComponents { messages }
    }
}
