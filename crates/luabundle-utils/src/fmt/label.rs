use std::fmt;

use console::{style, Color};

// NOTE: Status labels are right-aligned to this width, the
// same way cargo aligns its "Compiling" / "Finished" lines
const STATUS_WIDTH: usize = 7;

/**
    Label enum used for consistent output formatting throughout luabundle.

    Status labels (`Bundle`, `Write`) are printed as bold, right-aligned
    words, while diagnostic labels (`Warn`, `Error`) are bracketed.

    # Example usage

    ```rs
    use luabundle_utils::fmt::Label;

    println!("{} main.lua", Label::Bundle);
    //  Bundle main.lua

    println!("{} This is an error message", Label::Error);
    // [ERROR] This is an error message
    ```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Bundle,
    Write,
    Warn,
    Error,
}

impl Label {
    /**
        Returns the display name of the label.
    */
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bundle => "Bundle",
            Self::Write => "Write",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /**
        Returns the color of the label.
    */
    #[must_use]
    pub fn color(&self) -> Color {
        match self {
            Self::Bundle => Color::Green,
            Self::Write => Color::Blue,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    /**
        Returns `true` if this is a progress status label
        rather than a warning or error diagnostic label.
    */
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Bundle | Self::Write)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_status() {
            let padded = format!("{:>STATUS_WIDTH$}", self.name());
            write!(f, "{}", style(padded).fg(self.color()).bold())
        } else {
            write!(
                f,
                "{}{}{}",
                style("[").dim(),
                style(self.name()).fg(self.color()),
                style("]").dim()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use console::set_colors_enabled;

    use super::*;

    #[test]
    fn status_labels_are_right_aligned() {
        set_colors_enabled(false);
        assert_eq!(Label::Bundle.to_string(), " Bundle");
        assert_eq!(Label::Write.to_string(), "  Write");
    }

    #[test]
    fn diagnostic_labels_are_bracketed() {
        set_colors_enabled(false);
        assert!(!Label::Warn.is_status());
        assert_eq!(Label::Warn.to_string(), "[WARN]");
        assert_eq!(Label::Error.to_string(), "[ERROR]");
    }
}
