use crate::cli::ColorChoice;
use std::io::IsTerminal;

/// Initialize color mode based on CLI choice and environment
pub fn init(choice: ColorChoice) {
    colored::control::set_override(should_color(choice, std::io::stdout().is_terminal()));
}

fn should_color(choice: ColorChoice, is_terminal: bool) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        // Respect NO_COLOR (https://no-color.org/)
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && is_terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_choices_ignore_terminal() {
        assert!(should_color(ColorChoice::Always, false));
        assert!(!should_color(ColorChoice::Never, true));
    }

    #[test]
    fn auto_needs_a_terminal() {
        assert!(!should_color(ColorChoice::Auto, false));
    }
}
