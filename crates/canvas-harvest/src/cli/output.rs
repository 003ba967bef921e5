//! Terminal output helpers shared by the subcommands.
//!
//! The global `--json`, `--quiet` and `--no-color` flags are exported as
//! environment variables by `main`, so every command can check them without
//! threading flags through.

use std::io::IsTerminal;

pub const ENV_JSON: &str = "CANVAS_HARVEST_JSON";
pub const ENV_QUIET: &str = "CANVAS_HARVEST_QUIET";
pub const ENV_NO_COLOR: &str = "CANVAS_HARVEST_NO_COLOR";

fn flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

pub fn is_json() -> bool {
    flag(ENV_JSON)
}

pub fn is_quiet() -> bool {
    flag(ENV_QUIET)
}

/// Color only on a terminal, and never when `--no-color` or `NO_COLOR` is set.
pub fn use_color() -> bool {
    !flag(ENV_NO_COLOR) && std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

/// Print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  failed to encode JSON output: {e}"),
    }
}

/// Status symbols, colored when the terminal allows it.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self { color: use_color() }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn ok_sym(&self) -> String {
        self.paint("32", "[OK]")
    }

    pub fn warn_sym(&self) -> String {
        self.paint("33", "[!!]")
    }

    pub fn err_sym(&self) -> String {
        self.paint("31", "[XX]")
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_symbols_without_color() {
        let s = Styled { color: false };
        assert_eq!(s.ok_sym(), "[OK]");
        assert_eq!(s.warn_sym(), "[!!]");
        assert_eq!(s.bold("x"), "x");
    }

    #[test]
    fn test_colored_symbols() {
        let s = Styled { color: true };
        assert_eq!(s.err_sym(), "\x1b[31m[XX]\x1b[0m");
    }
}
