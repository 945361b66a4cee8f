//! Terminal rendering of the markdown produced by `stepwise-core`.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Renders markdown with termimad, or prints it unchanged when color is off.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        for line in markdown.lines() {
            // Headers keep their hash marks so nesting stays visible
            if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else if let Some(rest) = line.strip_prefix("- ✗ ") {
                println!("- \x1b[31m✗\x1b[0m {}", self.skin.inline(rest));
            } else {
                println!("{}", self.skin.inline(line));
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
