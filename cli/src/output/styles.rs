//! Terminal stylesheet.
//!
//! Every field starts as the no-op `Style::new()`; [`Styles::colorize`] fills
//! them in when the terminal supports color.

use owo_colors::Style;

#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
    /// Log entries typed by the user.
    pub user: Style,
    /// Agent replies and final responses.
    pub agent: Style,
    /// Tool calls, code execution and other intermediate steps.
    pub tool: Style,
    /// The context currently being followed.
    pub active: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.user = Style::new().bold().truecolor(37, 56, 144);
        self.agent = Style::new().truecolor(26, 151, 179);
        self.tool = Style::new().dimmed().truecolor(26, 107, 160);
        self.active = Style::new().bold().green();
    }

    /// Style for a log entry of the given `type`.
    #[must_use]
    pub fn for_entry_kind(&self, kind: &str) -> Style {
        match kind {
            "user" => self.user,
            "agent" | "response" => self.agent,
            "error" => self.error,
            "warning" => self.warning,
            _ => self.tool,
        }
    }
}
