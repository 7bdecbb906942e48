//! Colored output helpers for CLI
//!
//! Every helper has a plain-text form for `--no-color` and non-terminal use.

use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

/// Status marker for a single line
#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Info,
    Warn,
    Error,
    Skip,
}

impl Tone {
    fn tag(self) -> &'static str {
        match self {
            Tone::Ok => "[OK]",
            Tone::Info => "[INFO]",
            Tone::Warn => "[WARN]",
            Tone::Error => "[ERROR]",
            Tone::Skip => "[SKIPPED]",
        }
    }

    fn paint(self, text: &str) -> String {
        match self {
            Tone::Ok => text.green().bold().to_string(),
            Tone::Info => text.blue().to_string(),
            Tone::Warn => text.yellow().bold().to_string(),
            Tone::Error => text.red().bold().to_string(),
            Tone::Skip => text.yellow().to_string(),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Tone::Ok => "✓",
            Tone::Info => "•",
            Tone::Warn => "⚠",
            Tone::Error => "✗",
            Tone::Skip => "○",
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn format_line(&self, tone: Tone, body: &str, styled_body: impl FnOnce() -> String) -> String {
        if self.colored {
            format!("  {} {}", tone.paint(tone.symbol()), styled_body())
        } else {
            format!("  {} {}", tone.tag(), body)
        }
    }

    fn line(&self, tone: Tone, body: &str, styled_body: impl FnOnce() -> String) {
        let text = self.format_line(tone, body, styled_body);
        match tone {
            Tone::Error => eprintln!("{}", text),
            _ => println!("{}", text),
        }
    }

    fn styled<'a>(&self, plain: &'a str, styled: impl FnOnce(&'a str) -> String) -> String {
        if self.colored {
            styled(plain)
        } else {
            plain.to_string()
        }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "\n   {} {}\n   {}\n",
            self.styled("GRAVITY", |s| s.bright_magenta().bold().to_string()),
            self.styled(&version, |s| s.dimmed().to_string()),
            self.styled("physics simulation backend", |s| s.bright_white().to_string()),
        );
    }

    pub fn success(&self, message: &str) {
        self.line(Tone::Ok, message, || message.green().to_string());
    }

    pub fn info(&self, message: &str) {
        self.line(Tone::Info, message, || message.to_string());
    }

    pub fn warning(&self, message: &str) {
        self.line(Tone::Warn, message, || message.yellow().to_string());
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        self.line(Tone::Error, message, || message.red().to_string());
    }

    /// A file written by `init`
    pub fn created(&self, file_type: &str, path: &str) {
        let plain = format!("{} {}", file_type, path);
        self.line(Tone::Ok, &plain, || {
            format!("{} {}", file_type.dimmed(), path.bright_white())
        });
    }

    /// A file `init` left alone
    pub fn skipped(&self, path: &str, reason: &str) {
        let plain = format!("{} ({})", path, reason);
        self.line(Tone::Skip, &plain, || {
            format!("{} {}", path.dimmed(), format!("({})", reason).yellow())
        });
    }

    pub fn created_dir(&self, path: &str) {
        self.created("directory", path);
    }

    pub fn header(&self, title: &str) {
        let plain = format!("=== {} ===", title);
        println!(
            "\n  {}",
            if self.colored {
                title.bright_white().bold().underline().to_string()
            } else {
                plain
            }
        );
    }

    pub fn subheader(&self, title: &str) {
        let plain = format!("--- {} ---", title);
        println!(
            "\n  {}",
            if self.colored {
                title.cyan().bold().to_string()
            } else {
                plain
            }
        );
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!(
            "    {}: {}",
            self.styled(key, |s| s.dimmed().to_string()),
            self.styled(value, |s| s.bright_white().to_string())
        );
    }

    pub fn hint(&self, message: &str) {
        let plain = format!("[TIP] {}", message);
        println!(
            "\n  {}",
            if self.colored {
                message.dimmed().italic().to_string()
            } else {
                plain
            }
        );
    }

    /// A shell command the user may want to run next
    pub fn command(&self, cmd: &str) {
        let text = format!("$ {}", cmd);
        println!("     {}", self.styled(&text, |s| s.bright_cyan().to_string()));
    }

    pub fn complete(&self, message: &str) {
        let plain = format!("[DONE] {}", message);
        println!(
            "\n  {}",
            if self.colored {
                message.bright_green().bold().to_string()
            } else {
                plain
            }
        );
    }

    pub fn newline(&self) {
        println!();
    }
}
