use crate::cli::OutputSettings;
use colored::*;
use protocurl_core::{Error, report::Reporter};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Error> for FormattedString {
    fn from(err: Error) -> Self {
        let heading = match &err {
            Error::Configuration(_) => "Invalid Configuration:",
            Error::Resolution(_) => "Message Type Lookup Failed:",
            Error::Compile(_) => "Failed to compile .proto files:",
            Error::Codec(_) => "Conversion Failed:",
            Error::Transport(_) => "Request Failed:",
        };

        FormattedString(format!("{}\n\n'{}'", heading.red().bold(), err))
    }
}

/// Prints the progress of a run to the console.
///
/// When running quietly only the decoded response is printed.
pub struct ConsoleReporter {
    settings: OutputSettings,
}

impl ConsoleReporter {
    pub fn new(settings: OutputSettings) -> Self {
        Self { settings }
    }

    fn section(&self, title: &str, outgoing: bool) {
        let arrow = if outgoing { ">>>" } else { "<<<" };
        println!(
            "{} {}",
            format!("=========================== {title:<16} ===========================").cyan(),
            arrow.cyan().bold()
        );
    }
}

impl Reporter for ConsoleReporter {
    fn request(&self, text: &str, binary: &[u8]) {
        if self.settings.quiet {
            return;
        }

        self.section("Request Text", true);
        println!("{text}");

        if self.settings.display_binary_and_http {
            self.section("Request Binary", true);
            print!("{}", hex_dump(binary));
        }
    }

    fn response_received(&self, headers: &str, binary: &[u8]) {
        if self.settings.quiet || !self.settings.display_binary_and_http {
            return;
        }

        self.section("Response Headers", false);
        println!("{headers}");
        self.section("Response Binary", false);
        print!("{}", hex_dump(binary));
    }

    fn response_text(&self, text: &str) {
        if !self.settings.quiet {
            self.section("Response Text", false);
        }
        println!("{text}");
    }

    fn tool_output(&self, tool: &str, stdout: &str, stderr: &str) {
        if self.settings.quiet {
            return;
        }

        let tool = tool.to_uppercase();
        if !stdout.trim().is_empty() {
            self.section(&format!("{tool} Output"), false);
            println!("{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            self.section(&format!("{tool} Error"), false);
            println!("{}", stderr.trim_end());
        }
    }
}

/// Canonical hex+ASCII dump: offset, 16 bytes split in two groups of 8, printable characters.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();

    for (line, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:08x}  ", line * 16));

        for i in 0..16 {
            match chunk.get(i) {
                Some(byte) => out.push_str(&format!("{byte:02x} ")),
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }

        out.push_str(" |");
        out.extend(chunk.iter().map(|&byte| {
            if (0x20..=0x7e).contains(&byte) {
                byte as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}
