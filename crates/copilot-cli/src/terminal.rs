//! Prompter and progress reporting on the controlling terminal.
//!
//! Prompts and progress go to stderr so stdout stays clean for log lines and
//! JSON.

use copilot_core::prompt::{Progress, Prompter};
use copilot_core::{CopilotError, Result};
use std::io::{self, BufRead, Write};

pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Next line from stdin, or `None` at end of input.
    fn read_line(&self) -> Result<Option<String>> {
        io::stderr().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        eprint!("{message} [y/N] ");
        Ok(self.read_line()?.is_some_and(|line| is_yes(&line)))
    }

    fn select(&self, message: &str, options: &[String]) -> Result<String> {
        if options.is_empty() {
            return Err(CopilotError::TargetNotSelected);
        }
        eprintln!("{message}");
        for (i, option) in options.iter().enumerate() {
            eprintln!("  {}. {option}", i + 1);
        }
        loop {
            eprint!("Choice [1-{}]: ", options.len());
            let Some(line) = self.read_line()? else {
                return Err(CopilotError::OperationCancelled);
            };
            match parse_choice(&line, options.len()) {
                Some(i) => return Ok(options[i].clone()),
                None => eprintln!("Enter a number between 1 and {}.", options.len()),
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Zero-based index for a 1-based menu answer.
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    let n: usize = answer.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

pub struct TerminalProgress;

impl Progress for TerminalProgress {
    fn start(&self, message: &str) {
        eprintln!("  {message}");
    }

    fn stop(&self, message: &str) {
        eprintln!("  {message}");
    }
}
