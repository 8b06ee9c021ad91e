//! Line-based prompts for the interactive recommendation form

use anyhow::{bail, Result};
use colored::Colorize;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Reads answers from `input`, echoing questions to `output`.
///
/// An empty answer takes the default; an invalid one asks again.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one trimmed line; `None` on EOF
    fn read_line(&mut self, question: &str, default: &str) -> Result<Option<String>> {
        write!(self.output, "{} [{}]: ", question.bold(), default)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until the answer parses and falls inside `range`
    pub fn number<T>(&mut self, question: &str, default: T, range: RangeInclusive<T>) -> Result<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let Some(answer) = self.read_line(question, &default.to_string())? else {
                bail!("No answer for '{}'", question);
            };
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<T>() {
                Ok(value) if range.contains(&value) => return Ok(value),
                _ => writeln!(
                    self.output,
                    "{} enter a number between {} and {}",
                    "⚠".yellow(),
                    range.start(),
                    range.end()
                )?,
            }
        }
    }

    /// Ask until the answer parses as `T`
    pub fn choice<T>(&mut self, question: &str, default: T) -> Result<T>
    where
        T: FromStr<Err = String> + Display + Copy,
    {
        loop {
            let Some(answer) = self.read_line(question, &default.to_string())? else {
                bail!("No answer for '{}'", question);
            };
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "{} {}", "⚠".yellow(), e)?,
            }
        }
    }
}
