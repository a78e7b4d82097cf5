//! Interactive prompts on the controlling terminal.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};

pub fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    read_answer(&mut io::stdin().lock())
}

fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        bail!("No input");
    }
    Ok(line.trim().to_string())
}

/// Reads without echo.
pub fn prompt_password(label: &str) -> Result<String> {
    use termion::input::TermRead;

    let mut stdout = io::stdout().lock();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;

    let password = io::stdin()
        .lock()
        .read_passwd(&mut stdout)
        .context("Failed to read password")?;
    writeln!(stdout)?;
    password.context("No input")
}

/// `[y/N]`; anything but yes declines.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N]", question))?;
    Ok(parse_confirmation(&answer))
}

/// Index in `0..count`, asked until a valid one is entered.
pub fn select_index(label: &str, count: usize) -> Result<usize> {
    loop {
        let answer = prompt_line(label)?;
        match parse_index(&answer, count) {
            Some(index) => return Ok(index),
            None => eprintln!("Error: {} is not in the range 0..{}", answer, count),
        }
    }
}

fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn parse_index(answer: &str, count: usize) -> Option<usize> {
    answer.trim().parse::<usize>().ok().filter(|i| *i < count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_answer() {
        let mut input = io::Cursor::new("  user@example.com \nrest\n");
        assert_eq!(read_answer(&mut input).unwrap(), "user@example.com");
        assert_eq!(read_answer(&mut input).unwrap(), "rest");
        assert_eq!(read_answer(&mut input).unwrap_err().to_string(), "No input");
    }

    #[test]
    fn test_parse_confirmation() {
        assert!(parse_confirmation("y"));
        assert!(parse_confirmation(" YES "));
        assert!(!parse_confirmation(""));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("maybe"));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0", 2), Some(0));
        assert_eq!(parse_index(" 1\n", 2), Some(1));
        assert_eq!(parse_index("2", 2), None);
        assert_eq!(parse_index("-1", 2), None);
        assert_eq!(parse_index("x", 2), None);
    }
}
