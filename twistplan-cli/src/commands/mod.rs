pub mod plan;
pub mod report;
pub mod transform;
pub mod validate;

use std::io::Write;

/// Prompt for a value on stdin when it was not supplied as an argument.
pub fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Use the given value or fall back to an interactive prompt.
pub fn or_prompt(value: Option<String>, message: &str) -> anyhow::Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            let answer = prompt(message)?;
            anyhow::ensure!(!answer.is_empty(), "no task name given");
            Ok(answer)
        }
    }
}
