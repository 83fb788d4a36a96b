//! Command handlers for the codeview CLI.
//!
//! Each subcommand has its own module with a public handler function
//! that `main()` dispatches to.

pub mod detect;
pub mod format;
pub mod languages;
pub mod version;

use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Reading input gives up after this long.
pub const INPUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a file, or stdin when no path is given.
pub async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    let read = async {
        match path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            None => {
                let mut buffer = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buffer)
                    .await
                    .context("Failed to read stdin")?;
                Ok(buffer)
            }
        }
    };

    tokio::time::timeout(INPUT_TIMEOUT, read)
        .await
        .with_context(|| format!("Timed out after {}s waiting for input", INPUT_TIMEOUT.as_secs()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x = 1").unwrap();
        assert_eq!(read_input(Some(file.path())).await.unwrap(), "x = 1\n");
    }

    #[tokio::test]
    async fn test_missing_file_names_the_path() {
        let err = read_input(Some(Path::new("/definitely/not/here.py"))).await.unwrap_err();
        assert!(err.to_string().contains("here.py"));
    }
}
