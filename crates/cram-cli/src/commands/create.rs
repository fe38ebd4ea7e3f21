//! Create command - register a new study session.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use cram_core::{FileRef, Preferences, Session};

pub fn run(
    user: &str,
    files: &[String],
    no_summary: bool,
    no_flashcards: bool,
    no_study_guide: bool,
) -> Result<()> {
    let refs = files
        .iter()
        .map(|spec| parse_file_spec(spec))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::new(user).with_preferences(Preferences {
        summary: !no_summary,
        flashcards: !no_flashcards,
        study_guide: !no_study_guide,
    });
    for file in refs {
        session = session.with_file(file);
    }

    let db = get_database()?;
    db.create_session(&session)
        .context("Failed to create session")?;

    println!(
        "{} Created session {} with {} file(s)",
        "✓".green(),
        session.id.cyan(),
        session.files.len()
    );
    println!(
        "  Process it with: {}",
        format!("cram process {} --user {}", session.id, user).cyan()
    );

    Ok(())
}

/// Parse a `name=url=media-type` triple. URLs may carry '=' in query
/// strings, so split the name off the front and the media type off the back.
fn parse_file_spec(spec: &str) -> Result<FileRef> {
    let (name, rest) = spec
        .split_once('=')
        .with_context(|| format!("Invalid file spec '{}', expected name=url=media-type", spec))?;
    let (url, media_type) = rest
        .rsplit_once('=')
        .with_context(|| format!("Invalid file spec '{}', expected name=url=media-type", spec))?;

    if name.is_empty() || url.is_empty() || media_type.is_empty() {
        anyhow::bail!("Invalid file spec '{}', expected name=url=media-type", spec);
    }

    Ok(FileRef::new(name, url, media_type, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_spec() {
        let file =
            parse_file_spec("notes.pdf=https://files.example/notes.pdf=application/pdf").unwrap();
        assert_eq!(file.file_name, "notes.pdf");
        assert_eq!(file.url, "https://files.example/notes.pdf");
        assert_eq!(file.media_type, "application/pdf");
    }

    #[test]
    fn test_parse_file_spec_with_equals_in_url() {
        let file =
            parse_file_spec("scan.png=https://files.example/get?sig=abc123=image/png").unwrap();
        assert_eq!(file.url, "https://files.example/get?sig=abc123");
        assert_eq!(file.media_type, "image/png");
    }

    #[test]
    fn test_parse_file_spec_rejects_malformed() {
        assert!(parse_file_spec("just-a-name").is_err());
        assert!(parse_file_spec("name=url-only").is_err());
        assert!(parse_file_spec("=url=type").is_err());
    }
}
