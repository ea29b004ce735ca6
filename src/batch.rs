//! Batch driver
//!
//! Loads the template, font, and name list once, then stamps each name
//! independently. A failure on one name is recorded and reported without
//! aborting the rest of the batch; only input-resolution failures (no
//! template, no names file, no font) are fatal, since no output can be
//! produced at all.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::font::BadgeFont;
use crate::names::read_names;
use crate::pdf::{stamp_badge, StampOptions, Template};

/// Options for a badge batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Path to the template PDF
    pub template: PathBuf,
    /// Path to the newline-delimited names file
    pub names: PathBuf,
    /// Directory for the generated PDFs (created if absent)
    pub output_dir: PathBuf,
    /// Path to the badge typeface
    pub font: PathBuf,
    /// Text size for the stamped name in points
    pub font_size: f32,
}

/// One event per processed name
///
/// Consumers (CLI, library callers, future UIs) observe progress through
/// these instead of depending on console output.
#[derive(Debug)]
pub enum BadgeEvent<'a> {
    /// A badge was written
    Stamped { name: &'a str, path: &'a Path },
    /// A name failed; the batch continues
    Failed { name: &'a str, error: &'a Error },
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Paths written, in input order
    pub written: Vec<PathBuf>,
    /// Names that failed, with their errors, in input order
    pub failed: Vec<(String, Error)>,
}

impl BatchSummary {
    /// True when every name produced a badge
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stamp every name in the names file onto the template
///
/// `on_event` receives one [`BadgeEvent`] per name as it completes.
pub fn run_batch(
    options: &BatchOptions,
    mut on_event: impl FnMut(BadgeEvent<'_>),
) -> Result<BatchSummary> {
    // Shared read-only for the whole run; loaded exactly once
    let font = BadgeFont::load(&options.font)?;
    let template = Template::load(&options.template)?;
    let names = read_names(&options.names)?;

    let stamp_options = StampOptions {
        font_size: options.font_size,
    };

    let mut summary = BatchSummary::default();

    for name in &names {
        match stamp_badge(&template, name, &options.output_dir, &font, &stamp_options) {
            Ok(path) => {
                on_event(BadgeEvent::Stamped {
                    name,
                    path: &path,
                });
                summary.written.push(path);
            }
            Err(error) => {
                on_event(BadgeEvent::Failed {
                    name,
                    error: &error,
                });
                summary.failed.push((name.clone(), error));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_font_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();

        let names_path = dir.path().join("names.txt");
        std::fs::File::create(&names_path)
            .unwrap()
            .write_all(b"Alice\n")
            .unwrap();

        let options = BatchOptions {
            template: dir.path().join("missing-template.pdf"),
            names: names_path,
            output_dir: dir.path().join("out"),
            font: dir.path().join("missing-font.ttf"),
            font_size: 17.0,
        };

        let mut events = 0;
        let result = run_batch(&options, |_| events += 1);

        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
        assert_eq!(events, 0, "no per-name events before inputs resolve");
        assert!(!options.output_dir.exists(), "no output on fatal error");
    }

    #[test]
    fn test_summary_all_succeeded() {
        let summary = BatchSummary::default();
        assert!(summary.all_succeeded());
    }
}
