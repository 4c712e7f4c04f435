//! Check-run annotations for failed assertions.

use std::path::Path;

use crate::format::strip_ansi;
use crate::model::{Annotation, AnnotationLevel, AssertionResult, Results, Status};

/// Separator between describe-block titles and the test title.
const TITLE_SEPARATOR: &str = " > ";

/// Build one failure annotation per failed assertion, in suite order then
/// assertion order. A successful run yields no annotations, whatever the
/// individual statuses say.
#[must_use]
pub fn extract(results: &Results, cwd: &Path) -> Vec<Annotation> {
    if results.success {
        return Vec::new();
    }

    results
        .test_results
        .iter()
        .flat_map(|suite| {
            let path = relative_path(&suite.name, cwd);
            suite
                .assertion_results
                .iter()
                .filter(|a| a.status == Status::Failed)
                .map(move |a| annotate(&path, a))
        })
        .collect()
}

fn annotate(path: &str, assertion: &AssertionResult) -> Annotation {
    let line = assertion.location.map_or(0, |l| l.line);
    let title = assertion
        .ancestor_titles
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(assertion.title.as_str()))
        .collect::<Vec<_>>()
        .join(TITLE_SEPARATOR);
    let message = assertion
        .failure_messages
        .as_deref()
        .unwrap_or_default()
        .join("\n\n");

    Annotation {
        path: path.to_string(),
        start_line: line,
        end_line: line,
        annotation_level: AnnotationLevel::Failure,
        title,
        message: strip_ansi(&message),
    }
}

/// Strip the working directory from an absolute path. Paths outside it are
/// returned unchanged.
#[must_use]
pub fn relative_path(path: &str, cwd: &Path) -> String {
    match Path::new(path).strip_prefix(cwd) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string(),
    }
}
