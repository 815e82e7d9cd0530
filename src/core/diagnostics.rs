use serde::Serialize;

/// Non-fatal findings surfaced to the caller. Nothing in here aborts a run;
/// the consolidator always produces its best-effort output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An import looked project-local (its package exists in the project) but
    /// no class in scope matched it.
    UnresolvedImport { qualified: String },
    /// Two distinct project classes share a simple name; the first one inlined
    /// kept the slot.
    NameCollision {
        name: String,
        kept: String,
        skipped: String,
    },
    /// A reference to an out-of-file class could not be repointed to an
    /// in-file copy after closure.
    CannotFixReference { qualified: String },
    /// Classes that were discovered but are missing from the merged file.
    CannotIntegrate { classes: Vec<String> },
    /// A declaration flagged for removal was no longer valid when the batch
    /// was applied.
    DeletionFailed { name: String },
    /// The target file's public class is not named after the file.
    IncorrectPublicClassName { found: String, expected: String },
    /// The class named after the target file was missing its public modifier;
    /// it has been added.
    ClassShouldBePublic { name: String },
}

impl Diagnostic {
    pub fn message(&self) -> String {
        match self {
            Diagnostic::UnresolvedImport { qualified } => {
                format!("cannot resolve import {qualified}")
            }
            Diagnostic::NameCollision {
                name,
                kept,
                skipped,
            } => format!("name collision on {name}: kept {kept}, skipped {skipped}"),
            Diagnostic::CannotFixReference { qualified } => {
                format!("cannot fix reference to {qualified}")
            }
            Diagnostic::CannotIntegrate { classes } => {
                format!("cannot integrate {}", classes.join(", "))
            }
            Diagnostic::DeletionFailed { name } => format!("could not delete {name}"),
            Diagnostic::IncorrectPublicClassName { found, expected } => {
                format!("incorrect public class name {found}, expected {expected}")
            }
            Diagnostic::ClassShouldBePublic { name } => {
                format!("class {name} should be public")
            }
        }
    }
}
