//! # scriptrs Script Categorisation (`runner::script_kind`)
//!
//! File: cli/src/runner/script_kind.rs
//! Author: Christi Mahu
//!
//! Groups script names into broad kinds (`test`, `build`, `dev`, ...) for
//! listings. Matching is a case-insensitive substring check; rules are tried in
//! declaration order and the first hit wins, so `test:build` is a test script.
//!
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Test,
    Build,
    Dev,
    Lint,
    Format,
    Deploy,
    Docs,
    Other,
}

impl ScriptKind {
    pub fn detect(script_name: &str) -> Self {
        let name = script_name.to_lowercase();
        let has = |needle: &str| name.contains(needle);

        if ["test", "spec", "jest", "vitest"].into_iter().any(has) {
            ScriptKind::Test
        } else if ["build", "bundle", "pack", "compile"].into_iter().any(has) {
            ScriptKind::Build
        } else if ["dev", "start", "serve"].into_iter().any(has) {
            ScriptKind::Dev
        } else if has("lint") || (has("prettier") && has("check")) {
            ScriptKind::Lint
        } else if has("format") || has("prettier") {
            // "prettier" + "check" was already taken as lint above.
            ScriptKind::Format
        } else if ["deploy", "publish", "release"].into_iter().any(has) {
            ScriptKind::Deploy
        } else if has("doc") {
            // Also covers "docs" and "jsdoc".
            ScriptKind::Docs
        } else {
            ScriptKind::Other
        }
    }

    /// Short fixed-width label for listings.
    pub fn label(self) -> &'static str {
        match self {
            ScriptKind::Test => "test",
            ScriptKind::Build => "build",
            ScriptKind::Dev => "dev",
            ScriptKind::Lint => "lint",
            ScriptKind::Format => "format",
            ScriptKind::Deploy => "deploy",
            ScriptKind::Docs => "docs",
            ScriptKind::Other => "run",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
