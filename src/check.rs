//! Asserts that literal input files exist on disk before execution.

use anyhow::Result;
use colored::Colorize;

use syntax::ast::Pos;
use unpack::{RealTask, RealTaskId, Unpacked, Visit};
use util::HashSet;
use workflow::{Rval, SpecId};

use crate::fs::Layout;

/// A literal input that matched no files on disk.
#[derive(Debug, Clone)]
pub struct InputFileNotFound {
    pub task: String,
    pub input: String,
    pub pattern: String,
    /// Where the literal value was declared.
    pub decl: Pos,
    /// Where the input slot uses it.
    pub use_site: Pos,
}

impl std::fmt::Display for InputFileNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Input file not found: \"{}\" for input \"{}\" of [{}] (declared at {}, used at {})",
            self.pattern, self.input, self.task, self.decl, self.use_site
        )
    }
}

/// For re-throwing after the full list of missing inputs has been printed.
#[derive(thiserror::Error, Debug)]
#[error("input check failed due to {0} missing input file(s)")]
pub struct MissingInputs(pub usize);

/// Visitor that expands every literal input as a glob and records the ones
/// that match nothing. Errors accumulate; the checker never fails fast, so
/// the user sees every missing input at once.
pub struct InputChecker<'a> {
    layout: &'a Layout,
    checked: HashSet<(SpecId, SpecId)>,
    errors: Vec<InputFileNotFound>,
}

impl<'a> InputChecker<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            checked: HashSet::default(),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[InputFileNotFound] {
        &self.errors
    }

    /// Print the full list of missing inputs to stderr; fail if there were
    /// one or more.
    pub fn finish(self) -> Result<(), MissingInputs> {
        if self.errors.is_empty() {
            return Ok(());
        }
        eprintln!("\n{}:\n", "Missing input files".red());
        for e in &self.errors {
            eprintln!("{}: {}", "ERROR".red(), e);
        }
        Err(MissingInputs(self.errors.len()))
    }

    /// True if the pattern matches at least one readable path.
    fn matches_anything(pattern: &str) -> bool {
        match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(|entry| entry.ok()).next().is_some(),
            Err(_) => false,
        }
    }
}

impl Visit for InputChecker<'_> {
    fn visit(&mut self, _id: RealTaskId, task: &RealTask, cx: &Unpacked) -> Result<()> {
        let graph = cx.graph();
        for (own, src, _src_task) in &task.inputs {
            let src_spec = graph.spec(*src);
            let Rval::Literal(val) = &src_spec.rval else {
                continue;
            };
            // the same declaration may appear in many realizations; check once
            if !self.checked.insert((*own, *src)) {
                continue;
            }
            let pattern = self.layout.resolve_literal(val);
            let pattern = pattern.to_string_lossy();
            if !Self::matches_anything(&pattern) {
                let own_spec = graph.spec(*own);
                self.errors.push(InputFileNotFound {
                    task: graph.task(task.task).name.clone(),
                    input: own_spec.name.clone(),
                    pattern: pattern.into_owned(),
                    decl: src_spec.pos,
                    use_site: own_spec.pos,
                });
            }
        }
        Ok(())
    }
}
