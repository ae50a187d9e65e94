use syntax::ast;

use crate::{BranchRegistry, SpecId, SpecTable};

/// A task loaded into the workflow, its slots compiled into the spec arena.
#[derive(Debug)]
pub struct Task {
    pub name: String,
    pub inputs: Vec<SpecId>,
    pub outputs: Vec<SpecId>,
    pub params: Vec<SpecId>,
    /// The shell command block, passed through verbatim.
    pub code: String,
    pub comments: Vec<String>,
    pub pos: ast::Pos,
}

impl Task {
    pub(crate) fn create(
        def: ast::TaskDef,
        specs: &mut SpecTable,
        branches: &mut BranchRegistry,
    ) -> Result<Self, crate::Error> {
        let ast::TaskDef {
            name,
            inputs,
            outputs,
            params,
            code,
            comments,
            pos,
        } = def;

        let compile_all = |list: Vec<ast::Spec>,
                           specs: &mut SpecTable,
                           branches: &mut BranchRegistry|
         -> Result<Vec<SpecId>, crate::Error> {
            list.into_iter().map(|s| specs.compile(s, branches)).collect()
        };

        Ok(Self {
            inputs: compile_all(inputs, specs, branches)?,
            outputs: compile_all(outputs, specs, branches)?,
            params: compile_all(params, specs, branches)?,
            name,
            code,
            comments,
            pos,
        })
    }

    pub fn output_named(&self, specs: &SpecTable, name: &str) -> Option<SpecId> {
        find_named(&self.outputs, specs, name)
    }

    pub fn param_named(&self, specs: &SpecTable, name: &str) -> Option<SpecId> {
        find_named(&self.params, specs, name)
    }

    pub fn input_named(&self, specs: &SpecTable, name: &str) -> Option<SpecId> {
        find_named(&self.inputs, specs, name)
    }

    /// Reserved dot-parameters (`.cpus`, `.submitter`, ...), passed through
    /// for downstream components to interpret as execution hints.
    pub fn dot_params<'a>(&'a self, specs: &'a SpecTable) -> impl Iterator<Item = SpecId> + 'a {
        self.params
            .iter()
            .copied()
            .filter(|id| specs.get(*id).name.starts_with('.'))
    }
}

fn find_named(ids: &[SpecId], specs: &SpecTable, name: &str) -> Option<SpecId> {
    ids.iter().copied().find(|id| specs.get(*id).name == name)
}
