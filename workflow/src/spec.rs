use syntax::ast;
use util::IdVec;

use crate::{BranchId, BranchPointId, BranchRegistry, Error, SpecId};

/// A compiled right-hand side. Branch-point children are flattened into the
/// spec arena, so every nested spec has its own [`SpecId`].
#[derive(Debug)]
pub enum Rval {
    Unbound,
    Literal(String),
    Variable { task: String, output: String },
    BranchPoint {
        point: BranchPointId,
        vals: Vec<(BranchId, SpecId)>,
    },
}

/// A compiled spec: one named slot and its value.
#[derive(Debug)]
pub struct Spec {
    pub name: String,
    pub rval: Rval,
    pub pos: ast::Pos,
}

/// Arena owning every compiled spec in the workflow.
#[derive(Debug, Default)]
pub struct SpecTable {
    specs: IdVec<SpecId, Spec>,
}

impl SpecTable {
    #[inline]
    pub fn get(&self, id: SpecId) -> &Spec {
        self.specs.get(id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Compile an ast spec into the arena, registering any branch point it
    /// declares, and return the id of the root spec.
    pub fn compile(
        &mut self,
        spec: ast::Spec,
        branches: &mut BranchRegistry,
    ) -> Result<SpecId, Error> {
        let ast::Spec { name, rval, pos } = spec;
        let rval = match rval {
            ast::Rval::Unbound => Rval::Unbound,
            ast::Rval::Literal { val } => Rval::Literal(val),
            ast::Rval::Variable { task, output } => Rval::Variable { task, output },
            ast::Rval::BranchPointDef { name: bp_name, vals } => {
                let branch_names: Vec<&str> = vals.iter().map(|s| s.name.as_str()).collect();
                let point = branches.declare_point(&bp_name, &branch_names)?;
                let mut compiled = Vec::with_capacity(vals.len());
                for child in vals {
                    let branch = branches
                        .branch_id(point, &child.name)
                        .expect("branch was declared just above");
                    let child_id = self.compile(child, branches)?;
                    compiled.push((branch, child_id));
                }
                Rval::BranchPoint {
                    point,
                    vals: compiled,
                }
            }
        };
        Ok(self.specs.push(Spec { name, rval, pos }))
    }
}
