use util::{HashMap, IdVec};

use crate::{BranchId, BranchPointId, Error, BASELINE_NAME, REALIZATION_DELIM};

/// The canonical branch point used for specs with no branch-point wrapping.
pub const BASELINE_POINT: BranchPointId = BranchPointId(0);
/// The canonical branch of [`BASELINE_POINT`].
pub const BASELINE_BRANCH: BranchId = BranchId(0);

#[derive(Debug)]
struct BranchPointData {
    name: String,
    branches: Vec<BranchId>,
}

#[derive(Debug)]
struct BranchData {
    name: String,
    point: BranchPointId,
}

/// Owning container for all branch points and branches in a workflow.
///
/// A branch is identified by (name, owning branch point); both directions of
/// that relationship live here, so `Branch` values elsewhere are just ids.
/// The canonical `Baseline`/`baseline` pair is seeded at construction and
/// compared by id, never by string.
#[derive(Debug)]
pub struct BranchRegistry {
    points: IdVec<BranchPointId, BranchPointData>,
    branches: IdVec<BranchId, BranchData>,
    points_by_name: HashMap<String, BranchPointId>,
}

impl Default for BranchRegistry {
    fn default() -> Self {
        let mut reg = Self {
            points: IdVec::with_capacity(8),
            branches: IdVec::with_capacity(16),
            points_by_name: HashMap::default(),
        };
        let baseline = reg.points.push(BranchPointData {
            name: "Baseline".to_owned(),
            branches: vec![BASELINE_BRANCH],
        });
        debug_assert_eq!(baseline, BASELINE_POINT);
        let branch = reg.branches.push(BranchData {
            name: BASELINE_NAME.to_owned(),
            point: BASELINE_POINT,
        });
        debug_assert_eq!(branch, BASELINE_BRANCH);
        reg.points_by_name.insert("Baseline".to_owned(), baseline);
        reg
    }
}

impl BranchRegistry {
    /// Declare a branch point with the given branch names, deduplicating by
    /// name. A redeclaration must expose the identical set of branch names.
    pub fn declare_point(
        &mut self,
        name: &str,
        branch_names: &[&str],
    ) -> Result<BranchPointId, Error> {
        if let Some(point) = self.points_by_name.get(name) {
            let point = *point;
            let mut prev: Vec<&str> =
                self.points.get(point).branches.iter().map(|b| self.branch_name(*b)).collect();
            let mut cur: Vec<&str> = branch_names.to_vec();
            prev.sort_unstable();
            cur.sort_unstable();
            if prev != cur {
                return Err(Error::BranchPointRedeclarationMismatch {
                    name: name.to_owned(),
                    prev: prev.join(" "),
                    cur: cur.join(" "),
                });
            }
            return Ok(point);
        }

        let point = self.points.push(BranchPointData {
            name: name.to_owned(),
            branches: Vec::with_capacity(branch_names.len()),
        });
        self.points_by_name.insert(name.to_owned(), point);
        for branch_name in branch_names {
            let branch = self.branches.push(BranchData {
                name: (*branch_name).to_owned(),
                point,
            });
            self.points.get_mut(point).branches.push(branch);
        }
        Ok(point)
    }

    /// Look up a branch point by name.
    pub fn point_named(&self, name: &str) -> Option<BranchPointId> {
        self.points_by_name.get(name).copied()
    }

    /// Look up a branch by name within a branch point.
    pub fn branch_id(&self, point: BranchPointId, name: &str) -> Option<BranchId> {
        self.points
            .get(point)
            .branches
            .iter()
            .copied()
            .find(|b| self.branch_name(*b) == name)
    }

    /// Branches of a point, in declaration order.
    pub fn branches_of(&self, point: BranchPointId) -> &[BranchId] {
        &self.points.get(point).branches
    }

    pub fn point_name(&self, point: BranchPointId) -> &str {
        &self.points.get(point).name
    }

    pub fn branch_name(&self, branch: BranchId) -> &str {
        &self.branches.get(branch).name
    }

    /// The branch point a branch belongs to.
    pub fn point_of(&self, branch: BranchId) -> BranchPointId {
        self.branches.get(branch).point
    }

    /// True for the canonical baseline branch (by id, not by name).
    pub fn is_baseline(&self, branch: BranchId) -> bool {
        branch == BASELINE_BRANCH
    }

    /// Number of branch points, the canonical one included.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}

/// An assignment of one branch per branch point.
///
/// Entries are kept sorted by branch point id, so equal assignments compare
/// and hash equal regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Realization {
    branches: Vec<(BranchPointId, BranchId)>,
}

impl Realization {
    /// Set the branch for a branch point, replacing any existing entry.
    pub fn insert(&mut self, point: BranchPointId, branch: BranchId) {
        match self.branches.binary_search_by_key(&point, |(p, _)| *p) {
            Ok(i) => self.branches[i].1 = branch,
            Err(i) => self.branches.insert(i, (point, branch)),
        }
    }

    pub fn get(&self, point: BranchPointId) -> Option<BranchId> {
        self.branches
            .binary_search_by_key(&point, |(p, _)| *p)
            .ok()
            .map(|i| self.branches[i].1)
    }

    pub fn covers(&self, point: BranchPointId) -> bool {
        self.get(point).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BranchPointId, BranchId)> + '_ {
        self.branches.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Combine two assignments; `None` if they disagree on any shared
    /// branch point. This is the consistency filter used during unpacking.
    pub fn merged(&self, other: &Self) -> Option<Self> {
        let mut out = self.clone();
        for (point, branch) in other.iter() {
            match out.get(point) {
                Some(existing) if existing != branch => return None,
                Some(_) => {}
                None => out.insert(point, branch),
            }
        }
        Some(out)
    }

    /// Canonical user-visible name: branch names sorted by branch-point
    /// name, joined with `-`. Baseline branches are omitted; if nothing
    /// remains the name is `baseline`.
    pub fn name(&self, reg: &BranchRegistry) -> String {
        let mut parts: Vec<(&str, &str)> = self
            .branches
            .iter()
            .filter(|(_, b)| !reg.is_baseline(*b))
            .map(|(p, b)| (reg.point_name(*p), reg.branch_name(*b)))
            .collect();
        if parts.is_empty() {
            return BASELINE_NAME.to_owned();
        }
        parts.sort_by(|a, b| a.0.cmp(b.0));
        let mut out = String::with_capacity(parts.len() * 8);
        for (i, (_, branch)) in parts.iter().enumerate() {
            if i > 0 {
                out.push(REALIZATION_DELIM);
            }
            out.push_str(branch);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sized_registry() -> (BranchRegistry, BranchPointId) {
        let mut reg = BranchRegistry::default();
        let size = reg.declare_point("Size", &["small", "large"]).unwrap();
        (reg, size)
    }

    #[test]
    fn test_baseline_is_seeded() {
        let reg = BranchRegistry::default();
        assert_eq!(reg.point_name(BASELINE_POINT), "Baseline");
        assert_eq!(reg.branch_name(BASELINE_BRANCH), BASELINE_NAME);
        assert!(reg.is_baseline(BASELINE_BRANCH));
    }

    #[test]
    fn test_redeclaration_must_match() {
        let (mut reg, size) = sized_registry();
        // identical set, different order: fine
        assert_eq!(reg.declare_point("Size", &["large", "small"]).unwrap(), size);
        // different set: rejected
        let err = reg.declare_point("Size", &["small", "huge"]).unwrap_err();
        assert!(matches!(
            err,
            Error::BranchPointRedeclarationMismatch { .. }
        ));
    }

    #[test]
    fn test_branch_named_baseline_is_not_canonical() {
        let mut reg = BranchRegistry::default();
        let point = reg.declare_point("Mode", &["baseline", "fancy"]).unwrap();
        let b = reg.branch_id(point, "baseline").unwrap();
        assert!(!reg.is_baseline(b));
    }

    #[test]
    fn test_realization_name() {
        let (mut reg, size) = sized_registry();
        let mem = reg.declare_point("Mem", &["2gb"]).unwrap();

        let mut real = Realization::default();
        assert_eq!(real.name(&reg), "baseline");

        real.insert(BASELINE_POINT, BASELINE_BRANCH);
        assert_eq!(real.name(&reg), "baseline");

        real.insert(size, reg.branch_id(size, "small").unwrap());
        assert_eq!(real.name(&reg), "small");

        real.insert(mem, reg.branch_id(mem, "2gb").unwrap());
        // sorted by branch point name: Mem < Size
        assert_eq!(real.name(&reg), "2gb-small");
    }

    #[test]
    fn test_merged_consistency() {
        let (mut reg, size) = sized_registry();
        let small = reg.branch_id(size, "small").unwrap();
        let large = reg.branch_id(size, "large").unwrap();
        let mem = reg.declare_point("Mem", &["2gb"]).unwrap();
        let two_gb = reg.branch_id(mem, "2gb").unwrap();

        let mut a = Realization::default();
        a.insert(size, small);
        let mut b = Realization::default();
        b.insert(mem, two_gb);
        let merged = a.merged(&b).unwrap();
        assert_eq!(merged.get(size), Some(small));
        assert_eq!(merged.get(mem), Some(two_gb));

        let mut conflicting = Realization::default();
        conflicting.insert(size, large);
        assert!(a.merged(&conflicting).is_none());
    }
}
