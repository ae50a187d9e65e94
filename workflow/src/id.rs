//! Ids for use in typed collections.

util::id!(TaskId, u16);
util::id!(SpecId, u32);
util::id!(BranchPointId, u8);
util::id!(BranchId, u16);
