use crate::model::Ms;

pub const MAX_ROLE_LABEL_LEN: usize = 256;
pub const MAX_ASSIGNMENTS_PER_ENGINEER: usize = 10_000;
pub const MAX_ALLOCATION_PERCENT: u32 = 100;

/// Widest window a capacity query may cover (~100 years).
pub const MAX_QUERY_WINDOW_MS: Ms = 100 * 366 * 24 * 3_600_000;
