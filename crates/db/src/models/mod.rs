//! Database row structs and their conversions into domain records.

pub mod signature;
