pub mod draft;
pub mod field_path;
pub mod payload;
pub mod responses;
