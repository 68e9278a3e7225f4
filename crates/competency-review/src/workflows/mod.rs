pub mod assessment;
pub mod import;
