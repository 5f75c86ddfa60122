pub mod grade;
pub mod utils;
