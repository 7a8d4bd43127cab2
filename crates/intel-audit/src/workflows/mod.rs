pub mod assessment;
pub mod intelligence;
