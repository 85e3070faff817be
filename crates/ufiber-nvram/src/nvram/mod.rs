pub mod hl;
pub mod ll;
