pub mod clusters;
pub mod fit;
pub mod recommend;
pub mod score;
