pub mod delivery;
pub mod pages;
