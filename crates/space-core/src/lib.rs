pub mod clustering;
pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
