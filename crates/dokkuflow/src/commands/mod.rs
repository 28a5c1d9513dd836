pub mod apply;
pub mod destroy;
pub mod plan;
pub mod probe;
pub mod refresh;
pub mod validate;
