pub mod asset;
pub mod composition;
pub mod keyframe;
pub mod layer;
pub mod model;
pub mod project;
