pub mod chart_animation;
pub mod reveal;
