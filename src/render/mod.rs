pub mod compositor;
pub mod throttle;
