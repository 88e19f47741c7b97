// MODEL: Sensor samples, ball and plane data
pub mod sample;
pub mod ball;
pub mod plane;
pub mod camera;

pub use sample::{AccelSample, Baseline, ForceCommand};
pub use ball::BallSpec;
pub use plane::{DetectedPlane, PlaneId, PlaneMap};
pub use camera::{Camera, Ray};
