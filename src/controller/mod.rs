// CONTROLLER: Steering, physics and input handling
pub mod axis;
pub mod steering;
pub mod session;
pub mod physics;
pub mod input;

pub use axis::{transition, Axis, AxisChannel, AxisState, Edge};
pub use steering::{DirectionState, SteeringSession};
pub use session::SteeringController;
pub use physics::{BallBody, PhysicsSystem};
pub use input::InputEvent;
