//! ramp-hardware
//!
//! Hardware abstraction crate that contains the GPIO pin backends, the A4988
//! stepper driver and the motion logic of the ramp. Used by the daemon.
//!
//! Public API:
//! - `gpio::OutputPin`: pin abstraction, with `gpio::SysfsPin` and `mock::MockPin`
//! - `a4988::A4988`: stepper driver
//! - `motor::WormMotor`: step counting and limits
//! - `ramp::Ramp`: angle control on top of the motor

pub mod a4988;
pub mod gpio;
pub mod mock;
pub mod motor;
pub mod ramp;

pub use a4988::{A4988Pins, A4988};
pub use gpio::{Level, OutputPin, SysfsPin, SYSFS_GPIO_ROOT};
pub use mock::{MockPin, MockPinHandle};
pub use motor::WormMotor;
pub use ramp::Ramp;
