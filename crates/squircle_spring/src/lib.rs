//! Squircle Spring
//!
//! Deterministic spring physics for driving UI values such as corner radii.
//!
//! # Features
//!
//! - **Manual springs**: [`NumberSpring`] advances only when told to, so frames
//!   can be precomputed while targets still change at any point
//! - **Sub-stepped integration**: 1ms sub-steps catch mid-frame overshoots
//! - **Settle time shortcut**: long time jumps snap straight to rest
//! - **Driven springs**: [`AutoNumberSpring`] runs itself off a frame source
//!   and stops when it comes to rest
//! - **Observable**: value reads and writes are reported to a [`ChangeObserver`]
//!
//! # Example
//!
//! ```rust
//! use squircle_spring::{NumberSpring, SpringConfigInput};
//!
//! let config = SpringConfigInput::new().with_stiffness(450.0).with_damping(30.0);
//! let mut spring = NumberSpring::new(0.0, &config).unwrap();
//!
//! spring.set_target_value(50.0).unwrap();
//! while !spring.is_at_rest() {
//!     spring.advance_time_by(16.0).unwrap();
//! }
//!
//! assert_eq!(spring.value(), 50.0);
//! ```

pub mod auto_spring;
pub mod config;
pub mod error;
pub mod frame;
pub mod number_spring;
pub mod observer;
pub mod step;
pub mod target;

pub use auto_spring::{AutoNumberSpring, MAX_FRAMES_WITHOUT_REST};
pub use config::{SpringConfig, SpringConfigInput};
pub use error::{Result, SpringError};
pub use frame::{FrameSource, IntervalFrames};
pub use number_spring::NumberSpring;
pub use observer::{ChangeCounter, ChangeObserver, NoopObserver};
pub use step::{spring_settle_time, step_once, step_spring, StepParams};
pub use target::TargetRange;
