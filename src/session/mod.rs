//! # Session
//!
//! Turns a caller's [`SessionRequest`] into one immutable [`ValidatedSession`] and
//! derives the per-run [`FrameSchedule`] from it.
//!
//! ```rust
//! use framesmith::session::{SessionRequest, SessionValidator};
//!
//! let request = SessionRequest {
//!     seconds: 1.0,
//!     fps: 10.0,
//!     duplication_factor: 3,
//!     ..SessionRequest::default()
//! };
//! let session = SessionValidator::new().validate(&request).unwrap();
//!
//! let repeats: Vec<u32> = session.schedule().map(|step| step.repeat).collect();
//! assert_eq!(repeats, vec![3, 3, 3, 1]);
//! ```

pub mod schedule;
pub mod validator;

pub use schedule::{FrameSchedule, ScheduleStep};
pub use validator::{SessionRequest, SessionValidator, ValidatedSession, MAX_HEIGHT, MAX_WIDTH};
