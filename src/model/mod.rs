//! Domain records shared by every component: event templates, event
//! instances, signup records and list moves.

mod errors;
mod event;
mod signup;

pub use errors::{ConfigError, ConfigResult};
pub use event::{Determinant, Event, EventTypeConfig, GroupId};
pub use signup::{resequence, ListMove, ListType, SignupRecord};
