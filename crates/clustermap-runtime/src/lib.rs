#![forbid(unsafe_code)]

//! Clustermap runtime.
//!
//! Keeps a rendered treemap in sync with changing input:
//!
//! - [`reconcile`] - keyed diff of two positioned sequences into a [`RenderSet`]
//! - [`TransitionScheduler`] - animates a render set, with cancel-and-resume
//! - [`TickSource`] - injected clock ([`FixedTicks`], [`IntervalTicks`])
//! - [`DrawSession`] - owns canvas, weight mode and the last layout, and runs
//!   the layout → reconcile → schedule cycle for each draw
//! - [`SessionConfig`] - session defaults, overridable from the environment
//!
//! Everything is single-threaded: layout and reconcile are pure, and a
//! transition only moves when the caller ticks it.

pub mod config;
pub mod reconcile;
pub mod session;
pub mod tick;
pub mod transition;

pub use config::{ConfigError, SessionConfig};
pub use reconcile::{ReconcileError, RenderSet, Sequence, Update, reconcile};
pub use session::{DisplayCell, DrawSession, SessionError};
pub use tick::{FixedTicks, IntervalTicks, TickSource};
pub use transition::{
    CancelToken, Category, NodeFrame, NodeState, Transition, TransitionFrame, TransitionHandle,
    TransitionScheduler,
};
