#![forbid(unsafe_code)]

//! Draw sessions.
//!
//! A [`DrawSession`] owns everything that outlives a single draw: the
//! configuration, the current weight mode and canvas, the tree being shown,
//! the last positioned sequence, and the transition scheduler. Each call to
//! [`draw`](DrawSession::draw), [`set_weight_mode`](DrawSession::set_weight_mode)
//! or [`resize`](DrawSession::resize) runs one cycle:
//!
//! ```text
//! tree + weight mode ─► layout ─► reconcile(previous) ─► schedule ─► previous := next
//! ```
//!
//! A cycle either completes or leaves the session exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use clustermap_core::geometry::{Rect, Sides};
use clustermap_layout::{LayoutError, PositionedNode, Size, TreeNode, Treemap, WeightMode};
use thiserror::Error;

use crate::config::{ConfigError, SessionConfig};
use crate::reconcile::{ReconcileError, RenderSet, reconcile};
use crate::tick::TickSource;
use crate::transition::{Category, NodeState, TransitionFrame, TransitionScheduler};

/// Failures of a draw cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A node as it should be drawn right now.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCell {
    pub node: PositionedNode,
    /// Current rectangle with the gutter removed.
    pub rect: Rect,
    /// Transition group, or `None` when nothing is animating.
    pub category: Option<Category>,
    pub state: NodeState,
}

/// Layout, diff and animation state for one rendered view.
#[derive(Debug)]
pub struct DrawSession {
    config: SessionConfig,
    tree: Option<Arc<TreeNode>>,
    nodes: Vec<PositionedNode>,
    scheduler: TransitionScheduler,
    draws: u64,
}

impl DrawSession {
    /// Create an empty session.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            scheduler: TransitionScheduler::new().easing(config.easing),
            config,
            tree: None,
            nodes: Vec::new(),
            draws: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn weight_mode(&self) -> WeightMode {
        self.config.weight_mode
    }

    pub fn canvas(&self) -> Size {
        self.config.canvas
    }

    /// The tree currently shown.
    pub fn tree(&self) -> Option<&Arc<TreeNode>> {
        self.tree.as_ref()
    }

    /// The settled layout of the current tree, in pre-order.
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    /// Number of completed draw cycles.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn scheduler(&self) -> &TransitionScheduler {
        &self.scheduler
    }

    /// Show `tree`, animating from whatever is on screen.
    ///
    /// `None` clears the view: every current node exits.
    pub fn draw(&mut self, tree: Option<Arc<TreeNode>>) -> Result<RenderSet, SessionError> {
        let mode = self.config.weight_mode;
        let canvas = self.config.canvas;
        self.cycle(tree, mode, canvas)
    }

    /// Switch weighting and re-lay-out the current tree.
    pub fn set_weight_mode(&mut self, mode: WeightMode) -> Result<RenderSet, SessionError> {
        let canvas = self.config.canvas;
        self.cycle(self.tree.clone(), mode, canvas)
    }

    /// Change the canvas and re-lay-out the current tree.
    pub fn resize(&mut self, canvas: Size) -> Result<RenderSet, SessionError> {
        let mode = self.config.weight_mode;
        self.cycle(self.tree.clone(), mode, canvas)
    }

    fn cycle(
        &mut self,
        tree: Option<Arc<TreeNode>>,
        mode: WeightMode,
        canvas: Size,
    ) -> Result<RenderSet, SessionError> {
        let _span = tracing::info_span!(
            "draw",
            draw = self.draws,
            weight_mode = %mode,
            width = canvas.width,
            height = canvas.height
        )
        .entered();

        let next = Treemap::new(canvas)
            .split_rule(self.config.split_rule)
            .rounding(self.config.rounding)
            .layout(tree.as_ref(), mode.accessor())
            .inspect_err(|err| tracing::warn!(error = %err, "layout failed"))?;
        let set = reconcile(&self.nodes, &next)?;

        self.scheduler.schedule(&set, self.config.duration);
        self.tree = tree;
        self.nodes = next;
        self.config.weight_mode = mode;
        self.config.canvas = canvas;
        self.draws += 1;

        tracing::debug!(
            nodes = self.nodes.len(),
            entering = set.entering.len(),
            updating = set.updating.len(),
            exiting = set.exiting.len(),
            "draw scheduled"
        );
        Ok(set)
    }

    /// Advance the running transition.
    pub fn tick(&mut self, dt: Duration) -> Option<TransitionFrame> {
        self.scheduler.tick(dt)
    }

    /// Stop the running transition where it is.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_active()
    }

    /// What to draw right now, gutter applied.
    ///
    /// While a transition is unfinished this is its interpolated state
    /// (removed exits omitted); otherwise the settled layout.
    pub fn frame(&self) -> Vec<DisplayCell> {
        let gutter = Sides::trailing(self.config.gutter);
        match self.scheduler.transition() {
            Some(transition) if !transition.is_finished() => transition
                .snapshot()
                .into_iter()
                .filter(|f| f.state != NodeState::Removed)
                .map(|f| DisplayCell {
                    rect: f.rect.inner(gutter),
                    category: Some(f.category),
                    state: f.state,
                    node: f.node,
                })
                .collect(),
            _ => self
                .nodes
                .iter()
                .map(|node| DisplayCell {
                    rect: node.rect.inner(gutter),
                    category: None,
                    state: NodeState::Settled,
                    node: node.clone(),
                })
                .collect(),
        }
    }

    /// Drive the running transition from `source` until it finishes, is
    /// cancelled, or the source runs dry. `sink` sees every frame.
    ///
    /// A source that yields two zero steps in a row is treated as stalled
    /// and ends the run.
    ///
    /// Returns the number of frames produced.
    pub fn run<S>(&mut self, source: &mut S, mut sink: impl FnMut(&[DisplayCell])) -> usize
    where
        S: TickSource + ?Sized,
    {
        let mut frames = 0;
        let mut idle = false;
        while self.is_animating() {
            let Some(dt) = source.next_tick() else {
                break;
            };
            if dt.is_zero() {
                if idle {
                    tracing::warn!(frames, "tick source stalled");
                    break;
                }
                idle = true;
            } else {
                idle = false;
            }
            let Some(frame) = self.tick(dt) else {
                break;
            };
            frames += 1;
            // Once final, `frame()` reports the settled layout.
            sink(&self.frame());
            if frame.is_final() {
                break;
            }
        }
        tracing::debug!(frames, "run finished");
        frames
    }
}
