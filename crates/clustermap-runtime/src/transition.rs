#![forbid(unsafe_code)]

//! Animated transitions between two layouts.
//!
//! A [`Transition`] owns one track per key of a [`RenderSet`]. Each track
//! interpolates from a start rectangle to an end rectangle as the shared
//! [`Progress`] clock advances:
//!
//! | category   | from                          | to                      | states                       |
//! |------------|-------------------------------|-------------------------|------------------------------|
//! | `Entering` | zero-size rect at final center | final rect             | Pending → Animating → Settled |
//! | `Updating` | old rect                      | new rect                | Animating → Settled          |
//! | `Exiting`  | last known rect               | same rect, width 0      | Animating → Removed          |
//!
//! The clock only moves when [`Transition::tick`] is called; the caller owns
//! time. At completion every track sits exactly on its end rectangle and the
//! frame lists each exiting key once in [`TransitionFrame::removed`]. Ticks
//! after completion or cancellation return `None`.
//!
//! # Interruption
//!
//! [`TransitionScheduler::schedule`] cancels any transition in flight. Keys
//! of the new set start from their current interpolated rectangle instead of
//! their nominal start, and exiting tracks of the cancelled transition that
//! the new set does not mention keep shrinking from where they are, so their
//! removal still fires exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clustermap_core::animation::{Animation, EasingFn, Progress, linear};
use clustermap_core::geometry::Rect;
use clustermap_layout::{NodeKey, PositionedNode};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::reconcile::RenderSet;

/// Which reconciliation group a track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Entering,
    Updating,
    Exiting,
}

/// Lifecycle state of one animated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Entering node before the first tick.
    Pending,
    Animating,
    /// Entering or updating node at its final rectangle.
    Settled,
    /// Exiting node whose shrink has finished.
    Removed,
}

/// Shared cancellation flag for a transition.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the transition; later ticks return `None`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Caller-side handle to a scheduled transition.
#[derive(Debug, Clone)]
pub struct TransitionHandle {
    id: u64,
    token: CancelToken,
}

impl TransitionHandle {
    /// Sequence number of the transition, unique per scheduler.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// One node at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFrame {
    /// The node being drawn: the new state for entering/updating nodes,
    /// the last known state for exiting ones.
    pub node: PositionedNode,
    /// Interpolated rectangle.
    pub rect: Rect,
    pub category: Category,
    pub state: NodeState,
}

impl NodeFrame {
    pub fn key(&self) -> &NodeKey {
        &self.node.key
    }
}

/// Output of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFrame {
    pub nodes: Vec<NodeFrame>,
    /// Exiting keys whose removal completed on this tick.
    pub removed: Vec<NodeKey>,
    /// Linear progress in [0, 1].
    pub progress: f64,
}

impl TransitionFrame {
    /// Whether this is the last frame of its transition.
    pub fn is_final(&self) -> bool {
        self.progress >= 1.0
    }
}

#[derive(Debug, Clone)]
struct Track {
    node: PositionedNode,
    category: Category,
    from: Rect,
    to: Rect,
}

impl Track {
    fn rect_at(&self, t: f64) -> Rect {
        self.from.lerp(&self.to, t)
    }
}

/// A running transition.
#[derive(Debug)]
pub struct Transition {
    id: u64,
    clock: Progress,
    tracks: Vec<Track>,
    token: CancelToken,
    started: bool,
    finished: bool,
}

impl Transition {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Linear progress in [0, 1], before easing.
    pub fn progress(&self) -> f64 {
        self.clock.raw()
    }

    pub fn duration(&self) -> Duration {
        self.clock.duration()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the final frame has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Neither finished nor cancelled.
    pub fn is_running(&self) -> bool {
        !self.finished && !self.is_cancelled()
    }

    /// Number of animated keys.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Advance by `dt` and return the resulting frame.
    ///
    /// Returns `None` once the transition has finished or been cancelled.
    pub fn tick(&mut self, dt: Duration) -> Option<TransitionFrame> {
        if !self.is_running() {
            return None;
        }
        self.started = true;
        self.clock.tick(dt);

        let complete = self.clock.is_complete();
        let removed = if complete {
            self.tracks
                .iter()
                .filter(|t| t.category == Category::Exiting)
                .map(|t| t.node.key.clone())
                .collect()
        } else {
            Vec::new()
        };
        if complete {
            self.finished = true;
            tracing::debug!(
                id = self.id,
                removed = removed.len(),
                overshoot_us = self.clock.overshoot().as_micros() as u64,
                "transition complete"
            );
        }

        Some(TransitionFrame {
            nodes: self.nodes(),
            removed,
            progress: self.clock.raw(),
        })
    }

    /// Current per-node state without advancing the clock.
    pub fn snapshot(&self) -> Vec<NodeFrame> {
        self.nodes()
    }

    fn nodes(&self) -> Vec<NodeFrame> {
        let t = self.clock.value();
        let complete = self.clock.is_complete();
        self.tracks
            .iter()
            .map(|track| NodeFrame {
                node: track.node.clone(),
                rect: track.rect_at(t),
                category: track.category,
                state: self.state_of(track.category, complete),
            })
            .collect()
    }

    fn state_of(&self, category: Category, complete: bool) -> NodeState {
        match (category, complete) {
            (Category::Entering, _) if !self.started => NodeState::Pending,
            (Category::Entering | Category::Updating, true) => NodeState::Settled,
            (Category::Exiting, true) => NodeState::Removed,
            (_, false) => NodeState::Animating,
        }
    }
}

/// Holds at most one transition and handles interruption.
#[derive(Debug)]
pub struct TransitionScheduler {
    active: Option<Transition>,
    easing: EasingFn,
    next_id: u64,
}

impl Default for TransitionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionScheduler {
    /// Scheduler with linear easing and nothing in flight.
    pub fn new() -> Self {
        Self {
            active: None,
            easing: linear,
            next_id: 0,
        }
    }

    /// Set the easing applied to transitions scheduled from now on.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn set_easing(&mut self, easing: EasingFn) {
        self.easing = easing;
    }

    /// Start animating `set` over `duration`, replacing any transition in flight.
    pub fn schedule(&mut self, set: &RenderSet, duration: Duration) -> TransitionHandle {
        let _span = tracing::debug_span!("schedule", keys = set.len()).entered();

        // Where each key is on screen right now, if a transition was cut short.
        let mut current: FxHashMap<NodeKey, Rect> = FxHashMap::default();
        let mut carried = Vec::new();
        if let Some(prev) = self.active.take().filter(|t| !t.is_finished()) {
            prev.cancel();
            let incoming: FxHashSet<&NodeKey> = set.keys().collect();
            for frame in prev.snapshot() {
                if frame.category == Category::Exiting && !incoming.contains(frame.key()) {
                    carried.push(exit_track(frame.node, frame.rect));
                } else {
                    current.insert(frame.node.key, frame.rect);
                }
            }
            tracing::debug!(
                cancelled = prev.id,
                progress = prev.progress(),
                resumed = current.len(),
                carried = carried.len(),
                "interrupted transition"
            );
        }

        let mut tracks = Vec::with_capacity(set.len() + carried.len());
        for node in &set.entering {
            let from = current
                .get(&node.key)
                .copied()
                .unwrap_or_else(|| node.rect.collapsed_to_center());
            tracks.push(Track {
                from,
                to: node.rect,
                category: Category::Entering,
                node: node.clone(),
            });
        }
        for update in &set.updating {
            let from = current.get(update.key()).copied().unwrap_or(update.old.rect);
            tracks.push(Track {
                from,
                to: update.new.rect,
                category: Category::Updating,
                node: update.new.clone(),
            });
        }
        for node in &set.exiting {
            let from = current.get(&node.key).copied().unwrap_or(node.rect);
            tracks.push(exit_track(node.clone(), from));
        }
        tracks.extend(carried);

        let id = self.next_id;
        self.next_id += 1;
        let token = CancelToken::new();
        tracing::debug!(
            id,
            entering = set.entering.len(),
            updating = set.updating.len(),
            exiting = set.exiting.len(),
            tracks = tracks.len(),
            duration_ms = duration.as_millis() as u64,
            "transition scheduled"
        );

        self.active = Some(Transition {
            id,
            clock: Progress::new(duration).easing(self.easing),
            tracks,
            token: token.clone(),
            started: false,
            finished: false,
        });
        TransitionHandle { id, token }
    }

    /// Advance the active transition.
    pub fn tick(&mut self, dt: Duration) -> Option<TransitionFrame> {
        self.active.as_mut()?.tick(dt)
    }

    /// Current interpolated state of the active (or last) transition.
    pub fn snapshot(&self) -> Vec<NodeFrame> {
        self.active
            .as_ref()
            .map(Transition::snapshot)
            .unwrap_or_default()
    }

    /// Progress of the active (or last) transition.
    pub fn progress(&self) -> Option<f64> {
        self.active.as_ref().map(Transition::progress)
    }

    /// Whether a transition is still producing frames.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(Transition::is_running)
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.active.as_ref()
    }

    /// Cancel the transition in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = &self.active {
            active.cancel();
        }
    }

    /// Drop any transition, in flight or finished.
    pub fn clear(&mut self) {
        self.cancel();
        self.active = None;
    }
}

fn exit_track(node: PositionedNode, from: Rect) -> Track {
    Track {
        to: from.collapsed_width(),
        from,
        category: Category::Exiting,
        node,
    }
}
