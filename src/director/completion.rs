use crate::director::plan::{AnimationPlan, Channel};
use crate::foundation::ids::{ElementIdx, SwitchId, TimerToken};
use crate::host::AnimationHandle;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Result of feeding a signal into a [`CompletionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// Belongs to another switch, repeats an earlier signal, or arrived after completion.
    Stale,
    /// Still waiting for this many elements.
    Pending(usize),
    /// The last expected signal (or the deadline) arrived; finalize now.
    Complete,
}

/// Countdown for one switch: one completion per animated element, bounded by a deadline.
///
/// An element counts as complete once every channel started for it has ended. `Complete` is
/// reported at most once, whichever of the countdown or the deadline gets there first.
#[derive(Debug)]
pub(crate) struct CompletionTracker {
    switch: SwitchId,
    deadline: TimerToken,
    outstanding: HashMap<ElementIdx, SmallVec<[Channel; 4]>>,
    shape_only: HashSet<ElementIdx>,
    expected: usize,
    done: bool,
}

impl CompletionTracker {
    pub(crate) fn new(switch: SwitchId, plan: &AnimationPlan, deadline: TimerToken) -> Self {
        let outstanding: HashMap<_, SmallVec<[Channel; 4]>> = plan
            .elements
            .iter()
            .map(|e| (e.element, e.channels.iter().map(|c| c.channel()).collect()))
            .collect();
        Self {
            switch,
            deadline,
            expected: outstanding.len(),
            shape_only: plan.shape_only().collect(),
            outstanding,
            done: false,
        }
    }

    pub(crate) fn switch(&self) -> SwitchId {
        self.switch
    }

    pub(crate) fn deadline(&self) -> TimerToken {
        self.deadline
    }

    pub(crate) fn expected(&self) -> usize {
        self.expected
    }

    pub(crate) fn remaining(&self) -> usize {
        self.outstanding.len()
    }

    /// Outstanding elements whose only animation is the shape-scale channel.
    pub(crate) fn remaining_shape_only(&self) -> usize {
        self.outstanding
            .keys()
            .filter(|e| self.shape_only.contains(e))
            .count()
    }

    pub(crate) fn signal(&mut self, handle: AnimationHandle) -> Progress {
        if self.done || handle.switch != self.switch {
            return Progress::Stale;
        }
        let Some(channels) = self.outstanding.get_mut(&handle.element) else {
            return Progress::Stale;
        };
        let Some(pos) = channels.iter().position(|c| *c == handle.channel) else {
            return Progress::Stale;
        };
        channels.swap_remove(pos);
        if channels.is_empty() {
            self.outstanding.remove(&handle.element);
        }
        if self.outstanding.is_empty() {
            self.done = true;
            Progress::Complete
        } else {
            Progress::Pending(self.outstanding.len())
        }
    }

    pub(crate) fn expire(&mut self, token: TimerToken) -> Progress {
        if self.done || token != self.deadline {
            return Progress::Stale;
        }
        self.done = true;
        Progress::Complete
    }
}

#[cfg(test)]
#[path = "../../tests/unit/director/completion.rs"]
mod tests;
