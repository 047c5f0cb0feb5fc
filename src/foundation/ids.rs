use serde::Serialize;

/// Dense index of an element inside a [`crate::RenderTree`] arena (pre-order allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementIdx(pub(crate) u32);

impl ElementIdx {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a variant group, in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupIdx(pub(crate) u32);

impl GroupIdx {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies one smart switch from start to finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SwitchId(pub(crate) u64);

impl SwitchId {
    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Token handed to the host when scheduling a timer; echoed back when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerToken(pub(crate) u64);

impl TimerToken {
    /// Raw value, for hosts that key their timer tables by integer.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Allocator for switch ids and timer tokens; both are unique for the lifetime of an engine.
#[derive(Debug, Default)]
pub(crate) struct IdGen {
    next_switch: u64,
    next_timer: u64,
}

impl IdGen {
    pub(crate) fn switch(&mut self) -> SwitchId {
        self.next_switch += 1;
        SwitchId(self.next_switch)
    }

    pub(crate) fn timer(&mut self) -> TimerToken {
        self.next_timer += 1;
        TimerToken(self.next_timer)
    }
}
