//! Wi-Fi link state shared between the async link loop and the UI loop.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ConnectivityState {
    Disconnected = 0,
    Connecting = 1,
    LinkUpNoIp = 2,
    Connected = 3,
}

impl ConnectivityState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::LinkUpNoIp,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Station credentials baked in at build time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiConfig {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectivitySnapshot {
    pub state: ConnectivityState,
    pub link_up: bool,
    pub has_ipv4: bool,
    /// Bumped on every change so the UI loop can react once.
    pub revision: u32,
}

impl ConnectivitySnapshot {
    /// Link up with an IPv4 address.
    pub const fn online(self) -> bool {
        self.link_up && self.has_ipv4
    }
}

/// Lock-free shared connectivity status.
#[derive(Debug)]
pub struct ConnectivityHandle {
    state: AtomicU8,
    link_up: AtomicBool,
    has_ipv4: AtomicBool,
    revision: AtomicU32,
}

impl ConnectivityHandle {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectivityState::Disconnected as u8),
            link_up: AtomicBool::new(false),
            has_ipv4: AtomicBool::new(false),
            revision: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            state: ConnectivityState::from_raw(self.state.load(Ordering::Acquire)),
            link_up: self.link_up.load(Ordering::Acquire),
            has_ipv4: self.has_ipv4.load(Ordering::Acquire),
            revision: self.revision.load(Ordering::Acquire),
        }
    }

    pub fn mark_connecting(&self) {
        if self.store_state(ConnectivityState::Connecting) {
            self.bump_revision();
        }
    }

    pub fn mark_disconnected(&self) {
        self.update(false, false, ConnectivityState::Disconnected);
    }

    pub fn update_link_ip(&self, link_up: bool, has_ipv4: bool) {
        let state = match (link_up, has_ipv4) {
            (false, _) => ConnectivityState::Disconnected,
            (true, false) => ConnectivityState::LinkUpNoIp,
            (true, true) => ConnectivityState::Connected,
        };
        self.update(link_up, has_ipv4, state);
    }

    fn update(&self, link_up: bool, has_ipv4: bool, state: ConnectivityState) {
        let mut changed = false;
        changed |= self.link_up.swap(link_up, Ordering::AcqRel) != link_up;
        changed |= self.has_ipv4.swap(has_ipv4, Ordering::AcqRel) != has_ipv4;
        changed |= self.store_state(state);
        if changed {
            self.bump_revision();
        }
    }

    fn store_state(&self, next: ConnectivityState) -> bool {
        self.state.swap(next as u8, Ordering::AcqRel) != next as u8
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ConnectivityHandle {
    fn default() -> Self {
        Self::new()
    }
}
