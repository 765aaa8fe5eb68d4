//! Session state of one collector generation.
//!
//! A [`Session`] folds the lifecycle notifications of the four pumps into a
//! single phase. It is owned by the collector's control task and never
//! shared, so it carries no synchronization.

use std::fmt;

use serde::Serialize;

use crate::stream::StreamKind;

/// Phase of the collector's current session generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Disconnected,
    Connecting,
    /// Pumps started, not all subscriptions established yet.
    PartiallyUp,
    /// All four subscriptions are active.
    Online,
    /// A stream failed; the connection is closed and pumps are exiting.
    Draining,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::PartiallyUp => "partially_up",
            Self::Online => "online",
            Self::Draining => "draining",
        })
    }
}

/// Lifecycle signal sent by a pump to the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The subscription for this kind is established.
    Up(StreamKind),
    /// The pump for this kind exited.
    Down(StreamKind),
}

/// What the control task has to do after applying a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// The session just became fully healthy.
    Online,
    /// The session just started draining; close the connection.
    Drain,
}

#[derive(Debug, Clone)]
pub struct Session {
    health: [bool; 4],
    active: usize,
    phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            health: [false; 4],
            active: 0,
            phase: Phase::Disconnected,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of kinds whose subscription is currently established.
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_healthy(&self, kind: StreamKind) -> bool {
        self.health[kind.index()]
    }

    /// `Disconnected → Connecting`.
    pub fn begin_connect(&mut self) {
        self.health = [false; 4];
        self.active = 0;
        self.phase = Phase::Connecting;
    }

    /// `Connecting → PartiallyUp`, once the pumps are spawned.
    pub fn pumps_started(&mut self) {
        self.phase = Phase::PartiallyUp;
    }

    /// Fold one pump notification into the session.
    pub fn apply(&mut self, notification: Notification) -> Transition {
        let transition = match notification {
            Notification::Up(kind) => {
                let slot = &mut self.health[kind.index()];
                if !*slot {
                    *slot = true;
                    self.active += 1;
                }
                if self.phase == Phase::PartiallyUp && self.active == StreamKind::ALL.len() {
                    self.phase = Phase::Online;
                    Transition::Online
                } else {
                    Transition::None
                }
            }
            Notification::Down(kind) => {
                let slot = &mut self.health[kind.index()];
                if *slot {
                    *slot = false;
                    self.active -= 1;
                }
                match self.phase {
                    Phase::PartiallyUp | Phase::Online => {
                        self.phase = Phase::Draining;
                        Transition::Drain
                    }
                    _ => Transition::None,
                }
            }
        };
        debug_assert_eq!(
            self.active,
            self.health.iter().filter(|up| **up).count(),
            "active count out of sync with stream health"
        );
        transition
    }

    /// End of generation: every pump has exited.
    pub fn finish(&mut self) {
        debug_assert_eq!(self.active, 0, "generation ended with live streams");
        self.health = [false; 4];
        self.active = 0;
        self.phase = Phase::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Session {
        let mut s = Session::new();
        s.begin_connect();
        s.pumps_started();
        s
    }

    fn all_notifications() -> Vec<Notification> {
        StreamKind::ALL
            .iter()
            .flat_map(|k| [Notification::Up(*k), Notification::Down(*k)])
            .collect()
    }

    #[test]
    fn online_only_when_all_four_up() {
        let mut s = started();
        for (i, kind) in StreamKind::ALL.iter().enumerate() {
            let t = s.apply(Notification::Up(*kind));
            if i < 3 {
                assert_eq!(t, Transition::None);
                assert_eq!(s.phase(), Phase::PartiallyUp);
            } else {
                assert_eq!(t, Transition::Online);
                assert_eq!(s.phase(), Phase::Online);
            }
        }
        assert_eq!(s.active_count(), 4);
    }

    #[test]
    fn down_while_online_drains() {
        let mut s = started();
        for kind in StreamKind::ALL {
            s.apply(Notification::Up(kind));
        }
        assert_eq!(s.apply(Notification::Down(StreamKind::GlobalState)), Transition::Drain);
        assert_eq!(s.phase(), Phase::Draining);
        assert_eq!(s.active_count(), 3);

        // remaining pumps exit; no second drain
        for kind in [StreamKind::SyncStatus, StreamKind::MeshLayer, StreamKind::NodeError] {
            assert_eq!(s.apply(Notification::Down(kind)), Transition::None);
        }
        assert_eq!(s.active_count(), 0);
        s.finish();
        assert_eq!(s.phase(), Phase::Disconnected);
    }

    #[test]
    fn failure_before_online_drains_directly() {
        let mut s = started();
        s.apply(Notification::Up(StreamKind::SyncStatus));
        assert_eq!(s.apply(Notification::Down(StreamKind::MeshLayer)), Transition::Drain);
        assert_eq!(s.phase(), Phase::Draining);
        // the failed pump never subscribed, so the count is untouched
        assert_eq!(s.active_count(), 1);
    }

    #[test]
    fn late_up_while_draining_never_goes_online() {
        let mut s = started();
        for kind in &StreamKind::ALL[..3] {
            s.apply(Notification::Up(*kind));
        }
        s.apply(Notification::Down(StreamKind::SyncStatus));
        s.apply(Notification::Up(StreamKind::NodeError));
        s.apply(Notification::Up(StreamKind::SyncStatus));
        assert_eq!(s.active_count(), 4);
        assert_eq!(s.phase(), Phase::Draining);
    }

    #[test]
    fn duplicate_up_is_counted_once() {
        let mut s = started();
        s.apply(Notification::Up(StreamKind::MeshLayer));
        s.apply(Notification::Up(StreamKind::MeshLayer));
        assert_eq!(s.active_count(), 1);
    }

    /// Exhaustively replays every notification sequence up to length 5 and
    /// checks the count and phase invariants after each step.
    #[test]
    fn invariants_hold_for_every_short_sequence() {
        let alphabet = all_notifications();
        let n = alphabet.len();
        let max_len = 5u32;

        for len in 1..=max_len {
            for mut code in 0..n.pow(len) {
                let mut s = started();
                let mut expected = [false; 4];
                let mut drained = false;

                for _ in 0..len {
                    let note = alphabet[code % n];
                    code /= n;

                    let before = s.phase();
                    let t = s.apply(note);
                    match note {
                        Notification::Up(k) => expected[k.index()] = true,
                        Notification::Down(k) => {
                            expected[k.index()] = false;
                            if !drained {
                                assert_eq!(t, Transition::Drain);
                            }
                            drained = true;
                        }
                    }

                    let healthy = expected.iter().filter(|u| **u).count();
                    assert_eq!(s.active_count(), healthy);
                    for kind in StreamKind::ALL {
                        assert_eq!(s.is_healthy(kind), expected[kind.index()]);
                    }
                    if drained {
                        assert_eq!(s.phase(), Phase::Draining);
                    } else {
                        assert_eq!(s.phase() == Phase::Online, healthy == 4);
                    }
                    if before == Phase::Draining {
                        assert_ne!(t, Transition::Online);
                    }
                }
            }
        }
    }
}
