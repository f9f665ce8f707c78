//! Frame-indexed input log and temporal queries.
//!
//! Every frame commits one list of `(key, pressed)` edge events. The buffer
//! only ever grows, which makes it a complete replay record: feeding the
//! same edges back through a fresh simulation reproduces the match.
//!
//! Queries look backward a bounded number of frames and can additionally
//! require that the matched press was (or was not) followed by a release,
//! which is what buffered jumps and held-button checks are built from.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque device key identifier. The embedding layer decides what the
/// number means (scancode, gamepad button, anything stable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(pub u16);

/// The closed set of logical controls the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalKey {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Attack,
    Shield,
}

impl LogicalKey {
    pub const ALL: [LogicalKey; 7] = [
        LogicalKey::Left,
        LogicalKey::Right,
        LogicalKey::Up,
        LogicalKey::Down,
        LogicalKey::Jump,
        LogicalKey::Attack,
        LogicalKey::Shield,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogicalKey::Left => "left",
            LogicalKey::Right => "right",
            LogicalKey::Up => "up",
            LogicalKey::Down => "down",
            LogicalKey::Jump => "jump",
            LogicalKey::Attack => "attack",
            LogicalKey::Shield => "shield",
        }
    }
}

/// Resolved device keys for each logical control, fixed at fighter
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybindings {
    pub left: Key,
    pub right: Key,
    pub up: Key,
    pub down: Key,
    pub jump: Key,
    pub attack: Key,
    pub shield: Key,
}

impl Keybindings {
    /// Build bindings from a `name -> key` mapping. Every logical control
    /// must be present.
    pub fn from_map<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Key)>,
    {
        let mut resolved: [Option<Key>; 7] = [None; 7];
        for (name, key) in entries {
            if let Some(idx) = LogicalKey::ALL.iter().position(|l| l.name() == name) {
                resolved[idx] = Some(key);
            }
        }
        let take = |logical: LogicalKey| {
            resolved[LogicalKey::ALL.iter().position(|l| *l == logical).unwrap()].ok_or_else(
                || EngineError::InvalidParameter(format!("missing keybinding: {}", logical.name())),
            )
        };
        Ok(Self {
            left: take(LogicalKey::Left)?,
            right: take(LogicalKey::Right)?,
            up: take(LogicalKey::Up)?,
            down: take(LogicalKey::Down)?,
            jump: take(LogicalKey::Jump)?,
            attack: take(LogicalKey::Attack)?,
            shield: take(LogicalKey::Shield)?,
        })
    }

    #[inline]
    pub fn resolve(&self, logical: LogicalKey) -> Key {
        match logical {
            LogicalKey::Left => self.left,
            LogicalKey::Right => self.right,
            LogicalKey::Up => self.up,
            LogicalKey::Down => self.down,
            LogicalKey::Jump => self.jump,
            LogicalKey::Attack => self.attack,
            LogicalKey::Shield => self.shield,
        }
    }
}

/// One frame's worth of input edges.
pub type InputFrame = Vec<(Key, bool)>;

#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    buffer: Vec<InputFrame>,
    working: InputFrame,
    last_index: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self { buffer: vec![Vec::new()], working: Vec::new(), last_index: 0 }
    }

    /// Index of the newest committed frame.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    /// Record an edge into the working frame. Nothing is visible to queries
    /// until the frame is pushed.
    pub fn append(&mut self, key: Key, pressed: bool) {
        self.working.push((key, pressed));
    }

    /// Commit the working frame and advance the frame index.
    pub fn push(&mut self) {
        let frame = std::mem::take(&mut self.working);
        self.buffer.push(frame);
        self.last_index += 1;
    }

    /// Look for a `(key, state)` edge within the last `distance_back`
    /// frames (0 = newest committed frame only).
    ///
    /// - `and_released`: the edge must be followed by its inversion within
    ///   the window's newer side.
    /// - `not_released`: the edge must NOT be followed by its inversion.
    ///
    /// If both flags are set, `and_released` wins.
    pub fn contains(
        &self,
        key: Key,
        distance_back: usize,
        state: bool,
        and_released: bool,
        not_released: bool,
    ) -> bool {
        // A key can appear on several frames in the window; all of them are
        // candidates for the release scan.
        let mut matches: Vec<usize> = Vec::new();
        let distance_back = distance_back.min(self.last_index);

        for i in ((self.last_index - distance_back)..=self.last_index).rev() {
            if self.buffer[i].contains(&(key, state)) {
                matches.push(i);
                if !(and_released || not_released) {
                    return true;
                }
            }
        }

        if matches.is_empty() {
            return false;
        }

        for j in matches {
            for i in j..=self.last_index {
                if self.buffer[i].contains(&(key, !state)) {
                    if and_released {
                        return true;
                    }
                    if not_released {
                        return false;
                    }
                }
            }
        }

        if and_released {
            return false;
        }
        if not_released {
            return true;
        }
        false
    }

    /// Newest-first view of the last `n` committed frames, clamped to the
    /// available history (the initial empty frame is never included).
    pub fn last_n_frames(&self, n: usize) -> Vec<&InputFrame> {
        let n = n.min(self.last_index);
        let mut frames = Vec::with_capacity(n);
        for i in ((self.last_index - n + 1)..=self.last_index).rev() {
            frames.push(&self.buffer[i]);
            if frames.len() == n {
                break;
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Key = Key(10);
    const B: Key = Key(20);

    fn bindings() -> Keybindings {
        Keybindings::from_map([
            ("left", Key(1)),
            ("right", Key(2)),
            ("up", Key(3)),
            ("down", Key(4)),
            ("jump", Key(5)),
            ("attack", Key(6)),
            ("shield", Key(7)),
        ])
        .unwrap()
    }

    #[test]
    fn test_keybindings_resolve_and_missing_name() {
        let kb = bindings();
        assert_eq!(kb.resolve(LogicalKey::Jump), Key(5));
        assert_eq!(kb.resolve(LogicalKey::Left), Key(1));

        let err = Keybindings::from_map([("left", Key(1))]);
        assert!(err.is_err());
    }

    #[test]
    fn test_starts_with_one_empty_frame() {
        let buf = InputBuffer::new();
        assert_eq!(buf.last_index(), 0);
        assert!(!buf.contains(A, 0, true, false, false));
    }

    #[test]
    fn test_working_frame_invisible_until_push() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        assert!(!buf.contains(A, 0, true, false, false));
        buf.push();
        assert!(buf.contains(A, 0, true, false, false));
    }

    #[test]
    fn test_distance_back_window_and_clamp() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        buf.push(); // frame 1: press
        buf.push(); // frame 2
        buf.push(); // frame 3

        assert!(!buf.contains(A, 0, true, false, false));
        assert!(!buf.contains(A, 1, true, false, false));
        assert!(buf.contains(A, 2, true, false, false));
        // Clamped far past the start of history
        assert!(buf.contains(A, 1000, true, false, false));
    }

    #[test]
    fn test_and_released_requires_following_release() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        buf.push(); // frame 1: press
        buf.push(); // frame 2: still held

        assert!(!buf.contains(A, 2, true, true, false));

        buf.append(A, false);
        buf.push(); // frame 3: release
        assert!(buf.contains(A, 3, true, true, false));
    }

    #[test]
    fn test_not_released_rejects_released_press() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        buf.push(); // frame 1: press
        assert!(buf.contains(A, 1, true, false, true));

        buf.append(A, false);
        buf.push(); // frame 2: release
        assert!(!buf.contains(A, 2, true, false, true));
    }

    #[test]
    fn test_and_released_wins_when_both_flags_set() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        buf.push();
        buf.append(A, false);
        buf.push();

        // and_released sees the release and reports true before
        // not_released can veto.
        assert!(buf.contains(A, 2, true, true, true));
    }

    #[test]
    fn test_release_queries_with_state_false() {
        let mut buf = InputBuffer::new();
        buf.append(B, true);
        buf.push();
        buf.append(B, false);
        buf.push();

        assert!(buf.contains(B, 0, false, false, false));
        assert!(!buf.contains(B, 0, true, false, false));
        assert!(buf.contains(B, 1, true, false, false));
    }

    #[test]
    fn test_last_n_frames_newest_first() {
        let mut buf = InputBuffer::new();
        buf.append(A, true);
        buf.push(); // frame 1
        buf.append(B, true);
        buf.push(); // frame 2

        let frames = buf.last_n_frames(2);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], &vec![(B, true)]);
        assert_eq!(frames[1], &vec![(A, true)]);

        // Clamped to committed history
        let frames = buf.last_n_frames(10);
        assert_eq!(frames.len(), 2);
    }
}
