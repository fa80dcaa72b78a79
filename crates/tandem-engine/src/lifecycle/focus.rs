/// Last known window-focus transition.
///
/// Audio is only resumed once focus is not known to be lost.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[repr(i8)]
pub enum FocusState {
    /// No focus change observed yet.
    #[default]
    Unknown = -1,
    Lost = 0,
    Gained = 1,
}

impl FocusState {
    #[inline]
    pub fn from_focus(has_focus: bool) -> Self {
        if has_focus {
            FocusState::Gained
        } else {
            FocusState::Lost
        }
    }

    /// Platform encoding: `-1` unknown, `0` lost, `1` gained.
    #[inline]
    pub fn as_raw(self) -> i8 {
        self as i8
    }

    /// Whether deferred audio may start now.
    #[inline]
    pub fn allows_audio(self) -> bool {
        self != FocusState::Lost
    }
}
