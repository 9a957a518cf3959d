use minifb::Key;

/// One program-visible input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A pad key 0x0..=0xF went down.
    Pressed(u8),
    /// The frontend wants the run to end.
    Quit,
    /// Nothing the program can see happened.
    Idle,
}

/// Input collaborator: the 16-key hex pad.
pub trait Keypad {
    /// Is the pad key numbered `key` currently held?
    fn is_key_down(&self, key: u8) -> bool;

    /// Drain one pending event. Never blocks; returns [`KeyEvent::Idle`]
    /// when the queue is empty.
    fn poll_events(&mut self) -> KeyEvent;
}

/// Host key for each pad number. The 4x4 pad
///
/// ```text
/// 1 2 3 C
/// 4 5 6 D
/// 7 8 9 E
/// A 0 B F
/// ```
///
/// maps onto the left-hand block of a qwerty board, 1234/qwer/asdf/zxcv.
pub const KEYMAP: [Key; 16] = [
    Key::X,    // 0
    Key::Key1, // 1
    Key::Key2, // 2
    Key::Key3, // 3
    Key::Q,    // 4
    Key::W,    // 5
    Key::E,    // 6
    Key::A,    // 7
    Key::S,    // 8
    Key::D,    // 9
    Key::Z,    // A
    Key::C,    // B
    Key::Key4, // C
    Key::R,    // D
    Key::F,    // E
    Key::V,    // F
];

/// Pad number for a host key, if it is on the pad at all.
pub fn key_number(key: Key) -> Option<u8> {
    KEYMAP.iter().position(|&k| k == key).map(|n| n as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keymap_round_trips() {
        for n in 0..16u8 {
            assert_eq!(key_number(KEYMAP[n as usize]), Some(n));
        }
    }

    #[test]
    fn keys_off_the_pad_map_to_nothing() {
        assert_eq!(key_number(Key::Space), None);
        assert_eq!(key_number(Key::Key5), None);
    }
}
