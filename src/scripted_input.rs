use std::{fs, path::Path};

use bracket_geometry::prelude::Point;
use tracing::warn;

use crate::{
    error::{Result, SimError},
    turn::Intent,
};

/// Player intents read from a text script, one key per character.
///
/// Movement uses the vi keys (`hjkl` plus `yubn` for diagonals). `c` and `x`
/// take the next direction key to close a door or kick; `d` takes the next
/// digit to drop that slot. Blank lines and lines starting with `#` are
/// skipped.
pub struct ScriptedInput {
    script_commands: Vec<Intent>,
    current_command_index: usize,
}

#[derive(Copy, Clone)]
enum Verb {
    Close,
    Kick,
    Drop,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut script_commands = Vec::new();
        for line in text.lines() {
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }

            let mut pending: Option<Verb> = None;
            for char_code in trimmed_line.chars().filter(|c| !c.is_whitespace()) {
                let intent = match pending.take() {
                    Some(Verb::Close) => char_to_direction(char_code).map(Intent::CloseDoor),
                    Some(Verb::Kick) => char_to_direction(char_code).map(Intent::Kick),
                    Some(Verb::Drop) => char_to_slot(char_code).map(Intent::DropItem),
                    None => {
                        match char_code {
                            'c' => pending = Some(Verb::Close),
                            'x' => pending = Some(Verb::Kick),
                            'd' => pending = Some(Verb::Drop),
                            _ => {}
                        }
                        if pending.is_some() {
                            continue;
                        }
                        char_to_intent(char_code)
                    }
                };
                match intent {
                    Some(intent) => script_commands.push(intent),
                    None => warn!(key = %char_code, "unknown key in script"),
                }
            }
            if pending.is_some() {
                warn!(line = trimmed_line, "script line ends in the middle of a command");
            }
        }

        Self {
            script_commands,
            current_command_index: 0,
        }
    }

    pub fn next_intent(&mut self) -> Option<Intent> {
        let intent = self.script_commands.get(self.current_command_index).copied()?;
        self.current_command_index += 1;
        Some(intent)
    }

    pub fn remaining(&self) -> usize {
        self.script_commands.len() - self.current_command_index
    }
}

fn char_to_direction(c: char) -> Option<Point> {
    let (dx, dy) = match c {
        'h' => (-1, 0),
        'l' => (1, 0),
        'k' => (0, -1),
        'j' => (0, 1),
        'y' => (-1, -1),
        'u' => (1, -1),
        'b' => (-1, 1),
        'n' => (1, 1),
        _ => return None,
    };
    Some(Point::new(dx, dy))
}

fn char_to_slot(c: char) -> Option<usize> {
    c.to_digit(10)
        .filter(|d| *d > 0)
        .map(|d| d as usize - 1)
}

fn char_to_intent(c: char) -> Option<Intent> {
    if let Some(delta) = char_to_direction(c) {
        return Some(Intent::Move(delta));
    }
    if let Some(slot) = char_to_slot(c) {
        return Some(Intent::UseItem(slot));
    }
    match c {
        '.' => Some(Intent::Wait),
        'g' | ',' => Some(Intent::PickUp),
        '>' => Some(Intent::DescendStairs),
        // Stat choices.
        'C' => Some(Intent::ChooseStat(0)),
        'S' => Some(Intent::ChooseStat(1)),
        'A' => Some(Intent::ChooseStat(2)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_decode_in_order() {
        let mut input = ScriptedInput::parse(
            "
            # walk east, drink, then leave
            ll.g 1
            cj xh d2 >
            ",
        );
        let expected = [
            Intent::Move(Point::new(1, 0)),
            Intent::Move(Point::new(1, 0)),
            Intent::Wait,
            Intent::PickUp,
            Intent::UseItem(0),
            Intent::CloseDoor(Point::new(0, 1)),
            Intent::Kick(Point::new(-1, 0)),
            Intent::DropItem(1),
            Intent::DescendStairs,
        ];
        assert_eq!(input.remaining(), expected.len());
        for intent in expected {
            assert_eq!(input.next_intent(), Some(intent));
        }
        assert_eq!(input.next_intent(), None);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let mut input = ScriptedInput::parse("q?z c0 S");
        assert_eq!(input.next_intent(), Some(Intent::ChooseStat(1)));
        assert_eq!(input.next_intent(), None);
    }
}
