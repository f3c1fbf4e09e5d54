//! Interactive yes/no gate used before destructive operations.

/// Prompt shown before a todo is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this todo?";

pub trait Confirm {
    /// Block until the user answers; `true` means proceed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
