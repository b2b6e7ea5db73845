//! Conditional execution state.

use super::error::{InterpreterError, InterpreterErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BranchFrame {
    /// Whether the currently selected arm of this frame runs.
    taken: bool,
    /// The frame was opened inside a branch that was not executing, so
    /// neither of its arms can run.
    skipped: bool,
    seen_else: bool,
}

/// Stack of open IF/NOTIF frames.
///
/// Execution is enabled only while every open frame has its current arm
/// taken. The count of frames that are not taken is kept alongside so the
/// check is constant time.
#[derive(Debug, Default)]
pub struct BranchStack {
    frames: Vec<BranchFrame>,
    not_taken: usize,
}

fn unbalanced(msg: &str) -> InterpreterError {
    InterpreterError::new(InterpreterErrorCode::UnbalancedConditional, msg)
}

impl BranchStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_executing(&self) -> bool {
        self.not_taken == 0
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Open a frame whose first arm runs when `cond` holds.
    pub fn push_if(&mut self, cond: bool) {
        self.push(BranchFrame {
            taken: cond,
            skipped: false,
            seen_else: false,
        });
    }

    /// Open a frame inside a branch that is not executing.
    pub fn push_skipped(&mut self) {
        self.push(BranchFrame {
            taken: false,
            skipped: true,
            seen_else: false,
        });
    }

    fn push(&mut self, frame: BranchFrame) {
        if !frame.taken {
            self.not_taken += 1;
        }
        self.frames.push(frame);
    }

    /// Switch the innermost frame to its ELSE arm. A frame accepts one ELSE.
    pub fn toggle_else(&mut self) -> Result<(), InterpreterError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| unbalanced("encountered opcode OP_ELSE with no matching opcode to begin conditional execution"))?;
        if frame.seen_else {
            return Err(unbalanced(
                "encountered opcode OP_ELSE after another OP_ELSE in the same conditional",
            ));
        }
        frame.seen_else = true;
        if frame.skipped {
            return Ok(());
        }
        if frame.taken {
            self.not_taken += 1;
        } else {
            self.not_taken -= 1;
        }
        frame.taken = !frame.taken;
        Ok(())
    }

    /// Close the innermost frame.
    pub fn pop_endif(&mut self) -> Result<(), InterpreterError> {
        let frame = self.frames.pop().ok_or_else(|| {
            unbalanced("encountered opcode OP_ENDIF with no matching opcode to begin conditional execution")
        })?;
        if !frame.taken {
            self.not_taken -= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_else_endif() {
        let mut b = BranchStack::new();
        assert!(b.is_executing());
        b.push_if(false);
        assert!(!b.is_executing());
        b.toggle_else().unwrap();
        assert!(b.is_executing());
        b.pop_endif().unwrap();
        assert!(b.is_executing());
        assert!(b.is_empty());
    }

    #[test]
    fn test_nested_skipped_frame_stays_off() {
        let mut b = BranchStack::new();
        b.push_if(false);
        b.push_skipped();
        b.toggle_else().unwrap();
        assert!(!b.is_executing());
        b.pop_endif().unwrap();
        assert!(!b.is_executing());
        b.toggle_else().unwrap();
        assert!(b.is_executing());
        b.pop_endif().unwrap();
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn test_unbalanced() {
        let mut b = BranchStack::new();
        assert_eq!(
            b.toggle_else().unwrap_err().code,
            InterpreterErrorCode::UnbalancedConditional
        );
        assert_eq!(
            b.pop_endif().unwrap_err().code,
            InterpreterErrorCode::UnbalancedConditional
        );

        b.push_if(true);
        b.toggle_else().unwrap();
        assert_eq!(
            b.toggle_else().unwrap_err().code,
            InterpreterErrorCode::UnbalancedConditional
        );
    }
}
