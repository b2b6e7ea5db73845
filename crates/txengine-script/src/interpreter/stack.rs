//! Script execution stack.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::scriptnum::ScriptNumber;

/// Truthiness of a stack element: any non-zero byte, except a lone sign bit
/// in the last position (negative zero).
pub fn as_bool(t: &[u8]) -> bool {
    for (i, &b) in t.iter().enumerate() {
        if b != 0 {
            return !(i == t.len() - 1 && b == 0x80);
        }
    }
    false
}

pub fn from_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

fn invalid_index(idx: usize, sz: usize) -> InterpreterError {
    InterpreterError::new(
        InterpreterErrorCode::InvalidStackOperation,
        format!("index {} is invalid for stack size {}", idx, sz),
    )
}

/// The main or alt stack. Index 0 is the top.
#[derive(Debug, Default)]
pub struct Stack {
    stk: Vec<Vec<u8>>,
    max_num_length: usize,
    verify_minimal_data: bool,
}

impl Stack {
    pub fn new(max_num_length: usize, verify_minimal_data: bool) -> Self {
        Stack {
            stk: Vec::new(),
            max_num_length,
            verify_minimal_data,
        }
    }

    pub fn depth(&self) -> usize {
        self.stk.len()
    }

    pub fn push_byte_array(&mut self, data: Vec<u8>) {
        self.stk.push(data);
    }

    pub fn push_int(&mut self, n: &ScriptNumber) {
        self.push_byte_array(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push_byte_array(from_bool(val));
    }

    pub fn pop_byte_array(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.nip_n(0)
    }

    /// Pop a number limited to the configured operand length.
    pub fn pop_int(&mut self) -> Result<ScriptNumber, InterpreterError> {
        let data = self.pop_byte_array()?;
        ScriptNumber::from_bytes(&data, self.max_num_length, self.verify_minimal_data)
    }

    pub fn pop_bool(&mut self) -> Result<bool, InterpreterError> {
        let data = self.pop_byte_array()?;
        Ok(as_bool(&data))
    }

    pub fn peek(&self, idx: usize) -> Result<&[u8], InterpreterError> {
        let sz = self.stk.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(&self.stk[sz - idx - 1])
    }

    pub fn peek_byte_array(&self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        self.peek(idx).map(<[u8]>::to_vec)
    }

    pub fn peek_int(&self, idx: usize) -> Result<ScriptNumber, InterpreterError> {
        ScriptNumber::from_bytes(self.peek(idx)?, self.max_num_length, self.verify_minimal_data)
    }

    pub fn peek_bool(&self, idx: usize) -> Result<bool, InterpreterError> {
        Ok(as_bool(self.peek(idx)?))
    }

    fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.stk.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(self.stk.remove(sz - idx - 1))
    }

    pub fn nip_n_discard(&mut self, idx: usize) -> Result<(), InterpreterError> {
        self.nip_n(idx).map(drop)
    }

    pub fn tuck(&mut self) -> Result<(), InterpreterError> {
        let so2 = self.pop_byte_array()?;
        let so1 = self.pop_byte_array()?;
        self.push_byte_array(so2.clone());
        self.push_byte_array(so1);
        self.push_byte_array(so2);
        Ok(())
    }

    pub fn drop_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        for _ in 0..n {
            self.pop_byte_array()?;
        }
        Ok(())
    }

    pub fn dup_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        for _ in 0..n {
            let so = self.peek_byte_array(n - 1)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn rot_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 3 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn swap_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn over_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.peek_byte_array(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn pick_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.peek_byte_array(n)?;
        self.push_byte_array(so);
        Ok(())
    }

    pub fn roll_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.nip_n(n)?;
        self.push_byte_array(so);
        Ok(())
    }

    /// Stack contents, bottom to top.
    pub fn items(&self) -> &[Vec<u8>] {
        &self.stk
    }

    /// Replace the contents (last element is the top).
    pub fn set_stack(&mut self, data: Vec<Vec<u8>>) {
        self.stk = data;
    }

    pub fn clear(&mut self) {
        self.stk.clear();
    }
}
