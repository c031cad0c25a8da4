//! Scratch register allocation: an ordered stack of available registers.
//!
//! The front element is always the "result register" for whatever expression is
//! currently being generated. This is deliberately simpler than a real allocator —
//! no spilling, no liveness analysis — matching the stack-of-available-resources
//! discipline the generator otherwise uses for its scope/frame bookkeeping.

use super::instr::Register;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct RegisterPool {
    available: VecDeque<Register>,
}

impl RegisterPool {
    /// `r4..=r10` are the scratch registers; `r0..=r3` are reserved for the calling
    /// convention and are never handed out by this pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: (4..=10).map(Register::R).collect(),
        }
    }

    /// Returns the register that would be used as a result register, without
    /// removing it from the pool.
    #[must_use]
    pub fn peek(&self) -> Register {
        *self
            .available
            .front()
            .expect("register pool exhausted: expression nesting exceeded available scratch registers")
    }

    /// Removes and returns the front register, for use as a second operand.
    pub fn consume(&mut self) -> Register {
        self.available
            .pop_front()
            .expect("register pool exhausted: expression nesting exceeded available scratch registers")
    }

    /// Returns a previously consumed register to the front of the pool.
    pub fn release(&mut self, reg: Register) {
        self.available.push_front(reg);
    }
}

impl Default for RegisterPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_consume() {
        let pool = RegisterPool::new();
        let first = pool.peek();
        assert_eq!(pool.peek(), first);
    }

    #[test]
    fn consume_then_release_restores_order() {
        let mut pool = RegisterPool::new();
        let head = pool.peek();
        let consumed = pool.consume();
        assert_eq!(consumed, head);
        assert_ne!(pool.peek(), head);
        pool.release(consumed);
        assert_eq!(pool.peek(), head);
    }
}
