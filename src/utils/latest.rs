use std::cell::Cell;

/// Issues request tickets so only the most recent request may publish its result.
#[derive(Debug, Default)]
pub struct Latest {
    current: Cell<u64>,
}

/// Proof of having issued a request; compare with [`Latest::is_current`] when the result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Latest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every ticket issued before.
    pub fn issue(&self) -> Ticket {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        Ticket(next)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.get() == ticket.0
    }

    /// Supersedes all outstanding tickets without starting a request.
    pub fn cancel(&self) {
        self.issue();
    }
}
