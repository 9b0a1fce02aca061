//! Per-process jitter seed
//!
//! Concurrent gdpath processes that hit the same rate limit must not retry in
//! lockstep. The seed spreads them over ten one-second slots using the
//! distance between the process ID and its process-group ID: siblings started
//! by the same shell pipeline land in different slots, while a single process
//! always waits the same amount.

/// Deterministic backoff step derived from process identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterSeed {
    pid: u32,
    pgid: u32,
    step: u32,
}

impl JitterSeed {
    /// Seed of the current process
    pub fn from_process() -> Self {
        let pid = std::process::id();
        // SAFETY: getpgrp has no preconditions and cannot fail.
        let pgid = unsafe { libc::getpgrp() } as u32;
        Self::from_ids(pid, pgid)
    }

    /// Seed for an explicit (pid, pgid) pair
    ///
    /// The step is `(pid - pgid) mod 10`, with `0` mapped to `10`; a process
    /// that leads its own group gets step `1`.
    pub fn from_ids(pid: u32, pgid: u32) -> Self {
        let step = if pid == pgid {
            1
        } else {
            match (i64::from(pid) - i64::from(pgid)).rem_euclid(10) {
                0 => 10,
                d => d as u32,
            }
        };
        Self { pid, pgid, step }
    }

    /// A seed with a fixed step, for tests and reproducible runs
    pub fn fixed(step: u32) -> Self {
        Self {
            pid: 0,
            pgid: 0,
            step,
        }
    }

    /// Multiplier in `1..=10` applied to the quota step
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn pgid(&self) -> u32 {
        self.pgid
    }
}

impl Default for JitterSeed {
    fn default() -> Self {
        Self::from_process()
    }
}
