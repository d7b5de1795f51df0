//! Thread local transaction statistics.

use core::cell::Cell;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Transactions that committed.
    pub commits: usize,
    /// Attempts that failed, either mid-transaction or at commit.
    pub conflicts: usize,
}

thread_local! {
    static STATS: Cell<Stats> = Cell::new(Stats {
        commits:   0,
        conflicts: 0,
    });
}

#[inline]
pub(crate) fn record_commit() {
    STATS.with(|stats| {
        let mut s = stats.get();
        s.commits += 1;
        stats.set(s);
    })
}

#[inline]
pub(crate) fn record_conflict() {
    STATS.with(|stats| {
        let mut s = stats.get();
        s.conflicts += 1;
        stats.set(s);
    })
}

/// A snapshot of this thread's counters.
#[inline]
pub fn get() -> Stats {
    STATS.with(Cell::get)
}

/// Prints this thread's counters to stdout.
pub fn print_stats() {
    println!("{:#?}", get())
}
