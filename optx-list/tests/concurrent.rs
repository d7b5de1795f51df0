//! Cross-thread conflict behavior, driven deterministically with channel
//! handshakes where ordering matters.

use crossbeam_utils::thread;
use optx_list::{OrdCompare, SortedSet, TList};
use std::sync::{mpsc, Barrier};

type OpaqueSet<T> = TList<T, OrdCompare, true, false, true>;

fn seeded(values: &[u64]) -> SortedSet<u64> {
    let mut set = SortedSet::new();
    for &v in values {
        assert!(set.nontrans_insert(v));
    }
    set
}

/// Two transactions race to insert the same element into an empty set.
/// Exactly one wins; the set ends with a single node.
#[test]
fn racing_inserts_one_winner() {
    let set = seeded(&[]);
    let barrier = Barrier::new(2);
    let (first, second) = thread::scope(|scope| {
        let set = &set;
        let barrier = &barrier;
        let a = scope.spawn(move |_| {
            barrier.wait();
            set.atomic(|tx| set.insert(tx, 3))
        });
        let b = scope.spawn(move |_| {
            barrier.wait();
            set.atomic(|tx| set.insert(tx, 3))
        });
        (a.join().unwrap(), b.join().unwrap())
    })
    .unwrap();
    assert!(first ^ second, "exactly one insert may win");
    assert_eq!(set.nontrans_len(), 1);
    assert_eq!(set.nontrans_find(&3), Some(3));
}

/// A transaction that observed a key absent must abort once a concurrent
/// transaction commits an insert of that key.
#[test]
fn absence_witness_invalidated() {
    let set = seeded(&[1, 3]);
    let (reader_ready, main_resume) = mpsc::channel();
    let (main_done, reader_resume) = mpsc::channel();
    thread::scope(|scope| {
        let set = &set;
        let reader = scope.spawn(move |_| {
            optx::try_rw(|tx| {
                assert_eq!(set.find(tx, &2)?, None);
                reader_ready.send(()).unwrap();
                reader_resume.recv().unwrap();
                Ok(())
            })
        });
        main_resume.recv().unwrap();
        assert!(set.atomic(|tx| set.insert(tx, 2)));
        main_done.send(()).unwrap();
        let result = reader.join().unwrap();
        assert!(result.is_err(), "absence witness no longer holds");
    })
    .unwrap();
    assert_eq!(set.nontrans_len(), 3);
}

/// A found element that a concurrent transaction then deletes invalidates
/// the finder's presence witness.
#[test]
fn presence_witness_invalidated() {
    let set = seeded(&[1, 2, 3]);
    let (reader_ready, main_resume) = mpsc::channel();
    let (main_done, reader_resume) = mpsc::channel();
    thread::scope(|scope| {
        let set = &set;
        let reader = scope.spawn(move |_| {
            optx::try_rw(|tx| {
                assert_eq!(set.find(tx, &2)?, Some(2));
                reader_ready.send(()).unwrap();
                reader_resume.recv().unwrap();
                Ok(())
            })
        });
        main_resume.recv().unwrap();
        assert!(set.atomic(|tx| set.remove(tx, &2)));
        main_done.send(()).unwrap();
        let result = reader.join().unwrap();
        assert!(result.is_err(), "the found node is gone");
    })
    .unwrap();
    assert_eq!(set.nontrans_len(), 2);
}

/// A reader that reaches another transaction's reserved (not yet committed)
/// node aborts rather than guess.
#[test]
fn foreign_reserved_node_aborts_reader() {
    let set = seeded(&[1, 3]);
    let (writer_ready, main_resume) = mpsc::channel();
    let (main_done, writer_resume) = mpsc::channel();
    thread::scope(|scope| {
        let set = &set;
        let writer = scope.spawn(move |_| {
            optx::try_rw(|tx| {
                assert!(set.insert(tx, 2)?);
                writer_ready.send(()).unwrap();
                writer_resume.recv().unwrap();
                Ok(())
            })
        });
        main_resume.recv().unwrap();
        let found = optx::try_rw(|tx| set.find(tx, &2));
        assert!(found.is_err(), "reserved node is not ours to read");
        main_done.send(()).unwrap();
        assert!(writer.join().unwrap().is_ok());
    })
    .unwrap();
    assert_eq!(set.nontrans_find(&2), Some(2));
    assert_eq!(set.nontrans_len(), 3);
}

/// An iteration overlapping a committed structural change never both yields
/// the new element and commits.
#[test]
fn iteration_vs_concurrent_insert() {
    let set = seeded(&[1, 2, 3]);
    let (reader_ready, main_resume) = mpsc::channel();
    let (main_done, reader_resume) = mpsc::channel();
    thread::scope(|scope| {
        let set = &set;
        let reader = scope.spawn(move |_| {
            optx::try_rw(|tx| {
                let mut iter = set.iter(tx)?;
                assert_eq!(iter.next(tx)?, Some(1));
                reader_ready.send(()).unwrap();
                reader_resume.recv().unwrap();
                let mut rest = Vec::new();
                while let Some(v) = iter.next(tx)? {
                    rest.push(v);
                }
                Ok(rest)
            })
        });
        main_resume.recv().unwrap();
        assert!(set.atomic(|tx| set.insert(tx, 4)));
        main_done.send(()).unwrap();
        let result = reader.join().unwrap();
        assert!(
            result.is_err(),
            "iteration overlapped a structural commit and must abort"
        );
    })
    .unwrap();
    assert_eq!(set.nontrans_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

/// In opacity mode, a version stamped after the transaction began fails the
/// early check instead of waiting for commit.
#[test]
fn opacity_check_aborts_early() {
    let mut set: OpaqueSet<u64> = OpaqueSet::new();
    assert!(set.nontrans_insert(1));
    let set = set;
    let (reader_ready, main_resume) = mpsc::channel();
    let (main_done, reader_resume) = mpsc::channel();
    thread::scope(|scope| {
        let set = &set;
        let reader = scope.spawn(move |_| {
            optx::try_rw(|tx| {
                assert_eq!(set.find(tx, &2)?, None);
                reader_ready.send(()).unwrap();
                reader_resume.recv().unwrap();
                // the version moved after this transaction began
                set.find(tx, &1).map(drop)
            })
        });
        main_resume.recv().unwrap();
        assert!(set.atomic(|tx| set.insert(tx, 2)));
        main_done.send(()).unwrap();
        assert!(reader.join().unwrap().is_err());
    })
    .unwrap();
}

/// Transactions on disjoint keys still serialize through the structure:
/// concurrent inserts and removes keep the committed count exact.
#[test]
fn contended_disjoint_keys() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 200;
    let set = seeded(&[]);
    thread::scope(|scope| {
        let set = &set;
        for t in 0..THREADS {
            let _ = scope.spawn(move |_| {
                let base = t * PER_THREAD;
                for k in base..base + PER_THREAD {
                    assert!(set.atomic(|tx| set.insert(tx, k)));
                }
                for k in (base..base + PER_THREAD).filter(|k| k % 2 == 0) {
                    assert!(set.atomic(|tx| set.remove(tx, &k)));
                }
            });
        }
    })
    .unwrap();
    let expected = (THREADS * PER_THREAD / 2) as usize;
    assert_eq!(set.nontrans_len(), expected);
    let walked: Vec<u64> = set.nontrans_iter().collect();
    assert_eq!(walked.len(), expected);
    assert!(walked.windows(2).all(|w| w[0] < w[1]), "sorted, no duplicates");
    assert!(walked.iter().all(|k| k % 2 == 1));
}
