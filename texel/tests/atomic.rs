use arrayview_texel::LifetimeOwner;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn writing_neighbours_parallel() {
    const LEN: usize = 64;
    let buffer = LifetimeOwner::new(LEN * 2);
    // And receive all the results in this shared handle of our buffer.
    let output_tap = buffer.clone();

    // Proxy for whether we run with optimization. Makes execution time bearable.
    #[cfg(debug_assertions)]
    const REPEAT: u16 = 1 << 6;
    #[cfg(not(debug_assertions))]
    const REPEAT: u16 = 1 << 12;

    // We want the modifying loops to overlap as much as possible for the strongest test, so
    // ensure they do not run early.
    let barrier = &Barrier::new(2);

    // Concurrently increment the even and odd elements. Each `u64` word of the buffer holds
    // elements of both threads.
    thread::scope(|join| {
        for parity in 0..2 {
            let view = buffer.clone();
            join.spawn(move || {
                let _ = barrier.wait();
                for _ in 0..REPEAT {
                    for idx in (parity..LEN).step_by(2) {
                        let n: u16 = view.load(idx * 2).unwrap();
                        view.store(idx * 2, n + 1).unwrap();
                    }
                }
            });
        }
    });

    // Each thread was the only writer of its own elements, so no increment may get lost even
    // though the other thread kept writing into the same words.
    for idx in 0..LEN {
        assert_eq!(output_tap.load::<u16>(idx * 2), Some(REPEAT), "at {}", idx);
    }
}

#[test]
fn released_once_by_last_holder() {
    const HOLDERS: usize = 16;

    for _ in 0..64 {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let owner = LifetimeOwner::new(32)
            .with_finalizer(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("Just allocated");

        let barrier = &Barrier::new(HOLDERS);
        thread::scope(|join| {
            for _ in 0..HOLDERS {
                let holder = owner.clone();
                join.spawn(move || {
                    let _ = barrier.wait();
                    drop(holder);
                });
            }
        });

        assert_eq!(released.load(Ordering::SeqCst), 0, "Still held by the first handle");
        assert!(owner.is_unique());
        drop(owner);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn address_is_shared_by_clones() {
    let owner = LifetimeOwner::with_bytes(b"shared");
    let alias = owner.clone();
    assert_eq!(owner.address(), alias.address());
    assert!(owner.ptr_eq(&alias));

    let copy = owner.to_independent();
    assert_ne!(owner.address(), copy.address());
    assert_eq!(copy.to_bytes(), b"shared");
}
