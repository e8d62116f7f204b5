//! Property tests for allocator invariants: alignment, disjointness, monotonic
//! heads, reset round-trips and pool conservation.

use std::collections::HashSet;
use std::ptr::NonNull;

use proptest::prelude::*;
use strata_alloc::prelude::*;
use strata_alloc::{BlockConfig, FixedBufferConfig};

#[repr(C, align(64))]
struct Aligned<const N: usize>([u8; N]);

fn span(region: NonNull<[u8]>) -> (usize, usize) {
    let start = region.cast::<u8>().as_ptr().addr();
    (start, start + region.len())
}

fn assert_disjoint(mut spans: Vec<(usize, usize)>) -> Result<(), TestCaseError> {
    spans.retain(|(start, end)| start != end);
    spans.sort_unstable();
    for pair in spans.windows(2) {
        prop_assert!(pair[0].1 <= pair[1].0, "overlap: {:?}", pair);
    }
    Ok(())
}

/// (size, alignment) requests with power-of-two alignments up to 64
fn requests(max_size: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..max_size, 0u32..7).prop_map(|(s, p)| (s, 1 << p)), 1..64)
}

// ---------------------------------------------------------------------------
// Fixed buffer
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fixed_buffer_aligned_disjoint_monotonic(reqs in requests(200)) {
        let mut buf = Aligned([0u8; 4096]);
        let fba = FixedBufferAllocator::new(&mut buf.0);
        let mut spans = Vec::new();
        let mut last_used = 0;

        for (size, align) in reqs {
            match fba.alloc(size, align) {
                Ok(region) => {
                    prop_assert_eq!(region.len(), size);
                    prop_assert_eq!(span(region).0 % align, 0);
                    spans.push(span(region));
                }
                Err(err) => prop_assert!(matches!(err, MemoryError::OutOfSpace { .. }), "expected OutOfSpace, got {:?}", err),
            }
            prop_assert!(fba.used() >= last_used);
            prop_assert!(fba.used() <= fba.capacity());
            last_used = fba.used();
        }
        assert_disjoint(spans)?;
    }

    #[test]
    fn fixed_buffer_reset_round_trip(reqs in requests(300)) {
        let mut buf = Aligned([0u8; 2048]);
        let mut fba = FixedBufferAllocator::with_config(&mut buf.0, FixedBufferConfig::debug());

        let first: Vec<_> = reqs.iter().map(|&(s, a)| fba.alloc(s, a)).collect();
        fba.reset();
        fba.reset();
        prop_assert_eq!(fba.used(), 0);
        let second: Vec<_> = reqs.iter().map(|&(s, a)| fba.alloc(s, a)).collect();

        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn arena_aligned_disjoint_and_grows_only_when_needed(reqs in requests(240)) {
        let config = ArenaConfig::new().with_block_size(256);
        let arena = Arena::with_config(config).unwrap();
        let mut spans = Vec::new();

        for (size, align) in reqs {
            let blocks_before = arena.block_count();
            let remaining_before = arena.current_block_remaining();

            match arena.alloc(size, align) {
                Ok(region) => {
                    prop_assert_eq!(span(region).0 % align, 0);
                    spans.push(span(region));
                    if arena.block_count() == blocks_before {
                        // Same block: the head only moves forward.
                        prop_assert!(arena.current_block_remaining() <= remaining_before - size);
                    } else {
                        prop_assert_eq!(arena.block_count(), blocks_before + 1);
                        // Padding is below `align`, so the old block really was too full.
                        prop_assert!(blocks_before == 0 || remaining_before < size + align);
                    }
                }
                Err(err) => {
                    prop_assert!(matches!(err, MemoryError::RequestTooLarge { .. }), "expected RequestTooLarge, got {:?}", err);
                    // Only requests no fresh block could hold fail, and they
                    // never leave a block behind.
                    prop_assert!(config.max_request_size(align).is_none_or(|max| size > max));
                    prop_assert_eq!(arena.block_count(), blocks_before);
                }
            }
        }
        assert_disjoint(spans)?;
    }

    #[test]
    fn arena_clear_round_trip(reqs in requests(200)) {
        let mut arena = Arena::with_config(ArenaConfig::debug().with_block_size(512)).unwrap();

        let run = |arena: &Arena| -> (usize, Vec<bool>) {
            let outcomes = reqs.iter().map(|&(s, a)| arena.alloc(s, a).is_ok()).collect();
            (arena.block_count(), outcomes)
        };

        let first = run(&arena);
        arena.clear();
        arena.clear();
        prop_assert_eq!(arena.block_count(), 0);
        let second = run(&arena);
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Block allocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum PoolOp {
    Alloc,
    /// Free the n-th live slot (modulo live count)
    Free(usize),
}

fn pool_ops() -> impl Strategy<Value = Vec<PoolOp>> {
    prop::collection::vec(
        prop_oneof![3 => Just(PoolOp::Alloc), 2 => any::<usize>().prop_map(PoolOp::Free)],
        1..200,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn block_pool_conservation_and_lifo(
        item_size in 8usize..80,
        ops in pool_ops(),
    ) {
        let mut buf = Aligned([0u8; 1024]);
        let pool = BlockAllocator::with_config(&mut buf.0, item_size, BlockConfig::debug()).unwrap();
        let slots = 1024 / item_size;
        let mut live: Vec<NonNull<u8>> = Vec::new();
        let mut last_freed: Option<NonNull<u8>> = None;

        for op in ops {
            match op {
                PoolOp::Alloc => match pool.alloc() {
                    Ok(region) => {
                        let slot = region.cast::<u8>();
                        if let Some(freed) = last_freed.take() {
                            prop_assert_eq!(slot, freed, "most recently freed slot comes back first");
                        }
                        prop_assert!(!live.contains(&slot));
                        live.push(slot);
                    }
                    Err(err) => {
                        prop_assert_eq!(live.len(), slots);
                        prop_assert_eq!(err, MemoryError::pool_exhausted(slots));
                    }
                },
                PoolOp::Free(n) if !live.is_empty() => {
                    let slot = live.swap_remove(n % live.len());
                    // SAFETY: slot is handed out and dropped from `live`.
                    prop_assert!(unsafe { pool.free(slot) }, "pool rejected free of a live slot");
                    last_freed = Some(slot);
                }
                PoolOp::Free(_) => {}
            }

            prop_assert_eq!(pool.allocated_count() + pool.free_count(), slots);
            prop_assert_eq!(pool.allocated_count(), live.len());
            prop_assert_eq!(pool.free_list_len(), pool.free_count());
        }

        let distinct: HashSet<_> = live.iter().map(|p| p.as_ptr().addr()).collect();
        prop_assert_eq!(distinct.len(), live.len());
    }

    #[test]
    fn block_free_ignores_non_slot_pointers(item_size in 8usize..64, offset in 1usize..64) {
        let mut buf = Aligned([0u8; 512]);
        let pool = BlockAllocator::new(&mut buf.0, item_size).unwrap();
        let slot = pool.alloc().unwrap().cast::<u8>();
        let before = pool.free_list_len();

        prop_assume!(offset % item_size != 0);
        // SAFETY: offset is inside the buffer and never a slot boundary, so
        // free must ignore it.
        let accepted = unsafe { pool.free(slot.add(offset)) };
        prop_assert!(!accepted);
        prop_assert_eq!(pool.free_list_len(), before);
    }
}
