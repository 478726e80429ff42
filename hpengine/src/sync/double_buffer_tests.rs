use std::sync::Arc;
use std::thread;
use super::*;

fn increment(value: &mut i64) -> Result<()> {
    *value += 1;
    Ok(())
}

fn write_value(buffer: &DoubleBuffer<i64>) -> i64 {
    *buffer.slots[buffer.write_slot()].state.read()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_assigns_roles() {
    let buffer = DoubleBuffer::new(10i64, 20i64);
    assert_eq!(buffer.read_slot(), 0);
    assert_eq!(buffer.write_slot(), 1);
    assert_eq!(*buffer.start_read(), 10);
    assert_eq!(write_value(&buffer), 20);
}

#[test]
fn test_try_from_requires_two_states() {
    assert!(DoubleBuffer::try_from(vec![1i64, 2]).is_ok());

    let result = DoubleBuffer::try_from(vec![1i64]);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    let result = DoubleBuffer::try_from(vec![1i64, 2, 3]);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

// ============================================================================
// Update / swap
// ============================================================================

#[test]
fn test_three_increments_two_updates() {
    let buffer = DoubleBuffer::new(0i64, 0i64);
    for _ in 0..3 {
        buffer.add_command(increment);
    }

    assert!(buffer.update());
    assert!(buffer.update());

    assert_eq!(*buffer.start_read(), 3);
    assert_eq!(write_value(&buffer), 3);
}

#[test]
fn test_single_update_publishes_to_reader() {
    let buffer = DoubleBuffer::new(0i64, 0i64);
    buffer.add_command(increment);

    assert!(buffer.update());

    assert_eq!(*buffer.start_read(), 1);
    // The other copy replays the same command on its next turn
    assert_eq!(buffer.slots[buffer.write_slot()].pending(), 1);
}

#[test]
fn test_swap_round_trip() {
    let buffer = DoubleBuffer::new(1i64, 2i64);

    buffer.swap();
    assert_eq!(buffer.read_slot(), 1);
    assert_eq!(buffer.write_slot(), 0);
    assert_eq!(*buffer.start_read(), 2);

    buffer.swap();
    assert_eq!(buffer.read_slot(), 0);
    assert_eq!(buffer.write_slot(), 1);
    assert_eq!(*buffer.start_read(), 1);
}

#[test]
fn test_failing_command_still_swaps() {
    let buffer = DoubleBuffer::new(0i64, 0i64);
    buffer.add_command(|_| Err(Error::CommandFailed("rejected".to_string())));
    buffer.add_command(increment);

    assert!(buffer.update());
    assert_eq!(*buffer.start_read(), 1);
}

// ============================================================================
// Read blocking
// ============================================================================

#[test]
fn test_update_refused_while_reading() {
    let buffer = DoubleBuffer::new(0i64, 0i64);
    buffer.add_command(increment);

    let guard = buffer.start_read();
    assert!(buffer.is_reading());
    assert!(!buffer.update());
    assert_eq!(*guard, 0);
    assert_eq!(write_value(&buffer), 0);
    buffer.stop_read(guard);

    assert!(!buffer.is_reading());
    assert!(buffer.update());
    assert_eq!(*buffer.start_read(), 1);
}

#[test]
fn test_update_refused_while_other_thread_reads() {
    let buffer = Arc::new(DoubleBuffer::new(0i64, 0i64));
    buffer.add_command(increment);

    let guard = buffer.start_read();
    let remote = Arc::clone(&buffer);
    let refused = thread::spawn(move || !remote.update()).join().unwrap();
    assert!(refused);
    drop(guard);

    let remote = Arc::clone(&buffer);
    assert!(thread::spawn(move || remote.update()).join().unwrap());
}

#[test]
fn test_nested_reads() {
    let buffer = DoubleBuffer::new(5i64, 0i64);

    let outer = buffer.start_read();
    let inner = buffer.start_read();
    assert_eq!(*outer, *inner);
    drop(inner);

    assert!(buffer.is_reading());
    assert!(!buffer.update());
    drop(outer);
    assert!(buffer.update());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_swaps_restore_identities() {
    const THREADS: usize = 6;
    const SWAPS: usize = 100_000;

    let buffer = Arc::new(DoubleBuffer::new(0i64, 1i64));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for _ in 0..SWAPS {
                    buffer.swap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(buffer.read_slot(), 0);
    assert_eq!(buffer.write_slot(), 1);
    assert_eq!(*buffer.start_read(), 0);
}

#[test]
fn test_concurrent_updates_and_reads_see_whole_commands() {
    let buffer = Arc::new(DoubleBuffer::new(0i64, 0i64));

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for _ in 0..1000 {
                buffer.add_command(|v| { *v += 2; Ok(()) });
                while !buffer.update() {
                    thread::yield_now();
                }
            }
        })
    };
    let consumer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for _ in 0..1000 {
                let value = *buffer.start_read();
                assert_eq!(value % 2, 0);
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();

    // One more update lets the lagging copy catch up
    assert!(buffer.update());
    assert_eq!(*buffer.start_read(), 2000);
    assert_eq!(write_value(&buffer), 2000);
}
