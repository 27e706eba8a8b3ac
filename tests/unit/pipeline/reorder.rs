use super::*;

#[test]
fn releases_in_index_order() {
    let mut buf = ReorderBuffer::new(0);
    assert!(buf.insert(2, Slot::Frame("c")));
    assert!(buf.insert(1, Slot::Skipped));
    assert!(buf.pop_ready().is_none());
    assert!(buf.insert(0, Slot::Frame("a")));

    let mut out = Vec::new();
    while let Some((idx, slot)) = buf.pop_ready() {
        out.push((idx, slot));
    }
    assert_eq!(
        out,
        vec![(0, Slot::Frame("a")), (1, Slot::Skipped), (2, Slot::Frame("c"))]
    );
    assert!(buf.is_empty());
    assert_eq!(buf.next_index(), 3);
}

#[test]
fn rejects_stale_and_duplicate_indices() {
    let mut buf = ReorderBuffer::new(5);
    assert!(!buf.insert(4, Slot::Frame(1)));
    assert!(buf.insert(6, Slot::Frame(1)));
    assert!(!buf.insert(6, Slot::Frame(2)));
    assert_eq!(buf.len(), 1);
}

#[test]
fn shuffled_completion_is_resequenced() {
    let order = [7u64, 3, 0, 9, 1, 2, 8, 4, 6, 5];
    let mut buf = ReorderBuffer::new(0);
    let mut released = Vec::new();
    for idx in order {
        buf.insert(idx, Slot::Frame(idx));
        while let Some((i, _)) = buf.pop_ready() {
            released.push(i);
        }
    }
    assert_eq!(released, (0..10).collect::<Vec<_>>());
}
