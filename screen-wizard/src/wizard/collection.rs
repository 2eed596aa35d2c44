// Collection editor
// Add/remove/replace over the ordered cabinet and module lists. Operations return a new list
// instead of mutating in place; no operation ever leaves a list with fewer than MIN_ENTRIES.

use thiserror::Error;

pub const MIN_ENTRIES: usize = 1;

/// Why an edit was refused. The message is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("At least one entry is required; the last entry cannot be removed.")]
    LastEntry,
    #[error("Entry {index} does not exist (the list has {len} entries).")]
    OutOfRange { index: usize, len: usize },
}

/// Append one entry built by `factory`.
pub fn add_entry<T: Clone>(list: &[T], factory: impl FnOnce() -> T) -> Vec<T> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend_from_slice(list);
    next.push(factory());
    next
}

pub fn remove_entry<T: Clone>(list: &[T], index: usize) -> Result<Vec<T>, Rejected> {
    if list.len() <= MIN_ENTRIES {
        return Err(Rejected::LastEntry);
    }
    if index >= list.len() {
        return Err(Rejected::OutOfRange {
            index,
            len: list.len(),
        });
    }
    let mut next = list.to_vec();
    next.remove(index);
    Ok(next)
}

/// Replace the entry at `index` with `entry`.
pub fn replace_entry<T: Clone>(list: &[T], index: usize, entry: T) -> Result<Vec<T>, Rejected> {
    if index >= list.len() {
        return Err(Rejected::OutOfRange {
            index,
            len: list.len(),
        });
    }
    let mut next = list.to_vec();
    next[index] = entry;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_appends_factory_value() {
        let list = vec![1, 2];
        let next = add_entry(&list, || 0);
        assert_eq!(next, vec![1, 2, 0]);
        assert_eq!(list, vec![1, 2], "input must be left untouched");
    }

    #[test]
    fn remove_refuses_last_entry() {
        let list = vec!["only"];
        assert_eq!(remove_entry(&list, 0), Err(Rejected::LastEntry));
        assert!(
            Rejected::LastEntry.to_string().contains("At least one"),
            "warning should be user-facing"
        );
    }

    #[test]
    fn remove_refuses_unknown_index() {
        let list = vec![1, 2, 3];
        assert_eq!(
            remove_entry(&list, 3),
            Err(Rejected::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn remove_keeps_order_of_remaining_entries() {
        let list = vec!["a", "b", "c"];
        assert_eq!(remove_entry(&list, 1), Ok(vec!["a", "c"]));
    }

    #[test]
    fn replace_swaps_single_index() {
        let list = vec![1, 2, 3];
        assert_eq!(replace_entry(&list, 2, 9), Ok(vec![1, 2, 9]));
        assert!(replace_entry(&list, 5, 9).is_err());
    }

    #[test]
    fn length_never_drops_below_minimum_over_edit_sequences() {
        // INTENT: whatever the order of adds/removes, the list never empties.
        let mut list = vec![0usize];
        let script: [(bool, usize); 12] = [
            (false, 0),
            (true, 0),
            (true, 0),
            (false, 2),
            (false, 0),
            (false, 0),
            (false, 0),
            (true, 0),
            (false, 5),
            (false, 1),
            (false, 0),
            (true, 0),
        ];
        for (step, (add, index)) in script.iter().enumerate() {
            list = if *add {
                add_entry(&list, || step)
            } else {
                remove_entry(&list, *index).unwrap_or(list)
            };
            assert!(
                list.len() >= MIN_ENTRIES,
                "list emptied at step {}: {:?}",
                step,
                list
            );
        }
    }
}
