//! Shuffled play order

use crate::types::Entry;
use rand::seq::SliceRandom;
use rand::Rng;

/// Build a shuffled copy of `entries`
///
/// The entry at `keep_first` (the one currently playing) is moved to the
/// front so turning shuffle on never interrupts the running track; the rest
/// are shuffled with Fisher-Yates.
pub fn shuffled_order(entries: &[Entry], keep_first: Option<usize>) -> Vec<Entry> {
    shuffled_order_with(entries, keep_first, &mut rand::thread_rng())
}

pub(crate) fn shuffled_order_with<R: Rng + ?Sized>(
    entries: &[Entry],
    keep_first: Option<usize>,
    rng: &mut R,
) -> Vec<Entry> {
    let mut order: Vec<Entry> = entries.to_vec();

    match keep_first.filter(|i| *i < order.len()) {
        Some(first) => {
            let current = order.remove(first);
            order.shuffle(rng);
            order.insert(0, current);
        }
        None => order.shuffle(rng),
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn create_test_entry(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            title: format!("Track {}", id),
            artist: "Test Artist".to_string(),
            album: None,
            duration: None,
            stream_url: format!("https://music.example.com/rest/stream.view?id={}", id),
            download_url: None,
        }
    }

    fn entries(n: usize) -> Vec<Entry> {
        (0..n).map(|i| create_test_entry(&i.to_string())).collect()
    }

    #[test]
    fn keeps_current_entry_first() {
        let list = entries(10);
        let mut rng = StdRng::seed_from_u64(7);
        let order = shuffled_order_with(&list, Some(4), &mut rng);
        assert_eq!(order[0].id, "4");
    }

    #[test]
    fn preserves_all_entries() {
        let list = entries(20);
        let order = shuffled_order(&list, Some(0));

        let ids: HashSet<String> = order.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(order.len(), 20);
    }

    #[test]
    fn out_of_range_keep_first_is_ignored() {
        let list = entries(3);
        let order = shuffled_order(&list, Some(9));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn empty_list() {
        assert!(shuffled_order(&[], None).is_empty());
    }
}
